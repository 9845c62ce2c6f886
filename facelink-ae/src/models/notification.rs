//! Face-detection notification model
//!
//! One `Notification` is one detection event pushed by the recognition
//! pipeline. All quality/geometry attributes are optional: upstream versions
//! differ in which attributes they report, and a missing attribute is never
//! a rejection reason.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Corner coordinates of the face crop within the source frame.
///
/// Coordinates are in frame pixels, origin at the frame's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropCoordinates {
    pub crop_left_top_x: f64,
    pub crop_left_top_y: f64,
    pub crop_right_top_x: f64,
    pub crop_right_top_y: f64,
    pub crop_left_bottom_x: f64,
    pub crop_left_bottom_y: f64,
    pub crop_right_bottom_x: f64,
    pub crop_right_bottom_y: f64,
}

/// Dimensions of the source video frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInformation {
    pub width: u32,
    pub height: u32,
}

/// One detection event. Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Identifier of the camera stream that produced the detection
    pub stream_id: String,
    /// Platform identifier of the detected face, when reported
    pub face_id: Option<String>,
    /// Identifier grouping detections of one physical transit
    pub tracklet_id: String,
    /// When this service received the event
    pub received_at: DateTime<Utc>,
    /// JPEG bytes of the face crop
    pub crop_image: Vec<u8>,

    pub crop_coordinates: Option<CropCoordinates>,
    pub frame_information: Option<FrameInformation>,

    pub face_quality: Option<f64>,
    pub template_quality: Option<f64>,
    pub face_size: Option<f64>,
    pub face_area: Option<f64>,
    pub face_order: Option<f64>,
    pub faces_on_frame_count: Option<f64>,
    /// Carried for diagnostics, never validated
    pub face_mask_status: Option<f64>,
    pub brightness: Option<f64>,
    pub sharpness: Option<f64>,
    pub yaw_angle: Option<f64>,
    pub pitch_angle: Option<f64>,
    pub roll_angle: Option<f64>,
}

impl Notification {
    /// Minimal notification for a stream/tracklet pair; attribute fields
    /// start unset. Primarily a test and fixture convenience.
    pub fn new(stream_id: impl Into<String>, tracklet_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            face_id: None,
            tracklet_id: tracklet_id.into(),
            received_at: Utc::now(),
            crop_image: Vec::new(),
            crop_coordinates: None,
            frame_information: None,
            face_quality: None,
            template_quality: None,
            face_size: None,
            face_area: None,
            face_order: None,
            faces_on_frame_count: None,
            face_mask_status: None,
            brightness: None,
            sharpness: None,
            yaw_angle: None,
            pitch_angle: None,
            roll_angle: None,
        }
    }
}
