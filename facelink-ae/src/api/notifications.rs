//! Notification ingestion webhook
//!
//! The push surface for upstream detection events. The upstream system's
//! own wire protocol stays out of scope; a bridge subscribes there and
//! POSTs one JSON body per detection here. Submission is non-blocking, so
//! the handler acknowledges with 202 before the pipeline has decided
//! anything.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::models::{base64_bytes, CropCoordinates, FrameInformation, Notification};
use crate::AppState;

/// One detection event as pushed by the notification bridge.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub stream_id: String,
    pub face_id: Option<String>,
    pub tracklet_id: String,
    #[serde(with = "base64_bytes")]
    pub crop_image: Vec<u8>,
    pub crop_coordinates: Option<CropCoordinates>,
    pub frame_information: Option<FrameInformation>,
    pub face_quality: Option<f64>,
    pub template_quality: Option<f64>,
    pub face_size: Option<f64>,
    pub face_area: Option<f64>,
    pub face_order: Option<f64>,
    pub faces_on_frame_count: Option<f64>,
    pub face_mask_status: Option<f64>,
    pub brightness: Option<f64>,
    pub sharpness: Option<f64>,
    pub yaw_angle: Option<f64>,
    pub pitch_angle: Option<f64>,
    pub roll_angle: Option<f64>,
}

impl From<NotificationPayload> for Notification {
    fn from(payload: NotificationPayload) -> Self {
        Self {
            stream_id: payload.stream_id,
            face_id: payload.face_id,
            tracklet_id: payload.tracklet_id,
            received_at: Utc::now(),
            crop_image: payload.crop_image,
            crop_coordinates: payload.crop_coordinates,
            frame_information: payload.frame_information,
            face_quality: payload.face_quality,
            template_quality: payload.template_quality,
            face_size: payload.face_size,
            face_area: payload.face_area,
            face_order: payload.face_order,
            faces_on_frame_count: payload.faces_on_frame_count,
            face_mask_status: payload.face_mask_status,
            brightness: payload.brightness,
            sharpness: payload.sharpness,
            yaw_angle: payload.yaw_angle,
            pitch_angle: payload.pitch_angle,
            roll_angle: payload.roll_angle,
        }
    }
}

/// POST /api/v1/notifications
pub async fn receive_notification(
    State(state): State<AppState>,
    Json(payload): Json<NotificationPayload>,
) -> StatusCode {
    state.dispatcher.submit(payload.into()).await;
    StatusCode::ACCEPTED
}

/// Build notification ingestion routes
pub fn notification_routes() -> Router<AppState> {
    Router::new().route("/api/v1/notifications", post(receive_notification))
}
