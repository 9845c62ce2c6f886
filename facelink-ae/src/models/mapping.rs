//! Per-stream enrollment rules
//!
//! A `StreamConfiguration` is the rule set applied to one camera stream:
//! attribute ranges a detection must satisfy, debounce windows, frame
//! padding, and the target watchlists. Entries come from the settings
//! document with most fields unset; the resolver fills the gaps from the
//! global `Conditions` defaults.

use serde::Deserialize;
use uuid::Uuid;

/// Inclusive numeric bounds. Either bound may be absent, meaning unbounded
/// on that side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Range<T> {
    pub fn min(min: T) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn new(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Global default rule set, merged into every stream entry at resolution
/// time. Same shape as the per-stream overrides minus the stream identity.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Conditions {
    pub watchlist_ids: Vec<String>,

    pub face_quality: Option<Range<f64>>,
    pub template_quality: Option<Range<f64>>,
    pub face_size: Option<Range<f64>>,
    pub face_area: Option<Range<f64>>,
    pub face_order: Option<Range<f64>>,
    pub faces_on_frame_count: Option<Range<f64>>,
    pub brightness: Option<Range<f64>>,
    pub sharpness: Option<Range<f64>>,
    pub yaw_angle: Option<Range<f64>>,
    pub pitch_angle: Option<Range<f64>>,
    pub roll_angle: Option<Range<f64>>,

    pub keep_auto_learn: Option<bool>,

    pub stream_debounce_ms: Option<u64>,
    pub tracklet_debounce_ms: Option<u64>,
    pub group_debounce_ms: Option<u64>,

    pub frame_padding_absolute: Option<f64>,
    pub frame_padding_relative: Option<f64>,
}

/// Rule set for one stream. Deserialized from a `[[stream_configurations]]`
/// entry, then normalized against the global defaults by the resolver.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct StreamConfiguration {
    pub stream_id: Option<Uuid>,
    pub stream_group_id: Option<String>,
    pub watchlist_ids: Vec<String>,

    pub face_quality: Option<Range<f64>>,
    pub template_quality: Option<Range<f64>>,
    pub face_size: Option<Range<f64>>,
    pub face_area: Option<Range<f64>>,
    pub face_order: Option<Range<f64>>,
    pub faces_on_frame_count: Option<Range<f64>>,
    pub brightness: Option<Range<f64>>,
    pub sharpness: Option<Range<f64>>,
    pub yaw_angle: Option<Range<f64>>,
    pub pitch_angle: Option<Range<f64>>,
    pub roll_angle: Option<Range<f64>>,

    pub keep_auto_learn: Option<bool>,

    pub stream_debounce_ms: Option<u64>,
    pub tracklet_debounce_ms: Option<u64>,
    pub group_debounce_ms: Option<u64>,

    pub frame_padding_absolute: Option<f64>,
    pub frame_padding_relative: Option<f64>,
}
