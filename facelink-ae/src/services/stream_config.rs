//! Stream configuration resolution
//!
//! Resolves the rule sets that apply to one camera stream: every configured
//! entry matching the stream id is normalized against the global defaults
//! (field-wise, unset fields inherit). When nothing matches and
//! `apply_for_all_streams` is set, one rule set is synthesized from the
//! defaults alone.
//!
//! Resolution is a pure function over the settings document. It never
//! mutates the defaults, so resolving the same stream twice yields
//! field-for-field identical results and resolved values are safe to cache
//! for the process lifetime.

use facelink_common::{Error, Result};
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::config::Settings;
use crate::models::{Conditions, Range, StreamConfiguration};

/// Built-in fallback conditions, applied beneath the `[config.conditions]`
/// section of the settings document.
static BASE_CONDITIONS: Lazy<Conditions> = Lazy::new(|| Conditions {
    face_quality: Some(Range::min(2000.0)),
    template_quality: Some(Range::min(80.0)),
    yaw_angle: Some(Range::new(-7.0, 7.0)),
    pitch_angle: Some(Range::new(-25.0, 25.0)),
    roll_angle: Some(Range::new(-15.0, 15.0)),
    tracklet_debounce_ms: Some(4_000),
    ..Conditions::default()
});

/// Resolves per-stream rule sets from the settings document.
pub struct StreamConfigResolver {
    settings: Arc<Settings>,
    defaults: Conditions,
}

impl StreamConfigResolver {
    pub fn new(settings: Arc<Settings>) -> Self {
        let defaults = normalize_conditions(&settings.config.conditions, &settings.config.watchlist_ids);
        Self { settings, defaults }
    }

    /// Resolve the rule sets applying to `stream_id`.
    ///
    /// Returns an empty vector when the stream has no entry and
    /// `apply_for_all_streams` is off.
    ///
    /// # Errors
    /// `Error::InvalidInput` when `stream_id` is not GUID-shaped.
    pub fn resolve(&self, stream_id: &str) -> Result<Vec<StreamConfiguration>> {
        let stream_guid = facelink_common::uuid_utils::parse(stream_id)
            .map_err(|_| Error::InvalidInput(format!("stream id is expected as GUID: {stream_id}")))?;

        let mut mappings: Vec<StreamConfiguration> = self
            .settings
            .stream_configurations
            .iter()
            .filter(|entry| entry.stream_id == Some(stream_guid))
            .map(|entry| normalize_mapping(entry.clone(), &self.defaults))
            .collect();

        if mappings.is_empty() && self.settings.config.apply_for_all_streams {
            let mut synthesized = normalize_mapping(StreamConfiguration::default(), &self.defaults);
            synthesized.stream_id = Some(stream_guid);
            mappings.push(synthesized);
        }

        Ok(mappings)
    }

    /// The normalized global defaults (mainly for diagnostics and tests).
    pub fn defaults(&self) -> &Conditions {
        &self.defaults
    }
}

/// Fill unset fields of the configured conditions from the built-in
/// fallbacks; the default watchlist set is the union of the top-level
/// `watchlist_ids` and the conditions-level ones.
fn normalize_conditions(conditions: &Conditions, global_watchlists: &[String]) -> Conditions {
    let mut normalized = conditions.clone();
    let base = &*BASE_CONDITIONS;

    normalized.face_quality = normalized.face_quality.or(base.face_quality);
    normalized.template_quality = normalized.template_quality.or(base.template_quality);
    normalized.yaw_angle = normalized.yaw_angle.or(base.yaw_angle);
    normalized.pitch_angle = normalized.pitch_angle.or(base.pitch_angle);
    normalized.roll_angle = normalized.roll_angle.or(base.roll_angle);
    normalized.tracklet_debounce_ms = normalized
        .tracklet_debounce_ms
        .or(base.tracklet_debounce_ms);

    for watchlist_id in global_watchlists {
        if !normalized.watchlist_ids.contains(watchlist_id) {
            normalized.watchlist_ids.push(watchlist_id.clone());
        }
    }

    normalized
}

/// Field-wise merge of one stream entry over the normalized defaults.
/// Consumes and returns the entry; the defaults are read-only.
fn normalize_mapping(mut mapping: StreamConfiguration, defaults: &Conditions) -> StreamConfiguration {
    mapping.face_quality = mapping.face_quality.or(defaults.face_quality);
    mapping.template_quality = mapping.template_quality.or(defaults.template_quality);
    mapping.face_size = mapping.face_size.or(defaults.face_size);
    mapping.face_area = mapping.face_area.or(defaults.face_area);
    mapping.face_order = mapping.face_order.or(defaults.face_order);
    mapping.faces_on_frame_count = mapping
        .faces_on_frame_count
        .or(defaults.faces_on_frame_count);
    mapping.brightness = mapping.brightness.or(defaults.brightness);
    mapping.sharpness = mapping.sharpness.or(defaults.sharpness);
    mapping.yaw_angle = mapping.yaw_angle.or(defaults.yaw_angle);
    mapping.pitch_angle = mapping.pitch_angle.or(defaults.pitch_angle);
    mapping.roll_angle = mapping.roll_angle.or(defaults.roll_angle);

    mapping.keep_auto_learn = mapping.keep_auto_learn.or(defaults.keep_auto_learn);
    mapping.stream_debounce_ms = mapping.stream_debounce_ms.or(defaults.stream_debounce_ms);
    mapping.tracklet_debounce_ms = mapping
        .tracklet_debounce_ms
        .or(defaults.tracklet_debounce_ms);
    mapping.group_debounce_ms = mapping.group_debounce_ms.or(defaults.group_debounce_ms);

    mapping.frame_padding_absolute = mapping
        .frame_padding_absolute
        .or(defaults.frame_padding_absolute);
    mapping.frame_padding_relative = mapping
        .frame_padding_relative
        .or(defaults.frame_padding_relative);

    if mapping.watchlist_ids.is_empty() {
        mapping.watchlist_ids = defaults.watchlist_ids.clone();
    }

    mapping
}
