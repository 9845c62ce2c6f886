//! Attribute validation
//!
//! Pass/fail gating of a notification against the resolved rule set. Every
//! predicate follows the same shape: a missing notification value passes,
//! a present value must lie inside the configured inclusive range, with an
//! unset bound falling back to the attribute's sentinel. This is gating
//! only; scoring happens later in tracklet selection.

use tracing::debug;

use crate::models::{Notification, Range, StreamConfiguration};

type Predicate = fn(&Notification, &StreamConfiguration) -> bool;

/// Fixed, ordered predicate list. Order matters only for the diagnostic
/// bitmap, which mirrors this table.
const PREDICATES: [(&str, Predicate); 11] = [
    ("face_quality", validate_face_quality),
    ("template_quality", validate_template_quality),
    ("face_size", validate_face_size),
    ("face_area", validate_face_area),
    ("face_order", validate_face_order),
    ("faces_on_frame_count", validate_faces_on_frame_count),
    ("brightness", validate_brightness),
    ("sharpness", validate_sharpness),
    ("yaw_angle", validate_yaw_angle),
    ("roll_angle", validate_roll_angle),
    ("pitch_angle", validate_pitch_angle),
];

/// Outcome of one validation run, predicate by predicate.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    results: [(&'static str, bool); 11],
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|(_, ok)| *ok)
    }

    /// Names of the predicates that rejected the notification.
    pub fn failures(&self) -> Vec<&'static str> {
        self.results
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Compact `1,0,1,...` form for the diagnostic trace.
    fn bitmap(&self) -> String {
        self.results
            .iter()
            .map(|(_, ok)| if *ok { "1" } else { "0" })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Run all predicates against a notification.
pub fn evaluate(notification: &Notification, mapping: &StreamConfiguration) -> ValidationReport {
    debug!(
        face_quality = ?notification.face_quality,
        template_quality = ?notification.template_quality,
        face_size = ?notification.face_size,
        yaw_angle = ?notification.yaw_angle,
        roll_angle = ?notification.roll_angle,
        pitch_angle = ?notification.pitch_angle,
        "Face attributes"
    );

    let mut results = [("", true); 11];
    for (slot, (name, predicate)) in results.iter_mut().zip(PREDICATES.iter().copied()) {
        *slot = (name, predicate(notification, mapping));
    }

    let report = ValidationReport { results };
    debug!("Validation result [{}]", report.bitmap());
    report
}

/// Shared predicate shape: absent values pass, present values must fall
/// inside `[min ?? lower_sentinel, max ?? f64::MAX]` inclusive.
fn check(value: Option<f64>, range: Option<Range<f64>>, lower_sentinel: f64) -> bool {
    let Some(value) = value else {
        return true;
    };
    let min = range.and_then(|r| r.min).unwrap_or(lower_sentinel);
    let max = range.and_then(|r| r.max).unwrap_or(f64::MAX);
    min <= value && value <= max
}

fn validate_face_quality(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.face_quality, m.face_quality, 0.0)
}

fn validate_template_quality(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.template_quality, m.template_quality, 0.0)
}

fn validate_face_size(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.face_size, m.face_size, 0.0)
}

fn validate_face_area(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.face_area, m.face_area, f64::MIN)
}

fn validate_face_order(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.face_order, m.face_order, 0.0)
}

fn validate_faces_on_frame_count(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.faces_on_frame_count, m.faces_on_frame_count, 0.0)
}

fn validate_brightness(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.brightness, m.brightness, f64::MIN)
}

fn validate_sharpness(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.sharpness, m.sharpness, f64::MIN)
}

fn validate_yaw_angle(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.yaw_angle, m.yaw_angle, f64::MIN)
}

fn validate_roll_angle(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.roll_angle, m.roll_angle, f64::MIN)
}

fn validate_pitch_angle(n: &Notification, m: &StreamConfiguration) -> bool {
    check(n.pitch_angle, m.pitch_angle, f64::MIN)
}
