//! Tracklet aggregation
//!
//! Buffers every surviving notification of a tracklet for a bounded idle
//! window, then hands the single best-scored notification downstream. One
//! window exists per active tracklet id; the window's rule set is fixed to
//! whatever was resolved for its first notification. The periodic sweep
//! (driven by the dispatcher tick) flushes windows that have seen no new
//! notification for the configured timeout.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::models::{Notification, StreamConfiguration};

// Selection weights, not configurable; they sum to 100.
const WEIGHT_FACE_SIZE: f64 = 50.0;
const WEIGHT_YAW_ANGLE: f64 = 20.0;
const WEIGHT_PITCH_ANGLE: f64 = 10.0;
const WEIGHT_ROLL_ANGLE: f64 = 10.0;
const WEIGHT_SHARPNESS: f64 = 5.0;
const WEIGHT_BRIGHTNESS: f64 = 5.0;

#[derive(Debug)]
struct TrackletWindow {
    notifications: Vec<Notification>,
    mapping: StreamConfiguration,
    last_seen: Instant,
}

/// A flushed window: the selected notification plus bookkeeping.
#[derive(Debug)]
pub struct FlushedTracklet {
    pub tracklet_id: String,
    pub selected: Notification,
    pub mapping: StreamConfiguration,
    pub buffered: usize,
}

/// Per-tracklet buffering with best-frame selection on expiry.
pub struct TrackletAggregator {
    timeout: Duration,
    windows: Mutex<HashMap<String, TrackletWindow>>,
}

impl TrackletAggregator {
    /// `timeout` is the idle window: a tracklet flushes once no new
    /// notification arrives for this long.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Buffer a notification into its tracklet's window, creating the
    /// window on first sight. Appends refresh the idle deadline but never
    /// replace the window's rule set.
    pub fn enqueue(&self, notification: Notification, mapping: StreamConfiguration) {
        debug!(tracklet_id = %notification.tracklet_id, "Enqueue tracklet notification");

        let mut windows = self.windows.lock().expect("tracklet window lock poisoned");
        let now = Instant::now();

        match windows.get_mut(&notification.tracklet_id) {
            Some(window) => {
                window.notifications.push(notification);
                window.last_seen = now;
            }
            None => {
                windows.insert(
                    notification.tracklet_id.clone(),
                    TrackletWindow {
                        notifications: vec![notification],
                        mapping,
                        last_seen: now,
                    },
                );
            }
        }
    }

    /// Remove every window idle for longer than the timeout and return its
    /// selected notification. Selection runs after the window is detached,
    /// so no lock is held while callers act on the result.
    pub fn drain_expired(&self) -> Vec<FlushedTracklet> {
        let now = Instant::now();

        let expired: Vec<(String, TrackletWindow)> = {
            let mut windows = self.windows.lock().expect("tracklet window lock poisoned");
            let expired_keys: Vec<String> = windows
                .iter()
                .filter(|(_, w)| now.duration_since(w.last_seen) > self.timeout)
                .map(|(id, _)| id.clone())
                .collect();

            expired_keys
                .into_iter()
                .filter_map(|id| windows.remove(&id).map(|w| (id, w)))
                .collect()
        };

        expired
            .into_iter()
            .map(|(tracklet_id, window)| {
                info!(
                    tracklet_id = %tracklet_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    count = window.notifications.len(),
                    "Tracklet timed out"
                );

                let buffered = window.notifications.len();
                let best = select_best(&window.notifications);
                let mut notifications = window.notifications;
                FlushedTracklet {
                    tracklet_id,
                    selected: notifications.swap_remove(best),
                    mapping: window.mapping,
                    buffered,
                }
            })
            .collect()
    }

    /// Number of currently open windows.
    pub fn active_windows(&self) -> usize {
        self.windows
            .lock()
            .expect("tracklet window lock poisoned")
            .len()
    }
}

/// Index of the best-scored notification.
///
/// Each attribute is normalized against the window's maximum observed value
/// and weighted. Note that absolute angle deviation scores *higher*, not
/// lower. A zero maximum contributes zero instead of dividing. Ties keep
/// the first-seen notification.
fn select_best(notifications: &[Notification]) -> usize {
    let max_face_size = fold_max(notifications, |n| n.face_size.unwrap_or(0.0));
    let max_yaw = fold_max(notifications, |n| n.yaw_angle.unwrap_or(0.0).abs());
    let max_pitch = fold_max(notifications, |n| n.pitch_angle.unwrap_or(0.0).abs());
    let max_roll = fold_max(notifications, |n| n.roll_angle.unwrap_or(0.0).abs());
    let max_sharpness = fold_max(notifications, |n| n.sharpness.unwrap_or(0.0).abs());
    let max_brightness = fold_max(notifications, |n| n.brightness.unwrap_or(0.0).abs());

    let mut best_index = 0;
    let mut best_score = f64::MIN;

    for (index, n) in notifications.iter().enumerate() {
        let score = ratio(n.face_size.unwrap_or(0.0), max_face_size) * WEIGHT_FACE_SIZE
            + ratio(n.yaw_angle.unwrap_or(0.0).abs(), max_yaw) * WEIGHT_YAW_ANGLE
            + ratio(n.pitch_angle.unwrap_or(0.0).abs(), max_pitch) * WEIGHT_PITCH_ANGLE
            + ratio(n.roll_angle.unwrap_or(0.0).abs(), max_roll) * WEIGHT_ROLL_ANGLE
            + ratio(n.sharpness.unwrap_or(0.0).abs(), max_sharpness) * WEIGHT_SHARPNESS
            + ratio(n.brightness.unwrap_or(0.0).abs(), max_brightness) * WEIGHT_BRIGHTNESS;

        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    best_index
}

fn fold_max(notifications: &[Notification], f: impl Fn(&Notification) -> f64) -> f64 {
    notifications.iter().map(f).fold(0.0, f64::max)
}

/// Normalized contribution; a zero maximum contributes nothing.
fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}
