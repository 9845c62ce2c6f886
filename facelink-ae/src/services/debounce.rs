//! Debounce gate
//!
//! Suppresses repeat processing of a notification within three
//! independently configured windows: per tracklet, per stream, and per
//! stream group. All scopes share one `ExpiringCache`; a decision checks
//! and stamps every configured scope under a single lock acquisition, so
//! concurrent notifications racing on the same keys observe a consistent
//! cache state.

use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::models::{Notification, StreamConfiguration};
use crate::services::cache::ExpiringCache;

/// Scoped debounce gate over a shared expiring cache.
pub struct DebounceService {
    cache: Mutex<ExpiringCache>,
}

impl DebounceService {
    /// `hard_absolute_expiration` bounds every entry's lifetime; see
    /// `ExpiringCache` for the window-capping consequence.
    pub fn new(hard_absolute_expiration: Duration) -> Self {
        Self {
            cache: Mutex::new(ExpiringCache::new(hard_absolute_expiration)),
        }
    }

    /// One debounce decision: if any configured scope is still inside its
    /// window, the notification is rejected; otherwise every configured
    /// scope is stamped and the notification may proceed. Check and stamp
    /// happen under the same lock.
    pub fn try_acquire(&self, notification: &Notification, mapping: &StreamConfiguration) -> bool {
        let mut cache = self.cache.lock().expect("debounce cache lock poisoned");

        if Self::blocked_scope(&mut cache, notification, mapping).is_some() {
            return false;
        }

        Self::stamp_scopes(&mut cache, notification, mapping);
        true
    }

    /// True iff any configured scope is currently blocking. Does not stamp.
    pub fn is_blocked(&self, notification: &Notification, mapping: &StreamConfiguration) -> bool {
        let mut cache = self.cache.lock().expect("debounce cache lock poisoned");
        Self::blocked_scope(&mut cache, notification, mapping).is_some()
    }

    /// Stamp every configured scope without checking.
    pub fn block(&self, notification: &Notification, mapping: &StreamConfiguration) {
        let mut cache = self.cache.lock().expect("debounce cache lock poisoned");
        Self::stamp_scopes(&mut cache, notification, mapping);
    }

    /// Evict hard-expired entries; called from the periodic sweep tick.
    pub fn sweep(&self) {
        self.cache
            .lock()
            .expect("debounce cache lock poisoned")
            .sweep();
    }

    fn blocked_scope(
        cache: &mut ExpiringCache,
        notification: &Notification,
        mapping: &StreamConfiguration,
    ) -> Option<&'static str> {
        if let Some(window) = configured_window(mapping.tracklet_debounce_ms) {
            if cache.is_blocked(&notification.tracklet_id, window) {
                info!(
                    tracklet_id = %notification.tracklet_id,
                    window_ms = window.as_millis() as u64,
                    "Tracklet blocked"
                );
                return Some("tracklet");
            }
        }

        if let Some(window) = configured_window(mapping.stream_debounce_ms) {
            if cache.is_blocked(&notification.stream_id, window) {
                info!(
                    stream_id = %notification.stream_id,
                    window_ms = window.as_millis() as u64,
                    "Stream blocked"
                );
                return Some("stream");
            }
        }

        if let (Some(window), Some(group_id)) = (
            configured_window(mapping.group_debounce_ms),
            mapping.stream_group_id.as_deref(),
        ) {
            if cache.is_blocked(group_id, window) {
                info!(
                    stream_group_id = %group_id,
                    window_ms = window.as_millis() as u64,
                    "Stream group blocked"
                );
                return Some("group");
            }
        }

        None
    }

    fn stamp_scopes(
        cache: &mut ExpiringCache,
        notification: &Notification,
        mapping: &StreamConfiguration,
    ) {
        if configured_window(mapping.tracklet_debounce_ms).is_some() {
            cache.insert(&notification.tracklet_id);
        }
        if configured_window(mapping.stream_debounce_ms).is_some() {
            cache.insert(&notification.stream_id);
        }
        if let (Some(_), Some(group_id)) = (
            configured_window(mapping.group_debounce_ms),
            mapping.stream_group_id.as_deref(),
        ) {
            cache.insert(group_id);
        }
        debug!(
            tracklet_id = %notification.tracklet_id,
            stream_id = %notification.stream_id,
            "Debounce scopes stamped"
        );
    }
}

/// A window is configured when it is present and greater than zero.
fn configured_window(window_ms: Option<u64>) -> Option<Duration> {
    window_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
