//! Watchlist enrollment client
//!
//! Registers the selected notification's crop as a new watchlist member via
//! the recognition platform's REST API, optionally preceded by a similarity
//! search that suppresses likely duplicates. Each enrollment attempt is
//! best-effort, once: a failed remote call is logged with the raw response
//! body and surfaced to the caller's per-item boundary; there is no retry.

use facelink_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Settings;
use crate::models::{base64_bytes, Notification, StreamConfiguration};

const REGISTER_PATH: &str = "api/v1/WatchlistMembers/Register";
const SEARCH_PATH: &str = "api/v1/Watchlists/Search";

/// Face detector constraints sent with registration and search requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetectorConfig {
    pub max_faces: u32,
    pub min_face_size: u32,
    pub max_face_size: u32,
    pub confidence_threshold: u32,
}

/// Binary image payload carried as base64 in JSON bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWatchlistMemberRequest {
    pub id: String,
    pub full_name: String,
    pub display_name: String,
    pub watchlist_ids: Vec<String>,
    pub keep_auto_learn_photos: bool,
    pub face_detector_config: FaceDetectorConfig,
    pub images: Vec<ImageData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInWatchlistRequest {
    pub watchlist_ids: Vec<String>,
    pub face_detector_config: FaceDetectorConfig,
    pub threshold: i64,
    pub image: ImageData,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultGroup {
    #[serde(default)]
    pub match_results: Vec<MatchResult>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub watchlist_member_id: Option<String>,
    pub score: Option<f64>,
}

/// REST client for member registration and duplicate search.
pub struct EnrollmentClient {
    http_client: reqwest::Client,
    base_url: String,
    detector: FaceDetectorConfig,
    duplicate_search_threshold: Option<i64>,
    debug_output_folder: Option<PathBuf>,
}

impl EnrollmentClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.target.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.target.base_url.trim_end_matches('/').to_string(),
            detector: FaceDetectorConfig {
                max_faces: settings.config.register_max_faces(),
                min_face_size: settings.config.register_min_face_size(),
                max_face_size: settings.config.register_max_face_size(),
                confidence_threshold: settings.config.register_face_confidence(),
            },
            duplicate_search_threshold: settings.config.duplicate_search_threshold,
            debug_output_folder: settings.config.debug_output_folder.clone(),
        })
    }

    /// Enroll a notification: duplicate search first (when configured),
    /// then registration. A duplicate match skips registration silently.
    pub async fn enroll(
        &self,
        notification: &Notification,
        mapping: &StreamConfiguration,
    ) -> Result<()> {
        if let Some(threshold) = self.duplicate_search_threshold.filter(|t| *t > 0) {
            if self.check_duplicate(notification, mapping, threshold).await? {
                info!(
                    tracklet_id = %notification.tracklet_id,
                    "Face is possible duplicate, skipping enrollment"
                );
                return Ok(());
            }
        }

        self.register(notification, mapping).await
    }

    /// Register a new watchlist member with a freshly generated id.
    pub async fn register(
        &self,
        notification: &Notification,
        mapping: &StreamConfiguration,
    ) -> Result<()> {
        info!(watchlists = ?mapping.watchlist_ids, "Enrolling new member to watchlist");

        if mapping.watchlist_ids.is_empty() {
            info!("No target watchlist id, skipped");
            return Ok(());
        }

        let member_id = Uuid::new_v4();

        let request = RegisterWatchlistMemberRequest {
            id: member_id.to_string(),
            full_name: member_id.to_string(),
            display_name: member_id.to_string(),
            watchlist_ids: mapping.watchlist_ids.clone(),
            keep_auto_learn_photos: mapping.keep_auto_learn.unwrap_or(false),
            face_detector_config: self.detector,
            images: vec![ImageData {
                data: notification.crop_image.clone(),
            }],
        };

        if let Some(folder) = &self.debug_output_folder {
            let path = folder.join(format!("{member_id}.jpg"));
            tokio::fs::write(&path, &notification.crop_image).await?;
        }

        let url = format!("{}/{}", self.base_url, REGISTER_PATH);
        let response = self.http_client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Register failed");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!(member_id = %member_id, "Successfully enrolled watchlist member");
        Ok(())
    }

    /// Search the target watchlists for a face similar to the crop.
    /// Returns true iff any match result comes back above the threshold.
    pub async fn check_duplicate(
        &self,
        notification: &Notification,
        mapping: &StreamConfiguration,
        threshold: i64,
    ) -> Result<bool> {
        info!(watchlists = ?mapping.watchlist_ids, "Searching for duplicate in watchlist");

        let request = SearchInWatchlistRequest {
            watchlist_ids: mapping.watchlist_ids.clone(),
            face_detector_config: self.detector,
            threshold,
            image: ImageData {
                data: notification.crop_image.clone(),
            },
        };

        let url = format!("{}/{}", self.base_url, SEARCH_PATH);
        let response = self.http_client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Duplicate search failed");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let groups: Vec<SearchResultGroup> = response.json().await?;
        Ok(groups.iter().any(|group| !group.match_results.is_empty()))
    }
}
