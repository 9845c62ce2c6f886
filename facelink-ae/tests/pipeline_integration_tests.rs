//! End-to-end pipeline tests: dispatcher → validation → debounce →
//! tracklet window → enrollment against a mock platform API.
//!
//! These run in real time with short windows; waits leave generous margins.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use facelink_ae::config::Settings;
use facelink_ae::models::{CropCoordinates, FrameInformation, Notification};
use facelink_ae::services::{
    DebounceService, EnrollmentClient, PipelineContext, PipelineDispatcher, StreamConfigResolver,
    TrackletAggregator,
};
use helpers::{spawn_mock_api, RecordingApi};

const STREAM_ID: &str = "0bb8f3e0-4b14-4af8-9e09-11b6a9687e55";
const SWEEP_INTERVAL: Duration = Duration::from_millis(50);

/// Window long enough for same-tracklet notifications to land inside it,
/// short enough for the test to wait it out.
const TRACKLET_TIMEOUT_MS: u64 = 300;

struct Pipeline {
    dispatcher: Arc<PipelineDispatcher>,
    debounce: Arc<DebounceService>,
    resolver: StreamConfigResolver,
}

/// Assemble a dispatcher over the mock API from a settings document.
async fn start_pipeline(doc: &str, base_url: String) -> Pipeline {
    let mut settings = Settings::parse(doc).unwrap();
    settings.target.base_url = base_url;
    let settings = Arc::new(settings);

    let debounce = Arc::new(DebounceService::new(Duration::from_millis(
        settings.config.hard_absolute_expiration_ms(),
    )));
    let resolver = StreamConfigResolver::new(Arc::clone(&settings));

    let context = PipelineContext {
        resolver: StreamConfigResolver::new(Arc::clone(&settings)),
        debounce: Arc::clone(&debounce),
        aggregator: Arc::new(TrackletAggregator::new(Duration::from_millis(
            settings.config.tracklet_timeout_ms(),
        ))),
        enrollment: Arc::new(EnrollmentClient::new(&settings).unwrap()),
        enroll_strategy: settings.config.enroll_strategy,
    };

    Pipeline {
        dispatcher: PipelineDispatcher::start(
            context,
            settings.config.max_parallel_blocks(),
            SWEEP_INTERVAL,
        ),
        debounce,
        resolver,
    }
}

fn good_notification(tracklet: &str, face_size: f64, crop: &[u8]) -> Notification {
    let mut n = Notification::new(STREAM_ID, tracklet);
    n.face_quality = Some(2500.0);
    n.face_size = Some(face_size);
    n.crop_image = crop.to_vec();
    n.frame_information = Some(FrameInformation {
        width: 1920,
        height: 1080,
    });
    n.crop_coordinates = Some(CropCoordinates {
        crop_left_top_x: 400.0,
        crop_left_top_y: 300.0,
        crop_right_top_x: 700.0,
        crop_right_top_y: 300.0,
        crop_left_bottom_x: 400.0,
        crop_left_bottom_y: 600.0,
        crop_right_bottom_x: 700.0,
        crop_right_bottom_y: 600.0,
    });
    n
}

fn base_doc() -> String {
    format!(
        r#"
        [config]
        tracklet_timeout_ms = {TRACKLET_TIMEOUT_MS}

        [[stream_configurations]]
        stream_id = "{STREAM_ID}"
        watchlist_ids = ["wl-entrance"]
        frame_padding_absolute = 50
        tracklet_debounce_ms = 0
    "#
    )
}

async fn wait_for_flush() {
    tokio::time::sleep(Duration::from_millis(TRACKLET_TIMEOUT_MS + 500)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_notification_enrolls_once_after_window() {
    let api = RecordingApi::new();
    let base_url = spawn_mock_api(api.clone()).await;
    let pipeline = start_pipeline(&base_doc(), base_url).await;

    pipeline
        .dispatcher
        .submit(good_notification("T1", 300.0, &[0xAA]))
        .await;

    // Inside the window: buffered, not yet enrolled
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.registration_count(), 0);

    wait_for_flush().await;
    assert_eq!(api.registration_count(), 1);

    let registrations = api.registrations.lock().unwrap();
    assert_eq!(registrations[0].watchlist_ids, vec!["wl-entrance"]);
    assert_eq!(registrations[0].images[0].data, vec![0xAA]);

    drop(registrations);
    pipeline.dispatcher.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_best_of_tracklet_selects_largest_face() {
    let api = RecordingApi::new();
    let base_url = spawn_mock_api(api.clone()).await;
    let pipeline = start_pipeline(&base_doc(), base_url).await;

    // tracklet_debounce_ms = 0 lets all three into the window
    pipeline
        .dispatcher
        .submit(good_notification("T1", 100.0, &[1]))
        .await;
    pipeline
        .dispatcher
        .submit(good_notification("T1", 200.0, &[2]))
        .await;
    pipeline
        .dispatcher
        .submit(good_notification("T1", 50.0, &[3]))
        .await;

    wait_for_flush().await;

    let registrations = api.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].images[0].data, vec![2]);

    drop(registrations);
    pipeline.dispatcher.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_notification_writes_nothing() {
    let api = RecordingApi::new();
    let base_url = spawn_mock_api(api.clone()).await;

    // A real debounce window, so a cache write would be observable
    let doc = format!(
        r#"
        [config]
        tracklet_timeout_ms = {TRACKLET_TIMEOUT_MS}

        [[stream_configurations]]
        stream_id = "{STREAM_ID}"
        watchlist_ids = ["wl-entrance"]
        tracklet_debounce_ms = 5000
    "#
    );
    let pipeline = start_pipeline(&doc, base_url).await;

    // Below the built-in face quality default of 2000
    let mut n = good_notification("T2", 300.0, &[0xBB]);
    n.face_quality = Some(1000.0);
    pipeline.dispatcher.submit(n.clone()).await;

    wait_for_flush().await;
    assert_eq!(api.registration_count(), 0);

    // No cache write happened for the rejected notification
    let mapping = pipeline.resolver.resolve(STREAM_ID).unwrap().remove(0);
    assert!(!pipeline.debounce.is_blocked(&n, &mapping));

    pipeline.dispatcher.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_crop_outside_padded_frame_is_rejected() {
    let api = RecordingApi::new();
    let base_url = spawn_mock_api(api.clone()).await;
    let pipeline = start_pipeline(&base_doc(), base_url).await;

    // Left edge inside the 50px padding border
    let mut n = good_notification("T3", 300.0, &[0xCC]);
    if let Some(crop) = n.crop_coordinates.as_mut() {
        crop.crop_left_top_x = 10.0;
        crop.crop_left_bottom_x = 10.0;
    }
    pipeline.dispatcher.submit(n).await;

    wait_for_flush().await;
    assert_eq!(api.registration_count(), 0);

    pipeline.dispatcher.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tracklet_debounce_drops_repeats_inside_window() {
    let api = RecordingApi::new();
    let base_url = spawn_mock_api(api.clone()).await;

    let doc = format!(
        r#"
        [config]
        tracklet_timeout_ms = {TRACKLET_TIMEOUT_MS}

        [[stream_configurations]]
        stream_id = "{STREAM_ID}"
        watchlist_ids = ["wl-entrance"]
        tracklet_debounce_ms = 5000
    "#
    );
    let pipeline = start_pipeline(&doc, base_url).await;

    pipeline
        .dispatcher
        .submit(good_notification("T1", 100.0, &[1]))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    // Same tracklet 50ms later: blocked, never buffered
    pipeline
        .dispatcher
        .submit(good_notification("T1", 900.0, &[2]))
        .await;

    wait_for_flush().await;

    let registrations = api.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].images[0].data, vec![1]);

    drop(registrations);
    pipeline.dispatcher.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_passing_criteria_enrolls_without_window() {
    let api = RecordingApi::new();
    let base_url = spawn_mock_api(api.clone()).await;

    let doc = format!(
        r#"
        [config]
        enroll_strategy = "first-passing-criteria"

        [[stream_configurations]]
        stream_id = "{STREAM_ID}"
        watchlist_ids = ["wl-entrance"]
    "#
    );
    let pipeline = start_pipeline(&doc, base_url).await;

    pipeline
        .dispatcher
        .submit(good_notification("T1", 300.0, &[0xDD]))
        .await;

    // Well under any tracklet window
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(api.registration_count(), 1);

    pipeline.dispatcher.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_register_failure_does_not_stop_the_pool() {
    let api = RecordingApi::new();
    *api.register_status.lock().unwrap() = 500;
    let base_url = spawn_mock_api(api.clone()).await;
    let pipeline = start_pipeline(&base_doc(), base_url).await;

    pipeline
        .dispatcher
        .submit(good_notification("T1", 300.0, &[1]))
        .await;
    wait_for_flush().await;
    assert_eq!(api.registration_count(), 1);

    // Endpoint recovers; a later tracklet still gets processed
    *api.register_status.lock().unwrap() = 200;
    pipeline
        .dispatcher
        .submit(good_notification("T2", 300.0, &[2]))
        .await;
    wait_for_flush().await;
    assert_eq!(api.registration_count(), 2);

    pipeline.dispatcher.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unconfigured_stream_is_skipped_silently() {
    let api = RecordingApi::new();
    let base_url = spawn_mock_api(api.clone()).await;
    let pipeline = start_pipeline(&base_doc(), base_url).await;

    let mut n = good_notification("T1", 300.0, &[1]);
    n.stream_id = "7e6ca1bb-43ad-43a4-8112-ad44dcbcb0d1".to_string();
    pipeline.dispatcher.submit(n).await;

    wait_for_flush().await;
    assert_eq!(api.registration_count(), 0);

    pipeline.dispatcher.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_drains_and_rejects_later_submissions() {
    let api = RecordingApi::new();
    let base_url = spawn_mock_api(api.clone()).await;

    let doc = format!(
        r#"
        [config]
        enroll_strategy = "first-passing-criteria"

        [[stream_configurations]]
        stream_id = "{STREAM_ID}"
        watchlist_ids = ["wl-entrance"]
    "#
    );
    let pipeline = start_pipeline(&doc, base_url).await;

    pipeline
        .dispatcher
        .submit(good_notification("T1", 300.0, &[1]))
        .await;
    pipeline.dispatcher.stop().await;

    // The queued item was drained before stop returned
    assert_eq!(api.registration_count(), 1);

    // Submissions after stop are dropped without panicking
    pipeline
        .dispatcher
        .submit(good_notification("T9", 300.0, &[9]))
        .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(api.registration_count(), 1);
}
