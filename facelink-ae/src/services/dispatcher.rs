//! Pipeline dispatcher
//!
//! Owns the notification queue and the worker pool. Each inbound
//! notification is handled by one worker: resolve the stream's rule sets,
//! validate attributes and geometry, pass the debounce gate, then either
//! enroll immediately or buffer into the tracklet aggregator depending on
//! the enroll strategy. A failure while handling one notification is logged
//! and never stops the pool.
//!
//! An independent periodic tick sweeps the debounce cache and flushes
//! expired tracklet windows into enrollment. The tick stops when the
//! dispatcher stops; `stop()` drains queued and in-flight work with a grace
//! period before aborting stragglers.

use facelink_common::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::EnrollStrategy;
use crate::models::Notification;
use crate::services::debounce::DebounceService;
use crate::services::enrollment::EnrollmentClient;
use crate::services::stream_config::StreamConfigResolver;
use crate::services::tracklet::TrackletAggregator;
use crate::services::{geometry, validation};

/// How long `stop()` waits for queued and in-flight work before aborting.
const STOP_GRACE: Duration = Duration::from_secs(10);

/// Everything a worker needs to handle one notification.
pub struct PipelineContext {
    pub resolver: StreamConfigResolver,
    pub debounce: Arc<DebounceService>,
    pub aggregator: Arc<TrackletAggregator>,
    pub enrollment: Arc<EnrollmentClient>,
    pub enroll_strategy: EnrollStrategy,
}

/// Bounded-concurrency notification pipeline with lifecycle control.
pub struct PipelineDispatcher {
    tx: Mutex<Option<mpsc::UnboundedSender<Notification>>>,
    cancel: CancellationToken,
    worker_loop: Mutex<Option<JoinHandle<()>>>,
    sweep_loop: Mutex<Option<JoinHandle<()>>>,
}

impl PipelineDispatcher {
    /// Start the worker loop (bounded to `max_parallel` in-flight items)
    /// and the periodic sweep tick.
    pub fn start(
        context: PipelineContext,
        max_parallel: usize,
        sweep_interval: Duration,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let context = Arc::new(context);

        let worker_loop = tokio::spawn(run_worker_loop(Arc::clone(&context), rx, max_parallel));
        let sweep_loop = tokio::spawn(run_sweep_loop(
            Arc::clone(&context),
            cancel.clone(),
            sweep_interval,
        ));

        info!(max_parallel, "Pipeline dispatcher started");

        Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            cancel,
            worker_loop: Mutex::new(Some(worker_loop)),
            sweep_loop: Mutex::new(Some(sweep_loop)),
        })
    }

    /// Non-blocking enqueue. Notifications submitted after `stop()` are
    /// dropped with a warning.
    pub async fn submit(&self, notification: Notification) {
        debug!(
            stream_id = %notification.stream_id,
            tracklet_id = %notification.tracklet_id,
            "Notification submitted"
        );

        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => {
                if tx.send(notification).is_err() {
                    warn!("Worker loop is gone, notification dropped");
                }
            }
            None => warn!("Dispatcher is stopped, notification dropped"),
        }
    }

    /// Graceful shutdown: stop accepting, drain queued and in-flight work
    /// within a grace period, stop the sweep tick.
    pub async fn stop(&self) {
        info!("Pipeline dispatcher stopping");

        // Closing the channel ends the worker loop once drained
        self.tx.lock().await.take();
        self.cancel.cancel();

        if let Some(handle) = self.worker_loop.lock().await.take() {
            let abort = handle.abort_handle();
            match tokio::time::timeout(STOP_GRACE, handle).await {
                Ok(_) => {}
                Err(_) => {
                    warn!("Worker loop did not drain within grace period, aborting");
                    abort.abort();
                }
            }
        }

        if let Some(handle) = self.sweep_loop.lock().await.take() {
            let _ = handle.await;
        }

        info!("Pipeline dispatcher stopped");
    }
}

/// Receive loop: one task per notification, bounded by a semaphore.
async fn run_worker_loop(
    context: Arc<PipelineContext>,
    mut rx: mpsc::UnboundedReceiver<Notification>,
    max_parallel: usize,
) {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(notification) = maybe else { break };

                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };

                let context = Arc::clone(&context);
                tasks.spawn(async move {
                    let _permit = permit;
                    // Per-item error boundary: one bad notification never
                    // stops the pool
                    if let Err(e) = process_notification(&context, notification).await {
                        error!(error = %e, "Failed to process notification");
                    }
                });
            }
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    // Channel closed: drain in-flight work
    while tasks.join_next().await.is_some() {}
}

/// Periodic tick: evict hard-expired debounce entries and flush expired
/// tracklet windows into enrollment. Enrollment I/O happens after the
/// window table lock is released (`drain_expired` detaches first).
async fn run_sweep_loop(
    context: Arc<PipelineContext>,
    cancel: CancellationToken,
    sweep_interval: Duration,
) {
    let mut tick = tokio::time::interval(sweep_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {
                context.debounce.sweep();

                for flushed in context.aggregator.drain_expired() {
                    if let Err(e) = context
                        .enrollment
                        .enroll(&flushed.selected, &flushed.mapping)
                        .await
                    {
                        error!(
                            tracklet_id = %flushed.tracklet_id,
                            error = %e,
                            "Enrollment failed"
                        );
                    }
                }
            }
        }
    }
}

/// Handle one notification through resolution, validation, debouncing and
/// the configured enrollment path.
async fn process_notification(
    context: &PipelineContext,
    notification: Notification,
) -> Result<()> {
    let mappings = context.resolver.resolve(&notification.stream_id)?;

    debug!(
        count = mappings.len(),
        stream_id = %notification.stream_id,
        "Resolved stream configurations"
    );

    for mapping in mappings {
        let report = validation::evaluate(&notification, &mapping);
        if !report.passed() {
            debug!(
                tracklet_id = %notification.tracklet_id,
                failed = ?report.failures(),
                "Attribute validation rejected notification"
            );
            continue;
        }

        if !geometry::validate(&notification, &mapping) {
            debug!(
                tracklet_id = %notification.tracklet_id,
                "Crop geometry rejected notification"
            );
            continue;
        }

        if !context.debounce.try_acquire(&notification, &mapping) {
            return Ok(());
        }

        match context.enroll_strategy {
            EnrollStrategy::FirstPassingCriteria => {
                context.enrollment.enroll(&notification, &mapping).await?;
            }
            EnrollStrategy::BestOfTracklet => {
                context.aggregator.enqueue(notification.clone(), mapping);
            }
        }
    }

    Ok(())
}
