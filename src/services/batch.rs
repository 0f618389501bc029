//! Batch analysis of pending videos and recovery of stuck `processing` rows.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use super::ingestion::analyze_video;
use super::provider::AnalysisProvider;
use crate::config::BatchSettings;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::BatchAnalysisSummary;

/// Process `items` strictly in order, sleeping `delay` between items.
///
/// A failed item is counted and the loop moves on.
pub async fn run_sequential<T, F, Fut>(
    items: Vec<T>,
    delay: Duration,
    mut process: F,
) -> BatchAnalysisSummary
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let mut summary = BatchAnalysisSummary::default();
    let total = items.len();

    for (index, item) in items.into_iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        summary.processed += 1;
        match process(item).await {
            Ok(()) => summary.successful += 1,
            Err(e) => {
                summary.failed += 1;
                warn!(item = index + 1, total, "Batch item failed: {}", e);
            }
        }
    }

    summary
}

/// Analyze up to `limit` pending videos, highest priority first.
///
/// Pending videos are always re-analyzed, even if an older analysis exists.
pub async fn batch_analyze(
    pool: &DbPool,
    provider: &dyn AnalysisProvider,
    settings: &BatchSettings,
    limit: u64,
    delay_ms: u64,
) -> AppResult<BatchAnalysisSummary> {
    let videos = pool.pending_videos_for_batch(limit).await?;
    if videos.is_empty() {
        info!("No pending videos to analyze");
        return Ok(BatchAnalysisSummary::default());
    }

    info!(count = videos.len(), delay_ms, "Starting batch analysis");

    let review_threshold = settings.review_confidence;
    let summary = run_sequential(
        videos,
        Duration::from_millis(delay_ms),
        move |video| async move {
            analyze_video(pool, provider, review_threshold, &video, true)
                .await
                .map(|_| ())
        },
    )
    .await;

    info!(
        processed = summary.processed,
        successful = summary.successful,
        failed = summary.failed,
        "Batch analysis complete"
    );

    Ok(summary)
}

/// Reset videos stuck in `processing` for longer than the configured window.
pub async fn recover_stale_analyses(pool: &DbPool, settings: &BatchSettings) -> AppResult<u64> {
    let cutoff = Utc::now() - chrono::Duration::minutes(settings.stale_processing_minutes);
    let reset = pool.reset_stale_processing(cutoff).await?;

    if reset > 0 {
        warn!(
            reset,
            minutes = settings.stale_processing_minutes,
            "Requeued videos stuck in processing"
        );
    }

    Ok(reset)
}
