//! Periodic background tasks: batch analysis, global insight generation and
//! stale `processing` recovery.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use super::batch::{batch_analyze, recover_stale_analyses};
use super::global_insights::generate_global_insights;
use super::provider::AnalysisProvider;
use crate::config::{BatchSettings, GlobalInsightSettings};
use crate::db::DbPool;

/// How often stuck `processing` videos are checked.
const STALE_CHECK_INTERVAL_SECS: u64 = 300;

/// Start the batch analysis task. An interval of zero disables it.
pub fn start_batch_task(
    pool: Arc<DbPool>,
    provider: Arc<dyn AnalysisProvider>,
    settings: BatchSettings,
) {
    if settings.interval_secs == 0 {
        info!("Scheduled batch analysis disabled");
        return;
    }

    tokio::spawn(async move {
        info!(
            "Starting batch analysis task (limit: {}, delay: {} ms, interval: {} seconds)",
            settings.limit, settings.delay_ms, settings.interval_secs
        );

        let mut ticker = interval(Duration::from_secs(settings.interval_secs));

        loop {
            ticker.tick().await;

            if let Err(e) = batch_analyze(
                &pool,
                provider.as_ref(),
                &settings,
                settings.limit,
                settings.delay_ms,
            )
            .await
            {
                error!("Batch analysis task error: {}", e);
            }
        }
    });
}

/// Start the global insight generation task. An interval of zero disables it.
pub fn start_insight_task(pool: Arc<DbPool>, settings: GlobalInsightSettings) {
    if settings.interval_secs == 0 {
        info!("Scheduled global insight generation disabled");
        return;
    }

    tokio::spawn(async move {
        info!(
            "Starting global insight task (lift: {}, outlier: {}, interval: {} seconds)",
            settings.lift_threshold, settings.outlier_threshold, settings.interval_secs
        );

        let mut ticker = interval(Duration::from_secs(settings.interval_secs));

        loop {
            ticker.tick().await;

            if let Err(e) = generate_global_insights(&pool, &settings).await {
                error!("Global insight task error: {}", e);
            }
        }
    });
}

/// Start the stale `processing` recovery task.
pub fn start_stale_recovery_task(pool: Arc<DbPool>, settings: BatchSettings) {
    tokio::spawn(async move {
        info!(
            "Starting stale analysis recovery (threshold: {} minutes, interval: {} seconds)",
            settings.stale_processing_minutes, STALE_CHECK_INTERVAL_SECS
        );

        let mut ticker = interval(Duration::from_secs(STALE_CHECK_INTERVAL_SECS));

        loop {
            ticker.tick().await;

            if let Err(e) = recover_stale_analyses(&pool, &settings).await {
                error!("Stale analysis recovery error: {}", e);
            }
        }
    });
}
