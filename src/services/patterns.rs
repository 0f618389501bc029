//! Per-user pattern insight engine: gates, aggregation, and the insight cache.

use chrono::{Duration, Utc};
use tracing::{debug, info};

use super::aggregator::aggregate;
use super::normalizer::{AnalysisRecord, normalize};
use crate::config::InsightSettings;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    CachedPatternInsights, InsufficientData, PatternInsight, PatternOutcome, PatternReport,
};

/// Full result of a successful evaluation, before truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Every emitted insight, ranked.
    pub insights: Vec<PatternInsight>,
    /// Records with a positive engagement rate.
    pub usable_records: usize,
}

impl Evaluation {
    /// Response carrying the top `top_n` insights.
    pub fn into_report(self, top_n: usize) -> PatternReport {
        let insights_generated = self.insights.len();
        PatternReport {
            success: true,
            insights: self.insights.into_iter().take(top_n).collect(),
            total_videos_analyzed: self.usable_records,
            insights_generated,
        }
    }
}

/// Apply both data gates, then normalize and aggregate.
pub fn evaluate(
    records: &[AnalysisRecord],
    settings: &InsightSettings,
) -> Result<Evaluation, InsufficientData> {
    if records.len() < settings.min_library_size {
        return Err(InsufficientData::library(
            settings.min_library_size,
            records.len(),
        ));
    }

    let normalized = normalize(records);
    if normalized.len() < settings.min_usable_records {
        return Err(InsufficientData::performance(
            settings.usable_threshold_reported,
            normalized.len(),
        ));
    }

    Ok(Evaluation {
        insights: aggregate(&normalized),
        usable_records: normalized.len(),
    })
}

/// Compute a user's pattern insights and refresh their cached snapshot.
///
/// The full insight list is cached with an expiry reset to `now + cache_days`;
/// the response carries only the top insights.
pub async fn compute_user_patterns(
    pool: &DbPool,
    settings: &InsightSettings,
    user_id: &str,
) -> AppResult<PatternOutcome> {
    let rows = pool.user_analyses_with_latest_snapshot(user_id).await?;
    let records: Vec<AnalysisRecord> = rows
        .iter()
        .map(|(analysis, snapshot)| AnalysisRecord::from_models(analysis, snapshot.as_ref()))
        .collect();

    let evaluation = match evaluate(&records, settings) {
        Ok(evaluation) => evaluation,
        Err(insufficient) => {
            debug!(
                user_id,
                threshold = insufficient.threshold,
                current = insufficient.current,
                "Not enough data for pattern insights"
            );
            return Ok(PatternOutcome::InsufficientData(insufficient));
        }
    };

    let now = Utc::now();
    let expires_at = now + Duration::days(settings.cache_days);
    let insights_json = serde_json::to_value(&evaluation.insights)
        .map_err(|e| AppError::Database(format!("Failed to encode insights: {}", e)))?;
    let video_count = i32::try_from(evaluation.usable_records).unwrap_or(i32::MAX);

    pool.put_user_pattern_insights(user_id, insights_json, video_count, now, expires_at)
        .await?;

    info!(
        user_id,
        analyses = records.len(),
        usable = evaluation.usable_records,
        insights = evaluation.insights.len(),
        "Pattern insights computed"
    );

    Ok(PatternOutcome::Report(
        evaluation.into_report(settings.top_insights),
    ))
}

/// The user's cached snapshot if it has not expired.
pub async fn cached_user_patterns(
    pool: &DbPool,
    user_id: &str,
) -> AppResult<Option<CachedPatternInsights>> {
    let Some(model) = pool.get_user_pattern_insights(user_id, Utc::now()).await? else {
        return Ok(None);
    };

    let cached = CachedPatternInsights::try_from(model)
        .map_err(|e| AppError::Database(format!("Corrupt cached insights: {}", e)))?;

    Ok(Some(cached))
}
