//! Global insight generator.
//!
//! Scans every measured video across all users, flags content-type cohorts
//! that beat the global average and promotes outlier videos to best practices.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::GlobalInsightSettings;
use crate::db::DbPool;
use crate::db::insights::{NewBestPractice, NewInsight};
use crate::error::AppResult;
use crate::models::{CONTENT_TYPE_CATEGORY, GenerationSummary};

/// Label for videos without a content type; never produces an insight.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Narrative attached to every promoted video.
pub const HIGH_PERFORMER_CONTENT: &str =
    "This video has significantly higher engagement than average. Analyze its hook and structure.";

/// Tolerance for the strictly-greater threshold comparisons.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Smallest cohort considered for a content-type insight.
const MIN_COHORT_SIZE: usize = 2;

/// A video with its latest engagement rate.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredVideo {
    pub id: Uuid,
    pub content_type: Option<String>,
    pub hook: Option<String>,
    pub engagement_rate: f64,
}

/// A content-type cohort that beat the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortInsight {
    pub subject: String,
    pub average: f64,
    pub lift_percent: f64,
    pub video_ids: Vec<Uuid>,
    pub text: String,
}

/// An outlier video worth promoting.
#[derive(Debug, Clone, PartialEq)]
pub struct Outlier {
    pub video_id: Uuid,
    pub title: String,
    pub engagement_rate: f64,
}

/// Result of one pass over the measured videos.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalAnalysis {
    pub global_avg: f64,
    pub cohorts: Vec<CohortInsight>,
    pub outliers: Vec<Outlier>,
}

/// `value > baseline * factor`, strictly, ignoring float representation noise.
pub fn exceeds(value: f64, baseline: f64, factor: f64) -> bool {
    value - baseline * factor > THRESHOLD_EPSILON
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Best-practice title: hook text, then content type, then "Video".
pub fn best_practice_title(hook: Option<&str>, content_type: Option<&str>) -> String {
    let subject = non_blank(hook)
        .or_else(|| non_blank(content_type))
        .unwrap_or("Video");
    format!("High Performing: {}", subject)
}

pub fn lift_sentence(subject: &str, lift_percent: f64) -> String {
    format!(
        "{} videos are outperforming the average by {:.0}%.",
        subject, lift_percent
    )
}

/// Compute cohort insights and outliers. `None` when there is nothing to scan.
pub fn analyze(
    videos: &[MeasuredVideo],
    settings: &GlobalInsightSettings,
) -> Option<GlobalAnalysis> {
    if videos.is_empty() {
        return None;
    }

    let global_avg = videos.iter().map(|v| v.engagement_rate).sum::<f64>() / videos.len() as f64;

    // Cohorts in first-seen order
    let mut cohorts: Vec<(String, Vec<&MeasuredVideo>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for video in videos {
        let label = non_blank(video.content_type.as_deref()).unwrap_or(UNCATEGORIZED);
        let slot = *index.entry(label.to_string()).or_insert_with(|| {
            cohorts.push((label.to_string(), Vec::new()));
            cohorts.len() - 1
        });
        cohorts[slot].1.push(video);
    }

    let mut insights = Vec::new();
    if global_avg > 0.0 {
        for (subject, members) in cohorts {
            if subject == UNCATEGORIZED || members.len() < MIN_COHORT_SIZE {
                continue;
            }

            let average =
                members.iter().map(|v| v.engagement_rate).sum::<f64>() / members.len() as f64;
            if !exceeds(average, global_avg, settings.lift_threshold) {
                continue;
            }

            let lift_percent = (average - global_avg) / global_avg * 100.0;
            insights.push(CohortInsight {
                text: lift_sentence(&subject, lift_percent),
                subject,
                average,
                lift_percent,
                video_ids: members.iter().map(|v| v.id).collect(),
            });
        }
    }

    let outliers = videos
        .iter()
        .filter(|v| {
            global_avg > 0.0 && exceeds(v.engagement_rate, global_avg, settings.outlier_threshold)
        })
        .map(|v| Outlier {
            video_id: v.id,
            title: best_practice_title(v.hook.as_deref(), v.content_type.as_deref()),
            engagement_rate: v.engagement_rate,
        })
        .collect();

    Some(GlobalAnalysis {
        global_avg,
        cohorts: insights,
        outliers,
    })
}

/// Run one global generation pass and persist its results.
///
/// Cohort insights are keyed by (category, content type, month), so repeated
/// runs within a month refresh the same row.
pub async fn generate_global_insights(
    pool: &DbPool,
    settings: &GlobalInsightSettings,
) -> AppResult<GenerationSummary> {
    let rows = pool.videos_with_latest_snapshot().await?;
    let videos: Vec<MeasuredVideo> = rows
        .into_iter()
        .map(|(video, snapshot)| MeasuredVideo {
            id: video.id,
            content_type: video.content_type,
            hook: video.hook,
            engagement_rate: snapshot.engagement_rate.unwrap_or(0.0),
        })
        .collect();

    let Some(analysis) = analyze(&videos, settings) else {
        info!("No videos with metrics found; skipping insight generation");
        return Ok(GenerationSummary::default());
    };

    info!(
        videos = videos.len(),
        "Global average engagement: {:.2}%", analysis.global_avg
    );

    let period = Utc::now().format("%Y-%m").to_string();
    for cohort in &analysis.cohorts {
        pool.upsert_insight(&NewInsight {
            category: CONTENT_TYPE_CATEGORY.to_string(),
            subject: cohort.subject.clone(),
            period: period.clone(),
            insight_text: cohort.text.clone(),
            confidence_score: settings.confidence,
            sample_size: i32::try_from(cohort.video_ids.len()).unwrap_or(i32::MAX),
            supporting_video_ids: cohort.video_ids.clone(),
        })
        .await?;
    }

    let mut best_practices_created = 0;
    for outlier in &analysis.outliers {
        if pool.best_practice_exists_for_video(outlier.video_id).await? {
            continue;
        }

        pool.insert_best_practice(&NewBestPractice {
            title: outlier.title.clone(),
            content: HIGH_PERFORMER_CONTENT.to_string(),
            video_id: outlier.video_id,
            performance_avg: outlier.engagement_rate,
        })
        .await?;
        best_practices_created += 1;
    }

    let summary = GenerationSummary {
        videos_considered: videos.len(),
        global_avg: analysis.global_avg,
        insights_generated: analysis.cohorts.len(),
        best_practices_found: analysis.outliers.len(),
        best_practices_created,
    };

    info!(
        insights = summary.insights_generated,
        outliers = summary.best_practices_found,
        created = summary.best_practices_created,
        "Global insight generation complete"
    );

    Ok(summary)
}
