//! System-wide insight and best-practice models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{best_practice, insight};

/// Category of insights produced from content-type cohorts.
pub const CONTENT_TYPE_CATEGORY: &str = "content_type";

/// Practice type for promoted outlier videos.
pub const HIGH_PERFORMER_PRACTICE: &str = "high_performer";

/// Lifecycle of a global insight or best practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightStatus {
    Active,
    Archived,
}

impl InsightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

fn uuid_list(value: serde_json::Value) -> Vec<Uuid> {
    serde_json::from_value(value).unwrap_or_default()
}

/// Global insight as exposed by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Insight {
    pub id: Uuid,
    pub category: String,
    /// Cohort the insight is about (e.g. the content type label).
    pub subject: String,
    /// Calendar month the insight was computed for (`YYYY-MM`).
    pub period: String,
    pub insight_text: String,
    pub confidence_score: f64,
    pub sample_size: i32,
    pub supporting_video_ids: Vec<Uuid>,
    pub status: InsightStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<insight::Model> for Insight {
    fn from(m: insight::Model) -> Self {
        Self {
            id: m.id,
            category: m.category,
            subject: m.subject,
            period: m.period,
            insight_text: m.insight_text,
            confidence_score: m.confidence_score,
            sample_size: m.sample_size,
            supporting_video_ids: uuid_list(m.supporting_video_ids),
            status: InsightStatus::parse(&m.status).unwrap_or(InsightStatus::Active),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Best-practice exemplar as exposed by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BestPractice {
    pub id: Uuid,
    pub practice_type: String,
    pub title: String,
    pub content: String,
    pub example_video_ids: Vec<Uuid>,
    pub performance_avg: Option<f64>,
    pub use_count: i32,
    pub status: InsightStatus,
    pub created_at: DateTime<Utc>,
}

impl From<best_practice::Model> for BestPractice {
    fn from(m: best_practice::Model) -> Self {
        Self {
            id: m.id,
            practice_type: m.practice_type,
            title: m.title,
            content: m.content,
            example_video_ids: uuid_list(m.example_video_ids),
            performance_avg: m.performance_avg,
            use_count: m.use_count,
            status: InsightStatus::parse(&m.status).unwrap_or(InsightStatus::Active),
            created_at: m.created_at,
        }
    }
}

/// Query parameters for listing global insights.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ListInsightsQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: u64,
}

fn default_list_limit() -> u64 {
    20
}

impl ListInsightsQuery {
    pub fn clamped_limit(&self) -> u64 {
        self.limit.clamp(1, 100)
    }
}

/// Active insights and best practices, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct GlobalInsightsResponse {
    pub insights: Vec<Insight>,
    pub best_practices: Vec<BestPractice>,
}

/// Counters from one global generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct GenerationSummary {
    /// Videos with at least one metric snapshot.
    pub videos_considered: usize,
    pub global_avg: f64,
    pub insights_generated: usize,
    /// Videos above the outlier threshold.
    pub best_practices_found: usize,
    /// Outliers not already referenced by a best practice.
    pub best_practices_created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insight_from_model_decodes_ids() {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let model = insight::Model {
            id: Uuid::now_v7(),
            category: CONTENT_TYPE_CATEGORY.to_string(),
            subject: "Tutorial".to_string(),
            period: "2026-03".to_string(),
            insight_text: "Tutorial videos are outperforming the average by 40%.".to_string(),
            confidence_score: 0.85,
            sample_size: 2,
            supporting_video_ids: json!([id]),
            status: "active".to_string(),
            created_at: now,
            updated_at: now,
        };

        let dto = Insight::from(model);
        assert_eq!(dto.supporting_video_ids, vec![id]);
        assert_eq!(dto.status, InsightStatus::Active);
    }

    #[test]
    fn test_list_limit_clamped() {
        let query: ListInsightsQuery = serde_json::from_value(json!({ "limit": 0 })).unwrap();
        assert_eq!(query.clamped_limit(), 1);
        let query: ListInsightsQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query.clamped_limit(), 20);
    }
}
