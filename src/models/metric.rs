//! Metric snapshot domain models and the canonical engagement formula.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::metric_snapshot;

/// Engagement rate as a percentage: `(likes + comments + shares) / views * 100`.
///
/// Zero views always yields `0.0`. Every computation site goes through this function.
pub fn engagement_rate(views: i64, likes: i64, comments: i64, shares: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    let interactions = likes as f64 + comments as f64 + shares as f64;
    (interactions / views as f64) * 100.0
}

/// Point-in-time performance observation for a video.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricSnapshot {
    pub id: Uuid,
    pub video_id: Uuid,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    /// Stored engagement rate (percentage).
    pub engagement_rate: Option<f64>,
    pub collected_at: DateTime<Utc>,
}

impl From<metric_snapshot::Model> for MetricSnapshot {
    fn from(m: metric_snapshot::Model) -> Self {
        Self {
            id: m.id,
            video_id: m.video_id,
            views: m.views,
            likes: m.likes,
            comments: m.comments,
            shares: m.shares,
            engagement_rate: m.engagement_rate,
            collected_at: m.collected_at,
        }
    }
}

/// Request to append a metric snapshot to a video.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordMetricsRequest {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    /// Provider-supplied rate; derived from the counters when omitted.
    #[serde(default)]
    pub engagement_rate: Option<f64>,
    /// Defaults to now.
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
}

impl RecordMetricsRequest {
    /// Reject negative counters and non-finite rates.
    pub fn validate(&self) -> Result<(), String> {
        if self.views < 0 || self.likes < 0 || self.comments < 0 || self.shares < 0 {
            return Err("metric counters must not be negative".to_string());
        }
        if let Some(rate) = self.engagement_rate
            && (!rate.is_finite() || rate < 0.0)
        {
            return Err("engagement_rate must be a non-negative number".to_string());
        }
        Ok(())
    }

    /// Rate to store: the provider's value when supplied, otherwise the canonical formula.
    pub fn resolved_rate(&self) -> f64 {
        self.engagement_rate.unwrap_or_else(|| {
            engagement_rate(self.views, self.likes, self.comments, self.shares)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_rate_formula() {
        assert_eq!(engagement_rate(1000, 50, 30, 20), 10.0);
        assert_eq!(engagement_rate(200, 1, 0, 0), 0.5);
        let rate = engagement_rate(3, 1, 0, 0);
        assert!((rate - 100.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_engagement_rate_zero_views() {
        assert_eq!(engagement_rate(0, 0, 0, 0), 0.0);
        assert_eq!(engagement_rate(0, 10, 5, 1), 0.0);
    }

    #[test]
    fn test_engagement_rate_huge_counters() {
        let half = i64::MAX / 2 + 1;
        let rate = engagement_rate(1_000, half, half, 0);
        assert!(rate.is_finite());
        assert!(rate > 0.0);

        let rate = engagement_rate(i64::MAX, i64::MAX, i64::MAX, i64::MAX);
        assert!((rate - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_engagement_rate_matches_definition_over_grid() {
        for views in [1_i64, 7, 100, 12_345] {
            for likes in [0_i64, 3, 99] {
                for comments in [0_i64, 11] {
                    for shares in [0_i64, 5] {
                        let expected =
                            (likes + comments + shares) as f64 / views as f64 * 100.0;
                        assert_eq!(engagement_rate(views, likes, comments, shares), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_record_request_resolved_rate() {
        let derived = RecordMetricsRequest {
            views: 500,
            likes: 40,
            comments: 5,
            shares: 5,
            engagement_rate: None,
            collected_at: None,
        };
        assert_eq!(derived.resolved_rate(), 10.0);

        let supplied = RecordMetricsRequest {
            engagement_rate: Some(4.2),
            ..derived
        };
        assert_eq!(supplied.resolved_rate(), 4.2);
    }

    #[test]
    fn test_record_request_validation() {
        let bad = RecordMetricsRequest {
            views: -1,
            likes: 0,
            comments: 0,
            shares: 0,
            engagement_rate: None,
            collected_at: None,
        };
        assert!(bad.validate().is_err());

        let nan_rate = RecordMetricsRequest {
            views: 10,
            engagement_rate: Some(f64::NAN),
            ..bad
        };
        assert!(nan_rate.validate().is_err());
    }
}
