//! Per-user pattern insight models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::user_pattern_insight;

/// Attribute family an insight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Hook,
    Visual,
    Cta,
}

impl PatternCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hook => "hook",
            Self::Visual => "visual",
            Self::Cta => "cta",
        }
    }
}

impl std::fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse confidence tier. Ordered `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Tier for a group of `count` records out of `total` filtered records.
    ///
    /// `high` needs at least 5 records and a 30% share, `medium` at least 3 and 20%.
    pub fn for_share(count: usize, total: usize) -> Self {
        let pct_at_least = |pct: usize| total > 0 && count * 100 >= total * pct;

        if count >= 5 && pct_at_least(30) {
            Self::High
        } else if count >= 3 && pct_at_least(20) {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One aggregated attribute pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatternInsight {
    pub category: PatternCategory,
    /// Attribute within the category (`type`, `environment`, `lighting`, `combo`).
    pub attribute: String,
    /// Normalized value, or `"{environment} + {lighting}"` for combos.
    pub value: String,
    pub avg_engagement: f64,
    pub video_count: usize,
    pub confidence_level: ConfidenceLevel,
    pub recommendation: String,
}

/// Successful computation: top insights plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PatternReport {
    pub success: bool,
    pub insights: Vec<PatternInsight>,
    /// Records that carried a usable engagement rate.
    pub total_videos_analyzed: usize,
    /// Length of the full (untruncated) insight list.
    pub insights_generated: usize,
}

/// "Not ready yet" result returned instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct InsufficientData {
    pub success: bool,
    pub message: String,
    pub threshold: usize,
    pub current: usize,
}

impl InsufficientData {
    /// Library gate: too few analyses overall.
    pub fn library(threshold: usize, current: usize) -> Self {
        Self {
            success: false,
            message: format!("Need at least {} videos (currently {})", threshold, current),
            threshold,
            current,
        }
    }

    /// Usable-record gate: too few analyses carry performance data.
    pub fn performance(threshold: usize, current: usize) -> Self {
        Self {
            success: false,
            message: format!(
                "Need at least {} videos with performance data (currently {})",
                threshold, current
            ),
            threshold,
            current,
        }
    }
}

/// Outcome of a pattern computation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PatternOutcome {
    Report(PatternReport),
    InsufficientData(InsufficientData),
}

/// Cached per-user insight snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CachedPatternInsights {
    pub insights: Vec<PatternInsight>,
    pub video_count: i32,
    pub calculated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<user_pattern_insight::Model> for CachedPatternInsights {
    type Error = serde_json::Error;

    fn try_from(m: user_pattern_insight::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            insights: serde_json::from_value(m.insights)?,
            video_count: m.video_count,
            calculated_at: m.calculated_at,
            expires_at: m.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(ConfidenceLevel::for_share(5, 5), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::for_share(5, 17), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::for_share(3, 15), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::for_share(3, 16), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::for_share(2, 2), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::for_share(0, 0), ConfidenceLevel::Low);
    }

    #[test]
    fn test_confidence_exact_percentage_boundaries() {
        // 30% of 10 and 20% of 15 are reached exactly
        assert_eq!(ConfidenceLevel::for_share(5, 10), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::for_share(3, 15), ConfidenceLevel::Medium);
    }

    #[test]
    fn test_confidence_monotonic_in_count() {
        for total in 1..=60 {
            let mut previous = ConfidenceLevel::Low;
            for count in 0..=total {
                let tier = ConfidenceLevel::for_share(count, total);
                assert!(tier >= previous, "count={} total={}", count, total);
                previous = tier;
            }
        }
    }

    #[test]
    fn test_insufficient_data_messages() {
        let library = InsufficientData::library(10, 9);
        assert_eq!(library.message, "Need at least 10 videos (currently 9)");
        assert!(!library.success);

        let performance = InsufficientData::performance(5, 2);
        assert_eq!(
            performance.message,
            "Need at least 5 videos with performance data (currently 2)"
        );
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = PatternOutcome::InsufficientData(InsufficientData::library(10, 9));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["threshold"], 10);
        assert_eq!(json["current"], 9);
    }
}
