//! Attribute normalizer.
//!
//! Turns stored analyses (with their video's latest snapshot) into flat records
//! carrying the four pattern attributes and one resolved engagement rate.

use serde_json::Value as JsonValue;

use crate::entity::{metric_snapshot, video_analysis};
use crate::models::{AnalysisSource, engagement_rate};

/// Attribute values the pattern aggregator groups by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternAttributes {
    pub hook_type: Option<String>,
    pub visual_environment: Option<String>,
    pub visual_lighting: Option<String>,
    pub cta_type: Option<String>,
}

/// Performance signal from a video's latest snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapshotSignal {
    pub engagement_rate: Option<f64>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

impl From<&metric_snapshot::Model> for SnapshotSignal {
    fn from(m: &metric_snapshot::Model) -> Self {
        Self {
            engagement_rate: m.engagement_rate,
            views: m.views,
            likes: m.likes,
            comments: m.comments,
            shares: m.shares,
        }
    }
}

/// One analysis as seen by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub source: AnalysisSource,
    /// Self-reported rate from a manual entry's `performance` object.
    pub manual_engagement_rate: Option<f64>,
    pub snapshot: Option<SnapshotSignal>,
    pub attributes: PatternAttributes,
}

impl AnalysisRecord {
    pub fn from_models(
        analysis: &video_analysis::Model,
        snapshot: Option<&metric_snapshot::Model>,
    ) -> Self {
        let source = AnalysisSource::parse(&analysis.source_type).unwrap_or(AnalysisSource::Ai);
        let manual_engagement_rate = match source {
            AnalysisSource::Manual => analysis
                .raw_payload
                .as_ref()
                .and_then(manual_engagement_rate),
            AnalysisSource::Ai => None,
        };

        Self {
            source,
            manual_engagement_rate,
            snapshot: snapshot.map(SnapshotSignal::from),
            attributes: PatternAttributes {
                hook_type: analysis.hook_type.clone(),
                visual_environment: analysis.visual_environment.clone(),
                visual_lighting: analysis.visual_lighting.clone(),
                cta_type: analysis.cta_type.clone(),
            },
        }
    }
}

/// Record with a usable (positive) engagement rate.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub attributes: PatternAttributes,
    pub engagement_rate: f64,
}

/// Read `performance.engagement_rate` from a manual payload.
///
/// Numbers and numeric strings are accepted; anything else is ignored.
pub fn manual_engagement_rate(payload: &JsonValue) -> Option<f64> {
    let performance = payload.get("performance")?;
    let raw = performance
        .get("engagement_rate")
        .or_else(|| performance.get("engagementRate"))?;

    let rate = match raw {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };

    rate.is_finite().then_some(rate)
}

/// Resolve one record's engagement rate.
///
/// 1. A manual entry's self-reported rate is the starting candidate.
/// 2. A positive rate stored on the latest snapshot always overrides it.
/// 3. Otherwise, if the candidate is still zero and a snapshot exists, the rate
///    is derived from the snapshot counters.
pub fn resolve_engagement_rate(record: &AnalysisRecord) -> f64 {
    let mut rate = match record.source {
        AnalysisSource::Manual => record.manual_engagement_rate.unwrap_or(0.0),
        AnalysisSource::Ai => 0.0,
    };

    if let Some(snapshot) = record.snapshot {
        match snapshot.engagement_rate {
            Some(stored) if stored.is_finite() && stored != 0.0 => rate = stored,
            _ if rate == 0.0 => {
                rate = engagement_rate(
                    snapshot.views,
                    snapshot.likes,
                    snapshot.comments,
                    snapshot.shares,
                );
            }
            _ => {}
        }
    }

    rate
}

/// Resolve every record and drop those without a positive rate.
pub fn normalize(records: &[AnalysisRecord]) -> Vec<NormalizedRecord> {
    records
        .iter()
        .filter_map(|record| {
            let rate = resolve_engagement_rate(record);
            (rate > 0.0).then(|| NormalizedRecord {
                attributes: record.attributes.clone(),
                engagement_rate: rate,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manual(rate: Option<f64>, snapshot: Option<SnapshotSignal>) -> AnalysisRecord {
        AnalysisRecord {
            source: AnalysisSource::Manual,
            manual_engagement_rate: rate,
            snapshot,
            attributes: PatternAttributes::default(),
        }
    }

    fn counters(views: i64, likes: i64, comments: i64, shares: i64) -> SnapshotSignal {
        SnapshotSignal {
            engagement_rate: None,
            views,
            likes,
            comments,
            shares,
        }
    }

    #[test]
    fn test_snapshot_rate_overrides_manual_rate() {
        let snapshot = SnapshotSignal {
            engagement_rate: Some(7.25),
            ..counters(100, 1, 1, 1)
        };
        assert_eq!(resolve_engagement_rate(&manual(Some(3.0), Some(snapshot))), 7.25);
    }

    #[test]
    fn test_manual_rate_kept_when_snapshot_has_no_stored_rate() {
        let record = manual(Some(3.0), Some(counters(100, 10, 0, 0)));
        assert_eq!(resolve_engagement_rate(&record), 3.0);
    }

    #[test]
    fn test_rate_derived_from_counters() {
        let record = AnalysisRecord {
            source: AnalysisSource::Ai,
            manual_engagement_rate: None,
            snapshot: Some(counters(1000, 50, 30, 20)),
            attributes: PatternAttributes::default(),
        };
        assert_eq!(resolve_engagement_rate(&record), 10.0);
    }

    #[test]
    fn test_ai_record_ignores_manual_rate() {
        let record = AnalysisRecord {
            source: AnalysisSource::Ai,
            manual_engagement_rate: Some(9.0),
            snapshot: None,
            attributes: PatternAttributes::default(),
        };
        assert_eq!(resolve_engagement_rate(&record), 0.0);
    }

    #[test]
    fn test_zero_rates_are_dropped() {
        let records = vec![
            manual(Some(4.0), None),
            manual(None, None),
            manual(None, Some(counters(0, 5, 5, 5))),
            manual(Some(0.0), Some(counters(10, 1, 0, 0))),
        ];
        let normalized = normalize(&records);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].engagement_rate, 4.0);
        assert_eq!(normalized[1].engagement_rate, 10.0);
    }

    #[test]
    fn test_manual_engagement_rate_extraction() {
        assert_eq!(
            manual_engagement_rate(&json!({"performance": {"engagement_rate": 5.5}})),
            Some(5.5)
        );
        assert_eq!(
            manual_engagement_rate(&json!({"performance": {"engagement_rate": "4.2%"}})),
            Some(4.2)
        );
        assert_eq!(
            manual_engagement_rate(&json!({"performance": {"engagementRate": 2}})),
            Some(2.0)
        );
        assert_eq!(manual_engagement_rate(&json!({"performance": {}})), None);
        assert_eq!(manual_engagement_rate(&json!({"hook": {}})), None);
        assert_eq!(
            manual_engagement_rate(&json!({"performance": {"engagement_rate": "high"}})),
            None
        );
    }
}
