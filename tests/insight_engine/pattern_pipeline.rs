//! Per-user pattern pipeline: gates, engagement resolution and ranking.

use clipinsight_lib::config::InsightSettings;
use clipinsight_lib::models::{AnalysisSource, ConfidenceLevel, PatternCategory};
use clipinsight_lib::services::aggregator::{COMBO_ATTRIBUTE, aggregate};
use clipinsight_lib::services::normalizer::{
    AnalysisRecord, NormalizedRecord, PatternAttributes, SnapshotSignal, manual_engagement_rate,
    resolve_engagement_rate,
};
use clipinsight_lib::services::patterns::evaluate;
use serde_json::json;

fn ai_record(hook: Option<&str>, rate: Option<f64>) -> AnalysisRecord {
    AnalysisRecord {
        source: AnalysisSource::Ai,
        manual_engagement_rate: None,
        snapshot: rate.map(|r| SnapshotSignal {
            engagement_rate: Some(r),
            ..SnapshotSignal::default()
        }),
        attributes: PatternAttributes {
            hook_type: hook.map(String::from),
            ..PatternAttributes::default()
        },
    }
}

fn library() -> Vec<AnalysisRecord> {
    vec![
        ai_record(Some("Bold_Claim "), Some(5.0)),
        ai_record(Some("bold_claim"), Some(7.0)),
        ai_record(Some("BOLD_CLAIM"), Some(6.0)),
        ai_record(Some("bold_claim"), Some(6.0)),
        ai_record(Some("curiosity_gap"), Some(2.0)),
        ai_record(Some("curiosity_gap"), Some(3.0)),
        ai_record(Some("curiosity_gap"), Some(4.0)),
        ai_record(Some("social_proof"), None),
        ai_record(Some("social_proof"), None),
        ai_record(None, None),
    ]
}

#[test]
fn test_library_gate_reports_current_size() {
    let records = &library()[..9];
    let err = evaluate(records, &InsightSettings::default()).unwrap_err();

    assert!(!err.success);
    assert_eq!(err.threshold, 10);
    assert_eq!(err.current, 9);
    assert_eq!(err.message, "Need at least 10 videos (currently 9)");
}

#[test]
fn test_usable_gate_reports_configured_threshold() {
    let mut records = library();
    for record in records.iter_mut().skip(2) {
        record.snapshot = None;
    }

    let err = evaluate(&records, &InsightSettings::default()).unwrap_err();
    assert_eq!(err.threshold, 5);
    assert_eq!(err.current, 2);
    assert!(err.message.contains("performance data"));
}

#[test]
fn test_hook_patterns_are_ranked_by_average() {
    let evaluation = evaluate(&library(), &InsightSettings::default()).unwrap();
    assert_eq!(evaluation.usable_records, 7);

    let report = evaluation.into_report(10);
    assert!(report.success);
    assert_eq!(report.total_videos_analyzed, 7);
    assert_eq!(report.insights_generated, 2);

    let top = &report.insights[0];
    assert_eq!(top.category, PatternCategory::Hook);
    assert_eq!(top.attribute, "type");
    assert_eq!(top.value, "bold_claim");
    assert_eq!(top.video_count, 4);
    assert!((top.avg_engagement - 6.0).abs() < 1e-9);
    assert_eq!(top.confidence_level, ConfidenceLevel::Medium);
    assert_eq!(
        top.recommendation,
        "Your \"bold claim\" hooks average 6.00% engagement across 4 videos."
    );

    assert_eq!(report.insights[1].value, "curiosity_gap");
}

#[test]
fn test_report_truncates_to_top_n() {
    let report = evaluate(&library(), &InsightSettings::default())
        .unwrap()
        .into_report(1);

    assert_eq!(report.insights.len(), 1);
    assert_eq!(report.insights_generated, 2);
}

#[test]
fn test_equal_averages_keep_evaluation_order() {
    let attributes = PatternAttributes {
        visual_environment: Some("studio".to_string()),
        visual_lighting: Some("natural".to_string()),
        ..PatternAttributes::default()
    };
    let records = vec![
        NormalizedRecord {
            attributes: attributes.clone(),
            engagement_rate: 4.0,
        },
        NormalizedRecord {
            attributes,
            engagement_rate: 8.0,
        },
    ];

    let insights = aggregate(&records);
    let attributes: Vec<&str> = insights.iter().map(|i| i.attribute.as_str()).collect();
    assert_eq!(attributes, vec!["environment", "lighting", COMBO_ATTRIBUTE]);

    let combo = &insights[2];
    assert_eq!(combo.category, PatternCategory::Visual);
    assert_eq!(combo.value, "studio + natural");
    assert_eq!(combo.confidence_level, ConfidenceLevel::Low);
}

#[test]
fn test_single_member_groups_are_dropped() {
    let records = vec![NormalizedRecord {
        attributes: PatternAttributes {
            cta_type: Some("shop_now".to_string()),
            ..PatternAttributes::default()
        },
        engagement_rate: 9.0,
    }];

    assert!(aggregate(&records).is_empty());
}

#[test]
fn test_manual_rate_resolution() {
    let payload = json!({ "performance": { "engagement_rate": "7.5%" } });
    assert_eq!(manual_engagement_rate(&payload), Some(7.5));
    assert_eq!(manual_engagement_rate(&json!({ "performance": {} })), None);

    let mut record = AnalysisRecord {
        source: AnalysisSource::Manual,
        manual_engagement_rate: Some(4.5),
        snapshot: None,
        attributes: PatternAttributes::default(),
    };
    assert_eq!(resolve_engagement_rate(&record), 4.5);

    record.snapshot = Some(SnapshotSignal {
        engagement_rate: Some(2.0),
        ..SnapshotSignal::default()
    });
    assert_eq!(resolve_engagement_rate(&record), 2.0);

    // A self-reported rate survives a snapshot without a stored rate
    record.snapshot = Some(SnapshotSignal {
        engagement_rate: None,
        views: 1000,
        likes: 10,
        ..SnapshotSignal::default()
    });
    assert_eq!(resolve_engagement_rate(&record), 4.5);
}
