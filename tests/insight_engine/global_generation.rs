//! Cross-user cohort and outlier analysis.

use clipinsight_lib::config::GlobalInsightSettings;
use clipinsight_lib::services::global_insights::{
    MeasuredVideo, analyze, best_practice_title, exceeds,
};
use uuid::Uuid;

fn video(content_type: Option<&str>, hook: Option<&str>, rate: f64) -> MeasuredVideo {
    MeasuredVideo {
        id: Uuid::new_v4(),
        content_type: content_type.map(String::from),
        hook: hook.map(String::from),
        engagement_rate: rate,
    }
}

#[test]
fn test_empty_input_produces_nothing() {
    assert!(analyze(&[], &GlobalInsightSettings::default()).is_none());
}

#[test]
fn test_cohort_lift_and_outliers() {
    let videos = vec![
        video(Some("tutorial"), None, 10.0),
        video(Some("tutorial"), Some("Watch this"), 10.0),
        video(Some("lifestyle"), None, 2.0),
        video(Some("lifestyle"), None, 2.0),
        video(None, None, 1.0),
    ];

    let analysis = analyze(&videos, &GlobalInsightSettings::default()).unwrap();
    assert!((analysis.global_avg - 5.0).abs() < 1e-9);

    assert_eq!(analysis.cohorts.len(), 1);
    let cohort = &analysis.cohorts[0];
    assert_eq!(cohort.subject, "tutorial");
    assert_eq!(cohort.video_ids, vec![videos[0].id, videos[1].id]);
    assert_eq!(
        cohort.text,
        "tutorial videos are outperforming the average by 100%."
    );

    let titles: Vec<&str> = analysis.outliers.iter().map(|o| o.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["High Performing: tutorial", "High Performing: Watch this"]
    );
}

#[test]
fn test_uncategorized_cohort_never_produces_insight() {
    let videos = vec![
        video(None, None, 9.0),
        video(Some("  "), None, 9.0),
        video(Some("lifestyle"), None, 1.0),
    ];

    let analysis = analyze(&videos, &GlobalInsightSettings::default()).unwrap();
    assert!(analysis.cohorts.is_empty());
}

#[test]
fn test_zero_average_produces_no_results() {
    let videos = vec![video(Some("tutorial"), None, 0.0), video(Some("tutorial"), None, 0.0)];

    let analysis = analyze(&videos, &GlobalInsightSettings::default()).unwrap();
    assert_eq!(analysis.global_avg, 0.0);
    assert!(analysis.cohorts.is_empty());
    assert!(analysis.outliers.is_empty());
}

#[test]
fn test_threshold_comparison_is_strict() {
    assert!(!exceeds(5.75, 5.0, 1.15));
    assert!(exceeds(5.76, 5.0, 1.15));
    assert!(!exceeds(7.5, 5.0, 1.5));
}

#[test]
fn test_best_practice_title_fallbacks() {
    assert_eq!(best_practice_title(Some("Wait"), Some("tutorial")), "High Performing: Wait");
    assert_eq!(best_practice_title(Some(" "), Some("tutorial")), "High Performing: tutorial");
    assert_eq!(best_practice_title(None, None), "High Performing: Video");
}
