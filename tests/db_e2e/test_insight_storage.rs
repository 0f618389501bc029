//! Pattern cache, library scans and global insight persistence.

use chrono::{Duration, Utc};
use clipinsight_lib::config::{GlobalInsightSettings, InsightSettings};
use clipinsight_lib::db::DbPool;
use clipinsight_lib::models::{CONTENT_TYPE_CATEGORY, PatternOutcome, SaveManualAnalysisRequest};
use clipinsight_lib::services::global_insights::generate_global_insights;
use clipinsight_lib::services::ingestion::save_manual_analysis;
use clipinsight_lib::services::patterns::{cached_user_patterns, compute_user_patterns};
use serde_json::json;
use uuid::Uuid;

use super::test_helpers::*;

/// Every measured video qualifies, so results do not depend on rows left by
/// other tests.
fn permissive_global_settings() -> GlobalInsightSettings {
    GlobalInsightSettings {
        lift_threshold: 0.0,
        outlier_threshold: 0.0,
        ..GlobalInsightSettings::default()
    }
}

async fn analyzed_video(pool: &DbPool, user: &str, hook: &str, rate: f64) -> Uuid {
    let video = create_video(pool, user, None).await;
    save_manual_analysis(
        pool,
        user,
        SaveManualAnalysisRequest {
            video_id: Some(video.id),
            analysis: json!({ "hook": { "type": hook }, "cta": { "type": "shop_now" } }),
        },
    )
    .await
    .expect("manual analysis saved");
    record_rate(pool, video.id, rate).await;
    video.id
}

#[actix_rt::test]
async fn test_pattern_cache_expiry_is_reset_on_compute() {
    let pool = create_test_pool().await;
    let user = unique_user("cache");
    analyzed_video(&pool, &user, "question", 8.0).await;
    analyzed_video(&pool, &user, "bold_claim", 3.0).await;

    let stale = Utc::now() - Duration::days(30);
    pool.put_user_pattern_insights(&user, json!([]), 0, stale, stale + Duration::days(7))
        .await
        .unwrap();
    assert!(cached_user_patterns(&pool, &user).await.unwrap().is_none());

    let settings = InsightSettings {
        min_library_size: 1,
        min_usable_records: 1,
        ..InsightSettings::default()
    };
    let before = Utc::now();
    let outcome = compute_user_patterns(&pool, &settings, &user).await.unwrap();
    assert!(matches!(outcome, PatternOutcome::Report(_)));

    let cached = cached_user_patterns(&pool, &user)
        .await
        .unwrap()
        .expect("fresh snapshot cached");
    assert_eq!(cached.video_count, 2);
    assert!(cached.calculated_at >= before - Duration::seconds(5));

    let expected = cached.calculated_at + Duration::days(settings.cache_days);
    assert!((cached.expires_at - expected).num_seconds().abs() <= 1);
    assert!(cached.expires_at > Utc::now() + Duration::days(6));
}

#[actix_rt::test]
async fn test_insufficient_library_is_not_cached() {
    let pool = create_test_pool().await;
    let user = unique_user("thin");
    analyzed_video(&pool, &user, "question", 8.0).await;

    let outcome = compute_user_patterns(&pool, &InsightSettings::default(), &user)
        .await
        .unwrap();

    assert!(matches!(outcome, PatternOutcome::InsufficientData(_)));
    assert!(cached_user_patterns(&pool, &user).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_soft_deleted_videos_leave_pattern_inputs() {
    let pool = create_test_pool().await;
    let user = unique_user("deleted");
    let kept = analyzed_video(&pool, &user, "question", 8.0).await;
    let removed = analyzed_video(&pool, &user, "bold_claim", 3.0).await;
    save_manual_analysis(
        &pool,
        &user,
        SaveManualAnalysisRequest {
            video_id: None,
            analysis: json!({ "hook": { "type": "pov" } }),
        },
    )
    .await
    .unwrap();

    let rows = pool.user_analyses_with_latest_snapshot(&user).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(pool.soft_delete_video(&user, removed).await.unwrap());

    let rows = pool.user_analyses_with_latest_snapshot(&user).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|(a, _)| a.video_id != Some(removed)));

    let (_, snapshot) = rows
        .iter()
        .find(|(a, _)| a.video_id == Some(kept))
        .expect("kept video analysis present");
    assert_eq!(snapshot.as_ref().and_then(|s| s.engagement_rate), Some(8.0));

    let standalone = rows.iter().find(|(a, _)| a.video_id.is_none()).unwrap();
    assert!(standalone.1.is_none());
}

#[actix_rt::test]
async fn test_global_generation_is_idempotent_per_month() {
    let pool = create_test_pool().await;
    let user = unique_user("global");
    let content_type = format!("cohort_{}", Uuid::new_v4().simple());
    let settings = permissive_global_settings();

    let first = create_video(&pool, &user, Some(&content_type)).await;
    let second = create_video(&pool, &user, Some(&content_type)).await;
    record_rate(&pool, first.id, 12.0).await;
    record_rate(&pool, second.id, 9.0).await;

    generate_global_insights(&pool, &settings).await.unwrap();

    let third = create_video(&pool, &user, Some(&content_type)).await;
    record_rate(&pool, third.id, 15.0).await;
    generate_global_insights(&pool, &settings).await.unwrap();

    let period = Utc::now().format("%Y-%m").to_string();
    let insights: Vec<_> = pool
        .list_active_insights(Some(CONTENT_TYPE_CATEGORY), 1_000)
        .await
        .unwrap()
        .into_iter()
        .filter(|i| i.subject == content_type)
        .collect();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].period, period);
    assert_eq!(insights[0].sample_size, 3);

    let practices: Vec<_> = pool
        .list_active_best_practices(1_000)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.example_video_ids == json!([first.id]))
        .collect();
    assert_eq!(practices.len(), 1);
    assert_eq!(practices[0].performance_avg, Some(12.0));
    assert!(pool.best_practice_exists_for_video(third.id).await.unwrap());
}
