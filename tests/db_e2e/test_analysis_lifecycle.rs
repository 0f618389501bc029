//! Analysis lifecycle: status transitions, reuse of stored analyses and the
//! `processing` gate.

use clipinsight_lib::error::AppError;
use clipinsight_lib::models::{AnalysisStatus, SaveManualAnalysisRequest};
use clipinsight_lib::services::ProviderError;
use clipinsight_lib::services::ingestion::{analyze_video, save_manual_analysis};
use clipinsight_lib::services::provider::mock::MockProvider;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_confident_analysis_completes() {
    let pool = create_test_pool().await;
    let user = unique_user("complete");
    let video = create_video(&pool, &user, None).await;

    let provider = MockProvider::new();
    provider.enqueue_text(&structured_reply(0.9));

    let response = analyze_video(&pool, &provider, REVIEW_THRESHOLD, &video, false)
        .await
        .expect("analysis succeeds");

    assert_eq!(response.status, AnalysisStatus::Completed);
    assert!(!response.needs_review);
    assert!(!response.is_existing);
    assert_eq!(status_of(&pool, video.id).await, AnalysisStatus::Completed);

    let stored = pool
        .get_analysis_by_video(video.id)
        .await
        .unwrap()
        .expect("analysis stored");
    assert_eq!(stored.id, response.analysis_id);
    assert_eq!(stored.hook_type.as_deref(), Some("curiosity_gap"));

    let tagged = pool.get_video(video.id).await.unwrap().unwrap();
    assert!(tagged.campaign_tag.is_some());
}

#[actix_rt::test]
async fn test_low_confidence_needs_review() {
    let pool = create_test_pool().await;
    let user = unique_user("review");
    let video = create_video(&pool, &user, None).await;

    let provider = MockProvider::new();
    provider.enqueue_text(&structured_reply(0.4));

    let response = analyze_video(&pool, &provider, REVIEW_THRESHOLD, &video, false)
        .await
        .unwrap();

    assert_eq!(response.status, AnalysisStatus::NeedsReview);
    assert!(response.needs_review);
    assert_eq!(status_of(&pool, video.id).await, AnalysisStatus::NeedsReview);
}

#[actix_rt::test]
async fn test_provider_failure_marks_video_failed() {
    let pool = create_test_pool().await;
    let user = unique_user("failed");
    let video = create_video(&pool, &user, None).await;

    let provider = MockProvider::new();
    provider.enqueue(Err(ProviderError::Api {
        status: 500,
        message: "upstream error".to_string(),
    }));

    let result = analyze_video(&pool, &provider, REVIEW_THRESHOLD, &video, false).await;
    assert!(matches!(result, Err(AppError::ExternalService(_))));

    let reloaded = pool.get_video(video.id).await.unwrap().unwrap();
    assert_eq!(reloaded.analysis_status, AnalysisStatus::Failed.as_str());
    assert!(reloaded.analysis_error.is_some());
    assert!(pool.get_analysis_by_video(video.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_unparseable_reply_marks_video_failed() {
    let pool = create_test_pool().await;
    let user = unique_user("garbled");
    let video = create_video(&pool, &user, None).await;

    let provider = MockProvider::new();
    provider.enqueue_text("Sorry, I cannot analyze this video.");

    let result = analyze_video(&pool, &provider, REVIEW_THRESHOLD, &video, false).await;
    assert!(matches!(result, Err(AppError::AnalysisParse(_))));
    assert_eq!(status_of(&pool, video.id).await, AnalysisStatus::Failed);
}

#[actix_rt::test]
async fn test_existing_analysis_returned_without_force() {
    let pool = create_test_pool().await;
    let user = unique_user("existing");
    let video = create_video(&pool, &user, None).await;

    let provider = MockProvider::new();
    provider.enqueue_text(&structured_reply(0.9));
    let first = analyze_video(&pool, &provider, REVIEW_THRESHOLD, &video, false)
        .await
        .unwrap();

    let video = pool.get_video(video.id).await.unwrap().unwrap();
    let again = analyze_video(&pool, &provider, REVIEW_THRESHOLD, &video, false)
        .await
        .unwrap();

    assert!(again.is_existing);
    assert_eq!(again.analysis_id, first.analysis_id);
    assert_eq!(again.status, AnalysisStatus::Completed);
    assert_eq!(provider.call_count(), 1);

    provider.enqueue_text(&structured_reply(0.5));
    let forced = analyze_video(&pool, &provider, REVIEW_THRESHOLD, &video, true)
        .await
        .unwrap();

    assert!(!forced.is_existing);
    assert_eq!(forced.analysis_id, first.analysis_id);
    assert_eq!(forced.status, AnalysisStatus::NeedsReview);
    assert_eq!(provider.call_count(), 2);
}

#[actix_rt::test]
async fn test_processing_gate_admits_one_run() {
    let pool = create_test_pool().await;
    let user = unique_user("gate");
    let video = create_video(&pool, &user, None).await;

    assert!(pool.try_begin_analysis(video.id).await.unwrap());
    assert!(!pool.try_begin_analysis(video.id).await.unwrap());
    assert_eq!(status_of(&pool, video.id).await, AnalysisStatus::Processing);

    let provider = MockProvider::new();
    provider.enqueue_text(&structured_reply(0.9));
    let result = analyze_video(&pool, &provider, REVIEW_THRESHOLD, &video, true).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(provider.call_count(), 0);
    assert_eq!(status_of(&pool, video.id).await, AnalysisStatus::Processing);
}

#[actix_rt::test]
async fn test_manual_save_respects_processing_gate() {
    let pool = create_test_pool().await;
    let user = unique_user("manual");
    let video = create_video(&pool, &user, None).await;

    let request = || SaveManualAnalysisRequest {
        video_id: Some(video.id),
        analysis: json!({ "hook": { "type": "question" } }),
    };

    assert!(pool.try_begin_analysis(video.id).await.unwrap());
    let result = save_manual_analysis(&pool, &user, request()).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(pool.get_analysis_by_video(video.id).await.unwrap().is_none());
    assert_eq!(status_of(&pool, video.id).await, AnalysisStatus::Processing);

    pool.set_analysis_status(video.id, AnalysisStatus::Failed, Some("timeout".to_string()))
        .await
        .unwrap();
    let stored = save_manual_analysis(&pool, &user, request()).await.unwrap();

    assert_eq!(stored.video_id, Some(video.id));
    assert_eq!(stored.hook_type.as_deref(), Some("question"));
    let reloaded = pool.get_video(video.id).await.unwrap().unwrap();
    assert_eq!(reloaded.analysis_status, AnalysisStatus::Completed.as_str());
    assert!(reloaded.analysis_error.is_none());
}
