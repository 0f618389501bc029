//! Shared helpers for the database-backed tests.

use chrono::Utc;
use clipinsight_lib::config::Config;
use clipinsight_lib::db::DbPool;
use clipinsight_lib::db::metrics::NewSnapshot;
use clipinsight_lib::entity::video;
use clipinsight_lib::models::{AnalysisStatus, CreateVideoRequest};
use serde_json::json;
use uuid::Uuid;

/// Confidence cutoff used by every analysis in this suite.
pub const REVIEW_THRESHOLD: f64 = 0.75;

/// Create a fresh DB pool. Migrations are applied on connect.
pub async fn create_test_pool() -> DbPool {
    let mut config = Config::from_env().expect(
        "Failed to load config. Ensure RUST_ENV and DATABASE_URL are set, \
         and that PostgreSQL is running.",
    );
    config.db_max_connections = 2;

    DbPool::new(&config)
        .await
        .expect("Failed to connect to database")
}

/// Generate a unique user id for test isolation.
pub fn unique_user(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Insert a pending video for `user_id`.
pub async fn create_video(
    pool: &DbPool,
    user_id: &str,
    content_type: Option<&str>,
) -> video::Model {
    let request = CreateVideoRequest {
        filename: "clip.mp4".to_string(),
        file_url: None,
        thumbnail_url: None,
        tiktok_url: None,
        hook: Some("Stop scrolling".to_string()),
        caption: Some("Fresh drop".to_string()),
        script: None,
        description: None,
        content_type: content_type.map(String::from),
        campaign_tag: None,
        duration_seconds: Some(15),
        analysis_priority: 0,
    };

    pool.insert_video(user_id, &request)
        .await
        .expect("Failed to insert video")
}

/// Append a snapshot with an explicit engagement rate.
pub async fn record_rate(pool: &DbPool, video_id: Uuid, rate: f64) {
    pool.insert_metric_snapshot(
        video_id,
        NewSnapshot {
            views: 1_000,
            likes: 10,
            comments: 0,
            shares: 0,
            engagement_rate: rate,
            collected_at: Utc::now(),
        },
    )
    .await
    .expect("Failed to insert snapshot");
}

/// Reload a video and return its analysis status.
pub async fn status_of(pool: &DbPool, video_id: Uuid) -> AnalysisStatus {
    let video = pool
        .get_video(video_id)
        .await
        .expect("Failed to load video")
        .expect("video exists");
    AnalysisStatus::parse(&video.analysis_status).expect("known status")
}

/// A provider reply in the structured analysis shape.
pub fn structured_reply(confidence: f64) -> String {
    json!({
        "hook": { "text": "Wait for it", "type": "curiosity_gap", "duration": 2 },
        "script": { "keyMessages": ["soft"], "voiceoverStyle": "casual" },
        "visual": { "environment": "studio", "productDisplay": "worn" },
        "classification": { "primary": "product_demo" },
        "cta": { "extracted": "Tap the cart", "type": "shop_now" },
        "campaign": { "category": "organic_content" },
        "metadata": { "confidence": confidence }
    })
    .to_string()
}
