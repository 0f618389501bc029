//! Video library writes that touch more than one table: metric recording and
//! provider imports.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::db::metrics::NewSnapshot;
use crate::entity::metric_snapshot;
use crate::error::{AppError, AppResult};
use crate::models::{
    ImportVideosRequest, ImportVideosResponse, ProviderVideo, RecordMetricsRequest,
    engagement_rate,
};

/// Append a snapshot to one of the caller's videos.
pub async fn record_metrics(
    pool: &DbPool,
    user_id: &str,
    video_id: Uuid,
    request: &RecordMetricsRequest,
) -> AppResult<metric_snapshot::Model> {
    request.validate().map_err(AppError::InvalidInput)?;
    let video = pool.get_user_video(user_id, video_id).await?;

    pool.insert_metric_snapshot(
        video.id,
        NewSnapshot {
            views: request.views,
            likes: request.likes,
            comments: request.comments,
            shares: request.shares,
            engagement_rate: request.resolved_rate(),
            collected_at: request.collected_at.unwrap_or_else(Utc::now),
        },
    )
    .await
}

/// Counters from a provider record, with negative values treated as zero.
fn snapshot_from(record: &ProviderVideo) -> NewSnapshot {
    let views = record.view_count.max(0);
    let likes = record.like_count.max(0);
    let comments = record.comment_count.max(0);
    let shares = record.share_count.max(0);

    NewSnapshot {
        views,
        likes,
        comments,
        shares,
        engagement_rate: engagement_rate(views, likes, comments, shares),
        collected_at: Utc::now(),
    }
}

/// Import provider records for a user.
///
/// Records are matched to existing videos by provider video id; unknown ids
/// create a new pending video. Every record appends one snapshot.
pub async fn import_provider_videos(
    pool: &DbPool,
    user_id: &str,
    request: &ImportVideosRequest,
) -> AppResult<ImportVideosResponse> {
    let mut response = ImportVideosResponse::default();

    for record in &request.videos {
        if record.id.trim().is_empty() {
            warn!(user_id, "Skipping provider record without an id");
            continue;
        }

        let video = match pool.find_video_by_tiktok_id(user_id, &record.id).await? {
            Some(existing) => existing,
            None => {
                response.created += 1;
                pool.insert_imported_video(user_id, record, request.account_handle.as_deref())
                    .await?
            }
        };

        pool.insert_metric_snapshot(video.id, snapshot_from(record))
            .await?;
        response.snapshots_recorded += 1;
    }

    info!(
        user_id,
        records = request.videos.len(),
        created = response.created,
        snapshots = response.snapshots_recorded,
        "Provider import complete"
    );

    Ok(response)
}
