//! Database queries for videos.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::video::{self, ActiveModel, Entity as Video};
use crate::error::{AppError, AppResult};
use crate::models::{
    AnalysisStatus, CreateVideoRequest, IMPORTED_CONTENT_TYPE, ListVideosQuery, ProviderVideo,
};

use super::{DbPool, like_pattern};

impl DbPool {
    /// Insert a new video for a user.
    pub async fn insert_video(
        &self,
        user_id: &str,
        request: &CreateVideoRequest,
    ) -> AppResult<video::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id.to_string()),
            filename: Set(request.filename.trim().to_string()),
            file_url: Set(request.file_url.clone()),
            thumbnail_url: Set(request.thumbnail_url.clone()),
            tiktok_video_id: Set(None),
            tiktok_url: Set(request.tiktok_url.clone()),
            hook: Set(request.hook.clone()),
            caption: Set(request.caption.clone()),
            script: Set(request.script.clone()),
            description: Set(request.description.clone()),
            content_type: Set(request.content_type.clone()),
            campaign_tag: Set(request.campaign_tag.clone()),
            duration_seconds: Set(request.duration_seconds),
            analysis_status: Set(AnalysisStatus::Pending.as_str().to_string()),
            analysis_priority: Set(request.analysis_priority),
            analysis_started_at: Set(None),
            analysis_error: Set(None),
            upload_date: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert video: {}", e)))?;

        Ok(result)
    }

    /// Insert a video created from a provider record.
    pub async fn insert_imported_video(
        &self,
        user_id: &str,
        record: &ProviderVideo,
        account_handle: Option<&str>,
    ) -> AppResult<video::Model> {
        let now = Utc::now();
        let upload_date = record
            .create_time
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or(now);
        let tiktok_url = record.share_url.clone().or_else(|| {
            account_handle.map(|handle| {
                format!(
                    "https://www.tiktok.com/@{}/video/{}",
                    handle.trim_start_matches('@'),
                    record.id
                )
            })
        });

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id.to_string()),
            filename: Set(record.filename()),
            file_url: Set(None),
            thumbnail_url: Set(record.cover_image_url.clone()),
            tiktok_video_id: Set(Some(record.id.clone())),
            tiktok_url: Set(tiktok_url),
            hook: Set(record.hook_fallback()),
            caption: Set(record.video_description.clone()),
            script: Set(None),
            description: Set(record.video_description.clone()),
            content_type: Set(Some(IMPORTED_CONTENT_TYPE.to_string())),
            campaign_tag: Set(None),
            duration_seconds: Set(record.duration),
            analysis_status: Set(AnalysisStatus::Pending.as_str().to_string()),
            analysis_priority: Set(0),
            analysis_started_at: Set(None),
            analysis_error: Set(None),
            upload_date: Set(upload_date),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert imported video: {}", e)))?;

        Ok(result)
    }

    /// Get a non-deleted video by ID.
    pub async fn get_video(&self, id: Uuid) -> AppResult<Option<video::Model>> {
        let result = Video::find_by_id(id)
            .filter(video::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get video: {}", e)))?;

        Ok(result)
    }

    /// Get a non-deleted video owned by `user_id`, or `NotFound`.
    pub async fn get_user_video(&self, user_id: &str, id: Uuid) -> AppResult<video::Model> {
        Video::find_by_id(id)
            .filter(video::Column::UserId.eq(user_id))
            .filter(video::Column::DeletedAt.is_null())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get video: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Video {}", id)))
    }

    /// Find a user's video by provider video id (deleted videos included, so a
    /// re-import never resurrects them as duplicates).
    pub async fn find_video_by_tiktok_id(
        &self,
        user_id: &str,
        tiktok_video_id: &str,
    ) -> AppResult<Option<video::Model>> {
        let result = Video::find()
            .filter(video::Column::UserId.eq(user_id))
            .filter(video::Column::TiktokVideoId.eq(tiktok_video_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find imported video: {}", e)))?;

        Ok(result)
    }

    /// List a user's videos with filtering and pagination.
    pub async fn list_videos(
        &self,
        user_id: &str,
        query: &ListVideosQuery,
    ) -> AppResult<(Vec<video::Model>, u64)> {
        let mut select = Video::find()
            .filter(video::Column::UserId.eq(user_id))
            .filter(video::Column::DeletedAt.is_null());

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let pattern = like_pattern(search);
            select = select.filter(Expr::cust_with_values(
                "(hook ILIKE $1 OR caption ILIKE $2 OR description ILIKE $3 OR filename ILIKE $4)",
                [
                    pattern.clone(),
                    pattern.clone(),
                    pattern.clone(),
                    pattern,
                ],
            ));
        }

        if let Some(ref content_type) = query.content_type {
            select = select.filter(video::Column::ContentType.eq(content_type.as_str()));
        }

        if let Some(ref campaign_tag) = query.campaign_tag {
            select = select.filter(video::Column::CampaignTag.eq(campaign_tag.as_str()));
        }

        if let Some(status) = query.status {
            select = select.filter(video::Column::AnalysisStatus.eq(status.as_str()));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count videos: {}", e)))?;

        let videos = select
            .order_by_desc(video::Column::CreatedAt)
            .offset(query.offset())
            .limit(query.clamped_limit())
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list videos: {}", e)))?;

        Ok((videos, total))
    }

    /// Soft-delete a user's video. Returns false if nothing matched.
    pub async fn soft_delete_video(&self, user_id: &str, id: Uuid) -> AppResult<bool> {
        let now = Utc::now();

        let result = Video::update_many()
            .col_expr(video::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(video::Column::UpdatedAt, Expr::value(now))
            .filter(video::Column::Id.eq(id))
            .filter(video::Column::UserId.eq(user_id))
            .filter(video::Column::DeletedAt.is_null())
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete video: {}", e)))?;

        Ok(result.rows_affected == 1)
    }

    /// Atomically move a video into `processing`.
    ///
    /// Only succeeds from a startable status; a second concurrent start sees
    /// `processing` and gets `false`.
    pub async fn try_begin_analysis(&self, id: Uuid) -> AppResult<bool> {
        let now = Utc::now();
        let startable: Vec<&str> = AnalysisStatus::startable()
            .iter()
            .map(|s| s.as_str())
            .collect();

        let result = Video::update_many()
            .col_expr(
                video::Column::AnalysisStatus,
                Expr::value(AnalysisStatus::Processing.as_str()),
            )
            .col_expr(video::Column::AnalysisStartedAt, Expr::value(Some(now)))
            .col_expr(video::Column::AnalysisError, Expr::value(Option::<String>::None))
            .col_expr(video::Column::UpdatedAt, Expr::value(now))
            .filter(video::Column::Id.eq(id))
            .filter(video::Column::AnalysisStatus.is_in(startable))
            .filter(video::Column::DeletedAt.is_null())
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to start analysis: {}", e)))?;

        Ok(result.rows_affected == 1)
    }

    /// Set the analysis status (and error message, cleared when `None`).
    pub async fn set_analysis_status(
        &self,
        id: Uuid,
        status: AnalysisStatus,
        error: Option<String>,
    ) -> AppResult<()> {
        Video::update_many()
            .col_expr(video::Column::AnalysisStatus, Expr::value(status.as_str()))
            .col_expr(video::Column::AnalysisError, Expr::value(error))
            .col_expr(video::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(video::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update analysis status: {}", e)))?;

        Ok(())
    }

    /// Set the campaign tag unless one is already present.
    pub async fn set_campaign_tag_if_absent(&self, id: Uuid, tag: &str) -> AppResult<bool> {
        let result = Video::update_many()
            .col_expr(video::Column::CampaignTag, Expr::value(tag))
            .col_expr(video::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(video::Column::Id.eq(id))
            .filter(video::Column::CampaignTag.is_null())
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to set campaign tag: {}", e)))?;

        Ok(result.rows_affected == 1)
    }

    /// Pending, non-deleted videos in batch order: priority desc, then newest first.
    pub async fn pending_videos_for_batch(&self, limit: u64) -> AppResult<Vec<video::Model>> {
        let result = Video::find()
            .filter(video::Column::AnalysisStatus.eq(AnalysisStatus::Pending.as_str()))
            .filter(video::Column::DeletedAt.is_null())
            .order_by_desc(video::Column::AnalysisPriority)
            .order_by_desc(video::Column::CreatedAt)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get pending videos: {}", e)))?;

        Ok(result)
    }

    /// Reset videos stuck in `processing` since before `started_before` back to `pending`.
    pub async fn reset_stale_processing(&self, started_before: DateTime<Utc>) -> AppResult<u64> {
        let result = Video::update_many()
            .col_expr(
                video::Column::AnalysisStatus,
                Expr::value(AnalysisStatus::Pending.as_str()),
            )
            .col_expr(
                video::Column::AnalysisError,
                Expr::value(Some("analysis timed out; requeued".to_string())),
            )
            .col_expr(video::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(video::Column::AnalysisStatus.eq(AnalysisStatus::Processing.as_str()))
            .filter(video::Column::AnalysisStartedAt.lt(started_before))
            .exec(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to reset stale processing videos: {}", e))
            })?;

        Ok(result.rows_affected)
    }
}
