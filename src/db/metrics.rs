//! Database queries for metric snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::metric_snapshot::{self, ActiveModel, Entity as MetricSnapshot};
use crate::entity::video::{self, Entity as Video};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// Counters for a new snapshot.
#[derive(Debug, Clone, Copy)]
pub struct NewSnapshot {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub engagement_rate: f64,
    pub collected_at: DateTime<Utc>,
}

impl DbPool {
    /// Append a metric snapshot. Snapshots are never updated afterwards.
    pub async fn insert_metric_snapshot(
        &self,
        video_id: Uuid,
        snapshot: NewSnapshot,
    ) -> AppResult<metric_snapshot::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            video_id: Set(video_id),
            views: Set(snapshot.views),
            likes: Set(snapshot.likes),
            comments: Set(snapshot.comments),
            shares: Set(snapshot.shares),
            engagement_rate: Set(Some(snapshot.engagement_rate)),
            collected_at: Set(snapshot.collected_at),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert metric snapshot: {}", e)))?;

        Ok(result)
    }

    /// Most recently collected snapshot for a video.
    pub async fn latest_snapshot(
        &self,
        video_id: Uuid,
    ) -> AppResult<Option<metric_snapshot::Model>> {
        let result = MetricSnapshot::find()
            .filter(metric_snapshot::Column::VideoId.eq(video_id))
            .order_by_desc(metric_snapshot::Column::CollectedAt)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get latest snapshot: {}", e)))?;

        Ok(result)
    }

    /// Latest snapshot per video for the given ids (videos without snapshots are absent).
    pub async fn latest_snapshots_for(
        &self,
        video_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, metric_snapshot::Model>> {
        if video_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = MetricSnapshot::find()
            .filter(metric_snapshot::Column::VideoId.is_in(video_ids.iter().copied()))
            .distinct_on([metric_snapshot::Column::VideoId])
            .order_by_asc(metric_snapshot::Column::VideoId)
            .order_by_desc(metric_snapshot::Column::CollectedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get latest snapshots: {}", e)))?;

        Ok(rows.into_iter().map(|s| (s.video_id, s)).collect())
    }

    /// Every non-deleted video (any user) that has at least one snapshot, paired
    /// with its latest snapshot.
    pub async fn videos_with_latest_snapshot(
        &self,
    ) -> AppResult<Vec<(video::Model, metric_snapshot::Model)>> {
        let latest = MetricSnapshot::find()
            .distinct_on([metric_snapshot::Column::VideoId])
            .order_by_asc(metric_snapshot::Column::VideoId)
            .order_by_desc(metric_snapshot::Column::CollectedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to scan latest snapshots: {}", e)))?;

        if latest.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_video: HashMap<Uuid, metric_snapshot::Model> =
            latest.into_iter().map(|s| (s.video_id, s)).collect();

        let videos = Video::find()
            .filter(video::Column::Id.is_in(by_video.keys().copied().collect::<Vec<_>>()))
            .filter(video::Column::DeletedAt.is_null())
            .order_by_asc(video::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load measured videos: {}", e)))?;

        Ok(videos
            .into_iter()
            .filter_map(|v| by_video.remove(&v.id).map(|s| (v, s)))
            .collect())
    }
}
