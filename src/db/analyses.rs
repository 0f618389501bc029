//! Database queries for video analyses.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde_json::json;
use uuid::Uuid;

use crate::entity::metric_snapshot;
use crate::entity::video::{self, Entity as Video};
use crate::entity::video_analysis::{self, ActiveModel, Entity as VideoAnalysis};
use crate::error::{AppError, AppResult};
use crate::models::{ANALYSIS_VERSION, CanonicalAnalysis};

use super::DbPool;

/// Build a full active model from a canonical attribute set.
fn active_model(
    id: Uuid,
    video_id: Option<Uuid>,
    user_id: &str,
    analysis: &CanonicalAnalysis,
    created_at: DateTime<Utc>,
) -> ActiveModel {
    let now = Utc::now();

    ActiveModel {
        id: Set(id),
        video_id: Set(video_id),
        user_id: Set(user_id.to_string()),
        source_type: Set(analysis.source.as_str().to_string()),
        hook_text: Set(analysis.hook_text.clone()),
        hook_type: Set(analysis.hook_type.clone()),
        hook_visual_element: Set(analysis.hook_visual_element.clone()),
        hook_effectiveness_score: Set(analysis.hook_effectiveness_score),
        hook_duration_seconds: Set(analysis.hook_duration_seconds),
        caption_cta: Set(analysis.caption_cta.clone()),
        full_script: Set(analysis.full_script.clone()),
        script_key_messages: Set(json!(analysis.script_key_messages)),
        voiceover_style: Set(analysis.voiceover_style.clone()),
        visual_environment: Set(analysis.visual_environment.clone()),
        visual_lighting: Set(analysis.visual_lighting.clone()),
        visual_camera_angles: Set(json!(analysis.visual_camera_angles)),
        visual_model_description: Set(analysis.visual_model_description.clone()),
        visual_product_display: Set(analysis.visual_product_display.clone()),
        visual_color_palette: Set(json!(analysis.visual_color_palette)),
        visual_scene_breakdown: Set(json!(analysis.visual_scene_breakdown)),
        content_type_primary: Set(analysis.content_type_primary.clone()),
        content_type_secondary: Set(analysis.content_type_secondary.clone()),
        cta_primary: Set(analysis.cta_primary.clone()),
        cta_type: Set(analysis.cta_type.clone()),
        cta_placement: Set(analysis.cta_placement.clone()),
        cta_urgency: Set(analysis.cta_urgency.clone()),
        campaign_category: Set(analysis.campaign_category.clone()),
        raw_payload: Set(Some(analysis.raw_payload.clone())),
        confidence_score: Set(analysis.confidence_score),
        needs_human_review: Set(analysis.needs_human_review),
        performance_tracked: Set(analysis.performance_tracked),
        analysis_version: Set(ANALYSIS_VERSION.to_string()),
        analyzed_at: Set(now),
        created_at: Set(created_at),
        updated_at: Set(now),
    }
}

impl DbPool {
    /// Store the analysis for a video, replacing any previous one wholesale.
    pub async fn upsert_video_analysis(
        &self,
        video_id: Uuid,
        user_id: &str,
        analysis: &CanonicalAnalysis,
    ) -> AppResult<video_analysis::Model> {
        let existing = self.get_analysis_by_video(video_id).await?;

        let result = match existing {
            Some(previous) => active_model(
                previous.id,
                Some(video_id),
                user_id,
                analysis,
                previous.created_at,
            )
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to replace analysis: {}", e)))?,
            None => active_model(Uuid::now_v7(), Some(video_id), user_id, analysis, Utc::now())
                .insert(self.connection())
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert analysis: {}", e)))?,
        };

        Ok(result)
    }

    /// Store a standalone analysis not linked to any video.
    pub async fn insert_standalone_analysis(
        &self,
        user_id: &str,
        analysis: &CanonicalAnalysis,
    ) -> AppResult<video_analysis::Model> {
        let result = active_model(Uuid::now_v7(), None, user_id, analysis, Utc::now())
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert analysis: {}", e)))?;

        Ok(result)
    }

    /// Get the analysis linked to a video.
    pub async fn get_analysis_by_video(
        &self,
        video_id: Uuid,
    ) -> AppResult<Option<video_analysis::Model>> {
        let result = VideoAnalysis::find()
            .filter(video_analysis::Column::VideoId.eq(video_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get analysis: {}", e)))?;

        Ok(result)
    }

    /// All of a user's analyses (newest first), each with its video's latest
    /// snapshot. Analyses of soft-deleted videos are excluded.
    pub async fn user_analyses_with_latest_snapshot(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<(video_analysis::Model, Option<metric_snapshot::Model>)>> {
        let analyses = VideoAnalysis::find()
            .filter(video_analysis::Column::UserId.eq(user_id))
            .order_by_desc(video_analysis::Column::AnalyzedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list analyses: {}", e)))?;

        let video_ids: Vec<Uuid> = analyses.iter().filter_map(|a| a.video_id).collect();
        if video_ids.is_empty() {
            return Ok(analyses.into_iter().map(|a| (a, None)).collect());
        }

        let deleted: HashSet<Uuid> = Video::find()
            .filter(video::Column::Id.is_in(video_ids.clone()))
            .filter(video::Column::DeletedAt.is_not_null())
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check deleted videos: {}", e)))?
            .into_iter()
            .map(|v| v.id)
            .collect();

        let mut latest = self.latest_snapshots_for(&video_ids).await?;

        Ok(analyses
            .into_iter()
            .filter(|a| a.video_id.is_none_or(|id| !deleted.contains(&id)))
            .map(|a| {
                let snapshot = a.video_id.and_then(|id| latest.remove(&id));
                (a, snapshot)
            })
            .collect())
    }
}
