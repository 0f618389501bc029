//! Database queries for global insights and best practices.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::entity::best_practice::{self, Entity as BestPractice};
use crate::entity::insight::{self, Entity as Insight};
use crate::error::{AppError, AppResult};
use crate::models::{HIGH_PERFORMER_PRACTICE, InsightStatus};

use super::DbPool;

/// A content-type insight ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInsight {
    pub category: String,
    pub subject: String,
    pub period: String,
    pub insight_text: String,
    pub confidence_score: f64,
    pub sample_size: i32,
    pub supporting_video_ids: Vec<Uuid>,
}

/// A best-practice exemplar ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBestPractice {
    pub title: String,
    pub content: String,
    pub video_id: Uuid,
    pub performance_avg: f64,
}

impl DbPool {
    /// Insert or refresh the insight for `(category, subject, period)`.
    pub async fn upsert_insight(&self, new: &NewInsight) -> AppResult<()> {
        let now = Utc::now();

        let model = insight::ActiveModel {
            id: Set(Uuid::now_v7()),
            category: Set(new.category.clone()),
            subject: Set(new.subject.clone()),
            period: Set(new.period.clone()),
            insight_text: Set(new.insight_text.clone()),
            confidence_score: Set(new.confidence_score),
            sample_size: Set(new.sample_size),
            supporting_video_ids: Set(json!(new.supporting_video_ids)),
            status: Set(InsightStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Insight::insert(model)
            .on_conflict(
                OnConflict::columns([
                    insight::Column::Category,
                    insight::Column::Subject,
                    insight::Column::Period,
                ])
                .update_columns([
                    insight::Column::InsightText,
                    insight::Column::ConfidenceScore,
                    insight::Column::SampleSize,
                    insight::Column::SupportingVideoIds,
                    insight::Column::Status,
                    insight::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to upsert insight: {}", e)))?;

        Ok(())
    }

    /// Whether any best practice already lists `video_id` among its examples.
    pub async fn best_practice_exists_for_video(&self, video_id: Uuid) -> AppResult<bool> {
        let count = BestPractice::find()
            .filter(Expr::cust_with_values(
                "example_video_ids @> $1::jsonb",
                [json!([video_id])],
            ))
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check best practices: {}", e)))?;

        Ok(count > 0)
    }

    /// Insert a high-performer best practice for one video.
    pub async fn insert_best_practice(
        &self,
        new: &NewBestPractice,
    ) -> AppResult<best_practice::Model> {
        let model = best_practice::ActiveModel {
            id: Set(Uuid::now_v7()),
            practice_type: Set(HIGH_PERFORMER_PRACTICE.to_string()),
            title: Set(new.title.clone()),
            content: Set(new.content.clone()),
            example_video_ids: Set(json!([new.video_id])),
            performance_avg: Set(Some(new.performance_avg)),
            use_count: Set(0),
            status: Set(InsightStatus::Active.as_str().to_string()),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert best practice: {}", e)))?;

        Ok(result)
    }

    /// Active insights, newest first.
    pub async fn list_active_insights(
        &self,
        category: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<insight::Model>> {
        let mut select =
            Insight::find().filter(insight::Column::Status.eq(InsightStatus::Active.as_str()));

        if let Some(category) = category {
            select = select.filter(insight::Column::Category.eq(category));
        }

        let result = select
            .order_by_desc(insight::Column::UpdatedAt)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list insights: {}", e)))?;

        Ok(result)
    }

    /// Active best practices, newest first.
    pub async fn list_active_best_practices(
        &self,
        limit: u64,
    ) -> AppResult<Vec<best_practice::Model>> {
        let result = BestPractice::find()
            .filter(best_practice::Column::Status.eq(InsightStatus::Active.as_str()))
            .order_by_desc(best_practice::Column::CreatedAt)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list best practices: {}", e)))?;

        Ok(result)
    }
}
