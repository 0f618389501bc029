//! Database queries for the per-user pattern insight cache.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::Value as JsonValue;

use crate::entity::user_pattern_insight::{self, ActiveModel, Entity as UserPatternInsight};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Replace the user's cached insight snapshot.
    pub async fn put_user_pattern_insights(
        &self,
        user_id: &str,
        insights: JsonValue,
        video_count: i32,
        calculated_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let model = ActiveModel {
            user_id: Set(user_id.to_string()),
            insights: Set(insights),
            video_count: Set(video_count),
            calculated_at: Set(calculated_at),
            expires_at: Set(expires_at),
        };

        UserPatternInsight::insert(model)
            .on_conflict(
                OnConflict::column(user_pattern_insight::Column::UserId)
                    .update_columns([
                        user_pattern_insight::Column::Insights,
                        user_pattern_insight::Column::VideoCount,
                        user_pattern_insight::Column::CalculatedAt,
                        user_pattern_insight::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to store pattern insights: {}", e))
            })?;

        Ok(())
    }

    /// The user's cached snapshot, if it has not expired at `now`.
    pub async fn get_user_pattern_insights(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<user_pattern_insight::Model>> {
        let result = UserPatternInsight::find_by_id(user_id.to_string())
            .filter(user_pattern_insight::Column::ExpiresAt.gt(now))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get pattern insights: {}", e)))?;

        Ok(result)
    }
}
