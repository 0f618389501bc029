//! System-wide insight entity.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "insights")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category: String,
    /// Cohort the insight is about (e.g. the content type label).
    pub subject: String,
    /// Calendar month the insight was generated for (YYYY-MM).
    pub period: String,
    pub insight_text: String,
    pub confidence_score: f64,
    pub sample_size: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub supporting_video_ids: JsonValue,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
