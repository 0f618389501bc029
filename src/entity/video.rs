//! Video entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "videos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub filename: String,
    pub file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Provider-side video id (unique when present).
    pub tiktok_video_id: Option<String>,
    pub tiktok_url: Option<String>,
    pub hook: Option<String>,
    pub caption: Option<String>,
    pub script: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub campaign_tag: Option<String>,
    pub duration_seconds: Option<i32>,
    /// Analysis lifecycle: pending, processing, completed, needs_review, failed
    pub analysis_status: String,
    pub analysis_priority: i32,
    /// Set when the video enters `processing`; used for stale recovery.
    pub analysis_started_at: Option<DateTimeUtc>,
    pub analysis_error: Option<String>,
    pub upload_date: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::metric_snapshot::Entity")]
    MetricSnapshots,
    #[sea_orm(has_one = "super::video_analysis::Entity")]
    Analysis,
}

impl Related<super::metric_snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MetricSnapshots.def()
    }
}

impl Related<super::video_analysis::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Analysis.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
