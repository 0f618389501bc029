//! Canonical creative-attribute analysis entity.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "video_analyses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Unique when present; NULL for standalone manual entries.
    pub video_id: Option<Uuid>,
    pub user_id: String,
    /// Provenance: ai or manual
    pub source_type: String,

    // Hook
    pub hook_text: Option<String>,
    pub hook_type: Option<String>,
    pub hook_visual_element: Option<String>,
    pub hook_effectiveness_score: Option<f64>,
    pub hook_duration_seconds: Option<f64>,

    // Script
    pub caption_cta: Option<String>,
    pub full_script: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub script_key_messages: JsonValue,
    pub voiceover_style: Option<String>,

    // Visual
    pub visual_environment: Option<String>,
    pub visual_lighting: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub visual_camera_angles: JsonValue,
    pub visual_model_description: Option<String>,
    pub visual_product_display: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub visual_color_palette: JsonValue,
    #[sea_orm(column_type = "JsonBinary")]
    pub visual_scene_breakdown: JsonValue,

    // Classification
    pub content_type_primary: Option<String>,
    pub content_type_secondary: Option<String>,

    // CTA
    pub cta_primary: Option<String>,
    pub cta_type: Option<String>,
    pub cta_placement: Option<String>,
    pub cta_urgency: Option<String>,

    pub campaign_category: Option<String>,

    /// Full structured payload as received.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub raw_payload: Option<JsonValue>,
    pub confidence_score: Option<f64>,
    pub needs_human_review: bool,
    pub performance_tracked: bool,
    pub analysis_version: String,
    pub analyzed_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id",
        on_delete = "Cascade"
    )]
    Video,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
