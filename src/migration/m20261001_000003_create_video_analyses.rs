//! Migration: Create video_analyses table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE video_analyses (
                    id UUID PRIMARY KEY,
                    -- NULL for standalone manual entries
                    video_id UUID REFERENCES videos(id) ON DELETE CASCADE,
                    user_id VARCHAR(255) NOT NULL,
                    source_type VARCHAR(10) NOT NULL
                        CHECK (source_type IN ('ai', 'manual')),

                    -- Hook
                    hook_text TEXT,
                    hook_type VARCHAR(100),
                    hook_visual_element TEXT,
                    hook_effectiveness_score DOUBLE PRECISION,
                    hook_duration_seconds DOUBLE PRECISION,

                    -- Script
                    caption_cta TEXT,
                    full_script TEXT,
                    script_key_messages JSONB NOT NULL DEFAULT '[]'::jsonb,
                    voiceover_style VARCHAR(100),

                    -- Visual
                    visual_environment VARCHAR(100),
                    visual_lighting VARCHAR(100),
                    visual_camera_angles JSONB NOT NULL DEFAULT '[]'::jsonb,
                    visual_model_description TEXT,
                    visual_product_display VARCHAR(100),
                    visual_color_palette JSONB NOT NULL DEFAULT '[]'::jsonb,
                    visual_scene_breakdown JSONB NOT NULL DEFAULT '[]'::jsonb,

                    -- Classification
                    content_type_primary VARCHAR(100),
                    content_type_secondary VARCHAR(100),

                    -- CTA
                    cta_primary TEXT,
                    cta_type VARCHAR(100),
                    cta_placement VARCHAR(100),
                    cta_urgency VARCHAR(100),

                    campaign_category VARCHAR(100),

                    -- Full structured payload as received
                    raw_payload JSONB,
                    confidence_score DOUBLE PRECISION,
                    needs_human_review BOOLEAN NOT NULL DEFAULT FALSE,
                    performance_tracked BOOLEAN NOT NULL DEFAULT FALSE,
                    analysis_version VARCHAR(20) NOT NULL,

                    analyzed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- At most one analysis per video
                CREATE UNIQUE INDEX idx_video_analyses_video_id ON video_analyses(video_id)
                    WHERE video_id IS NOT NULL;

                -- Per-user library scan for pattern insights
                CREATE INDEX idx_video_analyses_user_id ON video_analyses(user_id, analyzed_at DESC);

                CREATE TRIGGER update_video_analyses_updated_at
                    BEFORE UPDATE ON video_analyses
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_video_analyses_updated_at ON video_analyses;
                DROP TABLE IF EXISTS video_analyses CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
