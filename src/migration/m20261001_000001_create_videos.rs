//! Migration: Create videos table.
//!
//! Also installs the shared `update_updated_at_column()` trigger function.

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
                CREATE OR REPLACE FUNCTION update_updated_at_column()
                RETURNS TRIGGER AS $$
                BEGIN
                    NEW.updated_at = NOW();
                    RETURN NEW;
                END;
                $$ LANGUAGE plpgsql;

                CREATE TABLE videos (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    user_id VARCHAR(255) NOT NULL,

                    filename VARCHAR(500) NOT NULL,
                    file_url TEXT,
                    thumbnail_url TEXT,

                    -- Provider identity (set for imported videos)
                    tiktok_video_id VARCHAR(64),
                    tiktok_url TEXT,

                    hook VARCHAR(280),
                    caption TEXT,
                    script TEXT,
                    description TEXT,
                    content_type VARCHAR(100),
                    campaign_tag VARCHAR(100),
                    duration_seconds INTEGER,

                    -- Ingestion lifecycle
                    analysis_status VARCHAR(20) NOT NULL DEFAULT 'pending'
                        CHECK (analysis_status IN ('pending', 'processing', 'completed', 'needs_review', 'failed')),
                    analysis_priority INTEGER NOT NULL DEFAULT 0,
                    analysis_started_at TIMESTAMPTZ,
                    analysis_error TEXT,

                    upload_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                -- Library listing (active videos only)
                CREATE INDEX idx_videos_user_id ON videos(user_id, created_at DESC)
                    WHERE deleted_at IS NULL;

                -- Batch analysis selection
                CREATE INDEX idx_videos_pending ON videos(analysis_priority DESC, created_at DESC)
                    WHERE analysis_status = 'pending' AND deleted_at IS NULL;

                -- Stale processing recovery
                CREATE INDEX idx_videos_processing ON videos(analysis_started_at)
                    WHERE analysis_status = 'processing';

                -- Provider import matching
                CREATE UNIQUE INDEX idx_videos_tiktok_video_id ON videos(user_id, tiktok_video_id)
                    WHERE tiktok_video_id IS NOT NULL;

                CREATE TRIGGER update_videos_updated_at
                    BEFORE UPDATE ON videos
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
                DROP TRIGGER IF EXISTS update_videos_updated_at ON videos;
                DROP TABLE IF EXISTS videos CASCADE;
                DROP FUNCTION IF EXISTS update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }
}
