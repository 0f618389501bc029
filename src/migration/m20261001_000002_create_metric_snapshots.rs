//! Migration: Create metric_snapshots table.
//!
//! Append-only time series; the latest row per video is its current metrics.

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
                CREATE TABLE metric_snapshots (
                    id UUID PRIMARY KEY,
                    video_id UUID NOT NULL REFERENCES videos(id) ON DELETE CASCADE,

                    views BIGINT NOT NULL DEFAULT 0 CHECK (views >= 0),
                    likes BIGINT NOT NULL DEFAULT 0 CHECK (likes >= 0),
                    comments BIGINT NOT NULL DEFAULT 0 CHECK (comments >= 0),
                    shares BIGINT NOT NULL DEFAULT 0 CHECK (shares >= 0),

                    -- Percentage; provider-supplied or derived from the counters
                    engagement_rate DOUBLE PRECISION,

                    collected_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Latest snapshot lookup
                CREATE INDEX idx_metric_snapshots_video_collected
                    ON metric_snapshots(video_id, collected_at DESC);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS metric_snapshots CASCADE;")
            .await?;

        Ok(())
    }
}
