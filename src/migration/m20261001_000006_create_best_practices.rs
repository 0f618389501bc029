//! Migration: Create best_practices table.

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
                CREATE TABLE best_practices (
                    id UUID PRIMARY KEY,
                    practice_type VARCHAR(50) NOT NULL,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    example_video_ids JSONB NOT NULL DEFAULT '[]'::jsonb,
                    performance_avg DOUBLE PRECISION,
                    use_count INTEGER NOT NULL DEFAULT 0,
                    status VARCHAR(20) NOT NULL DEFAULT 'active'
                        CHECK (status IN ('active', 'archived')),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Containment lookups on example video ids
                CREATE INDEX idx_best_practices_examples ON best_practices
                    USING GIN (example_video_ids);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS best_practices CASCADE;")
            .await?;

        Ok(())
    }
}
