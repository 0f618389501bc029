//! Migration: Create user_pattern_insights table (per-user insight cache).

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
                CREATE TABLE user_pattern_insights (
                    user_id VARCHAR(255) PRIMARY KEY,
                    insights JSONB NOT NULL DEFAULT '[]'::jsonb,
                    video_count INTEGER NOT NULL DEFAULT 0,
                    calculated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    expires_at TIMESTAMPTZ NOT NULL
                );
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS user_pattern_insights CASCADE;")
            .await?;

        Ok(())
    }
}
