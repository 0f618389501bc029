//! Migration: Create insights table (system-wide findings).

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
                CREATE TABLE insights (
                    id UUID PRIMARY KEY,
                    category VARCHAR(50) NOT NULL,
                    -- Cohort label, e.g. the content type
                    subject VARCHAR(255) NOT NULL,
                    -- YYYY-MM
                    period VARCHAR(7) NOT NULL,
                    insight_text TEXT NOT NULL,
                    confidence_score DOUBLE PRECISION NOT NULL,
                    sample_size INTEGER NOT NULL,
                    supporting_video_ids JSONB NOT NULL DEFAULT '[]'::jsonb,
                    status VARCHAR(20) NOT NULL DEFAULT 'active'
                        CHECK (status IN ('active', 'archived')),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- One insight per cohort per month; reruns update in place
                CREATE UNIQUE INDEX idx_insights_key ON insights(category, subject, period);

                CREATE INDEX idx_insights_active ON insights(created_at DESC)
                    WHERE status = 'active';

                CREATE TRIGGER update_insights_updated_at
                    BEFORE UPDATE ON insights
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
                DROP TRIGGER IF EXISTS update_insights_updated_at ON insights;
                DROP TABLE IF EXISTS insights CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
