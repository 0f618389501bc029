//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_videos;
mod m20261001_000002_create_metric_snapshots;
mod m20261001_000003_create_video_analyses;
mod m20261001_000004_create_user_pattern_insights;
mod m20261001_000005_create_insights;
mod m20261001_000006_create_best_practices;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_videos::Migration),
            Box::new(m20261001_000002_create_metric_snapshots::Migration),
            Box::new(m20261001_000003_create_video_analyses::Migration),
            Box::new(m20261001_000004_create_user_pattern_insights::Migration),
            Box::new(m20261001_000005_create_insights::Migration),
            Box::new(m20261001_000006_create_best_practices::Migration),
        ]
    }
}
