//! SeaORM entity definitions for PostgreSQL database.

pub mod best_practice;
pub mod insight;
pub mod metric_snapshot;
pub mod user_pattern_insight;
pub mod video;
pub mod video_analysis;
