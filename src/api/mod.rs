//! API endpoint modules.

pub mod analysis;
pub mod health;
pub mod insights;
pub mod jobs;
pub mod openapi;
pub mod patterns;
pub mod videos;

pub use analysis::configure_routes as configure_analysis_routes;
pub use health::configure_health_routes;
pub use insights::configure_routes as configure_insight_routes;
pub use jobs::configure_routes as configure_job_routes;
pub use openapi::ApiDoc;
pub use patterns::configure_routes as configure_pattern_routes;
pub use videos::configure_routes as configure_video_routes;
