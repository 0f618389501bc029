//! OpenAPI documentation configuration.

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};

use crate::config::JOB_KEY_HEADER;
use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clip Insight Server",
        version = "0.1.0",
        description = "API server for short-form video analysis, performance tracking and winning-formula insights"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        api::health::info,
        // Video endpoints
        api::videos::create_video,
        api::videos::list_videos,
        api::videos::get_video,
        api::videos::delete_video,
        api::videos::add_metrics,
        api::videos::import_videos,
        // Analysis endpoints
        api::analysis::analyze,
        api::analysis::get_analysis_status,
        api::analysis::save_manual,
        // Insight endpoints
        api::patterns::compute_patterns,
        api::patterns::get_cached_patterns,
        api::insights::list_global_insights,
        // Job endpoints
        api::jobs::trigger_batch_analysis,
        api::jobs::trigger_insight_generation,
        api::jobs::trigger_stale_recovery,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::Pagination,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            api::health::ServerInfoResponse,
            // Videos
            models::AnalysisStatus,
            models::Video,
            models::VideoWithMetrics,
            models::CreateVideoRequest,
            models::VideoListResponse,
            models::MetricSnapshot,
            models::RecordMetricsRequest,
            models::ProviderVideo,
            models::ImportVideosRequest,
            models::ImportVideosResponse,
            // Analysis
            models::analysis::HookType,
            models::analysis::VoiceoverStyle,
            models::analysis::VisualEnvironment,
            models::analysis::Lighting,
            models::analysis::ProductDisplay,
            models::analysis::ContentCategory,
            models::analysis::CtaType,
            models::analysis::CtaPlacement,
            models::analysis::Urgency,
            models::CampaignCategory,
            models::AnalysisSource,
            models::StructuredAnalysis,
            models::ManualAnalysis,
            models::VideoAnalysis,
            models::AnalyzeResponse,
            models::AnalysisStatusResponse,
            models::SaveManualAnalysisRequest,
            models::SaveManualAnalysisResponse,
            // Insights
            models::PatternCategory,
            models::ConfidenceLevel,
            models::PatternInsight,
            models::PatternReport,
            models::InsufficientData,
            models::PatternOutcome,
            models::CachedPatternInsights,
            models::InsightStatus,
            models::Insight,
            models::BestPractice,
            models::GlobalInsightsResponse,
            // Jobs
            models::BatchAnalysisRequest,
            models::BatchAnalysisSummary,
            models::GenerationSummary,
            api::jobs::RecoverStaleResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Videos", description = "Video library and metric snapshots"),
        (name = "Analysis", description = "Provider and manual video analysis"),
        (name = "Insights", description = "Per-user patterns and global insights"),
        (name = "Jobs", description = "Batch and generation triggers for schedulers")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add session and job key security schemes.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "job_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(JOB_KEY_HEADER))),
            );
        }
    }
}
