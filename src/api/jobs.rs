//! Job trigger endpoints for external schedulers.
//!
//! Every route requires the `X-Job-Key` header.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::JobAuth;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{BatchAnalysisRequest, BatchAnalysisSummary, GenerationSummary};
use crate::services::AnalysisProvider;
use crate::services::batch::{batch_analyze, recover_stale_analyses};
use crate::services::global_insights::generate_global_insights;

/// Result of a stale-processing recovery run.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecoverStaleResponse {
    pub reset: u64,
}

/// An empty body means "use the configured defaults"; anything else must parse.
fn parse_batch_request(body: &[u8]) -> AppResult<BatchAnalysisRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BatchAnalysisRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid batch request: {}", e)))
}

/// Analyze pending videos in priority order.
#[utoipa::path(
    post,
    path = "/jobs/batch-analyze",
    tag = "Jobs",
    request_body(content = Option<BatchAnalysisRequest>, description = "Overrides for limit and delay"),
    responses(
        (status = 200, description = "Batch summary", body = BatchAnalysisSummary),
        (status = 400, description = "Malformed request body", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid job key", body = crate::error::ErrorResponse),
    ),
    security(("job_key" = []))
)]
pub async fn trigger_batch_analysis(
    _auth: JobAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    provider: web::Data<dyn AnalysisProvider>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let request = parse_batch_request(&body)?;
    let limit = request.limit.unwrap_or(config.batch.limit);
    let delay_ms = request.delay_ms.unwrap_or(config.batch.delay_ms);

    info!(limit, delay_ms, "Batch analysis triggered");
    let summary = batch_analyze(&pool, provider.get_ref(), &config.batch, limit, delay_ms).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Regenerate cross-user insights and best practices.
#[utoipa::path(
    post,
    path = "/jobs/generate-insights",
    tag = "Jobs",
    responses(
        (status = 200, description = "Generation summary", body = GenerationSummary),
        (status = 401, description = "Missing or invalid job key", body = crate::error::ErrorResponse),
    ),
    security(("job_key" = []))
)]
pub async fn trigger_insight_generation(
    _auth: JobAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Global insight generation triggered");
    let summary = generate_global_insights(&pool, &config.global_insights).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Requeue videos stuck in `processing`.
#[utoipa::path(
    post,
    path = "/jobs/recover-stale",
    tag = "Jobs",
    responses(
        (status = 200, description = "Number of videos requeued", body = RecoverStaleResponse),
        (status = 401, description = "Missing or invalid job key", body = crate::error::ErrorResponse),
    ),
    security(("job_key" = []))
)]
pub async fn trigger_stale_recovery(
    _auth: JobAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let reset = recover_stale_analyses(&pool, &config.batch).await?;
    Ok(HttpResponse::Ok().json(RecoverStaleResponse { reset }))
}

/// Configure job trigger routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/jobs/batch-analyze").route(web::post().to(trigger_batch_analysis)))
        .service(
            web::resource("/jobs/generate-insights")
                .route(web::post().to(trigger_insight_generation)),
        )
        .service(web::resource("/jobs/recover-stale").route(web::post().to(trigger_stale_recovery)));
}
