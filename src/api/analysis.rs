//! Video analysis API handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::UserAuth;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{
    AnalysisStatus, AnalysisStatusResponse, AnalyzeQuery, AnalyzeResponse,
    SaveManualAnalysisRequest, SaveManualAnalysisResponse, VideoAnalysis,
};
use crate::services::AnalysisProvider;
use crate::services::ingestion::{analyze_video, save_manual_analysis};

/// Analyze a video with the provider.
///
/// Returns the existing analysis unless `force=true`.
#[utoipa::path(
    post,
    path = "/videos/{video_id}/analyze",
    tag = "Analysis",
    params(
        ("video_id" = Uuid, Path, description = "Video UUID"),
        ("force" = Option<bool>, Query, description = "Re-analyze even if an analysis exists")
    ),
    responses(
        (status = 200, description = "Analysis stored or existing analysis returned", body = AnalyzeResponse),
        (status = 404, description = "Video not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Analysis already in progress", body = crate::error::ErrorResponse),
        (status = 422, description = "Provider reply could not be parsed", body = crate::error::ErrorResponse),
        (status = 502, description = "Provider failure", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn analyze(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    provider: web::Data<dyn AnalysisProvider>,
    path: web::Path<Uuid>,
    query: web::Query<AnalyzeQuery>,
) -> AppResult<HttpResponse> {
    let video = pool.get_user_video(&auth.user_id, path.into_inner()).await?;

    let response = analyze_video(
        &pool,
        provider.get_ref(),
        config.batch.review_confidence,
        &video,
        query.force,
    )
    .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Analysis status of a video, with the analysis when one exists.
#[utoipa::path(
    get,
    path = "/videos/{video_id}/analysis",
    tag = "Analysis",
    params(("video_id" = Uuid, Path, description = "Video UUID")),
    responses(
        (status = 200, description = "Analysis status", body = AnalysisStatusResponse),
        (status = 404, description = "Video not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn get_analysis_status(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let video = pool.get_user_video(&auth.user_id, path.into_inner()).await?;
    let analysis = pool.get_analysis_by_video(video.id).await?;

    Ok(HttpResponse::Ok().json(AnalysisStatusResponse {
        video_id: video.id,
        status: AnalysisStatus::parse(&video.analysis_status).unwrap_or(AnalysisStatus::Pending),
        has_analysis: analysis.is_some(),
        analysis: analysis.map(VideoAnalysis::from),
    }))
}

/// Save a manually authored analysis.
#[utoipa::path(
    post,
    path = "/analysis/manual",
    tag = "Analysis",
    request_body = SaveManualAnalysisRequest,
    responses(
        (status = 201, description = "Analysis saved", body = SaveManualAnalysisResponse),
        (status = 400, description = "Invalid analysis", body = crate::error::ErrorResponse),
        (status = 404, description = "Linked video not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Linked video is being analyzed", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn save_manual(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    body: web::Json<SaveManualAnalysisRequest>,
) -> AppResult<HttpResponse> {
    let stored = save_manual_analysis(&pool, &auth.user_id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(SaveManualAnalysisResponse {
        success: true,
        data: VideoAnalysis::from(stored),
    }))
}

/// Configure analysis routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/videos/{video_id}/analyze").route(web::post().to(analyze)))
        .service(
            web::resource("/videos/{video_id}/analysis").route(web::get().to(get_analysis_status)),
        )
        .service(web::resource("/analysis/manual").route(web::post().to(save_manual)));
}
