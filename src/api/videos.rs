//! Video library API handlers.

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::UserAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateVideoRequest, ImportVideosRequest, ImportVideosResponse, ListVideosQuery,
    MetricSnapshot, Pagination, RecordMetricsRequest, Video, VideoListResponse, VideoWithMetrics,
};
use crate::services::library::{import_provider_videos, record_metrics};

/// Register a video for the caller.
#[utoipa::path(
    post,
    path = "/videos",
    tag = "Videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video created", body = Video),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn create_video(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CreateVideoRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    request.validate().map_err(AppError::InvalidInput)?;

    let video = pool.insert_video(&auth.user_id, &request).await?;
    info!(user_id = %auth.user_id, video_id = %video.id, "Video created");

    Ok(HttpResponse::Created().json(Video::from(video)))
}

/// List the caller's videos with their latest metrics.
#[utoipa::path(
    get,
    path = "/videos",
    tag = "Videos",
    params(
        ("search" = Option<String>, Query, description = "Match hook, caption, description or filename"),
        ("content_type" = Option<String>, Query, description = "Filter by content type"),
        ("campaign_tag" = Option<String>, Query, description = "Filter by campaign tag"),
        ("status" = Option<String>, Query, description = "Filter by analysis status"),
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Results per page (default 10, max 100)")
    ),
    responses(
        (status = 200, description = "Paginated videos", body = VideoListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn list_videos(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    query: web::Query<ListVideosQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let (videos, total) = pool.list_videos(&auth.user_id, &query).await?;

    let ids: Vec<Uuid> = videos.iter().map(|v| v.id).collect();
    let mut latest = pool.latest_snapshots_for(&ids).await?;

    let data = videos
        .into_iter()
        .map(|video| VideoWithMetrics {
            current_metrics: latest.remove(&video.id).map(MetricSnapshot::from),
            video: Video::from(video),
        })
        .collect();

    Ok(HttpResponse::Ok().json(VideoListResponse {
        data,
        pagination: Pagination::new(query.page.max(1), query.clamped_limit(), total),
    }))
}

/// Get one video with its current metrics.
#[utoipa::path(
    get,
    path = "/videos/{video_id}",
    tag = "Videos",
    params(("video_id" = Uuid, Path, description = "Video UUID")),
    responses(
        (status = 200, description = "Video details", body = VideoWithMetrics),
        (status = 404, description = "Video not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn get_video(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let video = pool.get_user_video(&auth.user_id, path.into_inner()).await?;
    let current_metrics = pool.latest_snapshot(video.id).await?.map(MetricSnapshot::from);

    Ok(HttpResponse::Ok().json(VideoWithMetrics {
        video: Video::from(video),
        current_metrics,
    }))
}

/// Soft-delete one of the caller's videos.
#[utoipa::path(
    delete,
    path = "/videos/{video_id}",
    tag = "Videos",
    params(("video_id" = Uuid, Path, description = "Video UUID")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 404, description = "Video not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn delete_video(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let video_id = path.into_inner();
    if !pool.soft_delete_video(&auth.user_id, video_id).await? {
        return Err(AppError::NotFound(format!("Video {}", video_id)));
    }

    info!(user_id = %auth.user_id, video_id = %video_id, "Video deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Append a metric snapshot to a video.
#[utoipa::path(
    post,
    path = "/videos/{video_id}/metrics",
    tag = "Videos",
    params(("video_id" = Uuid, Path, description = "Video UUID")),
    request_body = RecordMetricsRequest,
    responses(
        (status = 201, description = "Snapshot recorded", body = MetricSnapshot),
        (status = 400, description = "Invalid counters", body = crate::error::ErrorResponse),
        (status = 404, description = "Video not found", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn add_metrics(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<RecordMetricsRequest>,
) -> AppResult<HttpResponse> {
    let snapshot = record_metrics(&pool, &auth.user_id, path.into_inner(), &body).await?;
    Ok(HttpResponse::Created().json(MetricSnapshot::from(snapshot)))
}

/// Import provider video records for the caller.
#[utoipa::path(
    post,
    path = "/videos/import",
    tag = "Videos",
    request_body = ImportVideosRequest,
    responses(
        (status = 200, description = "Import summary", body = ImportVideosResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn import_videos(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    body: web::Json<ImportVideosRequest>,
) -> AppResult<HttpResponse> {
    let summary = import_provider_videos(&pool, &auth.user_id, &body).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Configure video routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/videos")
            .route(web::get().to(list_videos))
            .route(web::post().to(create_video)),
    )
    .service(web::resource("/videos/import").route(web::post().to(import_videos)))
    .service(
        web::resource("/videos/{video_id}")
            .route(web::get().to(get_video))
            .route(web::delete().to(delete_video)),
    )
    .service(web::resource("/videos/{video_id}/metrics").route(web::post().to(add_metrics)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    #[actix_rt::test]
    async fn test_video_routes_require_session() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/videos").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::delete()
            .uri(&format!("/videos/{}", Uuid::now_v7()))
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
