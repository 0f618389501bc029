//! Per-user winning-formula pattern endpoints.

use actix_web::{HttpResponse, web};

use crate::auth::UserAuth;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{CachedPatternInsights, PatternOutcome};
use crate::services::patterns::{cached_user_patterns, compute_user_patterns};

/// Recompute the caller's pattern insights.
///
/// Responds 200 with `success: false` when the library is too small.
#[utoipa::path(
    post,
    path = "/insights/patterns",
    tag = "Insights",
    responses(
        (status = 200, description = "Pattern report or insufficient-data notice", body = PatternOutcome),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn compute_patterns(
    auth: UserAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let outcome = compute_user_patterns(&pool, &config.insights, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// The caller's cached pattern insights, if still fresh.
#[utoipa::path(
    get,
    path = "/insights/patterns",
    tag = "Insights",
    responses(
        (status = 200, description = "Cached insights", body = CachedPatternInsights),
        (status = 404, description = "No fresh insights cached", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn get_cached_patterns(
    auth: UserAuth,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    match cached_user_patterns(&pool, &auth.user_id).await? {
        Some(cached) => Ok(HttpResponse::Ok().json(cached)),
        None => Err(AppError::NotFound("Pattern insights".to_string())),
    }
}

/// Configure pattern routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/insights/patterns")
            .route(web::get().to(get_cached_patterns))
            .route(web::post().to(compute_patterns)),
    );
}
