//! Global insight and best practice endpoints.

use actix_web::{HttpResponse, web};

use crate::auth::UserAuth;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{BestPractice, GlobalInsightsResponse, Insight, ListInsightsQuery};

/// Active global insights and best practices.
#[utoipa::path(
    get,
    path = "/insights/global",
    tag = "Insights",
    params(
        ("category" = Option<String>, Query, description = "Filter insights by category"),
        ("limit" = Option<u64>, Query, description = "Maximum rows per list (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Global insights", body = GlobalInsightsResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn list_global_insights(
    _auth: UserAuth,
    pool: web::Data<DbPool>,
    query: web::Query<ListInsightsQuery>,
) -> AppResult<HttpResponse> {
    let limit = query.clamped_limit();
    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());

    let insights = pool.list_active_insights(category, limit).await?;
    let best_practices = pool.list_active_best_practices(limit).await?;

    Ok(HttpResponse::Ok().json(GlobalInsightsResponse {
        insights: insights.into_iter().map(Insight::from).collect(),
        best_practices: best_practices.into_iter().map(BestPractice::from).collect(),
    }))
}

/// Configure global insight routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/insights/global").route(web::get().to(list_global_insights)));
}
