//! Clip insight server - main entry point.
//!
//! Starts the Actix-web server with configured routes, middleware and
//! background tasks.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use clipinsight_lib::api::{self, ApiDoc};
use clipinsight_lib::auth::JobKey;
use clipinsight_lib::config::Config;
use clipinsight_lib::db::DbPool;
use clipinsight_lib::error::AppError;
use clipinsight_lib::middleware::RequestLogger;
use clipinsight_lib::services::{self, provider};

/// Largest accepted JSON body (provider imports can be large).
const JSON_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let Some(static_dir) = req.app_data::<web::Data<PathBuf>>() else {
        return Err(actix_web::error::ErrorNotFound("Static files not configured"));
    };
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Docker HEALTHCHECK: only verify the configuration loads
    if std::env::args().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if Config::from_env().is_ok() { 0 } else { 1 });
    }

    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and CI_SESSION_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Clip Insight Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let analysis_provider = match provider::from_settings(&config.provider) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to initialize analysis provider: {}", e);
            std::process::exit(1);
        }
    };

    // Background tasks
    let shared_pool = Arc::new(pool.clone());
    services::start_batch_task(
        shared_pool.clone(),
        analysis_provider.clone(),
        config.batch.clone(),
    );
    services::start_insight_task(shared_pool.clone(), config.global_insights.clone());
    services::start_stale_recovery_task(shared_pool, config.batch.clone());

    if config.job_key.is_none() {
        info!("CI_JOB_KEY not set; job trigger endpoints are disabled");
    }

    let bind_address = config.bind_address();
    let job_key = JobKey::new(config.job_key.clone());
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();
    let provider_data: web::Data<dyn services::AnalysisProvider> =
        web::Data::from(analysis_provider);
    let openapi = ApiDoc::openapi();

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!("Starting server at http://{} ({} workers)", bind_address, cpus);
        cpus
    };

    let server = HttpServer::new(move || {
        let allowed_headers = vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-job-key"),
        ];

        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers)
                .max_age(3600)
        } else {
            // Same-origin only in production
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(allowed_headers)
                .max_age(3600)
        };

        let json_config = web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into());

        let mut app = App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(json_config)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(job_key.clone()))
            .app_data(provider_data.clone())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_video_routes)
                    .configure(api::configure_analysis_routes)
                    .configure(api::configure_pattern_routes)
                    .configure(api::configure_insight_routes)
                    .configure(api::configure_job_routes),
            );

        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .service(Files::new("/favicon", dir.clone()).index_file("favicon.ico"))
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
