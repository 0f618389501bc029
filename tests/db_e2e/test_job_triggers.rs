//! Job trigger endpoints over HTTP.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use clipinsight_lib::api;
use clipinsight_lib::auth::JobKey;
use clipinsight_lib::config::{Config, JOB_KEY_HEADER};
use clipinsight_lib::services::AnalysisProvider;
use clipinsight_lib::services::provider::mock::MockProvider;
use serde_json::Value;

use super::test_helpers::*;

/// Job key used in tests.
const TEST_JOB_KEY: &str = "test-job-key-for-db-e2e";

#[actix_rt::test]
async fn test_batch_trigger_validates_body() {
    let pool = create_test_pool().await;
    let config = Config::from_env().expect("Failed to load config for test app");
    let mock = Arc::new(MockProvider::new());
    let provider: Arc<dyn AnalysisProvider> = mock.clone();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool))
            .app_data(web::Data::new(config))
            .app_data(web::Data::new(JobKey::new(Some(TEST_JOB_KEY.to_string()))))
            .app_data(web::Data::from(provider))
            .service(web::scope("/api/v1").configure(api::configure_job_routes)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/jobs/batch-analyze")
        .insert_header((JOB_KEY_HEADER, TEST_JOB_KEY))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"limit\": ")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "INVALID_INPUT");

    let req = test::TestRequest::post()
        .uri("/api/v1/jobs/batch-analyze")
        .insert_header((JOB_KEY_HEADER, TEST_JOB_KEY))
        .set_json(serde_json::json!({ "limit": 0, "delay_ms": 0 }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["processed"], 0);
    assert_eq!(mock.call_count(), 0);
}
