//! Request logging middleware.
//!
//! Credentials are never logged; only which kind was presented.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::AUTHORIZATION;
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::JOB_KEY_HEADER;

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

/// Which credential a request carried.
fn credential_kind(req: &ServiceRequest) -> &'static str {
    let headers = req.headers();
    if headers.contains_key(JOB_KEY_HEADER) {
        "job_key"
    } else if headers.contains_key(AUTHORIZATION) {
        "session"
    } else {
        "none"
    }
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let credential = credential_kind(&req);

        info!(
            target: "api",
            method = %method,
            path = %path,
            remote_addr = %remote_addr,
            credential,
            "→ Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let elapsed = start.elapsed().as_millis();
            let status = res.status();

            if status.is_server_error() {
                error!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = %elapsed,
                    "← Server error"
                );
            } else if status.is_client_error() {
                warn!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = %elapsed,
                    "← Client error"
                );
            } else {
                info!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = %elapsed,
                    "← Request completed"
                );
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    #[::core::prelude::v1::test]
    fn test_credential_kind() {
        let job = test::TestRequest::default()
            .insert_header((JOB_KEY_HEADER, "k"))
            .to_srv_request();
        assert_eq!(credential_kind(&job), "job_key");

        let session = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer t"))
            .to_srv_request();
        assert_eq!(credential_kind(&session), "session");

        assert_eq!(credential_kind(&test::TestRequest::default().to_srv_request()), "none");
    }

    #[actix_rt::test]
    async fn test_middleware_passes_response_through() {
        let app = test::init_service(
            App::new()
                .wrap(RequestLogger)
                .route("/teapot", web::get().to(|| async { HttpResponse::ImATeapot().finish() })),
        )
        .await;

        let req = test::TestRequest::get().uri("/teapot").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    }

    #[actix_rt::test]
    async fn test_middleware_passes_errors_through() {
        let app = test::init_service(
            App::new()
                .wrap(RequestLogger)
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().body("fine") }))
                .route(
                    "/broken",
                    web::get().to(|| async { HttpResponse::BadGateway().finish() }),
                ),
        )
        .await;

        let req = test::TestRequest::get().uri("/ok").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "fine");

        let req = test::TestRequest::get().uri("/broken").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

        let req = test::TestRequest::get().uri("/missing").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
