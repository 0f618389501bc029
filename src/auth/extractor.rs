//! Actix-web extractors for user sessions and the job key.
//!
//! Secret header values are wrapped in `SecretString` as soon as they are read
//! and are never logged.

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use secrecy::{ExposeSecret, SecretString};
use std::future::{Ready, ready};

use super::{JobKey, verify_session_token};
use crate::config::{Config, JOB_KEY_HEADER};
use crate::error::ErrorResponse;

/// Extract a secret header value, wrapping it in SecretString.
/// Returns None if the header is missing or invalid UTF-8.
fn extract_secret_header(req: &HttpRequest, header_name: &str) -> Option<SecretString> {
    req.headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(|s| SecretString::from(s.to_string()))
}

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl AuthError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED).json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message.clone(),
        })
    }
}

/// Extractor for the signed-in user (`Authorization: Bearer <session token>`).
///
/// ```ignore
/// async fn handler(auth: UserAuth) -> impl Responder {
///     // auth.user_id scopes every query
/// }
/// ```
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: String,
}

impl FromRequest for UserAuth {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(config) = req.app_data::<web::Data<Config>>() else {
            return ready(Err(AuthError::new("Internal configuration error")));
        };

        let Some(header) = extract_secret_header(req, AUTHORIZATION.as_str()) else {
            return ready(Err(AuthError::new(
                "Missing session token. Provide Authorization: Bearer header.",
            )));
        };

        let Some(token) = header.expose_secret().strip_prefix("Bearer ") else {
            return ready(Err(AuthError::new(
                "Authorization header must use the Bearer scheme",
            )));
        };

        match verify_session_token(token.trim(), &config.session_secret) {
            Ok(claims) => ready(Ok(UserAuth {
                user_id: claims.sub,
            })),
            Err(message) => ready(Err(AuthError::new(message))),
        }
    }
}

/// Extractor for job trigger calls (`X-Job-Key` header).
#[derive(Debug, Clone, Copy)]
pub struct JobAuth;

impl FromRequest for JobAuth {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(stored) = req.app_data::<web::Data<JobKey>>() else {
            return ready(Err(AuthError::new("Internal configuration error")));
        };

        if !stored.is_configured() {
            return ready(Err(AuthError::new("Job triggers are disabled")));
        }

        match extract_secret_header(req, JOB_KEY_HEADER) {
            Some(ref provided) if stored.verify(provided.expose_secret()) => ready(Ok(JobAuth)),
            Some(_) => ready(Err(AuthError::new("Invalid job key"))),
            None => ready(Err(AuthError::new(
                "Missing job key. Provide X-Job-Key header.",
            ))),
        }
    }
}
