//! Caller identification: user session tokens and the job trigger key.

mod extractor;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

pub use extractor::{AuthError, JobAuth, UserAuth};

/// Session token issuer.
pub const SESSION_ISSUER: &str = "clipinsight";

/// Claims carried by a user session token. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
}

/// Issue an HS256 session token for a user.
pub fn create_session_token(
    user_id: &str,
    secret: &SecretString,
    ttl_secs: u64,
) -> Result<String, String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(ttl_secs as i64);

    let claims = SessionClaims {
        sub: user_id.to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| format!("Failed to create session token: {}", e))
}

/// Verify a session token and return its claims.
pub fn verify_session_token(token: &str, secret: &SecretString) -> Result<SessionClaims, String> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_aud = false;

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| format!("Invalid session token: {}", e))?;

    if token_data.claims.sub.trim().is_empty() {
        return Err("Invalid session token: empty subject".to_string());
    }

    Ok(token_data.claims)
}

/// Shared key guarding the job trigger endpoints.
///
/// `Debug` never prints the key; comparison is constant-time.
#[derive(Clone)]
pub struct JobKey(Option<SecretString>);

impl JobKey {
    pub fn new(key: Option<String>) -> Self {
        Self(key.map(SecretString::from))
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    /// Compare the provided key with the configured one. Always false when unset.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.0 {
            Some(secret) => secret
                .expose_secret()
                .as_bytes()
                .ct_eq(provided.as_bytes())
                .into(),
            None => false,
        }
    }
}

impl std::fmt::Debug for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "JobKey([REDACTED])"),
            None => write!(f, "JobKey(None)"),
        }
    }
}
