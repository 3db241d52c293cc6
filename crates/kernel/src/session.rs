//! Admin session verification.
//!
//! The portal's login flow authenticates against the directory server and
//! issues an HS256 JWT, delivered as a cookie (or a Bearer header for API
//! clients). This module verifies that token and exposes the result to
//! handlers through the [`AdminSession`] extractor.

use anyhow::{Context, Result};
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use cookie::Cookie;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// JWT issuer claim value.
const ISSUER: &str = "intranet";

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "intranet_session";

/// Default session lifetime in seconds (8 hours).
pub const SESSION_LIFETIME: i64 = 8 * 3600;

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issuer.
    pub iss: String,
    /// Subject (directory username).
    pub sub: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Whether the user may manage portal content.
    #[serde(default)]
    pub is_admin: bool,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookie_name: String,
}

impl SessionKeys {
    /// Create keys from a shared HMAC secret.
    pub fn new(secret: &[u8], cookie_name: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            cookie_name: cookie_name.into(),
        }
    }

    /// Issue a session token for a user.
    pub fn issue(&self, username: &str, name: &str, is_admin: bool, lifetime: i64) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            iss: ISSUER.to_string(),
            sub: username.to_string(),
            name: name.to_string(),
            iat: now,
            exp: now + lifetime,
            is_admin,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to encode session token")
    }

    /// Verify a token's signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .context("invalid session token")?;
        Ok(data.claims)
    }

    /// Pull the raw token from a request's cookie or Authorization header.
    pub fn token_from_parts(&self, parts: &Parts) -> Option<String> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if let Some(token) = bearer {
            return Some(token.to_string());
        }

        parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|header| cookie_value(header, &self.cookie_name))
    }
}

/// Find a non-empty cookie's value in a `Cookie` header.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// A verified administrator session, passed explicitly to handlers.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub username: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let keys = state.sessions();
        let Some(token) = keys.token_from_parts(parts) else {
            return Err(AppError::Unauthorized("authentication required".to_string()));
        };

        let claims = keys.verify(&token).map_err(|e| {
            debug!(error = %e, "rejected session token");
            AppError::Unauthorized("invalid or expired session".to_string())
        })?;

        if !claims.is_admin {
            return Err(AppError::Forbidden("administrator access required".to_string()));
        }

        Ok(Self {
            username: claims.sub,
        })
    }
}
