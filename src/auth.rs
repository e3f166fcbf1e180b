//! HTTP Basic Authentication for the moderator connection

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, Response, StatusCode, Uri},
    middleware::Next,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use crate::types::Role;
use crate::ws::{parse_role, WsQuery};

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Username for the moderator (None = auth disabled)
    pub username: Option<String>,
    /// Password for the moderator
    pub password: Option<String>,
}

impl AuthConfig {
    /// Load auth config from environment variables
    /// MODERATOR_USERNAME and MODERATOR_PASSWORD must both be set to enable auth
    pub fn from_env() -> Self {
        let username = std::env::var("MODERATOR_USERNAME")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let password = std::env::var("MODERATOR_PASSWORD")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if username.is_some() && password.is_some() {
            tracing::info!("Moderator authentication enabled");
            Self { username, password }
        } else {
            if username.is_some() || password.is_some() {
                tracing::warn!(
                    "MODERATOR_USERNAME and MODERATOR_PASSWORD must both be set to enable authentication"
                );
            }
            tracing::warn!("Moderator authentication DISABLED - anyone can moderate!");
            Self {
                username: None,
                password: None,
            }
        }
    }

    /// Check if authentication is enabled
    pub fn is_enabled(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Validate credentials
    pub fn validate(&self, username: &str, password: &str) -> bool {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                // Evaluate both comparisons so timing doesn't reveal which failed
                let user_ok = constant_time_eq(u.as_bytes(), username.as_bytes());
                let pass_ok = constant_time_eq(p.as_bytes(), password.as_bytes());
                user_ok & pass_ok
            }
            _ => true, // Auth disabled, allow all
        }
    }

    /// Validate a raw `Authorization` header value
    fn validate_header(&self, value: &str) -> bool {
        let Some(encoded) = value.strip_prefix("Basic ") else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        match decoded.split_once(':') {
            Some((username, password)) => self.validate(username, password),
            None => false,
        }
    }
}

/// Constant-time byte comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Role the WebSocket handler will assign, decoded the same way it decodes it.
///
/// `None` when the query does not parse; the upgrade handler rejects those too.
fn requested_role(uri: &Uri) -> Option<Role> {
    let Query(params) = Query::<WsQuery>::try_from_uri(uri).ok()?;
    Some(parse_role(params.role.as_deref()))
}

/// Middleware to require HTTP Basic Auth for moderator WebSocket connections.
///
/// Audience and display connections pass through untouched.
pub async fn moderator_ws_auth_middleware(
    State(auth_config): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    match requested_role(request.uri()) {
        Some(Role::Moderator) => {}
        Some(_) => return next.run(request).await,
        None => {
            let mut response = Response::new(Body::from("Invalid query"));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return response;
        }
    }

    if !auth_config.is_enabled() {
        tracing::warn!(
            "Moderator WebSocket requested but authentication is DISABLED; set MODERATOR_USERNAME and MODERATOR_PASSWORD"
        );
        return next.run(request).await;
    }

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|value| auth_config.validate_header(value));
    if authorized {
        return next.run(request).await;
    }

    tracing::warn!("Rejected unauthenticated moderator connection");
    let mut response = Response::new(Body::from("Unauthorized"));
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Basic realm=\"Panel Showdown Moderator\""),
    );
    response
}
