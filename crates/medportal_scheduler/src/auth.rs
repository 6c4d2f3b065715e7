// --- File: crates/medportal_scheduler/src/auth.rs ---
//! Caller identity for scheduler requests.
//!
//! Sessions are handled by an upstream service, which forwards the
//! authenticated role and record id as headers. When a shared secret is
//! configured, requests must also carry it so the headers cannot be forged by
//! clients that bypass the upstream.

use crate::error::SchedulerError;
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;
use medportal_common::models::{Identity, Role};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const INTERNAL_AUTH_HEADER: &str = "X-Internal-Auth-Secret";
pub const ROLE_HEADER: &str = "X-Portal-Role";
pub const USER_ID_HEADER: &str = "X-Portal-User-Id";

#[derive(Clone, Debug, Default)]
pub struct AuthState {
    pub shared_secret: Option<String>,
    /// Without a secret, requests are refused unless this is set
    pub trust_identity_headers: bool,
}

impl AuthState {
    /// A state requiring `secret` on every request.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            shared_secret: Some(secret.into()),
            trust_identity_headers: false,
        }
    }
}

/// Rejects requests whose `X-Internal-Auth-Secret` does not match the configured secret.
pub async fn shared_secret_middleware(
    State(auth_state): State<Arc<AuthState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = auth_state.shared_secret.as_deref() else {
        if auth_state.trust_identity_headers {
            return next.run(req).await;
        }
        error!("Internal auth secret not configured, refusing request");
        return SchedulerError::Config("Internal auth secret not configured.".to_string())
            .into_response();
    };

    let provided = req
        .headers()
        .get(INTERNAL_AUTH_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(secret) if constant_time_eq(secret.as_bytes(), expected.as_bytes()) => {
            next.run(req).await
        }
        Some(_) => {
            warn!("Rejected request with invalid internal secret");
            SchedulerError::Unauthenticated("Unauthorized: Invalid credentials.".to_string())
                .into_response()
        }
        None => {
            warn!("Rejected request without {} header", INTERNAL_AUTH_HEADER);
            SchedulerError::Unauthenticated(format!(
                "Unauthorized: Missing {} header.",
                INTERNAL_AUTH_HEADER
            ))
            .into_response()
        }
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// The authenticated caller extracted from the identity headers.
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Identity);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = SchedulerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (Some(role), Some(user_id)) = (
            header_value(parts, ROLE_HEADER),
            header_value(parts, USER_ID_HEADER),
        ) else {
            return Err(SchedulerError::Unauthenticated(
                "Authentication required.".to_string(),
            ));
        };

        let role: Role = role
            .parse()
            .map_err(|_| SchedulerError::Unauthenticated(format!("Unknown role '{role}'.")))?;
        let id: i64 = user_id
            .parse()
            .map_err(|_| SchedulerError::Unauthenticated(format!("Invalid user id '{user_id}'.")))?;

        let identity = Identity::new(role, id);
        debug!("Request authenticated as {}", identity);
        Ok(CallerIdentity(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn extract(request: Request<()>) -> Result<CallerIdentity, SchedulerError> {
        let (mut parts, _) = request.into_parts();
        CallerIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_tagged_identity() {
        let request = Request::builder()
            .header(ROLE_HEADER, "patient")
            .header(USER_ID_HEADER, "42")
            .body(())
            .unwrap();
        let CallerIdentity(identity) = extract(request).await.unwrap();
        assert_eq!(identity, Identity::Patient { patient_id: 42 });
    }

    #[tokio::test]
    async fn missing_headers_are_unauthenticated() {
        let request = Request::builder()
            .header(ROLE_HEADER, "admin")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await,
            Err(SchedulerError::Unauthenticated(_))
        ));
    }

    async fn gated(auth: AuthState, secret: Option<&str>) -> StatusCode {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                Arc::new(auth),
                shared_secret_middleware,
            ));
        let mut builder = Request::builder().uri("/");
        if let Some(secret) = secret {
            builder = builder.header(INTERNAL_AUTH_HEADER, secret);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn missing_secret_fails_closed() {
        assert_eq!(
            gated(AuthState::default(), None).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            gated(AuthState::default(), Some("anything")).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn trusted_headers_are_an_explicit_opt_in() {
        let trusting = AuthState {
            shared_secret: None,
            trust_identity_headers: true,
        };
        assert_eq!(gated(trusting, None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn configured_secret_is_compared() {
        assert_eq!(
            gated(AuthState::with_secret("s3cr3t"), Some("s3cr3t")).await,
            StatusCode::OK
        );
        assert_eq!(
            gated(AuthState::with_secret("s3cr3t"), Some("guess")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            gated(AuthState::with_secret("s3cr3t"), None).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let request = Request::builder()
            .header(ROLE_HEADER, "nurse")
            .header(USER_ID_HEADER, "1")
            .body(())
            .unwrap();
        assert!(extract(request).await.is_err());
    }
}
