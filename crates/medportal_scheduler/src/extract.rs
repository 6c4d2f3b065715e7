// --- File: crates/medportal_scheduler/src/extract.rs ---
//! Extractors that report malformed input as [`SchedulerError::Validation`].
//!
//! axum's own rejections answer with plain text; these wrappers keep every
//! error in the `{success, message, code}` shape.

use crate::error::SchedulerError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// `Json<T>` with validation errors on rejection.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

/// `Query<T>` with validation errors on rejection.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

/// `Path<T>` with validation errors on rejection.
#[derive(Debug)]
pub struct ValidPath<T>(pub T);

impl From<JsonRejection> for SchedulerError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected JSON body: {}", rejection);
        SchedulerError::validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for SchedulerError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Rejected query string: {}", rejection);
        SchedulerError::validation(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for SchedulerError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected path parameters: {}", rejection);
        SchedulerError::validation(format!("Invalid path: {}", rejection.body_text()))
    }
}

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SchedulerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ValidJson(value))
    }
}

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SchedulerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ValidQuery(value))
    }
}

impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = SchedulerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ValidPath(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{AppointmentRequest, DateQuery};
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    #[tokio::test]
    async fn wrong_json_type_is_a_validation_error() {
        let request = HttpRequest::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"doctor_id": "one"}"#))
            .unwrap();
        let result = ValidJson::<AppointmentRequest>::from_request(request, &()).await;
        match result {
            Err(SchedulerError::Validation(message)) => assert!(message.contains("doctor_id")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_query_field_is_a_validation_error() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/doctors/1/slots")
            .body(())
            .unwrap()
            .into_parts();
        let result = ValidQuery::<DateQuery>::from_request_parts(&mut parts, &()).await;
        match result {
            Err(SchedulerError::Validation(message)) => assert!(message.contains("date")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
