use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{Credential, EnrollmentQuery, EnrollmentRequest, Requester};
use super::lookup::{CourseDirectory, IdentityError, IdentityResolver};
use super::repository::EnrollmentStore;
use super::service::{AdmissionError, EnrollmentService};

/// Shared handler state: the admission service plus the caller authenticator.
pub struct EnrollmentApi<S, C, I> {
    pub service: Arc<EnrollmentService<S, C>>,
    pub identity: Arc<I>,
}

impl<S, C, I> Clone for EnrollmentApi<S, C, I> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
        }
    }
}

/// Router exposing the list and create operations under `/api`.
pub fn enrollment_router<S, C, I>(
    service: Arc<EnrollmentService<S, C>>,
    identity: Arc<I>,
) -> Router
where
    S: EnrollmentStore + 'static,
    C: CourseDirectory + 'static,
    I: IdentityResolver + 'static,
{
    Router::new()
        .route("/api", get(index_handler))
        .route(
            "/api/enrollments",
            get(list_handler::<S, C, I>).post(create_handler::<S, C, I>),
        )
        .with_state(EnrollmentApi { service, identity })
}

pub(crate) async fn index_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Enrollment Service API is running!" }))
}

pub(crate) async fn list_handler<S, C, I>(
    State(api): State<EnrollmentApi<S, C, I>>,
    headers: HeaderMap,
    Query(query): Query<EnrollmentQuery>,
) -> Response
where
    S: EnrollmentStore + 'static,
    C: CourseDirectory + 'static,
    I: IdentityResolver + 'static,
{
    let result = match authenticate(api.identity.as_ref(), &headers).await {
        Ok((requester, _)) => api.service.list(&requester, query).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(enrollments) => (StatusCode::OK, Json(enrollments)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_handler<S, C, I>(
    State(api): State<EnrollmentApi<S, C, I>>,
    headers: HeaderMap,
    body: Result<Json<EnrollmentRequest>, JsonRejection>,
) -> Response
where
    S: EnrollmentStore + 'static,
    C: CourseDirectory + 'static,
    I: IdentityResolver + 'static,
{
    // The caller is identified before the body is looked at.
    let result = match authenticate(api.identity.as_ref(), &headers).await {
        Ok((requester, credential)) => match body {
            Ok(Json(request)) => api.service.admit(&requester, &credential, request).await,
            Err(rejection) => Err(AdmissionError::Validation(format!(
                "invalid request body: {}",
                rejection.body_text()
            ))),
        },
        Err(err) => Err(err),
    };

    match result {
        Ok(enrollment) => {
            let payload = json!({
                "message": "student enrolled in course",
                "enrollment": enrollment,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Resolve the caller from the `Authorization` header.
pub async fn authenticate<I>(
    identity: &I,
    headers: &HeaderMap,
) -> Result<(Requester, Credential), AdmissionError>
where
    I: IdentityResolver + ?Sized,
{
    let credential = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(Credential::from_header)
        .ok_or(AdmissionError::MissingCredential)?;

    let requester = identity
        .resolve(&credential)
        .await
        .map_err(|err| match err {
            IdentityError::Unauthenticated(message) => AdmissionError::InvalidCredential(message),
            other => {
                tracing::error!(error = %other, "identity resolution failed");
                AdmissionError::Upstream(other.to_string())
            }
        })?;

    Ok((requester, credential))
}

impl AdmissionError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdmissionError::Validation(_) => StatusCode::BAD_REQUEST,
            AdmissionError::MissingCredential | AdmissionError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            AdmissionError::Forbidden(_) => StatusCode::FORBIDDEN,
            AdmissionError::CourseNotFound(_) => StatusCode::NOT_FOUND,
            AdmissionError::ScheduleConflict { .. } | AdmissionError::AlreadyEnrolled { .. } => {
                StatusCode::CONFLICT
            }
            AdmissionError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AdmissionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
