use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router};
use enrollment::admission::{
    enrollment_router, CourseDirectory, CourseId, EnrollmentService, EnrollmentStore,
    IdentityResolver, StaticCourseCatalog,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_enrollment_routes<S, C, I>(
    service: Arc<EnrollmentService<S, C>>,
    identity: Arc<I>,
) -> Router
where
    S: EnrollmentStore + 'static,
    C: CourseDirectory + 'static,
    I: IdentityResolver + 'static,
{
    enrollment_router(service, identity)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

/// Serve the built-in course table in the registry's response shape.
pub(crate) fn with_mock_courses(router: Router, catalog: Arc<StaticCourseCatalog>) -> Router {
    let mock = Router::new()
        .route("/mock/courses/:id", axum::routing::get(mock_course_endpoint))
        .with_state(catalog);
    router.merge(mock)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn mock_course_endpoint(
    State(catalog): State<Arc<StaticCourseCatalog>>,
    Path(id): Path<String>,
) -> Response {
    match catalog.get(&CourseId::new(id.trim())) {
        Some(course) => Json(json!({
            "id": course.course_id,
            "teacher_id": course.teacher_id,
            "schedule": course.schedule,
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "course not found" })),
        )
            .into_response(),
    }
}
