//! HTTP clients exercised against a stub registry and auth service on a loopback port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Weekday;
use serde_json::json;
use tokio::net::TcpListener;

use enrollment::admission::{
    ClockTime, CourseDirectory, CourseId, Credential, IdentityError, IdentityResolver,
    LookupError, Role, TeacherId,
};
use enrollment::remote::{HttpCourseDirectory, HttpIdentityResolver};

#[derive(Clone, Default)]
struct Upstream {
    seen_authorization: Arc<Mutex<Vec<String>>>,
}

impl Upstream {
    fn record(&self, headers: &HeaderMap) {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.seen_authorization
            .lock()
            .expect("upstream mutex poisoned")
            .push(value);
    }

    fn seen(&self) -> Vec<String> {
        self.seen_authorization
            .lock()
            .expect("upstream mutex poisoned")
            .clone()
    }
}

async fn course_handler(
    State(upstream): State<Upstream>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    upstream.record(&headers);
    match id.as_str() {
        "1" => Json(json!({
            "id": 1,
            "teacher_id": 7,
            "schedule": {"day": "monday", "start_time": "10:00", "end_time": "12:00"}
        }))
        .into_response(),
        "2" => Json(json!({"id": 2, "schedule": {"day": "Tue", "time": "08:30"}})).into_response(),
        "3" => Json(json!({"id": 3, "schedule": null})).into_response(),
        "4" => Json(json!({"id": 4, "schedule": {"day": "Funday", "start_time": "10:00"}}))
            .into_response(),
        "5" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
        "6" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"id": 6})).into_response()
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({"error": "course not found"}))).into_response(),
    }
}

async fn me_handler(State(upstream): State<Upstream>, headers: HeaderMap) -> Response {
    upstream.record(&headers);
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    match token {
        "student" => Json(json!({
            "status": "success",
            "data": {"id": 42, "role": "murid"}
        }))
        .into_response(),
        "teacher" => Json(json!({
            "status": "success",
            "data": {"id": "t-9", "role": "pengajar"}
        }))
        .into_response(),
        "suspended" => Json(json!({"status": "error", "message": "account suspended"}))
            .into_response(),
        "empty" => Json(json!({"status": "success"})).into_response(),
        "crash" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"status": "error"}))).into_response(),
    }
}

async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/course/:id", get(course_handler))
        .route("/api/auth/me", get(me_handler))
        .with_state(upstream.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server runs");
    });

    (format!("http://{addr}"), upstream)
}

fn directory(base_url: &str) -> HttpCourseDirectory {
    HttpCourseDirectory::new(base_url, Duration::from_secs(5)).expect("client builds")
}

#[tokio::test]
async fn course_lookup_parses_schedule_and_teacher() {
    let (base_url, upstream) = spawn_upstream().await;
    let credential = Credential::bearer("student");

    let info = directory(&base_url)
        .course(&CourseId::new("1"), &credential)
        .await
        .expect("course resolves");

    assert_eq!(info.course_id, CourseId::new("1"));
    assert_eq!(info.teacher_id, Some(TeacherId::new("7")));
    assert_eq!(info.schedule.day(), Weekday::Mon);
    assert_eq!(info.schedule.start(), ClockTime::hm(10, 0));
    assert_eq!(info.schedule.resolve_end(), ClockTime::hm(12, 0));
    assert_eq!(upstream.seen(), vec!["Bearer student".to_string()]);
}

#[tokio::test]
async fn course_lookup_accepts_legacy_time_field_and_default_duration() {
    let (base_url, _) = spawn_upstream().await;

    let info = directory(&base_url)
        .course(&CourseId::new("2"), &Credential::bearer("student"))
        .await
        .expect("course resolves");

    assert_eq!(info.teacher_id, None);
    assert_eq!(info.schedule.day(), Weekday::Tue);
    assert_eq!(info.schedule.resolve_end(), ClockTime::hm(10, 30));
}

#[tokio::test]
async fn course_lookup_classifies_failures() {
    let (base_url, _) = spawn_upstream().await;
    let directory = directory(&base_url);
    let credential = Credential::bearer("student");

    let missing = directory.course(&CourseId::new("99"), &credential).await;
    assert!(matches!(missing, Err(LookupError::NotFound(id)) if id == CourseId::new("99")));

    let unscheduled = directory.course(&CourseId::new("3"), &credential).await;
    assert!(matches!(unscheduled, Err(LookupError::NotFound(_))));

    let malformed = directory.course(&CourseId::new("4"), &credential).await;
    assert!(matches!(malformed, Err(LookupError::Malformed(_))));

    let down = directory.course(&CourseId::new("5"), &credential).await;
    assert!(matches!(down, Err(LookupError::Unavailable(_))));
}

#[tokio::test]
async fn course_lookup_times_out() {
    let (base_url, _) = spawn_upstream().await;
    let directory = HttpCourseDirectory::new(&base_url, Duration::from_millis(200))
        .expect("client builds");

    let result = directory
        .course(&CourseId::new("6"), &Credential::bearer("student"))
        .await;

    assert!(matches!(result, Err(LookupError::Timeout)));
}

#[tokio::test]
async fn course_lookup_reports_unreachable_registry() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let result = directory(&format!("http://{addr}"))
        .course(&CourseId::new("1"), &Credential::bearer("student"))
        .await;

    assert!(matches!(result, Err(LookupError::Unavailable(_))));
}

#[tokio::test]
async fn identity_resolves_legacy_roles_and_numeric_ids() {
    let (base_url, upstream) = spawn_upstream().await;
    let resolver =
        HttpIdentityResolver::new(&base_url, Duration::from_secs(5)).expect("client builds");

    let student = resolver
        .resolve(&Credential::bearer("student"))
        .await
        .expect("student resolves");
    assert_eq!(student.id.0, "42");
    assert_eq!(student.role, Role::Student);

    let teacher = resolver
        .resolve(&Credential::bearer("teacher"))
        .await
        .expect("teacher resolves");
    assert_eq!(teacher.role, Role::Instructor);

    assert_eq!(
        upstream.seen(),
        vec!["Bearer student".to_string(), "Bearer teacher".to_string()]
    );
}

#[tokio::test]
async fn identity_classifies_failures() {
    let (base_url, _) = spawn_upstream().await;
    let resolver =
        HttpIdentityResolver::new(&base_url, Duration::from_secs(5)).expect("client builds");

    let rejected = resolver.resolve(&Credential::bearer("forged")).await;
    assert!(matches!(rejected, Err(IdentityError::Unauthenticated(_))));

    let suspended = resolver.resolve(&Credential::bearer("suspended")).await;
    assert!(
        matches!(suspended, Err(IdentityError::Unauthenticated(message)) if message == "account suspended")
    );

    let empty = resolver.resolve(&Credential::bearer("empty")).await;
    assert!(matches!(empty, Err(IdentityError::Malformed(_))));

    let crashed = resolver.resolve(&Credential::bearer("crash")).await;
    assert!(matches!(crashed, Err(IdentityError::Unavailable(_))));
}
