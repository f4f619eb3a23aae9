use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{Utc, Weekday};
use serde_json::Value;

use crate::admission::domain::{
    CourseId, CourseInfo, Credential, Enrollment, EnrollmentId, EnrollmentRequest,
    NewEnrollment, Requester, Role, StudentId, TeacherId,
};
use crate::admission::lookup::{CourseDirectory, IdentityError, IdentityResolver, LookupError};
use crate::admission::repository::{
    sort_newest_first, EnrollmentFilter, EnrollmentStore, StoreError,
};
use crate::admission::schedule::{ClockTime, CourseSchedule};
use crate::admission::service::{
    AdmissionConfig, EnrollmentService, LookupFailurePolicy, TeacherSource,
};

pub(super) const STUDENT: &str = "s-1";
pub(super) const OTHER_STUDENT: &str = "s-2";
pub(super) const STUDENT_TOKEN: &str = "student-token";
pub(super) const ADMIN_TOKEN: &str = "admin-token";
pub(super) const INSTRUCTOR_TOKEN: &str = "instructor-token";

/// Monday 10:00-12:00.
pub(super) const MORNING: &str = "101";
/// Monday 11:00-13:00, collides with MORNING.
pub(super) const LATE_MORNING: &str = "102";
/// Monday 12:00-14:00, touches MORNING at 12:00.
pub(super) const NOON: &str = "103";
/// Tuesday 10:00 with the default duration.
pub(super) const TUESDAY: &str = "104";
/// Registry always fails for this course.
pub(super) const BROKEN: &str = "500";

pub(super) fn course(id: &str) -> CourseId {
    CourseId::new(id)
}

pub(super) fn student(id: &str) -> StudentId {
    StudentId::new(id)
}

pub(super) fn slot(day: Weekday, start: (u32, u32), end: Option<(u32, u32)>) -> CourseSchedule {
    CourseSchedule::new(
        day,
        ClockTime::hm(start.0, start.1),
        end.map(|(h, m)| ClockTime::hm(h, m)),
    )
    .expect("valid slot")
}

pub(super) fn student_requester() -> Requester {
    Requester::new(STUDENT, Role::Student)
}

pub(super) fn admin() -> Requester {
    Requester::new("a-1", Role::Admin)
}

pub(super) fn instructor() -> Requester {
    Requester::new("t-1", Role::Instructor)
}

pub(super) fn credential() -> Credential {
    Credential::bearer(STUDENT_TOKEN)
}

pub(super) fn request(student_id: &str, course_id: &str) -> EnrollmentRequest {
    EnrollmentRequest::new(student(student_id), course(course_id))
}

pub(super) fn registry_config() -> AdmissionConfig {
    AdmissionConfig {
        teacher_source: TeacherSource::Registry,
        lookup_failure_policy: LookupFailurePolicy::Skip,
    }
}

pub(super) fn standalone_config() -> AdmissionConfig {
    AdmissionConfig {
        teacher_source: TeacherSource::Request,
        lookup_failure_policy: LookupFailurePolicy::Skip,
    }
}

pub(super) type TestService = EnrollmentService<MemoryStore, ScriptedDirectory>;

pub(super) fn build_service(
    config: AdmissionConfig,
) -> (TestService, Arc<MemoryStore>, Arc<ScriptedDirectory>) {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(ScriptedDirectory::standard());
    let service = EnrollmentService::new(store.clone(), directory.clone(), config);
    (service, store, directory)
}

#[derive(Default)]
pub(super) struct MemoryStore {
    rows: Mutex<Vec<Enrollment>>,
}

impl MemoryStore {
    pub(super) fn rows(&self) -> Vec<Enrollment> {
        self.rows.lock().expect("store mutex poisoned").clone()
    }

    /// Insert bypassing admission, for seeding states the engine would not produce.
    pub(super) fn seed(&self, student_id: &str, course_id: &str) -> Enrollment {
        let mut rows = self.rows.lock().expect("store mutex poisoned");
        let enrollment = Enrollment {
            id: EnrollmentId(rows.len() as u64 + 1),
            student_id: student(student_id),
            course_id: course(course_id),
            teacher_id: None,
            created_at: Utc::now(),
        };
        rows.push(enrollment.clone());
        enrollment
    }
}

#[async_trait]
impl EnrollmentStore for MemoryStore {
    async fn list(&self, filter: &EnrollmentFilter) -> Result<Vec<Enrollment>, StoreError> {
        let rows = self.rows.lock().expect("store mutex poisoned");
        let mut matching: Vec<Enrollment> = rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);
        Ok(matching)
    }

    async fn exists(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
    ) -> Result<bool, StoreError> {
        let rows = self.rows.lock().expect("store mutex poisoned");
        Ok(rows
            .iter()
            .any(|row| &row.student_id == student_id && &row.course_id == course_id))
    }

    async fn insert(&self, enrollment: NewEnrollment) -> Result<Enrollment, StoreError> {
        let mut rows = self.rows.lock().expect("store mutex poisoned");
        if rows.iter().any(|row| {
            row.student_id == enrollment.student_id && row.course_id == enrollment.course_id
        }) {
            return Err(StoreError::Duplicate {
                student_id: enrollment.student_id,
                course_id: enrollment.course_id,
            });
        }
        let stored = enrollment.into_enrollment(EnrollmentId(rows.len() as u64 + 1));
        rows.push(stored.clone());
        Ok(stored)
    }
}

/// Store whose existence check always misses, as if a concurrent request committed
/// between the check and the insert.
pub(super) struct RacingStore;

#[async_trait]
impl EnrollmentStore for RacingStore {
    async fn list(&self, _filter: &EnrollmentFilter) -> Result<Vec<Enrollment>, StoreError> {
        Ok(Vec::new())
    }

    async fn exists(
        &self,
        _student_id: &StudentId,
        _course_id: &CourseId,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn insert(&self, enrollment: NewEnrollment) -> Result<Enrollment, StoreError> {
        Err(StoreError::Duplicate {
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
        })
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl EnrollmentStore for UnavailableStore {
    async fn list(&self, _filter: &EnrollmentFilter) -> Result<Vec<Enrollment>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn exists(
        &self,
        _student_id: &StudentId,
        _course_id: &CourseId,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn insert(&self, _enrollment: NewEnrollment) -> Result<Enrollment, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Course directory with a fixed table, a set of failing ids, and a call log.
pub(super) struct ScriptedDirectory {
    courses: HashMap<CourseId, CourseInfo>,
    failing: HashSet<CourseId>,
    calls: Mutex<Vec<(CourseId, String)>>,
}

impl ScriptedDirectory {
    pub(super) fn standard() -> Self {
        let info = |id: &str, schedule: CourseSchedule, teacher: &str| CourseInfo {
            course_id: course(id),
            schedule,
            teacher_id: Some(TeacherId::new(teacher)),
        };

        let courses = [
            info(MORNING, slot(Weekday::Mon, (10, 0), Some((12, 0))), "t-10"),
            info(LATE_MORNING, slot(Weekday::Mon, (11, 0), Some((13, 0))), "t-11"),
            info(NOON, slot(Weekday::Mon, (12, 0), Some((14, 0))), "t-12"),
            info(TUESDAY, slot(Weekday::Tue, (10, 0), None), "t-13"),
        ]
        .into_iter()
        .map(|info| (info.course_id.clone(), info))
        .collect();

        Self {
            courses,
            failing: HashSet::from([course(BROKEN)]),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn with_failing(mut self, course_id: &str) -> Self {
        self.failing.insert(course(course_id));
        self
    }

    pub(super) fn calls(&self) -> Vec<CourseId> {
        self.calls
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .map(|(course_id, _)| course_id.clone())
            .collect()
    }

    pub(super) fn forwarded_credentials(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .map(|(_, header)| header.clone())
            .collect()
    }
}

#[async_trait]
impl CourseDirectory for ScriptedDirectory {
    async fn course(
        &self,
        course_id: &CourseId,
        credential: &Credential,
    ) -> Result<CourseInfo, LookupError> {
        self.calls
            .lock()
            .expect("directory mutex poisoned")
            .push((course_id.clone(), credential.header_value().to_string()));

        if self.failing.contains(course_id) {
            return Err(LookupError::Unavailable("registry offline".to_string()));
        }
        self.courses
            .get(course_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(course_id.clone()))
    }
}

/// Token table standing in for the auth service.
#[derive(Default)]
pub(super) struct StaticIdentity {
    tokens: HashMap<String, Requester>,
    offline: bool,
}

impl StaticIdentity {
    pub(super) fn standard() -> Self {
        let tokens = HashMap::from([
            (STUDENT_TOKEN.to_string(), student_requester()),
            (ADMIN_TOKEN.to_string(), admin()),
            (INSTRUCTOR_TOKEN.to_string(), instructor()),
        ]);
        Self {
            tokens,
            offline: false,
        }
    }

    pub(super) fn offline() -> Self {
        Self {
            tokens: HashMap::new(),
            offline: true,
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentity {
    async fn resolve(&self, credential: &Credential) -> Result<Requester, IdentityError> {
        if self.offline {
            return Err(IdentityError::Unavailable("connection refused".to_string()));
        }
        self.tokens
            .get(credential.token())
            .cloned()
            .ok_or_else(|| IdentityError::Unauthenticated("token not recognised".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
