use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::domain::{
    CourseId, CourseInfo, Credential, Enrollment, EnrollmentQuery, EnrollmentRequest,
    NewEnrollment, Requester, Role, StudentId, TeacherId,
};
use super::lookup::{CourseDirectory, LookupError};
use super::repository::{EnrollmentFilter, EnrollmentStore, StoreError};

/// Where the committed enrollment's teacher comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeacherSource {
    /// Trust the course registry; client-supplied teacher ids are ignored.
    Registry,
    /// No trusted registry; the client must supply the teacher id.
    Request,
}

/// What to do when an already-enrolled course cannot be resolved during the conflict scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupFailurePolicy {
    /// Treat the course as non-conflicting and keep scanning.
    #[default]
    Skip,
    /// Fail the admission with an upstream error.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionConfig {
    pub teacher_source: TeacherSource,
    pub lookup_failure_policy: LookupFailurePolicy,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            teacher_source: TeacherSource::Registry,
            lookup_failure_policy: LookupFailurePolicy::Skip,
        }
    }
}

/// Service composing the enrollment store and course directory into admission decisions.
pub struct EnrollmentService<S, C> {
    store: Arc<S>,
    courses: Arc<C>,
    config: AdmissionConfig,
}

impl<S, C> EnrollmentService<S, C>
where
    S: EnrollmentStore + 'static,
    C: CourseDirectory + 'static,
{
    pub fn new(store: Arc<S>, courses: Arc<C>, config: AdmissionConfig) -> Self {
        Self {
            store,
            courses,
            config,
        }
    }

    /// Decide whether `request` may become an enrollment and persist it if so.
    ///
    /// Checks run in a fixed order and the first failure wins: required fields,
    /// authorization, course existence, schedule conflicts, duplicates.
    pub async fn admit(
        &self,
        requester: &Requester,
        credential: &Credential,
        request: EnrollmentRequest,
    ) -> Result<Enrollment, AdmissionError> {
        let candidate = self.validate(request)?;

        if requester.role == Role::Student && requester.id != candidate.student_id {
            debug!(
                requester = %requester.id,
                student = %candidate.student_id,
                "student attempted to enroll someone else"
            );
            return Err(AdmissionError::Forbidden(
                "students may only enroll themselves".to_string(),
            ));
        }

        let course = self
            .courses
            .course(&candidate.course_id, credential)
            .await
            .map_err(|err| match err {
                LookupError::NotFound(course_id) => AdmissionError::CourseNotFound(course_id),
                other => {
                    error!(
                        course = %candidate.course_id,
                        error = %other,
                        "candidate course lookup failed"
                    );
                    AdmissionError::Upstream(other.to_string())
                }
            })?;

        self.ensure_no_conflict(&candidate, &course, credential)
            .await?;

        if self
            .store
            .exists(&candidate.student_id, &candidate.course_id)
            .await?
        {
            debug!(
                student = %candidate.student_id,
                course = %candidate.course_id,
                "duplicate enrollment"
            );
            return Err(AdmissionError::AlreadyEnrolled {
                student_id: candidate.student_id,
                course_id: candidate.course_id,
            });
        }

        let teacher_id = match self.config.teacher_source {
            TeacherSource::Registry => course.teacher_id,
            TeacherSource::Request => candidate.teacher_id,
        };

        let enrollment = self
            .store
            .insert(NewEnrollment {
                student_id: candidate.student_id,
                course_id: candidate.course_id,
                teacher_id,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            enrollment = enrollment.id.0,
            student = %enrollment.student_id,
            course = %enrollment.course_id,
            "enrollment admitted"
        );
        Ok(enrollment)
    }

    /// List enrollments visible to the requester.
    ///
    /// Students only ever see their own rows. Staff may narrow by student, or failing
    /// that by course; with neither they see everything.
    pub async fn list(
        &self,
        requester: &Requester,
        query: EnrollmentQuery,
    ) -> Result<Vec<Enrollment>, AdmissionError> {
        let filter = match requester.role {
            Role::Student => EnrollmentFilter::Student(requester.id.clone()),
            Role::Admin | Role::Instructor => {
                let student_id = query.student_id.filter(|id| !id.0.trim().is_empty());
                let course_id = query.course_id.filter(|id| !id.0.trim().is_empty());
                match (student_id, course_id) {
                    (Some(student_id), _) => EnrollmentFilter::Student(student_id),
                    (None, Some(course_id)) => EnrollmentFilter::Course(course_id),
                    (None, None) => EnrollmentFilter::All,
                }
            }
        };

        Ok(self.store.list(&filter).await?)
    }

    fn validate(&self, request: EnrollmentRequest) -> Result<Candidate, AdmissionError> {
        let student_id = request.student_id.filter(|id| !id.0.trim().is_empty());
        let course_id = request.course_id.filter(|id| !id.0.trim().is_empty());
        let teacher_id = request.teacher_id.filter(|id| !id.0.trim().is_empty());

        match self.config.teacher_source {
            TeacherSource::Registry => match (student_id, course_id) {
                (Some(student_id), Some(course_id)) => Ok(Candidate {
                    student_id,
                    course_id,
                    teacher_id: None,
                }),
                _ => Err(AdmissionError::Validation(
                    "student_id and course_id are required".to_string(),
                )),
            },
            TeacherSource::Request => match (student_id, course_id, teacher_id) {
                (Some(student_id), Some(course_id), Some(teacher_id)) => Ok(Candidate {
                    student_id,
                    course_id,
                    teacher_id: Some(teacher_id),
                }),
                _ => Err(AdmissionError::Validation(
                    "student_id, course_id, and teacher_id are required".to_string(),
                )),
            },
        }
    }

    /// Sequentially compare the candidate slot with every other course the student holds.
    async fn ensure_no_conflict(
        &self,
        candidate: &Candidate,
        course: &CourseInfo,
        credential: &Credential,
    ) -> Result<(), AdmissionError> {
        let existing = self.store.list_by_student(&candidate.student_id).await?;

        for enrollment in existing {
            if enrollment.course_id == candidate.course_id {
                continue;
            }

            let current = match self.courses.course(&enrollment.course_id, credential).await {
                Ok(current) => current,
                Err(err) => match self.config.lookup_failure_policy {
                    LookupFailurePolicy::Skip => {
                        warn!(
                            course = %enrollment.course_id,
                            error = %err,
                            "skipping enrolled course in conflict check"
                        );
                        continue;
                    }
                    LookupFailurePolicy::Reject => {
                        error!(
                            course = %enrollment.course_id,
                            error = %err,
                            "enrolled course lookup failed"
                        );
                        return Err(AdmissionError::Upstream(format!(
                            "could not resolve enrolled course {}: {err}",
                            enrollment.course_id
                        )));
                    }
                },
            };

            if current.schedule.overlaps(&course.schedule) {
                debug!(
                    course = %candidate.course_id,
                    colliding = %enrollment.course_id,
                    "schedule conflict"
                );
                return Err(AdmissionError::ScheduleConflict {
                    course_id: enrollment.course_id,
                });
            }
        }

        Ok(())
    }
}

/// Request that passed field validation.
struct Candidate {
    student_id: StudentId,
    course_id: CourseId,
    teacher_id: Option<TeacherId>,
}

/// Rejection reasons surfaced by the admission engine.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("{0}")]
    Validation(String),
    #[error("missing bearer token")]
    MissingCredential,
    #[error("invalid or expired token: {0}")]
    InvalidCredential(String),
    #[error("access denied: {0}")]
    Forbidden(String),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("schedule conflicts with enrolled course {course_id}")]
    ScheduleConflict { course_id: CourseId },
    #[error("student {student_id} is already enrolled in course {course_id}")]
    AlreadyEnrolled {
        student_id: StudentId,
        course_id: CourseId,
    },
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AdmissionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate {
                student_id,
                course_id,
            } => AdmissionError::AlreadyEnrolled {
                student_id,
                course_id,
            },
            other => AdmissionError::Store(other),
        }
    }
}
