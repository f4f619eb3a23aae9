use async_trait::async_trait;

use super::domain::{CourseId, Enrollment, NewEnrollment, StudentId};

/// Row selection for the list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentFilter {
    All,
    Student(StudentId),
    Course(CourseId),
}

impl EnrollmentFilter {
    pub fn matches(&self, enrollment: &Enrollment) -> bool {
        match self {
            EnrollmentFilter::All => true,
            EnrollmentFilter::Student(student_id) => &enrollment.student_id == student_id,
            EnrollmentFilter::Course(course_id) => &enrollment.course_id == course_id,
        }
    }
}

/// Storage abstraction for enrollments.
///
/// `insert` must be a conditional write guarded by a uniqueness constraint on
/// `(student_id, course_id)`; a violation is reported as [`StoreError::Duplicate`] so two
/// racing admissions cannot both commit.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Matching rows, newest first.
    async fn list(&self, filter: &EnrollmentFilter) -> Result<Vec<Enrollment>, StoreError>;

    async fn list_by_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Enrollment>, StoreError> {
        self.list(&EnrollmentFilter::Student(student_id.clone()))
            .await
    }

    async fn exists(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
    ) -> Result<bool, StoreError>;

    async fn insert(&self, enrollment: NewEnrollment) -> Result<Enrollment, StoreError>;
}

/// Newest first, ties broken by id so listings are stable.
pub fn sort_newest_first(enrollments: &mut [Enrollment]) {
    enrollments.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("enrollment for student {student_id} in course {course_id} already exists")]
    Duplicate {
        student_id: StudentId,
        course_id: CourseId,
    },
    #[error("enrollment store unavailable: {0}")]
    Unavailable(String),
}
