//! Enrollment admission: the schedule model, the decision engine, and its HTTP surface.
//!
//! The engine talks to its collaborators through three traits: [`EnrollmentStore`] for
//! persistence, [`CourseDirectory`] for schedule lookups, and [`IdentityResolver`] for
//! turning a bearer credential into a [`Requester`].

pub mod catalog;
pub mod domain;
pub mod lookup;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::StaticCourseCatalog;
pub use domain::{
    CourseId, CourseInfo, Credential, Enrollment, EnrollmentId, EnrollmentQuery,
    EnrollmentRequest, NewEnrollment, Requester, Role, StudentId, TeacherId,
};
pub use lookup::{CourseDirectory, IdentityError, IdentityResolver, LookupError};
pub use repository::{sort_newest_first, EnrollmentFilter, EnrollmentStore, StoreError};
pub use router::{authenticate, enrollment_router, EnrollmentApi};
pub use schedule::{
    overlaps, to_minutes, ClockTime, CourseSchedule, ScheduleError, DEFAULT_DURATION_MINUTES,
};
pub use service::{
    AdmissionConfig, AdmissionError, EnrollmentService, LookupFailurePolicy, TeacherSource,
};
