use async_trait::async_trait;

use super::domain::{CourseId, CourseInfo, Credential, Requester};

/// Resolves a course id to its weekly schedule and assigned teacher.
///
/// Implementations forward the caller's credential so the registry applies the same
/// authorization as it would to the caller directly.
#[async_trait]
pub trait CourseDirectory: Send + Sync {
    async fn course(
        &self,
        course_id: &CourseId,
        credential: &Credential,
    ) -> Result<CourseInfo, LookupError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("course {0} not found or has no schedule")]
    NotFound(CourseId),
    #[error("course registry unavailable: {0}")]
    Unavailable(String),
    #[error("course registry returned malformed data: {0}")]
    Malformed(String),
    #[error("course registry timed out")]
    Timeout,
}

/// Resolves a bearer credential to the caller's identity and role.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credential: &Credential) -> Result<Requester, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
    #[error("auth service returned malformed data: {0}")]
    Malformed(String),
}
