use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::schedule::CourseSchedule;

/// Upstream systems send identifiers as either JSON strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn deserialize_identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawIdentifier::deserialize(deserializer)? {
        RawIdentifier::Text(value) => value.trim().to_string(),
        RawIdentifier::Signed(value) => value.to_string(),
        RawIdentifier::Unsigned(value) => value.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(#[serde(deserialize_with = "deserialize_identifier")] pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(#[serde(deserialize_with = "deserialize_identifier")] pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeacherId(#[serde(deserialize_with = "deserialize_identifier")] pub String);

/// Store-assigned row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnrollmentId(pub u64);

impl StudentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl CourseId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl TeacherId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted enrollment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub teacher_id: Option<TeacherId>,
    pub created_at: DateTime<Utc>,
}

/// Enrollment awaiting a store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnrollment {
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub teacher_id: Option<TeacherId>,
    pub created_at: DateTime<Utc>,
}

impl NewEnrollment {
    pub fn into_enrollment(self, id: EnrollmentId) -> Enrollment {
        Enrollment {
            id,
            student_id: self.student_id,
            course_id: self.course_id,
            teacher_id: self.teacher_id,
            created_at: self.created_at,
        }
    }
}

/// Client payload for the create operation. Every field is optional on the wire so the
/// engine can report missing values as validation failures instead of decode errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    #[serde(default)]
    pub student_id: Option<StudentId>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
}

impl EnrollmentRequest {
    pub fn new(student_id: StudentId, course_id: CourseId) -> Self {
        Self {
            student_id: Some(student_id),
            course_id: Some(course_id),
            teacher_id: None,
        }
    }

    pub fn with_teacher(mut self, teacher_id: TeacherId) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }
}

/// Query parameters accepted by the list operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnrollmentQuery {
    #[serde(default)]
    pub student_id: Option<StudentId>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
}

/// Role claimed by the auth service for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "murid")]
    Student,
    #[serde(alias = "pengajar", alias = "teacher")]
    Instructor,
    Admin,
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: StudentId,
    pub role: Role,
}

impl Requester {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: StudentId::new(id),
            role,
        }
    }
}

/// Raw `Authorization` header value, forwarded verbatim to upstream services.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(header_value: impl Into<String>) -> Self {
        Self(header_value.into())
    }

    pub fn bearer(token: &str) -> Self {
        Self(format!("Bearer {token}"))
    }

    /// Parse an `Authorization` header. Returns `None` when no token follows the scheme.
    pub fn from_header(value: &str) -> Option<Self> {
        let mut parts = value.split_whitespace();
        parts.next()?;
        parts.next()?;
        Some(Self(value.trim().to_string()))
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }

    pub fn token(&self) -> &str {
        self.0
            .split_whitespace()
            .nth(1)
            .unwrap_or_default()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Course details returned by a schedule lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    pub course_id: CourseId,
    pub schedule: CourseSchedule,
    pub teacher_id: Option<TeacherId>,
}
