use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Weekday;

use super::domain::{CourseId, CourseInfo, Credential};
use super::lookup::{CourseDirectory, LookupError};
use super::schedule::{ClockTime, CourseSchedule, ScheduleError};

/// In-process course table for running without a course registry.
#[derive(Debug, Clone, Default)]
pub struct StaticCourseCatalog {
    courses: BTreeMap<CourseId, CourseInfo>,
}

impl StaticCourseCatalog {
    pub fn new(courses: impl IntoIterator<Item = CourseInfo>) -> Self {
        Self {
            courses: courses
                .into_iter()
                .map(|course| (course.course_id.clone(), course))
                .collect(),
        }
    }

    /// The three-course table shipped with the standalone service.
    pub fn standard() -> Result<Self, ScheduleError> {
        let slot = |id: &str, day, start: (u32, u32), end: (u32, u32)| {
            CourseSchedule::new(
                day,
                ClockTime::hm(start.0, start.1),
                Some(ClockTime::hm(end.0, end.1)),
            )
            .map(|schedule| CourseInfo {
                course_id: CourseId::new(id),
                schedule,
                teacher_id: None,
            })
        };

        Ok(Self::new([
            slot("1", Weekday::Mon, (10, 0), (12, 0))?,
            slot("2", Weekday::Mon, (11, 0), (13, 0))?,
            slot("3", Weekday::Tue, (8, 0), (10, 0))?,
        ]))
    }

    pub fn get(&self, course_id: &CourseId) -> Option<&CourseInfo> {
        self.courses.get(course_id)
    }
}

#[async_trait]
impl CourseDirectory for StaticCourseCatalog {
    async fn course(
        &self,
        course_id: &CourseId,
        _credential: &Credential,
    ) -> Result<CourseInfo, LookupError> {
        self.get(course_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(course_id.clone()))
    }
}
