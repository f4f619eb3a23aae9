use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::admission::{
    CourseDirectory, CourseId, CourseInfo, CourseSchedule, Credential, LookupError, TeacherId,
};

/// Course registry client calling `GET {base_url}/course/{id}`.
#[derive(Debug, Clone)]
pub struct HttpCourseDirectory {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RegistryCourse {
    #[serde(default)]
    teacher_id: Option<TeacherId>,
    #[serde(default)]
    schedule: Option<serde_json::Value>,
}

impl HttpCourseDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: super::build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn course_url(&self, course_id: &CourseId) -> String {
        format!("{}/course/{}", self.base_url, course_id)
    }
}

fn transport_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl CourseDirectory for HttpCourseDirectory {
    async fn course(
        &self,
        course_id: &CourseId,
        credential: &Credential,
    ) -> Result<CourseInfo, LookupError> {
        let response = self
            .client
            .get(self.course_url(course_id))
            .header(AUTHORIZATION, credential.header_value())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(course_id.clone()));
        }
        if !status.is_success() {
            return Err(LookupError::Unavailable(format!(
                "course registry responded with {status}"
            )));
        }

        let body: RegistryCourse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                LookupError::Timeout
            } else {
                LookupError::Malformed(err.to_string())
            }
        })?;

        let schedule = match body.schedule {
            None | Some(serde_json::Value::Null) => {
                return Err(LookupError::NotFound(course_id.clone()));
            }
            Some(raw) => serde_json::from_value::<CourseSchedule>(raw)
                .map_err(|err| LookupError::Malformed(err.to_string()))?,
        };

        Ok(CourseInfo {
            course_id: course_id.clone(),
            schedule,
            teacher_id: body.teacher_id,
        })
    }
}
