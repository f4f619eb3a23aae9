//! reqwest-backed clients for the course registry and auth service.

mod auth;
mod course;

pub use auth::HttpIdentityResolver;
pub use course::HttpCourseDirectory;

use std::time::Duration;

/// Shared client builder; every upstream call is single-attempt and bounded by `timeout`.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}
