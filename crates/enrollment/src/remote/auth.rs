use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::admission::{Credential, IdentityError, IdentityResolver, Requester};

/// Auth service client calling `GET {base_url}/api/auth/me`.
#[derive(Debug, Clone)]
pub struct HttpIdentityResolver {
    client: reqwest::Client,
    base_url: String,
}

/// `{"status": "success", "data": {"id": ..., "role": ...}}`
#[derive(Debug, Deserialize)]
struct MeResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Requester>,
}

impl HttpIdentityResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: super::build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, credential: &Credential) -> Result<Requester, IdentityError> {
        let response = self
            .client
            .get(format!("{}/api/auth/me", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", credential.token()))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(IdentityError::Unauthenticated(
                "invalid or expired token".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(IdentityError::Unavailable(format!(
                "auth service responded with {status}"
            )));
        }

        let body: MeResponse = response
            .json()
            .await
            .map_err(|err| IdentityError::Malformed(err.to_string()))?;

        if body.status != "success" {
            return Err(IdentityError::Unauthenticated(
                body.message.unwrap_or_else(|| "token rejected".to_string()),
            ));
        }

        body.data
            .ok_or_else(|| IdentityError::Malformed("missing identity payload".to_string()))
    }
}
