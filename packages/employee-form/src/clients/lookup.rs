use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{build_http_client, DuplicateCheck};
use crate::config::FormConfig;
use crate::error::{ConfigResult, LookupError};
use crate::types::{DuplicateRecord, ExistsResult};

/// Path of the lookup endpoint below the API base URL.
pub const LOOKUP_PATH: &str = "/checkEmployee";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DuplicateRecord>,
}

impl TryFrom<LookupResponse> for ExistsResult {
    type Error = LookupError;

    fn try_from(resp: LookupResponse) -> Result<Self, Self::Error> {
        match (resp.exists, resp.data) {
            (false, _) => Ok(ExistsResult::NotFound),
            (true, Some(record)) => Ok(ExistsResult::Exists(record)),
            (true, None) => Err(LookupError::Parse(
                "exists is true but no record was returned".into(),
            )),
        }
    }
}

/// Duplicate lookup over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDuplicateCheckClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDuplicateCheckClient {
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", api_url.trim_end_matches('/'), LOOKUP_PATH),
        }
    }

    pub fn from_config(config: &FormConfig) -> ConfigResult<Self> {
        let client = build_http_client(config.request_timeout)?;
        Ok(Self::new(client, &config.api_url))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DuplicateCheck for HttpDuplicateCheckClient {
    async fn check(&self, employee_id: &str, email: &str) -> Result<ExistsResult, LookupError> {
        let request = LookupRequest {
            employee_id: employee_id.to_string(),
            email: email.to_string(),
        };

        let resp = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LookupError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let lookup: LookupResponse = resp.json().await?;
        debug!(employee_id, email, exists = lookup.exists, "Duplicate lookup answered");
        lookup.try_into()
    }
}
