use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{build_http_client, RecordCreator};
use crate::config::FormConfig;
use crate::error::{ConfigResult, SubmitError};
use crate::types::FieldSet;

/// Path of the create-record endpoint below the API base URL.
pub const CREATE_PATH: &str = "/addEmployee";

/// Status text for a 2xx reply that carries no message of its own.
pub const CREATED_FALLBACK_MESSAGE: &str = "Employee record created.";

/// Success body of the create-record service. Any 2xx counts as created,
/// whatever the body holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateResponse {
    #[serde(default)]
    pub message: String,
}

/// Failure body of the create-record service. `message` is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: Option<String>,
}

/// Record creation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSubmissionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubmissionClient {
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", api_url.trim_end_matches('/'), CREATE_PATH),
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
impl RecordCreator for HttpSubmissionClient {
    async fn create(&self, fields: &FieldSet) -> Result<String, SubmitError> {
        let resp = self.client.post(&self.endpoint).json(fields).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let payload: ErrorPayload = serde_json::from_str(&body).unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Create-record service rejected submission");
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: payload.message,
            });
        }

        let body = resp.text().await?;
        let created: CreateResponse = serde_json::from_str(&body).unwrap_or_default();
        info!(employee_id = %fields.employee_id, status = status.as_u16(), "Employee record created");

        if created.message.trim().is_empty() {
            debug!(body = %body, "Create-record reply carried no message");
            return Ok(CREATED_FALLBACK_MESSAGE.to_string());
        }
        Ok(created.message)
    }
}
