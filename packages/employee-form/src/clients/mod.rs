//! Remote collaborators: the duplicate lookup and the create-record service.
//!
//! Both sit behind traits so the runtime can be driven by in-memory mocks
//! (see [`crate::testing`]) as easily as by the HTTP clients.

mod lookup;
mod submission;

pub use lookup::{HttpDuplicateCheckClient, LookupRequest, LookupResponse, LOOKUP_PATH};
pub use submission::{
    CreateResponse, ErrorPayload, HttpSubmissionClient, CREATED_FALLBACK_MESSAGE, CREATE_PATH,
};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ConfigResult, LookupError, SubmitError};
use crate::types::{ExistsResult, FieldSet};

/// Checks whether an employee with the given identity already exists.
#[async_trait]
pub trait DuplicateCheck: Send + Sync {
    async fn check(&self, employee_id: &str, email: &str) -> Result<ExistsResult, LookupError>;
}

/// Creates an employee record, returning the service's confirmation message.
#[async_trait]
pub trait RecordCreator: Send + Sync {
    async fn create(&self, fields: &FieldSet) -> Result<String, SubmitError>;
}

pub(crate) fn build_http_client(timeout: Option<Duration>) -> ConfigResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}
