//! In-memory collaborators for driving a [`FormRuntime`] without a network.
//!
//! Responses are scripted in order and may be delayed, which is how tests
//! make a later duplicate check answer before an earlier one.
//!
//! # Example
//!
//! ```rust,ignore
//! let lookup = MockDuplicateCheck::new()
//!     .respond_after(Duration::from_secs(2), Ok(ExistsResult::NotFound))
//!     .respond(Ok(ExistsResult::Exists(record)));
//! ```
//!
//! [`FormRuntime`]: crate::runtime::FormRuntime

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::clients::{DuplicateCheck, RecordCreator};
use crate::error::{LookupError, SubmitError};
use crate::types::{ExistsResult, FieldSet};

type Scripted<T> = Arc<Mutex<VecDeque<(Duration, T)>>>;

/// Scripted duplicate lookup. Answers `NotFound` immediately once the script
/// runs out.
#[derive(Clone, Default)]
pub struct MockDuplicateCheck {
    responses: Scripted<Result<ExistsResult, LookupError>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockDuplicateCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, result: Result<ExistsResult, LookupError>) -> Self {
        self.respond_after(Duration::ZERO, result)
    }

    /// Queue a response delivered `delay` after the call starts.
    pub fn respond_after(self, delay: Duration, result: Result<ExistsResult, LookupError>) -> Self {
        self.responses.lock().unwrap().push_back((delay, result));
        self
    }

    /// `(employee_id, email)` of every call so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DuplicateCheck for MockDuplicateCheck {
    async fn check(&self, employee_id: &str, email: &str) -> Result<ExistsResult, LookupError> {
        self.calls
            .lock()
            .unwrap()
            .push((employee_id.to_string(), email.to_string()));

        let next = self.responses.lock().unwrap().pop_front();
        let (delay, result) = next.unwrap_or((Duration::ZERO, Ok(ExistsResult::NotFound)));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

/// Scripted create-record service. Answers with a generic confirmation once
/// the script runs out.
#[derive(Clone, Default)]
pub struct MockRecordCreator {
    responses: Scripted<Result<String, SubmitError>>,
    calls: Arc<Mutex<Vec<FieldSet>>>,
}

impl MockRecordCreator {
    pub const DEFAULT_MESSAGE: &'static str = "Employee added successfully.";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, result: Result<String, SubmitError>) -> Self {
        self.respond_after(Duration::ZERO, result)
    }

    pub fn respond_after(self, delay: Duration, result: Result<String, SubmitError>) -> Self {
        self.responses.lock().unwrap().push_back((delay, result));
        self
    }

    pub fn calls(&self) -> Vec<FieldSet> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordCreator for MockRecordCreator {
    async fn create(&self, fields: &FieldSet) -> Result<String, SubmitError> {
        self.calls.lock().unwrap().push(fields.clone());

        let next = self.responses.lock().unwrap().pop_front();
        let (delay, result) =
            next.unwrap_or((Duration::ZERO, Ok(Self::DEFAULT_MESSAGE.to_string())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
