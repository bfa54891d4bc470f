//! # Employee Form
//!
//! The coordination core of an employee registration form: static field
//! validation, debounced duplicate detection against a lookup service, and
//! submission to a create-record service.
//!
//! ## Architecture
//!
//! ```text
//! edit ──► FormSession.edit() ──► validate() ──► ErrorSet
//!   │
//!   └─(employeeID / email)──► DebounceCoordinator ── settled ──┐
//!                                                             ▼
//!                          FormSession.settle() ── CheckDuplicate { token }
//!                                                             │
//!                                   DuplicateCheck.check() ◄──┘
//!                                             │
//!                 FormSession.resolve_lookup(token) ── stale? drop : apply
//! ```
//!
//! [`FormSession`] is a pure state machine; [`FormRuntime`] owns it on a
//! single task and performs the IO it asks for.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use employee_form::{Field, FormConfig, FormRuntime, HttpDuplicateCheckClient, HttpSubmissionClient};
//!
//! let config = FormConfig::from_env()?;
//! let lookup = Arc::new(HttpDuplicateCheckClient::from_config(&config)?);
//! let creator = Arc::new(HttpSubmissionClient::from_config(&config)?);
//!
//! let (runtime, handle) = FormRuntime::new(&config, Some(lookup), creator);
//! tokio::spawn(runtime.run());
//!
//! handle.edit(Field::EmployeeId, "E1");
//! handle.submit();
//! ```

pub mod clients;
pub mod config;
pub mod debounce;
pub mod error;
pub mod machine;
pub mod runtime;
pub mod types;
pub mod validation;

// Mock collaborators (feature-gated)
#[cfg(any(test, feature = "testing"))]
pub mod testing;


pub use clients::{DuplicateCheck, HttpDuplicateCheckClient, HttpSubmissionClient, RecordCreator};
pub use config::{CheckPolicy, FormConfig};
pub use debounce::{DebounceCoordinator, Settled};
pub use error::{ConfigError, FieldParseError, LookupError, SubmitError, GENERIC_SUBMIT_FAILURE};
pub use machine::{
    FormCommand, FormSession, FormView, LookupOutcome, Phase, StatusMessage, SubmissionOutcome,
};
pub use runtime::{FormHandle, FormInput, FormRuntime};
pub use types::{
    CheckToken, DuplicateRecord, ErrorSet, ExistsResult, Field, FieldSet, SubmitToken,
};
pub use validation::{validate, ValidationRules};
