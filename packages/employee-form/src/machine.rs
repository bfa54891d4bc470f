//! The form session state machine.
//!
//! `FormSession` is pure and synchronous: every operation updates state and
//! optionally returns a [`FormCommand`] describing IO for the runtime to
//! perform. Results of that IO come back through [`FormSession::resolve_lookup`]
//! and [`FormSession::resolve_submission`].
//!
//! # Stale lookups
//!
//! Every dispatched duplicate check carries a [`CheckToken`]. Only a result
//! whose token equals the latest dispatched token may touch state; anything
//! else is silently dropped. Reset and successful submission advance the
//! token too, so checks issued before them can never resurrect a record.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{CheckPolicy, FormConfig};
use crate::debounce::Settled;
use crate::error::{LookupError, SubmitError};
use crate::types::{
    CheckToken, DuplicateRecord, ErrorSet, ExistsResult, Field, FieldSet, SubmitToken,
};
use crate::validation::ValidationRules;

/// IO requested by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormCommand {
    CheckDuplicate {
        token: CheckToken,
        employee_id: String,
        email: String,
    },
    CreateRecord {
        token: SubmitToken,
        fields: FieldSet,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Editing,
    /// A duplicate check is outstanding
    Checking,
    Submitting,
}

/// Primary status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StatusMessage {
    Success(String),
    Failure(String),
}

impl StatusMessage {
    pub fn text(&self) -> &str {
        match self {
            StatusMessage::Success(text) | StatusMessage::Failure(text) => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Applied,
    Failed,
    /// Superseded by a later check, reset, or submission
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Created,
    Rejected,
    /// Answers an attempt the user reset away from
    Stale,
}

/// Everything a host needs to render one frame of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub fields: FieldSet,
    pub errors: ErrorSet,
    /// Existing record, only while it still matches a live identity field
    pub duplicate: Option<DuplicateRecord>,
    pub employee_id_taken: bool,
    pub email_taken: bool,
    pub phase: Phase,
    pub status: Option<StatusMessage>,
    /// Transient lookup-failure notice
    pub notice: Option<String>,
}

impl Default for FormView {
    fn default() -> Self {
        Self {
            fields: FieldSet::default(),
            errors: ErrorSet::default(),
            duplicate: None,
            employee_id_taken: false,
            email_taken: false,
            phase: Phase::Editing,
            status: None,
            notice: None,
        }
    }
}

/// One interactive registration session.
#[derive(Debug, Clone)]
pub struct FormSession {
    rules: ValidationRules,
    /// `None` disables duplicate checking entirely
    policy: Option<CheckPolicy>,

    fields: FieldSet,
    errors: ErrorSet,
    duplicate: Option<DuplicateRecord>,

    settled_employee_id: String,
    settled_email: String,

    latest_token: CheckToken,
    checking: bool,
    submitting: bool,
    submit_token: SubmitToken,

    status: Option<StatusMessage>,
    notice: Option<String>,
}

impl FormSession {
    pub fn new(rules: ValidationRules, policy: Option<CheckPolicy>) -> Self {
        Self {
            rules,
            policy,
            fields: FieldSet::default(),
            errors: ErrorSet::default(),
            duplicate: None,
            settled_employee_id: String::new(),
            settled_email: String::new(),
            latest_token: CheckToken::default(),
            checking: false,
            submitting: false,
            submit_token: SubmitToken::default(),
            status: None,
            notice: None,
        }
    }

    pub fn from_config(config: &FormConfig) -> Self {
        Self::new(config.validation_rules(), config.duplicate_policy())
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    /// Stored duplicate, regardless of whether it is still displayed.
    pub fn stored_duplicate(&self) -> Option<&DuplicateRecord> {
        self.duplicate.as_ref()
    }

    pub fn latest_token(&self) -> CheckToken {
        self.latest_token
    }

    pub fn duplicate_check_enabled(&self) -> bool {
        self.policy.is_some()
    }

    /// Whether edits to `field` should be debounced for duplicate checks.
    pub fn watches(&self, field: Field) -> bool {
        self.duplicate_check_enabled() && field.is_identity()
    }

    pub fn phase(&self) -> Phase {
        if self.submitting {
            Phase::Submitting
        } else if self.checking {
            Phase::Checking
        } else {
            Phase::Editing
        }
    }

    /// Apply a user edit and recompute every validation error.
    ///
    /// A displayed duplicate is left alone here; it disappears from the view
    /// once the live value stops matching it.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        self.fields.set(field, value);
        self.errors = self.rules.check(&self.fields);
        if field.is_identity() {
            self.notice = None;
        }
        debug!(field = %field, errors = self.errors.len(), "field edited");
    }

    /// Record a settled identity value and decide whether to check for a
    /// duplicate.
    pub fn settle(&mut self, settled: Settled) -> Option<FormCommand> {
        let policy = self.policy?;

        match settled.field {
            Field::EmployeeId => self.settled_employee_id = settled.value,
            Field::Email => self.settled_email = settled.value,
            _ => return None,
        }

        let employee_id = self.settled_employee_id.trim();
        let email = self.settled_email.trim();
        if !policy.permits(employee_id, email) {
            debug!(?policy, "settled identity incomplete, no duplicate check");
            return None;
        }

        self.latest_token = self.latest_token.next();
        self.checking = true;
        self.notice = None;
        info!(token = %self.latest_token, employee_id, email, "dispatching duplicate check");

        Some(FormCommand::CheckDuplicate {
            token: self.latest_token,
            employee_id: employee_id.to_string(),
            email: email.to_string(),
        })
    }

    /// Apply a lookup result if it answers the latest dispatched check.
    pub fn resolve_lookup(
        &mut self,
        token: CheckToken,
        result: Result<ExistsResult, LookupError>,
    ) -> LookupOutcome {
        if token != self.latest_token || !self.checking {
            debug!(%token, latest = %self.latest_token, "discarding stale duplicate check");
            return LookupOutcome::Stale;
        }

        self.checking = false;
        match result {
            Ok(ExistsResult::NotFound) => {
                self.duplicate = None;
                LookupOutcome::Applied
            }
            Ok(ExistsResult::Exists(record)) => {
                info!(%token, employee_id = %record.employee_id, "existing employee found");
                self.duplicate = Some(record);
                LookupOutcome::Applied
            }
            Err(err) => {
                warn!(%token, error = %err, "duplicate check failed");
                self.notice = Some(format!("Could not check for an existing employee: {err}"));
                LookupOutcome::Failed
            }
        }
    }

    /// Validate everything and, if clean, request record creation.
    ///
    /// Ignored while a submission is already in flight.
    pub fn submit(&mut self) -> Option<FormCommand> {
        if self.submitting {
            debug!("submission already in flight, ignoring submit");
            return None;
        }

        self.errors = self.rules.check(&self.fields);
        if !self.errors.is_empty() {
            debug!(errors = self.errors.len(), "submission blocked by validation");
            return None;
        }

        self.submitting = true;
        self.submit_token = self.submit_token.next();
        Some(FormCommand::CreateRecord {
            token: self.submit_token,
            fields: self.fields.clone(),
        })
    }

    /// Apply the answer to the submission in flight. Answers to attempts
    /// superseded by a reset change nothing.
    pub fn resolve_submission(
        &mut self,
        token: SubmitToken,
        result: Result<String, SubmitError>,
    ) -> SubmissionOutcome {
        if token != self.submit_token || !self.submitting {
            info!(%token, latest = %self.submit_token, ok = result.is_ok(), "discarding superseded submission result");
            return SubmissionOutcome::Stale;
        }

        self.submitting = false;
        match result {
            Ok(message) => {
                info!(message = %message, "submission accepted");
                self.clear_form();
                self.status = Some(StatusMessage::Success(message));
                SubmissionOutcome::Created
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                self.status = Some(StatusMessage::Failure(err.user_message().to_string()));
                SubmissionOutcome::Rejected
            }
        }
    }

    /// Return to a blank form. Any outstanding duplicate check or submission
    /// becomes stale.
    pub fn reset(&mut self) {
        self.clear_form();
        self.submitting = false;
        self.submit_token = self.submit_token.next();
        self.status = None;
        debug!(token = %self.latest_token, "form reset");
    }

    pub fn view(&self) -> FormView {
        let (employee_id_taken, email_taken) = match &self.duplicate {
            Some(record) => (
                matches_live(&record.employee_id, &self.fields.employee_id),
                matches_live(&record.email, &self.fields.email),
            ),
            None => (false, false),
        };

        let duplicate = if employee_id_taken || email_taken {
            self.duplicate.clone()
        } else {
            None
        };

        FormView {
            fields: self.fields.clone(),
            errors: self.errors.clone(),
            duplicate,
            employee_id_taken,
            email_taken,
            phase: self.phase(),
            status: self.status.clone(),
            notice: self.notice.clone(),
        }
    }

    fn clear_form(&mut self) {
        self.fields = FieldSet::default();
        self.errors = ErrorSet::default();
        self.duplicate = None;
        self.settled_employee_id.clear();
        self.settled_email.clear();
        self.notice = None;
        self.checking = false;
        // in-flight checks answer an older token from here on
        self.latest_token = self.latest_token.next();
    }
}

fn matches_live(checked: &str, live: &str) -> bool {
    let live = live.trim();
    !live.is_empty() && checked.trim() == live
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn session() -> FormSession {
        FormSession::new(ValidationRules::default(), Some(CheckPolicy::Either))
    }

    fn fill_valid(session: &mut FormSession, employee_id: &str, email: &str) {
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        session.edit(Field::EmployeeId, employee_id);
        session.edit(Field::Name, "Ada Lovelace");
        session.edit(Field::Email, email);
        session.edit(Field::PhoneNumber, "5551234567");
        session.edit(Field::Department, "Engineering");
        session.edit(Field::DateOfJoining, today);
        session.edit(Field::Role, "Engineer");
    }

    fn settle(session: &mut FormSession, field: Field, value: &str) -> Option<FormCommand> {
        session.settle(Settled {
            field,
            value: value.to_string(),
        })
    }

    fn record(employee_id: &str, email: &str) -> DuplicateRecord {
        DuplicateRecord {
            employee_id: employee_id.into(),
            name: "Existing Person".into(),
            email: email.into(),
            ..Default::default()
        }
    }

    fn submit_token_of(cmd: Option<FormCommand>) -> SubmitToken {
        match cmd {
            Some(FormCommand::CreateRecord { token, .. }) => token,
            other => panic!("expected a create command, got {other:?}"),
        }
    }

    fn token_of(cmd: Option<FormCommand>) -> CheckToken {
        match cmd {
            Some(FormCommand::CheckDuplicate { token, .. }) => token,
            other => panic!("expected a duplicate check, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_recomputes_errors() {
        let mut session = session();
        session.edit(Field::EmployeeId, "E1");

        assert!(!session.errors().contains(Field::EmployeeId));
        assert!(session.errors().contains(Field::Name));

        session.edit(Field::EmployeeId, "");
        assert!(session.errors().contains(Field::EmployeeId));
    }

    #[test]
    fn test_settle_dispatches_check_with_both_settled_values() {
        let mut session = session();
        session.edit(Field::EmployeeId, "E1");
        assert!(settle(&mut session, Field::EmployeeId, "E1").is_some());

        let cmd = settle(&mut session, Field::Email, "e1@company.com");
        assert_eq!(
            cmd,
            Some(FormCommand::CheckDuplicate {
                token: session.latest_token(),
                employee_id: "E1".into(),
                email: "e1@company.com".into(),
            })
        );
        assert_eq!(session.phase(), Phase::Checking);
    }

    #[test]
    fn test_both_policy_waits_for_both_fields() {
        let mut session = FormSession::new(ValidationRules::default(), Some(CheckPolicy::Both));
        assert!(settle(&mut session, Field::EmployeeId, "E1").is_none());
        assert_eq!(session.phase(), Phase::Editing);
        assert!(settle(&mut session, Field::Email, "e1@company.com").is_some());
    }

    #[test]
    fn test_empty_identity_is_not_checked() {
        let mut session = session();
        assert!(settle(&mut session, Field::EmployeeId, "   ").is_none());
        assert!(settle(&mut session, Field::Email, "").is_none());
    }

    #[test]
    fn test_disabled_duplicate_check_never_dispatches() {
        let mut session = FormSession::new(ValidationRules::default(), None);
        assert!(!session.watches(Field::EmployeeId));
        assert!(settle(&mut session, Field::EmployeeId, "E1").is_none());
    }

    #[test]
    fn test_found_record_is_stored_and_displayed() {
        let mut session = session();
        session.edit(Field::EmployeeId, "E1");
        let token = token_of(settle(&mut session, Field::EmployeeId, "E1"));

        let outcome = session.resolve_lookup(token, Ok(ExistsResult::Exists(record("E1", "x@company.com"))));

        assert_eq!(outcome, LookupOutcome::Applied);
        let view = session.view();
        assert_eq!(view.phase, Phase::Editing);
        assert!(view.employee_id_taken);
        assert!(!view.email_taken);
        assert_eq!(view.duplicate.unwrap().employee_id, "E1");
    }

    #[test]
    fn test_not_found_clears_record() {
        let mut session = session();
        session.edit(Field::EmployeeId, "E1");
        let token = token_of(settle(&mut session, Field::EmployeeId, "E1"));
        session.resolve_lookup(token, Ok(ExistsResult::Exists(record("E1", ""))));

        let token = token_of(settle(&mut session, Field::EmployeeId, "E1"));
        session.resolve_lookup(token, Ok(ExistsResult::NotFound));

        assert!(session.stored_duplicate().is_none());
        assert!(session.view().duplicate.is_none());
    }

    #[test]
    fn test_superseded_response_is_discarded_in_either_order() {
        // A answers after B was dispatched
        let mut session = session();
        session.edit(Field::EmployeeId, "E2");
        let a = token_of(settle(&mut session, Field::EmployeeId, "E1"));
        let b = token_of(settle(&mut session, Field::EmployeeId, "E2"));

        assert_eq!(
            session.resolve_lookup(a, Ok(ExistsResult::Exists(record("E1", "")))),
            LookupOutcome::Stale
        );
        assert!(session.stored_duplicate().is_none());
        assert_eq!(session.phase(), Phase::Checking);

        session.resolve_lookup(b, Ok(ExistsResult::Exists(record("E2", ""))));
        assert_eq!(session.stored_duplicate().unwrap().employee_id, "E2");

        // B answers first, then A arrives late
        let mut session = session_with_id("E2");
        let a = token_of(settle(&mut session, Field::EmployeeId, "E1"));
        let b = token_of(settle(&mut session, Field::EmployeeId, "E2"));

        session.resolve_lookup(b, Ok(ExistsResult::Exists(record("E2", ""))));
        assert_eq!(
            session.resolve_lookup(a, Ok(ExistsResult::NotFound)),
            LookupOutcome::Stale
        );
        assert_eq!(session.stored_duplicate().unwrap().employee_id, "E2");
    }

    fn session_with_id(employee_id: &str) -> FormSession {
        let mut session = session();
        session.edit(Field::EmployeeId, employee_id);
        session
    }

    #[test]
    fn test_lookup_failure_sets_notice_and_keeps_record() {
        let mut session = session_with_id("E1");
        let token = token_of(settle(&mut session, Field::EmployeeId, "E1"));
        session.resolve_lookup(token, Ok(ExistsResult::Exists(record("E1", ""))));

        let token = token_of(settle(&mut session, Field::EmployeeId, "E1"));
        let outcome = session.resolve_lookup(token, Err(LookupError::Timeout));

        assert_eq!(outcome, LookupOutcome::Failed);
        let view = session.view();
        assert_eq!(view.phase, Phase::Editing);
        assert!(view.notice.unwrap().contains("timed out"));
        assert!(view.duplicate.is_some());
        assert!(view.errors.contains(Field::Name));
    }

    #[test]
    fn test_changed_identity_hides_stale_record() {
        let mut session = session_with_id("E1");
        session.edit(Field::Email, "e1@company.com");
        let token = token_of(settle(&mut session, Field::Email, "e1@company.com"));
        session.resolve_lookup(token, Ok(ExistsResult::Exists(record("E1", "e1@company.com"))));
        assert!(session.view().email_taken);

        session.edit(Field::EmployeeId, "E9");
        let view = session.view();
        assert!(!view.employee_id_taken);
        assert!(view.email_taken);
        assert!(view.duplicate.is_some());

        session.edit(Field::Email, "e9@company.com");
        let view = session.view();
        assert!(!view.email_taken);
        assert!(view.duplicate.is_none());
        // not cleared until a fresh check says so
        assert!(session.stored_duplicate().is_some());
    }

    #[test]
    fn test_submit_blocked_by_validation() {
        let mut session = session_with_id("E1");
        assert!(session.submit().is_none());
        assert_eq!(session.phase(), Phase::Editing);
        assert!(session.errors().contains(Field::Role));
    }

    #[test]
    fn test_successful_submission_resets_form() {
        let mut session = session();
        fill_valid(&mut session, "E1", "e1@company.com");

        let cmd = session.submit();
        assert!(matches!(cmd, Some(FormCommand::CreateRecord { ref fields, .. }) if fields.employee_id == "E1"));
        assert_eq!(session.phase(), Phase::Submitting);
        assert!(session.submit().is_none(), "double submit must be ignored");

        let outcome = session.resolve_submission(submit_token_of(cmd), Ok("Added".into()));

        assert_eq!(outcome, SubmissionOutcome::Created);
        let view = session.view();
        assert!(view.fields.is_blank());
        assert!(view.errors.is_empty());
        assert_eq!(view.status, Some(StatusMessage::Success("Added".into())));
        assert_eq!(view.phase, Phase::Editing);
    }

    #[test]
    fn test_failed_submission_keeps_fields() {
        let mut session = session();
        fill_valid(&mut session, "E1", "e1@company.com");
        let token = submit_token_of(session.submit());

        let outcome = session.resolve_submission(token, Err(SubmitError::Rejected {
            status: 409,
            message: Some("Duplicate".into()),
        }));

        assert_eq!(outcome, SubmissionOutcome::Rejected);
        let view = session.view();
        assert_eq!(view.fields.employee_id, "E1");
        assert_eq!(view.fields.email, "e1@company.com");
        assert_eq!(view.status.unwrap().text(), "Duplicate");
        assert_eq!(view.phase, Phase::Editing);
    }

    #[test]
    fn test_reset_discards_in_flight_check() {
        let mut session = session_with_id("E1");
        let token = token_of(settle(&mut session, Field::EmployeeId, "E1"));

        session.reset();

        assert_eq!(
            session.resolve_lookup(token, Ok(ExistsResult::Exists(record("E1", "")))),
            LookupOutcome::Stale
        );
        let view = session.view();
        assert_eq!(view, FormView::default());
        assert!(session.stored_duplicate().is_none());
    }

    #[test]
    fn test_reset_while_submitting_supersedes_the_attempt() {
        let mut session = session();
        fill_valid(&mut session, "E1", "e1@company.com");
        let first = submit_token_of(session.submit());

        session.reset();
        assert_eq!(session.phase(), Phase::Editing);

        fill_valid(&mut session, "E2", "e2@company.com");
        session.edit(Field::Name, "Grace");

        let outcome = session.resolve_submission(first, Ok("Added".into()));
        assert_eq!(outcome, SubmissionOutcome::Stale);
        let view = session.view();
        assert_eq!(view.fields.employee_id, "E2");
        assert_eq!(view.fields.name, "Grace");
        assert_eq!(view.status, None);
        assert_eq!(view.phase, Phase::Editing);

        let second = submit_token_of(session.submit());
        assert!(second > first);
        assert_eq!(
            session.resolve_submission(first, Err(SubmitError::Timeout)),
            SubmissionOutcome::Stale
        );
        assert_eq!(session.phase(), Phase::Submitting);

        let outcome = session.resolve_submission(second, Ok("Added".into()));
        assert_eq!(outcome, SubmissionOutcome::Created);
        assert!(session.view().fields.is_blank());
    }

    #[test]
    fn test_identity_edit_clears_lookup_notice() {
        let mut session = session_with_id("E1");
        let token = token_of(settle(&mut session, Field::EmployeeId, "E1"));
        session.resolve_lookup(token, Err(LookupError::Timeout));
        assert!(session.view().notice.is_some());

        session.edit(Field::Name, "Ada");
        assert!(session.view().notice.is_some());

        session.edit(Field::Email, "e1@company.com");
        assert!(session.view().notice.is_none());
    }
}
