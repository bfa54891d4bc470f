//! Runtime driving a [`FormSession`].
//!
//! One task owns the session and the debounce coordinator, so every state
//! change happens in a single place, in order:
//!
//! ```text
//! FormHandle ── edit/submit/reset ──► inputs ─┐
//!                                             │
//! DebounceCoordinator ── settled ─────────────┼──► FormSession ── FormCommand
//!                                             │                      │
//! completions ◄── lookup / create tasks ◄─────┼──────────────────────┘
//!                                             │
//!                                             └──► watch<FormView> ──► host
//! ```
//!
//! Network calls run on spawned tasks and are never cancelled; a lookup that
//! returns after it was superseded is dropped by the session's token check.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::clients::{DuplicateCheck, RecordCreator};
use crate::config::FormConfig;
use crate::debounce::DebounceCoordinator;
use crate::error::{LookupError, SubmitError};
use crate::machine::{FormCommand, FormSession, FormView, SubmissionOutcome};
use crate::types::{CheckToken, ExistsResult, Field, SubmitToken};

/// Inbound operations from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInput {
    Edit { field: Field, value: String },
    Submit,
    Reset,
}

#[derive(Debug)]
enum Completion {
    Lookup {
        token: CheckToken,
        result: Result<ExistsResult, LookupError>,
    },
    Submission {
        token: SubmitToken,
        result: Result<String, SubmitError>,
    },
}

/// Cloneable handle for feeding input to a running [`FormRuntime`] and
/// observing what it renders.
#[derive(Debug, Clone)]
pub struct FormHandle {
    inputs: mpsc::UnboundedSender<FormInput>,
    view: watch::Receiver<FormView>,
}

impl FormHandle {
    /// Returns `false` once the runtime has stopped.
    pub fn send(&self, input: FormInput) -> bool {
        self.inputs.send(input).is_ok()
    }

    pub fn edit(&self, field: Field, value: impl Into<String>) -> bool {
        self.send(FormInput::Edit {
            field,
            value: value.into(),
        })
    }

    pub fn submit(&self) -> bool {
        self.send(FormInput::Submit)
    }

    pub fn reset(&self) -> bool {
        self.send(FormInput::Reset)
    }

    /// Latest published view.
    pub fn view(&self) -> FormView {
        self.view.borrow().clone()
    }

    /// Wait for the next published view. `None` once the runtime has stopped.
    pub async fn changed(&mut self) -> Option<FormView> {
        self.view.changed().await.ok()?;
        Some(self.view.borrow_and_update().clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<FormView> {
        self.view.clone()
    }
}

/// Owns a session and executes the commands it decides on.
pub struct FormRuntime {
    session: FormSession,
    debounce: DebounceCoordinator,
    lookup: Option<Arc<dyn DuplicateCheck>>,
    creator: Arc<dyn RecordCreator>,
    inputs: mpsc::UnboundedReceiver<FormInput>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    view: watch::Sender<FormView>,
}

impl FormRuntime {
    /// Build a runtime and its handle.
    ///
    /// Duplicate checking runs only when the configuration enables it and a
    /// lookup client is supplied.
    pub fn new(
        config: &FormConfig,
        lookup: Option<Arc<dyn DuplicateCheck>>,
        creator: Arc<dyn RecordCreator>,
    ) -> (Self, FormHandle) {
        let policy = lookup.as_ref().and(config.duplicate_policy());
        let session = FormSession::new(config.validation_rules(), policy);
        let lookup = lookup.filter(|_| session.duplicate_check_enabled());

        let watched: &[Field] = if lookup.is_some() {
            &[Field::EmployeeId, Field::Email]
        } else {
            &[]
        };
        let debounce = DebounceCoordinator::new(config.quiet_period, watched);

        let (inputs_tx, inputs) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(session.view());

        let runtime = Self {
            session,
            debounce,
            lookup,
            creator,
            inputs,
            completions_tx,
            completions,
            view: view_tx,
        };
        let handle = FormHandle {
            inputs: inputs_tx,
            view: view_rx,
        };
        (runtime, handle)
    }

    /// Process input until every [`FormHandle`] is dropped.
    pub async fn run(mut self) {
        info!(
            duplicate_check = self.session.duplicate_check_enabled(),
            quiet_period_ms = self.debounce.quiet_period().as_millis() as u64,
            "form runtime started"
        );

        loop {
            tokio::select! {
                biased;

                input = self.inputs.recv() => match input {
                    Some(input) => self.handle_input(input),
                    None => break,
                },
                Some(completion) = self.completions.recv() => self.handle_completion(completion),
                settled = self.debounce.next_settled() => {
                    debug!(field = %settled.field, "identity field settled");
                    let command = self.session.settle(settled);
                    self.execute(command);
                }
            }

            self.publish();
        }

        info!("form runtime stopped");
    }

    fn handle_input(&mut self, input: FormInput) {
        match input {
            FormInput::Edit { field, value } => {
                if self.session.watches(field) {
                    self.debounce.on_edit(field, value.clone());
                }
                self.session.edit(field, value);
            }
            FormInput::Submit => {
                let command = self.session.submit();
                self.execute(command);
            }
            FormInput::Reset => {
                self.debounce.clear();
                self.session.reset();
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Lookup { token, result } => {
                self.session.resolve_lookup(token, result);
            }
            Completion::Submission { token, result } => {
                if self.session.resolve_submission(token, result) == SubmissionOutcome::Created {
                    self.debounce.clear();
                }
            }
        }
    }

    fn execute(&self, command: Option<FormCommand>) {
        let Some(command) = command else {
            return;
        };

        let completions = self.completions_tx.clone();
        match command {
            FormCommand::CheckDuplicate {
                token,
                employee_id,
                email,
            } => {
                let Some(lookup) = self.lookup.clone() else {
                    return;
                };
                tokio::spawn(async move {
                    let result = lookup.check(&employee_id, &email).await;
                    let _ = completions.send(Completion::Lookup { token, result });
                });
            }
            FormCommand::CreateRecord { token, fields } => {
                let creator = self.creator.clone();
                tokio::spawn(async move {
                    let result = creator.create(&fields).await;
                    let _ = completions.send(Completion::Submission { token, result });
                });
            }
        }
    }

    fn publish(&self) {
        let view = self.session.view();
        self.view.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
