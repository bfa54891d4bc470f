//! Per-field debouncing of identity edits.
//!
//! Each watched field owns at most one pending deadline. An edit replaces the
//! deadline rather than stacking another one, so a field that is edited
//! faster than the quiet period never settles until typing pauses.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut debounce = DebounceCoordinator::new(Duration::from_secs(1), &[Field::Email]);
//!
//! debounce.on_edit(Field::Email, "a@");
//! debounce.on_edit(Field::Email, "a@company.com");
//!
//! // Resolves one quiet period after the last edit.
//! let settled = debounce.next_settled().await;
//! assert_eq!(settled.value, "a@company.com");
//! ```

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::trace;

use crate::types::Field;

/// A value that stayed unchanged for the full quiet period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub field: Field,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
struct DebounceState {
    last_raw: String,
    last_settled: String,
    deadline: Option<Instant>,
}

/// Turns a stream of raw edits into settled values.
#[derive(Debug)]
pub struct DebounceCoordinator {
    quiet_period: Duration,
    watched: Vec<(Field, DebounceState)>,
}

impl DebounceCoordinator {
    pub fn new(quiet_period: Duration, fields: &[Field]) -> Self {
        let mut watched: Vec<(Field, DebounceState)> = Vec::with_capacity(fields.len());
        for field in fields {
            if !watched.iter().any(|(f, _)| f == field) {
                watched.push((*field, DebounceState::default()));
            }
        }
        Self {
            quiet_period,
            watched,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    pub fn watches(&self, field: Field) -> bool {
        self.watched.iter().any(|(f, _)| *f == field)
    }

    /// Record a raw edit and restart the field's quiet period.
    ///
    /// Never emits synchronously. Returns `false` for fields that are not
    /// watched.
    pub fn on_edit(&mut self, field: Field, value: impl Into<String>) -> bool {
        let quiet_period = self.quiet_period;
        let Some(state) = self.state_mut(field) else {
            return false;
        };

        state.last_raw = value.into();
        state.deadline = Some(Instant::now() + quiet_period);
        trace!(field = %field, "debounce deadline reset");
        true
    }

    /// Wait for the next field to settle.
    ///
    /// Pending forever while no deadline is scheduled. Cancel-safe: dropping
    /// the future before it resolves leaves every deadline in place.
    pub async fn next_settled(&mut self) -> Settled {
        loop {
            let Some(deadline) = self.earliest_deadline() else {
                std::future::pending::<()>().await;
                continue;
            };

            sleep_until(deadline).await;

            if let Some(settled) = self.take_due(deadline) {
                return settled;
            }
        }
    }

    /// Last settled value for `field`, empty if it never settled.
    pub fn last_settled(&self, field: Field) -> Option<&str> {
        self.state(field).map(|s| s.last_settled.as_str())
    }

    /// Last raw value seen for `field`.
    pub fn last_raw(&self, field: Field) -> Option<&str> {
        self.state(field).map(|s| s.last_raw.as_str())
    }

    pub fn is_pending(&self, field: Field) -> bool {
        self.state(field).is_some_and(|s| s.deadline.is_some())
    }

    /// Drop every pending deadline and forget recorded values.
    pub fn clear(&mut self) {
        for (_, state) in &mut self.watched {
            *state = DebounceState::default();
        }
    }

    fn earliest_deadline(&self) -> Option<Instant> {
        self.watched.iter().filter_map(|(_, s)| s.deadline).min()
    }

    fn take_due(&mut self, now: Instant) -> Option<Settled> {
        let (field, state) = self
            .watched
            .iter_mut()
            .filter(|(_, s)| s.deadline.is_some_and(|d| d <= now))
            .min_by_key(|(_, s)| s.deadline)?;

        state.deadline = None;
        state.last_settled = state.last_raw.clone();
        Some(Settled {
            field: *field,
            value: state.last_settled.clone(),
        })
    }

    fn state(&self, field: Field) -> Option<&DebounceState> {
        self.watched
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, s)| s)
    }

    fn state_mut(&mut self, field: Field) -> Option<&mut DebounceState> {
        self.watched
            .iter_mut()
            .find(|(f, _)| *f == field)
            .map(|(_, s)| s)
    }
}
