use serde::{Deserialize, Serialize};
use statig::prelude::*;

use crate::deposit::actions::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationOutcome {
    Succeeded,
    ValidationFailed,
    PersistFailed,
    ReviewStepFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationEvent {
    Start { kind: ActionKind },
    Finish { outcome: OperationOutcome },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationPhase {
    #[default]
    Idle,
    Started,
    ValidationFailed,
    PersistFailed,
    ReviewStepFailed,
    Succeeded,
}

impl From<OperationOutcome> for OperationPhase {
    fn from(outcome: OperationOutcome) -> Self {
        match outcome {
            OperationOutcome::Succeeded => OperationPhase::Succeeded,
            OperationOutcome::ValidationFailed => OperationPhase::ValidationFailed,
            OperationOutcome::PersistFailed => OperationPhase::PersistFailed,
            OperationOutcome::ReviewStepFailed => OperationPhase::ReviewStepFailed,
        }
    }
}

/// Lifecycle of the one save-like operation an editor session may run.
///
/// Every settled phase accepts the next `Start`; `Start` while an
/// operation is in flight is ignored.
#[derive(Debug, Default)]
pub struct OperationTracker {
    phase: OperationPhase,
    current: Option<ActionKind>,
    completed: u64,
}

#[state_machine(initial = "State::idle()")]
impl OperationTracker {
    #[state]
    fn idle(&mut self, event: &OperationEvent) -> Outcome<State> {
        self.start_from_settled(event)
    }

    #[state]
    fn started(&mut self, event: &OperationEvent) -> Outcome<State> {
        match event {
            OperationEvent::Start { kind } => {
                tracing::warn!(
                    requested = %kind,
                    in_flight = ?self.current,
                    "Ignoring start while another operation is in flight"
                );
                Handled
            }
            OperationEvent::Finish { outcome } => {
                self.phase = (*outcome).into();
                self.completed += 1;
                tracing::debug!(
                    operation = ?self.current,
                    outcome = ?outcome,
                    "Operation settled"
                );
                match outcome {
                    OperationOutcome::Succeeded => Transition(State::succeeded()),
                    OperationOutcome::ValidationFailed => Transition(State::validation_failed()),
                    OperationOutcome::PersistFailed => Transition(State::persist_failed()),
                    OperationOutcome::ReviewStepFailed => Transition(State::review_step_failed()),
                }
            }
        }
    }

    #[state]
    fn succeeded(&mut self, event: &OperationEvent) -> Outcome<State> {
        self.start_from_settled(event)
    }

    #[state]
    fn validation_failed(&mut self, event: &OperationEvent) -> Outcome<State> {
        self.start_from_settled(event)
    }

    #[state]
    fn persist_failed(&mut self, event: &OperationEvent) -> Outcome<State> {
        self.start_from_settled(event)
    }

    #[state]
    fn review_step_failed(&mut self, event: &OperationEvent) -> Outcome<State> {
        self.start_from_settled(event)
    }
}

impl OperationTracker {
    fn start_from_settled(&mut self, event: &OperationEvent) -> Outcome<State> {
        match event {
            OperationEvent::Start { kind } => {
                self.current = Some(*kind);
                self.phase = OperationPhase::Started;
                Transition(State::started())
            }
            // Nothing in flight to finish
            OperationEvent::Finish { .. } => Handled,
        }
    }

    pub fn phase(&self) -> OperationPhase {
        self.phase
    }

    /// Operation currently running or, once settled, the last one that ran
    pub fn current(&self) -> Option<ActionKind> {
        self.current
    }

    pub fn in_flight(&self) -> Option<ActionKind> {
        if self.phase == OperationPhase::Started {
            self.current
        } else {
            None
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }
}
