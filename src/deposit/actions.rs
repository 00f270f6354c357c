// Actions dispatched by the workflow and folded into the editor state

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::deposit::types::{CommunitySelection, FieldErrors, Record};

/// Operation an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Save,
    Publish,
    SubmitReview,
    Preview,
    Delete,
    ReservePid,
    DiscardPid,
    /// Re-read of the draft after the review request changed
    Fetch,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Save => "save",
            ActionKind::Publish => "publish",
            ActionKind::SubmitReview => "submit_review",
            ActionKind::Preview => "preview",
            ActionKind::Delete => "delete",
            ActionKind::ReservePid => "reserve_pid",
            ActionKind::DiscardPid => "discard_pid",
            ActionKind::Fetch => "fetch",
        }
    }

    /// Whether a success of this kind carries a record to merge into the editor
    pub fn refreshes_record(&self) -> bool {
        matches!(
            self,
            ActionKind::Fetch | ActionKind::Save | ActionKind::ReservePid | ActionKind::DiscardPid
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPhase {
    Started,
    Succeeded,
    Failed,
    FailedWithValidationErrors,
    ReconciliationFailed,
}

/// Last action seen by the editor, e.g. `(Publish, Started)` while publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    pub kind: ActionKind,
    pub phase: ActionPhase,
}

impl ActionState {
    pub fn new(kind: ActionKind, phase: ActionPhase) -> Self {
        Self { kind, phase }
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase == ActionPhase::Started
    }
}

/// Operation context kept while an action is in flight so the UI can
/// re-render it (the pending review comment, the PID being reserved).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionExtra {
    #[default]
    Empty,
    ReviewComment {
        review_comment: Option<String>,
    },
    Pid {
        pid_type: String,
    },
}

impl ActionExtra {
    pub fn is_empty(&self) -> bool {
        matches!(self, ActionExtra::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DepositAction {
    Started {
        kind: ActionKind,
        extra: ActionExtra,
    },
    Succeeded {
        kind: ActionKind,
        data: Option<Record>,
    },
    ValidationFailed {
        kind: ActionKind,
        data: Record,
        errors: FieldErrors,
    },
    Failed {
        kind: ActionKind,
        errors: FieldErrors,
    },
    /// Draft saved, but the review request could not be brought in line
    ReconciliationFailed {
        kind: ActionKind,
        data: Record,
        errors: FieldErrors,
    },
    CommunityChanged {
        selection: CommunitySelection,
    },
}

impl DepositAction {
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            DepositAction::Started { kind, .. }
            | DepositAction::Succeeded { kind, .. }
            | DepositAction::ValidationFailed { kind, .. }
            | DepositAction::Failed { kind, .. }
            | DepositAction::ReconciliationFailed { kind, .. } => Some(*kind),
            DepositAction::CommunityChanged { .. } => None,
        }
    }

    pub fn phase(&self) -> Option<ActionPhase> {
        match self {
            DepositAction::Started { .. } => Some(ActionPhase::Started),
            DepositAction::Succeeded { .. } => Some(ActionPhase::Succeeded),
            DepositAction::ValidationFailed { .. } => Some(ActionPhase::FailedWithValidationErrors),
            DepositAction::Failed { .. } => Some(ActionPhase::Failed),
            DepositAction::ReconciliationFailed { .. } => Some(ActionPhase::ReconciliationFailed),
            DepositAction::CommunityChanged { .. } => None,
        }
    }

    pub fn action_state(&self) -> Option<ActionState> {
        Some(ActionState::new(self.kind()?, self.phase()?))
    }
}
