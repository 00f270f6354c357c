// Editor state - the session context folded from dispatched actions

use serde::{Deserialize, Serialize};

use crate::deposit::actions::*;
use crate::deposit::state::{derive_state, DepositState};
use crate::deposit::types::*;

/// Everything the deposit form renders from.
///
/// Only [`EditorState::apply`] mutates it, one action at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    pub record: Record,
    pub editor_state: DepositState,
    pub action_state: Option<ActionState>,
    pub action_state_extra: ActionExtra,
    pub errors: FieldErrors,
}

impl EditorState {
    /// Initialize from the record the server rendered the form with
    pub fn new(record: Record, selection: CommunitySelection) -> Self {
        let editor_state = derive_state(&record, &selection);
        Self {
            record,
            editor_state,
            action_state: None,
            action_state_extra: ActionExtra::Empty,
            errors: FieldErrors::new(),
        }
    }

    pub fn selection(&self) -> &CommunitySelection {
        &self.editor_state.selected_community
    }

    pub fn is_busy(&self) -> bool {
        self.action_state.is_some_and(|s| s.is_in_flight())
    }

    /// Comment of a review submission in flight, to pre-fill the dialog
    pub fn pending_review_comment(&self) -> Option<&str> {
        match &self.action_state_extra {
            ActionExtra::ReviewComment { review_comment } => review_comment.as_deref(),
            _ => None,
        }
    }

    fn absorb(&mut self, data: &Record) {
        self.record = self.record.merged_with(data);
        let selection = self.editor_state.selected_community.clone();
        self.editor_state = derive_state(&self.record, &selection);
    }

    pub fn apply(&mut self, action: &DepositAction) {
        if let Some(state) = action.action_state() {
            self.action_state = Some(state);
        }

        match action {
            DepositAction::Started { extra, .. } => {
                if !extra.is_empty() {
                    self.action_state_extra = extra.clone();
                }
            }
            DepositAction::Succeeded { kind, data } => {
                if !kind.refreshes_record() {
                    return;
                }
                if let Some(data) = data {
                    self.absorb(data);
                }
                self.errors = FieldErrors::new();
                self.action_state_extra = ActionExtra::Empty;
            }
            DepositAction::ValidationFailed { data, errors, .. } => {
                self.absorb(data);
                self.errors = errors.clone();
            }
            DepositAction::Failed { errors, .. } => {
                self.errors = errors.clone();
                self.action_state_extra = ActionExtra::Empty;
            }
            DepositAction::ReconciliationFailed { data, errors, .. } => {
                self.absorb(data);
                self.errors = errors.clone();
                self.action_state_extra = ActionExtra::Empty;
            }
            DepositAction::CommunityChanged { selection } => {
                // a resolved selection stays resolved for the session
                if !selection.is_resolved() && self.selection().is_resolved() {
                    return;
                }
                self.editor_state = derive_state(&self.record, selection);
            }
        }
    }
}
