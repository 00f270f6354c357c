use thiserror::Error;

use crate::deposit::actions::ActionKind;
use crate::deposit::submission::ConfirmationError;
use crate::deposit::types::{FieldErrors, Record};

/// Failure reported by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ServiceError {
    /// HTTP status, when the failure came from a server response
    pub status: Option<u16>,
    pub message: String,
    pub errors: FieldErrors,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    /// Error list to surface; falls back to the message as a global error
    pub fn error_list(&self) -> FieldErrors {
        if self.errors.is_empty() {
            FieldErrors::global(&self.message)
        } else {
            self.errors.clone()
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("cannot start {requested}: {in_flight} is still in flight")]
    OperationInFlight {
        requested: ActionKind,
        in_flight: ActionKind,
    },
    #[error("{kind} failed: {source}")]
    Persist {
        kind: ActionKind,
        #[source]
        source: ServiceError,
    },
    #[error("draft saved with {} validation error(s)", .errors.len())]
    Validation {
        record: Box<Record>,
        errors: FieldErrors,
    },
    #[error("draft saved but the review request could not be reconciled: {source}")]
    Reconciliation {
        record: Box<Record>,
        /// Field errors the save itself reported
        validation_errors: FieldErrors,
        #[source]
        source: ServiceError,
    },
    #[error("selected community has no uuid")]
    MissingCommunityUuid,
    #[error("{0} requires a saved draft identifier")]
    MissingDraftId(ActionKind),
    #[error("review submission not confirmed: {0}")]
    Confirmation(#[from] ConfirmationError),
}

impl WorkflowError {
    /// Record retained by the failure, when the draft did get saved
    pub fn saved_record(&self) -> Option<&Record> {
        match self {
            WorkflowError::Validation { record, .. }
            | WorkflowError::Reconciliation { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation { .. })
    }
}
