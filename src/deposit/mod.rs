// Deposit Workflow Module - state derivation and save orchestration
//
// The deriver is pure; the orchestrator reaches the backend and the browser
// only through the traits in `traits`, so both run without I/O in tests.

pub mod types;
pub mod state;
pub mod actions;
pub mod errors;
pub mod editor;
pub mod traits;
pub mod lifecycle;
pub mod submission;
pub mod orchestrator;
pub mod memory;

#[cfg(test)]
pub mod mocks;


pub use types::{CommunityDescriptor, CommunityId, CommunitySelection, DepositStatus, FieldErrors, Record, SaveResponse};
pub use state::{derive_state, DepositActions, DepositState, DepositUiState, PrimaryAction};
pub use actions::{ActionExtra, ActionKind, ActionPhase, ActionState, DepositAction};
pub use errors::{ServiceError, WorkflowError};
pub use editor::EditorState;
pub use traits::{DraftsService, Navigator};
pub use lifecycle::{OperationPhase, OperationTracker};
pub use submission::{ConfirmationError, ReviewConfirmation, SubmitReviewRequest};
pub use orchestrator::{Continuation, DepositWorkflow, SaveStrategy};
pub use memory::{InMemoryDraftsService, RecordingNavigator};
