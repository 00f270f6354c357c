// Deposit Workflow Library - form state derivation and draft save orchestration
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod deposit;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{config, DepositConfig, RoutesConfig};
pub use deposit::{
    derive_state, CommunitySelection, DepositAction, DepositState, DepositWorkflow, DraftsService,
    EditorState, InMemoryDraftsService, Navigator, Record, RecordingNavigator, WorkflowError,
};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
