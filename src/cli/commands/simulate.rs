use anyhow::{anyhow, Result};
use serde_json::json;
use std::path::PathBuf;
use tokio::sync::broadcast::error::TryRecvError;

use super::{print_json, read_record, Command};
use crate::cli::{SelectionArgs, SimulatedOperation};
use crate::config::DepositConfig;
use crate::deposit::memory::ServiceOperation;
use crate::deposit::{
    DepositAction, DepositStatus, DepositWorkflow, EditorState, FieldErrors, InMemoryDraftsService, Record,
    RecordingNavigator, ReviewConfirmation, ServiceError, WorkflowError,
};

pub struct SimulateCommand {
    pub operation: SimulatedOperation,
    pub record: Option<PathBuf>,
    pub selection: SelectionArgs,
    pub comment: Option<String>,
    pub confirm: bool,
    pub pid_type: String,
    pub failures: Vec<ServiceOperation>,
    pub validation_errors: FieldErrors,
    pub pretty: bool,
    pub config: DepositConfig,
}

pub fn parse_failure(value: &str) -> Result<ServiceOperation> {
    serde_json::from_value(json!(value.replace('-', "_")))
        .map_err(|_| anyhow!("Unknown backend operation '{value}'"))
}

pub fn parse_validation_errors(values: &[String]) -> Result<FieldErrors> {
    values.iter().try_fold(FieldErrors::new(), |errors, value| {
        let (field, message) = value
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected FIELD=MESSAGE, got '{value}'"))?;
        Ok(errors.field(field.trim(), message.trim()))
    })
}

impl SimulateCommand {
    pub fn new(operation: SimulatedOperation, config: DepositConfig) -> Self {
        Self {
            operation,
            record: None,
            selection: SelectionArgs::default(),
            comment: None,
            confirm: true,
            pid_type: "doi".to_string(),
            failures: Vec::new(),
            validation_errors: FieldErrors::new(),
            pretty: false,
            config,
        }
    }

    pub fn with_record(mut self, record: Option<PathBuf>) -> Self {
        self.record = record;
        self
    }

    pub fn with_selection(mut self, selection: SelectionArgs) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>, confirm: bool) -> Self {
        self.comment = comment;
        self.confirm = confirm;
        self
    }

    pub fn with_pid_type(mut self, pid_type: String) -> Self {
        self.pid_type = pid_type;
        self
    }

    pub fn with_failures(mut self, failures: Vec<ServiceOperation>) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_validation_errors(mut self, errors: FieldErrors) -> Self {
        self.validation_errors = errors;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn seeded_backend(&self) -> Result<(InMemoryDraftsService, Record)> {
        let initial = match &self.record {
            Some(path) => read_record(path)?,
            // a fresh upload form starts as a draft
            None => Record {
                status: Some(DepositStatus::Draft),
                ..Default::default()
            },
        };

        let mut service = InMemoryDraftsService::new();
        let initial = match initial.id.clone() {
            Some(id) => {
                service = service.with_draft(initial.clone());
                service.draft(&id).unwrap_or(initial)
            }
            None => initial,
        };

        for operation in &self.failures {
            service.fail_next(
                *operation,
                ServiceError::new(format!("Simulated {operation:?} failure")).with_status(500),
            );
        }
        if !self.validation_errors.is_empty() {
            service.validation_errors_next(self.validation_errors.clone());
        }
        Ok((service, initial))
    }

    /// Run the operation and describe everything it did
    pub async fn run(&self) -> Result<serde_json::Value> {
        let (service, initial) = self.seeded_backend()?;
        let mut editor = EditorState::new(initial.clone(), self.selection.selection());
        let mut workflow =
            DepositWorkflow::from_config(service, RecordingNavigator::new(), &self.config);
        let mut rx = workflow.subscribe();

        tracing::info!(operation = ?self.operation, draft_id = ?initial.id, "Simulating operation");
        let draft = initial;
        let result: Result<Option<Record>, WorkflowError> = match self.operation {
            SimulatedOperation::Save => workflow.save(&mut editor, draft).await.map(Some),
            SimulatedOperation::Publish => workflow.publish(&mut editor, draft, false).await.map(Some),
            SimulatedOperation::PublishWithoutCommunity => {
                workflow.publish(&mut editor, draft, true).await.map(Some)
            }
            SimulatedOperation::SubmitReview => {
                let mut confirmation = ReviewConfirmation::with_comment(self.comment.as_deref());
                confirmation.accept_access_to_record = self.confirm;
                confirmation.accept_after_publishing_record = self.confirm;
                workflow
                    .submit_confirmed_review(&mut editor, draft, confirmation)
                    .await
                    .map(Some)
            }
            SimulatedOperation::Preview => workflow.preview(&mut editor, draft).await.map(Some),
            SimulatedOperation::Delete => workflow.delete(&mut editor, draft).await.map(|()| None),
            SimulatedOperation::ReservePid => workflow
                .reserve_pid(&mut editor, draft, &self.pid_type)
                .await
                .map(Some),
            SimulatedOperation::DiscardPid => workflow
                .discard_pid(&mut editor, draft, &self.pid_type)
                .await
                .map(Some),
        };

        let mut actions: Vec<DepositAction> = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(action) => actions.push(action),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Simulation output lost actions");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        let outcome = match &result {
            Ok(data) => json!({ "status": "ok", "data": data }),
            Err(err) => json!({
                "status": "error",
                "error": err.to_string(),
                "saved_record": err.saved_record(),
            }),
        };

        Ok(json!({
            "operation": format!("{:?}", self.operation),
            "outcome": outcome,
            "phase": workflow.phase(),
            "actions": actions,
            "calls": workflow.service().calls(),
            "navigation": workflow.navigator().events(),
            "editor": editor,
            "primary_action": editor.editor_state.primary_action(),
        }))
    }
}

impl Command for SimulateCommand {
    async fn execute(&self) -> Result<()> {
        print_json(&self.run().await?, self.pretty)
    }
}
