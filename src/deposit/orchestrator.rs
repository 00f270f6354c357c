// Deposit workflow orchestration - save-like operations against the drafts service

use statig::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::{DepositConfig, RoutesConfig};
use crate::deposit::actions::{ActionExtra, ActionKind, DepositAction};
use crate::deposit::editor::EditorState;
use crate::deposit::errors::{ServiceError, WorkflowError};
use crate::deposit::lifecycle::{OperationEvent, OperationOutcome, OperationPhase, OperationTracker};
use crate::deposit::submission::ReviewConfirmation;
use crate::deposit::traits::{DraftsService, Navigator};
use crate::deposit::types::{CommunitySelection, FieldErrors, Record, SaveResponse};
use crate::telemetry::{create_workflow_span, generate_correlation_id};

pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// What happens after the draft was saved and its review reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    None,
    Publish { without_community: bool },
    SubmitReview { review_comment: Option<String> },
    Preview,
}

/// Parameters of the shared save routine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStrategy {
    pub kind: ActionKind,
    pub failure_kind: ActionKind,
    pub partial_validation_kind: ActionKind,
    pub continuation: Continuation,
}

impl SaveStrategy {
    pub fn save() -> Self {
        Self {
            kind: ActionKind::Save,
            failure_kind: ActionKind::Save,
            partial_validation_kind: ActionKind::Save,
            continuation: Continuation::None,
        }
    }

    pub fn publish(without_community: bool) -> Self {
        Self {
            kind: ActionKind::Publish,
            failure_kind: ActionKind::Publish,
            partial_validation_kind: ActionKind::Publish,
            continuation: Continuation::Publish { without_community },
        }
    }

    pub fn submit_review(review_comment: Option<String>) -> Self {
        Self {
            kind: ActionKind::SubmitReview,
            failure_kind: ActionKind::SubmitReview,
            partial_validation_kind: ActionKind::SubmitReview,
            continuation: Continuation::SubmitReview { review_comment },
        }
    }

    /// Preview reports field errors the same way a plain save does
    pub fn preview() -> Self {
        Self {
            kind: ActionKind::Preview,
            failure_kind: ActionKind::Preview,
            partial_validation_kind: ActionKind::Save,
            continuation: Continuation::Preview,
        }
    }

    fn extra(&self) -> ActionExtra {
        match &self.continuation {
            Continuation::SubmitReview { review_comment } => ActionExtra::ReviewComment {
                review_comment: review_comment.clone(),
            },
            _ => ActionExtra::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PidOperation {
    Reserve,
    Discard,
}

impl PidOperation {
    fn kind(&self) -> ActionKind {
        match self {
            PidOperation::Reserve => ActionKind::ReservePid,
            PidOperation::Discard => ActionKind::DiscardPid,
        }
    }
}

/// Drives save, publish, review submission, preview, deletion and PID
/// handling for one editor session.
///
/// Every dispatched action is applied to the [`EditorState`] passed in and
/// broadcast to subscribers. Only one operation runs at a time.
pub struct DepositWorkflow<S: DraftsService, N: Navigator> {
    service: S,
    navigator: N,
    routes: RoutesConfig,
    tracker: StateMachine<OperationTracker>,
    events: broadcast::Sender<DepositAction>,
}

impl<S: DraftsService, N: Navigator> DepositWorkflow<S, N> {
    pub fn new(service: S, navigator: N, routes: RoutesConfig) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            service,
            navigator,
            routes,
            tracker: OperationTracker::default().state_machine(),
            events,
        }
    }

    pub fn from_config(service: S, navigator: N, config: &DepositConfig) -> Self {
        Self::new(service, navigator, config.routes.clone())
            .with_event_capacity(config.workflow.event_capacity)
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        self.events = events;
        self
    }

    /// Receive every action dispatched from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DepositAction> {
        self.events.subscribe()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn phase(&self) -> OperationPhase {
        self.tracker.inner().phase()
    }

    /// Settle an operation whose future was dropped before it finished.
    /// Returns the abandoned operation, if any.
    pub fn abandon_in_flight(&mut self) -> Option<ActionKind> {
        let in_flight = self.tracker.inner().in_flight()?;
        warn!(operation = %in_flight, "Abandoning operation that never settled");
        self.finish(OperationOutcome::PersistFailed);
        Some(in_flight)
    }

    fn dispatch(&self, editor: &mut EditorState, action: DepositAction) {
        editor.apply(&action);
        // Nobody listening is fine
        let _ = self.events.send(action);
    }

    fn begin(&mut self, kind: ActionKind) -> Result<(), WorkflowError> {
        if let Some(in_flight) = self.tracker.inner().in_flight() {
            return Err(WorkflowError::OperationInFlight {
                requested: kind,
                in_flight,
            });
        }
        self.tracker.handle(&OperationEvent::Start { kind });
        Ok(())
    }

    fn finish(&mut self, outcome: OperationOutcome) {
        self.tracker.handle(&OperationEvent::Finish { outcome });
    }

    /// Change the community of the draft. Takes effect on the next save.
    /// Once resolved, the selection cannot go back to `Unresolved`.
    pub fn change_selected_community(&self, editor: &mut EditorState, selection: CommunitySelection) {
        if !selection.is_resolved() && editor.selection().is_resolved() {
            warn!(current = ?editor.selection(), "Ignoring unresolved community selection");
            return;
        }
        debug!(selection = ?selection, "Community selection changed");
        self.dispatch(editor, DepositAction::CommunityChanged { selection });
    }

    pub async fn save(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
    ) -> Result<Record, WorkflowError> {
        self.run_save_like(editor, draft, SaveStrategy::save()).await
    }

    /// Save, then publish. With `without_community` the selected community is
    /// dropped first so an existing review request gets deleted.
    pub async fn publish(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
        without_community: bool,
    ) -> Result<Record, WorkflowError> {
        self.run_save_like(editor, draft, SaveStrategy::publish(without_community))
            .await
    }

    pub async fn submit_review(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
        review_comment: Option<String>,
    ) -> Result<Record, WorkflowError> {
        self.run_save_like(editor, draft, SaveStrategy::submit_review(review_comment))
            .await
    }

    /// Submit for review once the user confirmed the submission dialog
    pub async fn submit_confirmed_review(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
        confirmation: ReviewConfirmation,
    ) -> Result<Record, WorkflowError> {
        let request = confirmation.validate()?;
        self.submit_review(editor, draft, request.review_comment).await
    }

    pub async fn preview(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
    ) -> Result<Record, WorkflowError> {
        self.run_save_like(editor, draft, SaveStrategy::preview()).await
    }

    /// Run one save-like operation under `strategy`
    pub async fn run_save_like(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
        strategy: SaveStrategy,
    ) -> Result<Record, WorkflowError> {
        self.begin(strategy.kind)?;
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(strategy.kind.as_str(), draft.id.as_deref(), &correlation_id);
        self.save_like_steps(editor, draft, strategy)
            .instrument(span)
            .await
    }

    async fn save_like_steps(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
        strategy: SaveStrategy,
    ) -> Result<Record, WorkflowError> {
        let kind = strategy.kind;
        self.dispatch(
            editor,
            DepositAction::Started {
                kind,
                extra: strategy.extra(),
            },
        );

        if let Continuation::Publish {
            without_community: true,
        } = strategy.continuation
        {
            self.change_selected_community(editor, CommunitySelection::Deselected);
        }

        let response = match self.save_with_location_update(&draft).await {
            Ok(response) => response,
            Err(source) => {
                error!(operation = %kind, error = %source, "Saving draft failed");
                self.dispatch(
                    editor,
                    DepositAction::Failed {
                        kind: strategy.failure_kind,
                        errors: source.error_list(),
                    },
                );
                self.finish(OperationOutcome::PersistFailed);
                return Err(WorkflowError::Persist {
                    kind: strategy.failure_kind,
                    source,
                });
            }
        };

        let SaveResponse {
            data: mut record,
            errors: validation_errors,
        } = response;

        if editor.editor_state.actions.community_state_must_be_checked {
            match self.reconcile_review(editor, &record).await {
                Ok(merged) => record = merged,
                Err(mut err) => {
                    error!(operation = %kind, error = %err, "Review reconciliation failed");
                    let mut errors = match &mut err {
                        WorkflowError::Reconciliation {
                            source,
                            validation_errors: kept,
                            ..
                        } => {
                            *kept = validation_errors.clone();
                            source.error_list()
                        }
                        other => FieldErrors::global(&other.to_string()),
                    };
                    errors.extend(&validation_errors);
                    self.dispatch(
                        editor,
                        DepositAction::ReconciliationFailed {
                            kind,
                            data: record,
                            errors,
                        },
                    );
                    self.finish(OperationOutcome::ReviewStepFailed);
                    return Err(err);
                }
            }
        }

        if !validation_errors.is_empty() {
            warn!(
                operation = %kind,
                errors = validation_errors.len(),
                "Draft saved with validation errors"
            );
            self.dispatch(
                editor,
                DepositAction::ValidationFailed {
                    kind: strategy.partial_validation_kind,
                    data: record.clone(),
                    errors: validation_errors.clone(),
                },
            );
            self.finish(OperationOutcome::ValidationFailed);
            return Err(WorkflowError::Validation {
                record: Box::new(record),
                errors: validation_errors,
            });
        }

        match strategy.continuation {
            Continuation::None => {
                info!(draft_id = ?record.id, "Draft saved");
                self.succeed(editor, kind, Some(record.clone()));
                Ok(record)
            }
            Continuation::Publish { .. } => match self.service.publish(&record.links).await {
                Ok(published) => {
                    info!(draft_id = ?record.id, "Draft published");
                    self.navigate_to(&published, kind);
                    self.succeed(editor, kind, Some(published.clone()));
                    Ok(published)
                }
                Err(source) => Err(self.fail(editor, kind, source)),
            },
            Continuation::SubmitReview { review_comment } => {
                match self.service.submit_review(&record.links, review_comment).await {
                    Ok(request) => {
                        info!(draft_id = ?record.id, "Draft submitted for review");
                        self.navigate_to(&request, kind);
                        self.succeed(editor, kind, Some(request.clone()));
                        Ok(request)
                    }
                    Err(source) => Err(self.fail(editor, kind, source)),
                }
            }
            Continuation::Preview => {
                let Some(draft_id) = record.id.clone().or(draft.id) else {
                    let err = WorkflowError::MissingDraftId(kind);
                    self.dispatch(
                        editor,
                        DepositAction::Failed {
                            kind: strategy.failure_kind,
                            errors: FieldErrors::global(&err.to_string()),
                        },
                    );
                    self.finish(OperationOutcome::PersistFailed);
                    return Err(err);
                };
                self.navigator.navigate(&self.routes.preview_url(&draft_id));
                self.succeed(editor, kind, None);
                Ok(record)
            }
        }
    }

    /// Delete the draft and leave for the uploads page
    pub async fn delete(&mut self, editor: &mut EditorState, draft: Record) -> Result<(), WorkflowError> {
        let kind = ActionKind::Delete;
        self.begin(kind)?;
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(kind.as_str(), draft.id.as_deref(), &correlation_id);

        async {
            self.dispatch(
                editor,
                DepositAction::Started {
                    kind,
                    extra: ActionExtra::Empty,
                },
            );
            match self.save_then_delete(&draft).await {
                Ok(()) => {
                    info!(draft_id = ?draft.id, "Draft deleted");
                    self.navigator.navigate(&self.routes.uploads_url);
                    self.succeed(editor, kind, None);
                    Ok(())
                }
                Err(source) => Err(self.fail(editor, kind, source)),
            }
        }
        .instrument(span)
        .await
    }

    pub async fn reserve_pid(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
        pid_type: &str,
    ) -> Result<Record, WorkflowError> {
        self.run_pid_operation(editor, draft, pid_type, PidOperation::Reserve)
            .await
    }

    pub async fn discard_pid(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
        pid_type: &str,
    ) -> Result<Record, WorkflowError> {
        self.run_pid_operation(editor, draft, pid_type, PidOperation::Discard)
            .await
    }

    async fn run_pid_operation(
        &mut self,
        editor: &mut EditorState,
        draft: Record,
        pid_type: &str,
        operation: PidOperation,
    ) -> Result<Record, WorkflowError> {
        let kind = operation.kind();
        self.begin(kind)?;
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(kind.as_str(), draft.id.as_deref(), &correlation_id);

        async {
            self.dispatch(
                editor,
                DepositAction::Started {
                    kind,
                    extra: ActionExtra::Pid {
                        pid_type: pid_type.to_string(),
                    },
                },
            );
            match self.save_then_pid(&draft, pid_type, operation).await {
                Ok(record) => {
                    info!(draft_id = ?record.id, pid_type, operation = %kind, "PID updated");
                    self.succeed(editor, kind, Some(record.clone()));
                    Ok(record)
                }
                Err(source) => Err(self.fail(editor, kind, source)),
            }
        }
        .instrument(span)
        .await
    }

    /// Persist the draft; a newly created draft's page becomes the current location
    async fn save_with_location_update(&self, draft: &Record) -> Result<SaveResponse, ServiceError> {
        let created = draft.id.is_none();
        let response = self.service.save(draft).await?;
        if created {
            match response.data.links.self_html() {
                Some(url) => {
                    debug!(url, "Draft created, adopting its location");
                    self.navigator.adopt_location(url);
                }
                None => warn!("Created draft has no self_html link"),
            }
        }
        Ok(response)
    }

    async fn save_then_delete(&self, draft: &Record) -> Result<(), ServiceError> {
        let saved = self.save_with_location_update(draft).await?;
        self.service.delete(&saved.data.links).await
    }

    async fn save_then_pid(
        &self,
        draft: &Record,
        pid_type: &str,
        operation: PidOperation,
    ) -> Result<Record, ServiceError> {
        let saved = self.save_with_location_update(draft).await?;
        match operation {
            PidOperation::Reserve => self.service.reserve_pid(&saved.data.links, pid_type).await,
            PidOperation::Discard => self.service.discard_pid(&saved.data.links, pid_type).await,
        }
    }

    /// Bring the review request in line with the selection, then re-read
    /// the draft so its review fields are authoritative. Returns the saved
    /// record with the re-read fields merged over it.
    async fn reconcile_review(
        &self,
        editor: &mut EditorState,
        saved: &Record,
    ) -> Result<Record, WorkflowError> {
        let actions = editor.editor_state.actions;
        let reconciliation = |source: ServiceError| WorkflowError::Reconciliation {
            record: Box::new(saved.clone()),
            validation_errors: FieldErrors::new(),
            source,
        };

        if actions.should_delete_review {
            debug!(draft_id = ?saved.id, "Deleting review request");
            self.service
                .delete_review(&saved.links)
                .await
                .map_err(reconciliation)?;
        }

        if actions.should_update_review {
            let community_uuid = editor
                .editor_state
                .effective_community()
                .and_then(|c| c.uuid.clone())
                .ok_or(WorkflowError::MissingCommunityUuid)?;
            debug!(draft_id = ?saved.id, community = %community_uuid, "Creating or updating review request");
            self.service
                .create_or_update_review(&saved.links, &community_uuid)
                .await
                .map_err(reconciliation)?;
        }

        let fetched = self.service.read(&saved.links).await.map_err(reconciliation)?;
        self.dispatch(
            editor,
            DepositAction::Succeeded {
                kind: ActionKind::Fetch,
                data: Some(fetched.clone()),
            },
        );
        Ok(saved.merged_with(&fetched))
    }

    fn navigate_to(&self, resource: &Record, kind: ActionKind) {
        match resource.links.self_html() {
            Some(url) => self.navigator.navigate(url),
            None => warn!(operation = %kind, "Response has no self_html link, staying on the form"),
        }
    }

    fn succeed(&mut self, editor: &mut EditorState, kind: ActionKind, data: Option<Record>) {
        self.dispatch(editor, DepositAction::Succeeded { kind, data });
        self.finish(OperationOutcome::Succeeded);
    }

    fn fail(&mut self, editor: &mut EditorState, kind: ActionKind, source: ServiceError) -> WorkflowError {
        error!(operation = %kind, error = %source, "Operation failed");
        self.dispatch(
            editor,
            DepositAction::Failed {
                kind,
                errors: source.error_list(),
            },
        );
        self.finish(OperationOutcome::PersistFailed);
        WorkflowError::Persist { kind, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deposit::actions::{ActionPhase, ActionState};
    use crate::deposit::traits::{MockDraftsService, MockNavigator};
    use crate::deposit::types::{CommunityId, DepositStatus};
    use mockall::predicate::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn saved_draft() -> Record {
        record(json!({
            "id": "r1",
            "status": "draft",
            "links": {"self": "/api/records/r1/draft", "self_html": "/uploads/r1"},
        }))
    }

    fn quiet_navigator() -> MockNavigator {
        let mut navigator = MockNavigator::new();
        navigator.expect_adopt_location().times(0);
        navigator.expect_navigate().times(0);
        navigator
    }

    fn workflow(
        service: MockDraftsService,
        navigator: MockNavigator,
    ) -> DepositWorkflow<MockDraftsService, MockNavigator> {
        DepositWorkflow::new(service, navigator, RoutesConfig::default())
    }

    #[tokio::test]
    async fn test_plain_save_without_reconciliation() {
        let mut service = MockDraftsService::new();
        service.expect_save().times(1).returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new(),
            })
        });
        service.expect_read().times(0);
        service.expect_delete_review().times(0);
        service.expect_create_or_update_review().times(0);

        let mut editor = EditorState::new(saved_draft(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, quiet_navigator());

        let saved = wf.save(&mut editor, saved_draft()).await.unwrap();
        assert_eq!(saved.id.as_deref(), Some("r1"));
        assert_eq!(wf.phase(), OperationPhase::Succeeded);
        assert_eq!(
            editor.action_state,
            Some(ActionState::new(ActionKind::Save, ActionPhase::Succeeded))
        );
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_before_reconciliation() {
        let mut service = MockDraftsService::new();
        service
            .expect_save()
            .times(1)
            .returning(|_| Err(ServiceError::new("Service unavailable").with_status(503)));
        service.expect_create_or_update_review().times(0);
        service.expect_read().times(0);

        let draft = saved_draft();
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::from_id("c1"));
        assert!(editor.editor_state.actions.should_update_review);
        let mut wf = workflow(service, quiet_navigator());

        let err = wf.publish(&mut editor, draft.clone(), false).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Persist {
                kind: ActionKind::Publish,
                ..
            }
        ));
        assert_eq!(wf.phase(), OperationPhase::PersistFailed);
        assert_eq!(editor.record, draft);
        assert_eq!(
            editor.action_state,
            Some(ActionState::new(ActionKind::Publish, ActionPhase::Failed))
        );
    }

    #[tokio::test]
    async fn test_review_creation_failure_is_reported_as_reconciliation() {
        let mut service = MockDraftsService::new();
        service.expect_save().returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new(),
            })
        });
        service
            .expect_create_or_update_review()
            .with(always(), eq(CommunityId::new("c1")))
            .times(1)
            .returning(|_, _| Err(ServiceError::new("Community does not accept records").with_status(400)));
        service.expect_read().times(0);

        let draft = saved_draft();
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::from_id("c1"));
        let mut wf = workflow(service, quiet_navigator());

        let err = wf.save(&mut editor, draft).await.unwrap_err();
        match &err {
            WorkflowError::Reconciliation { record, source, .. } => {
                assert_eq!(record.id.as_deref(), Some("r1"));
                assert_eq!(source.status, Some(400));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(wf.phase(), OperationPhase::ReviewStepFailed);
        assert_eq!(
            editor.action_state.map(|s| s.phase),
            Some(ActionPhase::ReconciliationFailed)
        );
        assert_eq!(
            editor.errors.0[0].messages,
            vec!["Community does not accept records".to_string()]
        );
    }

    #[tokio::test]
    async fn test_refetch_failure_is_reported_as_reconciliation() {
        let mut service = MockDraftsService::new();
        service.expect_save().returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new(),
            })
        });
        service.expect_delete_review().times(1).returning(|_| Ok(()));
        service
            .expect_read()
            .times(1)
            .returning(|_| Err(ServiceError::new("Gateway timeout").with_status(504)));

        let draft = record(json!({
            "id": "r1",
            "status": "draft_with_review",
            "parent": {"review": {"receiver": {"community": "c1"}}},
            "links": {"self": "/api/records/r1/draft"},
        }));
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, quiet_navigator());
        wf.change_selected_community(&mut editor, CommunitySelection::Deselected);

        let err = wf.save(&mut editor, draft).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Reconciliation { .. }));
        assert!(err.saved_record().is_some());
    }

    #[tokio::test]
    async fn test_first_save_adopts_draft_location() {
        let mut service = MockDraftsService::new();
        service.expect_save().times(1).returning(|_| {
            Ok(SaveResponse {
                data: saved_draft(),
                errors: FieldErrors::new(),
            })
        });

        let mut navigator = MockNavigator::new();
        navigator
            .expect_adopt_location()
            .with(eq("/uploads/r1"))
            .times(1)
            .return_const(());
        navigator.expect_navigate().times(0);

        let mut editor = EditorState::new(Record::default(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, navigator);

        wf.save(&mut editor, Record::default()).await.unwrap();
        assert_eq!(editor.record.id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_publish_redirects_to_published_record() {
        let mut service = MockDraftsService::new();
        service.expect_save().returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new(),
            })
        });
        service.expect_publish().times(1).returning(|_| {
            Ok(serde_json::from_value(json!({
                "id": "r1",
                "status": "published",
                "links": {"self_html": "/records/r1"},
            }))
            .unwrap())
        });

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/records/r1"))
            .times(1)
            .return_const(());

        let draft = saved_draft();
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, navigator);

        let published = wf.publish(&mut editor, draft, false).await.unwrap();
        assert_eq!(published.status, Some(DepositStatus::Published));
    }

    #[tokio::test]
    async fn test_submit_review_failure_does_not_redirect() {
        let mut service = MockDraftsService::new();
        service.expect_save().returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new(),
            })
        });
        service
            .expect_submit_review()
            .with(always(), eq(Some("Thanks".to_string())))
            .times(1)
            .returning(|_, _| Err(ServiceError::new("Conflict").with_status(409)));

        let draft = record(json!({
            "id": "r1",
            "status": "draft_with_review",
            "parent": {"review": {"receiver": {"community": "c1"}}},
            "links": {"self": "/api/records/r1/draft"},
        }));
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, quiet_navigator());

        let err = wf
            .submit_review(&mut editor, draft, Some("Thanks".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Persist {
                kind: ActionKind::SubmitReview,
                ..
            }
        ));
        assert_eq!(editor.pending_review_comment(), None);
    }

    #[tokio::test]
    async fn test_preview_validation_errors_use_save_kind() {
        let mut service = MockDraftsService::new();
        service.expect_save().returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new().field("metadata.title", "Missing data."),
            })
        });

        let draft = saved_draft();
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, quiet_navigator());

        let err = wf.preview(&mut editor, draft).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            editor.action_state,
            Some(ActionState::new(
                ActionKind::Save,
                ActionPhase::FailedWithValidationErrors
            ))
        );
    }

    #[tokio::test]
    async fn test_preview_navigates_to_preview_route() {
        let mut service = MockDraftsService::new();
        service.expect_save().returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new(),
            })
        });

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/records/r1?preview=1"))
            .times(1)
            .return_const(());

        let draft = saved_draft();
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, navigator);

        wf.preview(&mut editor, draft).await.unwrap();
        assert_eq!(wf.phase(), OperationPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_reserve_pid_failure_surfaces_errors() {
        let mut service = MockDraftsService::new();
        service.expect_save().returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new(),
            })
        });
        service
            .expect_reserve_pid()
            .with(always(), eq("doi"))
            .times(1)
            .returning(|_, _| {
                Err(ServiceError::new("PID provider unavailable")
                    .with_errors(FieldErrors::new().field("pids.doi", "Provider unavailable.")))
            });

        let draft = saved_draft();
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, quiet_navigator());

        let err = wf.reserve_pid(&mut editor, draft, "doi").await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Persist {
                kind: ActionKind::ReservePid,
                ..
            }
        ));
        assert!(editor.errors.for_field("pids.doi").is_some());
        assert_eq!(editor.action_state_extra, ActionExtra::Empty);
    }

    #[tokio::test]
    async fn test_delete_redirects_to_uploads() {
        let mut service = MockDraftsService::new();
        service.expect_save().returning(|draft| {
            Ok(SaveResponse {
                data: draft.clone(),
                errors: FieldErrors::new(),
            })
        });
        service.expect_delete().times(1).returning(|_| Ok(()));

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/me/uploads"))
            .times(1)
            .return_const(());

        let draft = saved_draft();
        let mut editor = EditorState::new(draft.clone(), CommunitySelection::Unresolved);
        let mut wf = workflow(service, navigator);

        wf.delete(&mut editor, draft).await.unwrap();
        assert_eq!(
            editor.action_state,
            Some(ActionState::new(ActionKind::Delete, ActionPhase::Succeeded))
        );
    }
}
