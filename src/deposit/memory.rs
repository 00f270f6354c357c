// In-process drafts backend and navigator - deterministic, no I/O

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::deposit::errors::ServiceError;
use crate::deposit::traits::{DraftsService, Navigator};
use crate::deposit::types::*;

/// Calls received by [`InMemoryDraftsService`], in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ServiceCall {
    Save { id: Option<String> },
    Read { id: String },
    Delete { id: String },
    DeleteReview { id: String },
    CreateOrUpdateReview { id: String, community: String },
    Publish { id: String },
    SubmitReview { id: String, comment: Option<String> },
    ReservePid { id: String, pid_type: String },
    DiscardPid { id: String, pid_type: String },
}

impl ServiceCall {
    pub fn operation(&self) -> ServiceOperation {
        match self {
            ServiceCall::Save { .. } => ServiceOperation::Save,
            ServiceCall::Read { .. } => ServiceOperation::Read,
            ServiceCall::Delete { .. } => ServiceOperation::Delete,
            ServiceCall::DeleteReview { .. } => ServiceOperation::DeleteReview,
            ServiceCall::CreateOrUpdateReview { .. } => ServiceOperation::CreateOrUpdateReview,
            ServiceCall::Publish { .. } => ServiceOperation::Publish,
            ServiceCall::SubmitReview { .. } => ServiceOperation::SubmitReview,
            ServiceCall::ReservePid { .. } => ServiceOperation::ReservePid,
            ServiceCall::DiscardPid { .. } => ServiceOperation::DiscardPid,
        }
    }
}

/// Operation selector for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOperation {
    Save,
    Read,
    Delete,
    DeleteReview,
    CreateOrUpdateReview,
    Publish,
    SubmitReview,
    ReservePid,
    DiscardPid,
}

#[derive(Debug, Default)]
struct Backend {
    drafts: BTreeMap<String, Record>,
    next_id: u64,
    failures: HashMap<ServiceOperation, ServiceError>,
    validation_errors: Option<FieldErrors>,
    calls: Vec<ServiceCall>,
}

/// Drafts backend held in memory.
///
/// Models the status transitions of the real service: a save stores a
/// `draft`, creating a review request makes it `draft_with_review`,
/// deleting the request goes back to `draft`, submitting makes it
/// `in_review` and publishing makes it `published` under the community
/// the review targeted.
#[derive(Debug, Default)]
pub struct InMemoryDraftsService {
    backend: Mutex<Backend>,
}

pub fn draft_links(id: &str) -> Links {
    Links::new()
        .with("self", format!("/api/records/{id}/draft"))
        .with("self_html", format!("/uploads/{id}"))
}

fn record_links(id: &str) -> Links {
    Links::new()
        .with("self", format!("/api/records/{id}"))
        .with("self_html", format!("/records/{id}"))
}

fn draft_id(links: &Links) -> Result<String, ServiceError> {
    links
        .get("self")
        .and_then(|href| href.strip_prefix("/api/records/"))
        .and_then(|rest| rest.strip_suffix("/draft"))
        .map(str::to_string)
        .ok_or_else(|| ServiceError::new("Draft link missing or malformed").with_status(400))
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::new(format!("Draft {id} not found")).with_status(404)
}

impl InMemoryDraftsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored draft, e.g. one that already has a review request
    pub fn with_draft(self, mut record: Record) -> Self {
        {
            let mut backend = self.lock();
            let id = match record.id.clone() {
                Some(id) => id,
                None => backend.allocate_id(),
            };
            record.id = Some(id.clone());
            record.links = draft_links(&id);
            record.parent.get_or_insert_with(Parent::default);
            backend.drafts.insert(id, record);
        }
        self
    }

    /// Fail the next call of `operation` with `error`
    pub fn fail_next(&self, operation: ServiceOperation, error: ServiceError) {
        self.lock().failures.insert(operation, error);
    }

    /// Return `errors` along with the next successful save
    pub fn validation_errors_next(&self, errors: FieldErrors) {
        self.lock().validation_errors = Some(errors);
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.lock().calls.clone()
    }

    pub fn operations(&self) -> Vec<ServiceOperation> {
        self.lock().calls.iter().map(ServiceCall::operation).collect()
    }

    pub fn draft(&self, id: &str) -> Option<Record> {
        self.lock().drafts.get(id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        // A panicking test must not wedge the others
        self.backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Log the call and consume an injected failure for it
    fn begin_call(&self, call: ServiceCall) -> Result<MutexGuard<'_, Backend>, ServiceError> {
        let mut backend = self.lock();
        let operation = call.operation();
        backend.calls.push(call);
        match backend.failures.remove(&operation) {
            Some(error) => Err(error),
            None => Ok(backend),
        }
    }
}

impl Backend {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("rec-{:05}", self.next_id)
    }

    fn draft_mut(&mut self, id: &str) -> Result<&mut Record, ServiceError> {
        self.drafts.get_mut(id).ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl DraftsService for InMemoryDraftsService {
    async fn save(&self, draft: &Record) -> Result<SaveResponse, ServiceError> {
        let mut backend = self.begin_call(ServiceCall::Save {
            id: draft.id.clone(),
        })?;

        let id = match draft.id.clone() {
            Some(id) => {
                if !backend.drafts.contains_key(&id) {
                    return Err(not_found(&id));
                }
                id
            }
            None => backend.allocate_id(),
        };

        // Status and parent belong to the server
        let (status, parent) = match backend.drafts.get(&id) {
            Some(existing) => (existing.status, existing.parent.clone()),
            None => (None, draft.parent.clone()),
        };
        let stored = Record {
            id: Some(id.clone()),
            status: status.or(Some(DepositStatus::Draft)),
            parent: Some(parent.unwrap_or_default()),
            links: draft_links(&id),
            metadata: draft.metadata.clone(),
        };
        backend.drafts.insert(id, stored.clone());

        Ok(SaveResponse {
            data: stored,
            errors: backend.validation_errors.take().unwrap_or_default(),
        })
    }

    async fn read(&self, links: &Links) -> Result<Record, ServiceError> {
        let id = draft_id(links)?;
        let backend = self.begin_call(ServiceCall::Read { id: id.clone() })?;
        backend.drafts.get(&id).cloned().ok_or_else(|| not_found(&id))
    }

    async fn delete(&self, links: &Links) -> Result<(), ServiceError> {
        let id = draft_id(links)?;
        let mut backend = self.begin_call(ServiceCall::Delete { id: id.clone() })?;
        backend
            .drafts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(&id))
    }

    async fn delete_review(&self, links: &Links) -> Result<(), ServiceError> {
        let id = draft_id(links)?;
        let mut backend = self.begin_call(ServiceCall::DeleteReview { id: id.clone() })?;
        let draft = backend.draft_mut(&id)?;
        if draft.has_status(&[DepositStatus::InReview]) {
            return Err(ServiceError::new("A submitted review cannot be deleted").with_status(400));
        }
        if let Some(parent) = draft.parent.as_mut() {
            parent.review = None;
        }
        if draft.has_status(DepositStatus::ALLOWS_REVIEW_DELETION) {
            draft.status = Some(DepositStatus::Draft);
        }
        Ok(())
    }

    async fn create_or_update_review(
        &self,
        links: &Links,
        community_uuid: &CommunityId,
    ) -> Result<(), ServiceError> {
        let id = draft_id(links)?;
        let mut backend = self.begin_call(ServiceCall::CreateOrUpdateReview {
            id: id.clone(),
            community: community_uuid.to_string(),
        })?;
        let draft = backend.draft_mut(&id)?;
        if !draft.has_status(DepositStatus::ALLOWS_REVIEW_UPDATE) {
            return Err(ServiceError::new(format!(
                "Review cannot be changed while the draft is {}",
                draft.status.map(|s| s.as_str()).unwrap_or("unsaved")
            ))
            .with_status(400));
        }
        draft.parent.get_or_insert_with(Parent::default).review =
            Some(Review::for_community(community_uuid.clone()));
        draft.status = Some(DepositStatus::DraftWithReview);
        Ok(())
    }

    async fn publish(&self, links: &Links) -> Result<Record, ServiceError> {
        let id = draft_id(links)?;
        let mut backend = self.begin_call(ServiceCall::Publish { id: id.clone() })?;
        let mut record = backend.drafts.remove(&id).ok_or_else(|| not_found(&id))?;

        let parent = record.parent.get_or_insert_with(Parent::default);
        if let Some(community) = parent.review.take().and_then(|r| r.receiver_community().cloned()) {
            parent.communities = Some(Communities {
                default: Some(community.clone()),
                ids: vec![community],
            });
        }
        record.status = Some(DepositStatus::Published);
        record.links = record_links(&id);
        Ok(record)
    }

    async fn submit_review(
        &self,
        links: &Links,
        comment: Option<String>,
    ) -> Result<Record, ServiceError> {
        let id = draft_id(links)?;
        let mut backend = self.begin_call(ServiceCall::SubmitReview {
            id: id.clone(),
            comment: comment.clone(),
        })?;
        let draft = backend.draft_mut(&id)?;
        let Some(review) = draft.parent.as_mut().and_then(|p| p.review.as_mut()) else {
            return Err(ServiceError::new("Draft has no review request").with_status(400));
        };
        let request_id = format!("req-{id}");
        review.id = Some(request_id.clone());
        review.status = Some("submitted".to_string());
        draft.status = Some(DepositStatus::InReview);

        let mut metadata = serde_json::Map::new();
        metadata.insert("topic".to_string(), json!({ "record": id }));
        if let Some(comment) = comment {
            metadata.insert("comment".to_string(), Value::String(comment));
        }
        Ok(Record {
            id: Some(request_id.clone()),
            links: Links::new().with("self_html", format!("/me/requests/{request_id}")),
            metadata,
            ..Default::default()
        })
    }

    async fn reserve_pid(&self, links: &Links, pid_type: &str) -> Result<Record, ServiceError> {
        let id = draft_id(links)?;
        let mut backend = self.begin_call(ServiceCall::ReservePid {
            id: id.clone(),
            pid_type: pid_type.to_string(),
        })?;
        let draft = backend.draft_mut(&id)?;
        let pids = draft
            .metadata
            .entry("pids")
            .or_insert_with(|| json!({}));
        if let Some(pids) = pids.as_object_mut() {
            pids.insert(
                pid_type.to_string(),
                json!({ "identifier": format!("10.1234/{id}"), "provider": "in-memory" }),
            );
        }
        Ok(draft.clone())
    }

    async fn discard_pid(&self, links: &Links, pid_type: &str) -> Result<Record, ServiceError> {
        let id = draft_id(links)?;
        let mut backend = self.begin_call(ServiceCall::DiscardPid {
            id: id.clone(),
            pid_type: pid_type.to_string(),
        })?;
        let draft = backend.draft_mut(&id)?;
        let removed = draft
            .metadata
            .get_mut("pids")
            .and_then(Value::as_object_mut)
            .and_then(|pids| pids.remove(pid_type));
        if removed.is_none() {
            return Err(ServiceError::new(format!("No {pid_type} identifier reserved")).with_status(400));
        }
        Ok(draft.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum NavigationEvent {
    Adopted(String),
    Navigated(String),
}

/// Navigator that only records where it was sent
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavigationEvent>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationEvent> {
        self.lock().clone()
    }

    /// Current location: the last adopted or navigated url
    pub fn location(&self) -> Option<String> {
        self.lock().last().map(|event| match event {
            NavigationEvent::Adopted(url) | NavigationEvent::Navigated(url) => url.clone(),
        })
    }

    /// Whether the form was left for another page
    pub fn has_left(&self) -> bool {
        self.lock()
            .iter()
            .any(|e| matches!(e, NavigationEvent::Navigated(_)))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<NavigationEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for RecordingNavigator {
    fn adopt_location(&self, url: &str) {
        self.lock().push(NavigationEvent::Adopted(url.to_string()));
    }

    fn navigate(&self, url: &str) {
        self.lock().push(NavigationEvent::Navigated(url.to_string()));
    }
}
