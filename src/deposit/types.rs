// Core types for the deposit workflow: records, communities and selections

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a record, as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Draft,
    NewVersionDraft,
    DraftWithReview,
    InReview,
    Declined,
    Expired,
    Published,
}

impl DepositStatus {
    pub const ALL: [DepositStatus; 7] = [
        DepositStatus::Draft,
        DepositStatus::NewVersionDraft,
        DepositStatus::DraftWithReview,
        DepositStatus::InReview,
        DepositStatus::Declined,
        DepositStatus::Expired,
        DepositStatus::Published,
    ];

    /// Statuses in which an existing review request may be deleted
    pub const ALLOWS_REVIEW_DELETION: &'static [DepositStatus] = &[
        DepositStatus::DraftWithReview,
        DepositStatus::Declined,
        DepositStatus::Expired,
    ];

    /// Statuses in which a review request may be created or retargeted
    pub const ALLOWS_REVIEW_UPDATE: &'static [DepositStatus] = &[
        DepositStatus::DraftWithReview,
        DepositStatus::Declined,
        DepositStatus::Expired,
        DepositStatus::Draft,
    ];

    pub const DISALLOWS_SUBMIT_FOR_REVIEW: &'static [DepositStatus] = &[
        DepositStatus::Published,
        DepositStatus::InReview,
        DepositStatus::NewVersionDraft,
    ];

    /// Statuses where the record already lives under its published community
    pub const PUBLISHED: &'static [DepositStatus] =
        &[DepositStatus::Published, DepositStatus::NewVersionDraft];

    pub const DECLINED_OR_EXPIRED: &'static [DepositStatus] =
        &[DepositStatus::Declined, DepositStatus::Expired];

    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Draft => "draft",
            DepositStatus::NewVersionDraft => "new_version_draft",
            DepositStatus::DraftWithReview => "draft_with_review",
            DepositStatus::InReview => "in_review",
            DepositStatus::Declined => "declined",
            DepositStatus::Expired => "expired",
            DepositStatus::Published => "published",
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Community identifier. Backends hand out strings, but numeric ids occur
/// in the wild; a string and a number never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommunityId {
    Text(String),
    Number(i64),
}

impl CommunityId {
    pub fn new(id: impl Into<String>) -> Self {
        CommunityId::Text(id.into())
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunityId::Text(text) => f.write_str(text),
            CommunityId::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for CommunityId {
    fn from(id: &str) -> Self {
        CommunityId::Text(id.to_string())
    }
}

impl From<String> for CommunityId {
    fn from(id: String) -> Self {
        CommunityId::Text(id)
    }
}

/// Hypermedia links attached to a record. Opaque to the workflow apart
/// from `self_html`, the canonical human-facing location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(pub BTreeMap<String, String>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rel: &str, href: impl Into<String>) -> Self {
        self.0.insert(rel.to_string(), href.into());
        self
    }

    pub fn get(&self, rel: &str) -> Option<&str> {
        self.0.get(rel).map(String::as_str)
    }

    pub fn self_html(&self) -> Option<&str> {
        self.get("self_html")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReceiver {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<CommunityId>,
}

/// Review request attached to the parent of a draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<ReviewReceiver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Review {
    pub fn for_community(community: impl Into<CommunityId>) -> Self {
        Self {
            id: None,
            receiver: Some(ReviewReceiver {
                community: Some(community.into()),
            }),
            status: None,
        }
    }

    pub fn receiver_community(&self) -> Option<&CommunityId> {
        self.receiver.as_ref().and_then(|r| r.community.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<CommunityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<CommunityId>,
}

impl Communities {
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communities: Option<Communities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
}

/// The persisted entity being edited.
///
/// Everything the workflow does not interpret is kept in `metadata` and
/// serialized back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DepositStatus>,
    #[serde(
        default,
        deserialize_with = "lenient_parent",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<Parent>,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// A `parent` that is missing or does not have the expected shape is
/// treated as empty instead of failing the whole record.
fn lenient_parent<'de, D>(deserializer: D) -> Result<Option<Parent>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

impl Record {
    pub fn with_status(status: DepositStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn has_status(&self, statuses: &[DepositStatus]) -> bool {
        self.status.is_some_and(|s| statuses.contains(&s))
    }

    pub fn review(&self) -> Option<&Review> {
        self.parent.as_ref().and_then(|p| p.review.as_ref())
    }

    pub fn review_community(&self) -> Option<&CommunityId> {
        self.review().and_then(Review::receiver_community)
    }

    pub fn default_community(&self) -> Option<&CommunityId> {
        self.parent
            .as_ref()
            .and_then(|p| p.communities.as_ref())
            .and_then(|c| c.default.as_ref())
    }

    pub fn has_communities(&self) -> bool {
        self.parent
            .as_ref()
            .and_then(|p| p.communities.as_ref())
            .is_some_and(|c| !c.is_empty())
    }

    /// Shallow merge: every field present in `newer` replaces ours.
    pub fn merged_with(&self, newer: &Record) -> Record {
        let mut metadata = self.metadata.clone();
        metadata.extend(newer.metadata.clone());
        Record {
            id: newer.id.clone().or_else(|| self.id.clone()),
            status: newer.status.or(self.status),
            parent: newer.parent.clone().or_else(|| self.parent.clone()),
            links: if newer.links.is_empty() {
                self.links.clone()
            } else {
                newer.links.clone()
            },
            metadata,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_html: Option<String>,
}

/// Community as shown in the deposit form header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommunityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<CommunityId>,
    #[serde(default)]
    pub metadata: CommunityMetadata,
    #[serde(default)]
    pub links: CommunityLinks,
}

impl CommunityDescriptor {
    /// Minimal descriptor for a community known only by its identifier
    pub fn from_id(id: impl Into<CommunityId>) -> Self {
        let id = id.into();
        let label = id.to_string();
        Self {
            id: Some(id.clone()),
            uuid: Some(id),
            metadata: CommunityMetadata {
                title: Some(label.clone()),
                description: Some(label),
                kind: None,
            },
            links: CommunityLinks::default(),
        }
    }

    /// Fill the description from the title when the backend omitted it
    pub fn normalized(mut self) -> Self {
        if self.metadata.description.is_none() {
            self.metadata.description = self.metadata.title.clone();
        }
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }
}

/// The community chosen in the form.
///
/// `Unresolved` means "take it from the record", `Deselected` means the
/// user explicitly removed the community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "community", rename_all = "snake_case")]
pub enum CommunitySelection {
    #[default]
    Unresolved,
    Deselected,
    Selected(CommunityDescriptor),
}

impl CommunitySelection {
    pub fn from_id(id: impl Into<CommunityId>) -> Self {
        CommunitySelection::Selected(CommunityDescriptor::from_id(id))
    }

    pub fn community(&self) -> Option<&CommunityDescriptor> {
        match self {
            CommunitySelection::Selected(community) => Some(community),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, CommunitySelection::Unresolved)
    }
}

/// One field-level (or global, when `field` is absent) error entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: &str, message: &str) -> Self {
        self.0.push(FieldError {
            field: Some(field.to_string()),
            messages: vec![message.to_string()],
        });
        self
    }

    pub fn global(message: &str) -> Self {
        Self(vec![FieldError {
            field: None,
            messages: vec![message.to_string()],
        }])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn extend(&mut self, other: &FieldErrors) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field.as_deref() == Some(field))
    }
}

/// Result of persisting a draft: the stored data plus any field errors
/// the backend accepted the draft with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub data: Record,
    #[serde(default, skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
}

impl SaveResponse {
    pub fn has_validation_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
