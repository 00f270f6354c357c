// Traits for dependency injection - the collaborators the workflow drives

use async_trait::async_trait;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::deposit::errors::ServiceError;
use crate::deposit::types::{CommunityId, Links, Record, SaveResponse};

/// Persistence interface for drafts and their review requests.
///
/// Every call is a suspension point of the workflow. None of them is
/// retried by the caller.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait DraftsService: Send + Sync {
    /// Create or update the draft. Field errors do not fail the call: the
    /// draft is stored and the errors come back with the data.
    async fn save(&self, draft: &Record) -> Result<SaveResponse, ServiceError>;

    /// Read the current draft
    async fn read(&self, links: &Links) -> Result<Record, ServiceError>;

    /// Delete (or discard) the draft
    async fn delete(&self, links: &Links) -> Result<(), ServiceError>;

    /// Delete the review request attached to the draft
    async fn delete_review(&self, links: &Links) -> Result<(), ServiceError>;

    /// Create the review request, or retarget it to another community
    async fn create_or_update_review(
        &self,
        links: &Links,
        community_uuid: &CommunityId,
    ) -> Result<(), ServiceError>;

    /// Publish the draft, returning the published record
    async fn publish(&self, links: &Links) -> Result<Record, ServiceError>;

    /// Submit the review request, returning the request resource
    async fn submit_review(
        &self,
        links: &Links,
        comment: Option<String>,
    ) -> Result<Record, ServiceError>;

    /// Reserve a persistent identifier of `pid_type` for the draft
    async fn reserve_pid(&self, links: &Links, pid_type: &str) -> Result<Record, ServiceError>;

    /// Discard a previously reserved persistent identifier
    async fn discard_pid(&self, links: &Links, pid_type: &str) -> Result<Record, ServiceError>;
}

/// Browser location side effects
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait Navigator: Send + Sync {
    /// Replace the address of the current page without reloading
    fn adopt_location(&self, url: &str);

    /// Leave the form for `url`
    fn navigate(&self, url: &str);
}
