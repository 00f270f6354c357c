// Test fixtures - records and preconfigured collaborator mocks

use serde_json::json;

use crate::config::RoutesConfig;
use crate::deposit::orchestrator::DepositWorkflow;
use crate::deposit::traits::{MockDraftsService, MockNavigator};
use crate::deposit::types::*;

pub fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).expect("fixture record must deserialize")
}

/// Saved draft without any review request
pub fn draft(id: &str) -> Record {
    record(json!({
        "id": id,
        "status": "draft",
        "parent": {},
        "links": {
            "self": format!("/api/records/{id}/draft"),
            "self_html": format!("/uploads/{id}"),
        },
        "metadata": {"title": "A dataset"},
    }))
}

/// Saved draft with a review request for `community`
pub fn draft_with_review(id: &str, community: &str) -> Record {
    record(json!({
        "id": id,
        "status": "draft_with_review",
        "parent": {"review": {"receiver": {"community": community}, "status": "created"}},
        "links": {
            "self": format!("/api/records/{id}/draft"),
            "self_html": format!("/uploads/{id}"),
        },
    }))
}

/// Service whose saves echo the draft back without field errors
pub fn echoing_service() -> MockDraftsService {
    let mut service = MockDraftsService::new();
    service.expect_save().returning(|draft| {
        Ok(SaveResponse {
            data: draft.clone(),
            errors: FieldErrors::new(),
        })
    });
    service
}

/// Navigator accepting any location change
pub fn permissive_navigator() -> MockNavigator {
    let mut navigator = MockNavigator::new();
    navigator.expect_adopt_location().return_const(());
    navigator.expect_navigate().return_const(());
    navigator
}

pub fn workflow(
    service: MockDraftsService,
    navigator: MockNavigator,
) -> DepositWorkflow<MockDraftsService, MockNavigator> {
    DepositWorkflow::new(service, navigator, RoutesConfig::default())
}
