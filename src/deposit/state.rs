// Deposit state derivation - pure mapping from (record, selection) to UI and action flags

use serde::{Deserialize, Serialize};

use crate::deposit::types::*;

/// Flags consumed by the form's buttons and header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositUiState {
    pub show_submit_for_review_button: bool,
    pub disable_submit_for_review_button: bool,
    pub show_change_community_button: bool,
    pub show_community_selection_button: bool,
    pub disable_community_selection_button: bool,
    pub hide_community_header: bool,
}

/// Review-request side effects a save must perform.
///
/// `should_update_review` and `should_delete_review` are never both set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositActions {
    pub should_update_review: bool,
    pub should_delete_review: bool,
    pub community_state_must_be_checked: bool,
}

/// What the publish area of the form offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    SubmitForReview { disabled: bool },
    /// Review was declined or expired: pick another community or publish without one
    ChangeCommunityOrPublishWithoutCommunity,
    Publish,
}

/// The derived state bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositState {
    /// Selection as resolved against the record; fed back into the next derivation
    pub selected_community: CommunitySelection,
    pub ui: DepositUiState,
    pub actions: DepositActions,
}

impl DepositState {
    pub fn effective_community(&self) -> Option<&CommunityDescriptor> {
        self.selected_community.community()
    }

    pub fn primary_action(&self) -> PrimaryAction {
        if self.ui.show_submit_for_review_button {
            PrimaryAction::SubmitForReview {
                disabled: self.ui.disable_submit_for_review_button,
            }
        } else if self.ui.show_change_community_button {
            PrimaryAction::ChangeCommunityOrPublishWithoutCommunity
        } else {
            PrimaryAction::Publish
        }
    }
}

/// Resolve the selection against the record.
///
/// An unresolved selection picks up the published community for published
/// records and the review receiver otherwise. If the record names no
/// community the selection stays unresolved.
fn resolve_selection(record: &Record, selection: &CommunitySelection) -> CommunitySelection {
    match selection {
        CommunitySelection::Unresolved => {
            let community = if record.has_status(DepositStatus::PUBLISHED) {
                record.default_community()
            } else {
                record.review_community()
            };
            match community {
                Some(id) => CommunitySelection::from_id(id.clone()),
                None => CommunitySelection::Unresolved,
            }
        }
        CommunitySelection::Deselected => CommunitySelection::Deselected,
        CommunitySelection::Selected(community) => {
            CommunitySelection::Selected(community.clone().normalized())
        }
    }
}

/// Compute the deposit form state for `record` given the user's community selection.
///
/// Pure and deterministic: equal inputs always give equal bundles.
pub fn derive_state(record: &Record, selection: &CommunitySelection) -> DepositState {
    let selected_community = resolve_selection(record, selection);
    let effective = selected_community.community();

    let status_allows_review_deletion = record.has_status(DepositStatus::ALLOWS_REVIEW_DELETION);
    let status_allows_review_update = record.has_status(DepositStatus::ALLOWS_REVIEW_UPDATE);
    let status_disallows_submit_for_review =
        record.has_status(DepositStatus::DISALLOWS_SUBMIT_FOR_REVIEW);
    let is_published = record.has_status(DepositStatus::PUBLISHED);

    let community_is_selected = effective.is_some();

    // Both sides absent compares equal
    let review_targets_selected =
        record.review_community() == effective.and_then(|c| c.uuid.as_ref());

    let review_created_for_selected =
        record.has_status(&[DepositStatus::DraftWithReview]) && review_targets_selected;

    let review_declined_or_expired_for_selected =
        record.has_status(DepositStatus::DECLINED_OR_EXPIRED) && review_targets_selected;

    let published_without_community = is_published && !record.has_communities();

    let should_update_review = community_is_selected
        && status_allows_review_update
        && !review_created_for_selected
        && !review_declined_or_expired_for_selected;

    let should_delete_review = !community_is_selected && status_allows_review_deletion;

    let show_submit_for_review_button =
        community_is_selected && !review_declined_or_expired_for_selected && !is_published;

    let show_community_selection_button = !is_published;

    let disable_community_selection_button = show_community_selection_button
        && (review_declined_or_expired_for_selected
            || (status_disallows_submit_for_review && !published_without_community));

    DepositState {
        selected_community,
        ui: DepositUiState {
            show_submit_for_review_button,
            disable_submit_for_review_button: show_submit_for_review_button
                && status_disallows_submit_for_review,
            show_change_community_button: review_declined_or_expired_for_selected,
            show_community_selection_button,
            disable_community_selection_button,
            hide_community_header: published_without_community,
        },
        actions: DepositActions {
            should_update_review,
            should_delete_review,
            community_state_must_be_checked: should_update_review || should_delete_review,
        },
    }
}
