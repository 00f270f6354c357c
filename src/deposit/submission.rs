// Submit-for-review confirmation dialog

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Acknowledgements the user has to give before a draft goes to review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    /// Community curators will be able to access and edit the record
    CuratorAccess,
    /// If accepted, the record is published immediately
    ImmediatePublication,
}

impl Acknowledgement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Acknowledgement::CuratorAccess => "curator_access",
            Acknowledgement::ImmediatePublication => "immediate_publication",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmationError {
    #[error("missing acknowledgements: {}", .0.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", "))]
    MissingAcknowledgements(Vec<Acknowledgement>),
}

/// Contents of the confirmation dialog as filled in by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewConfirmation {
    #[serde(default)]
    pub accept_access_to_record: bool,
    #[serde(default)]
    pub accept_after_publishing_record: bool,
    #[serde(default)]
    pub review_comment: Option<String>,
}

/// Confirmed submission, ready for the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReviewRequest {
    pub review_comment: Option<String>,
}

impl ReviewConfirmation {
    /// Dialog pre-filled with the comment of an earlier attempt
    pub fn with_comment(review_comment: Option<&str>) -> Self {
        Self {
            review_comment: review_comment.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<SubmitReviewRequest, ConfirmationError> {
        let mut missing = Vec::new();
        if !self.accept_access_to_record {
            missing.push(Acknowledgement::CuratorAccess);
        }
        if !self.accept_after_publishing_record {
            missing.push(Acknowledgement::ImmediatePublication);
        }
        if !missing.is_empty() {
            return Err(ConfirmationError::MissingAcknowledgements(missing));
        }

        let review_comment = self
            .review_comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Ok(SubmitReviewRequest { review_comment })
    }
}
