//! Prompt governance DTOs and the review workflow.
//!
//! A prompt template moves through a small review cycle:
//!
//! ```text
//! draft ──submit──▶ in_review ──approve──▶ approved
//!   ▲                   │
//!   └──── submit ◀── rejected ◀──reject──┘
//! ```
//!
//! Transitions are checked client-side before the action is sent so that an
//! invalid click never reaches the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStatus {
    Draft,
    InReview,
    Approved,
    Rejected,
}

/// Governance action applied to a prompt version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptAction {
    Submit,
    Approve,
    Reject,
    Evaluate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action:?} prompt in status {status:?}")]
pub struct TransitionError {
    pub status: PromptStatus,
    pub action: PromptAction,
}

impl PromptStatus {
    /// Status after applying `action`, or an error if the action is not allowed.
    ///
    /// `Evaluate` is a read-only check and leaves the status unchanged.
    pub fn apply(self, action: PromptAction) -> Result<PromptStatus, TransitionError> {
        use PromptAction::*;
        use PromptStatus::*;
        match (self, action) {
            (_, Evaluate) => Ok(self),
            (Draft | Rejected, Submit) => Ok(InReview),
            (InReview, Approve) => Ok(Approved),
            (InReview, Reject) => Ok(Rejected),
            (status, action) => Err(TransitionError { status, action }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetadata {
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub pii_risk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub prompt_id: String,
    pub version: u32,
    pub status: PromptStatus,
    pub content: String,
    pub risk: RiskMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Body sent with approve/reject actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub reviewer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Result of an evaluation run against a prompt version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEvaluation {
    pub prompt_id: String,
    pub version: u32,
    pub score: f64,
    #[serde(default)]
    pub flagged_issues: Vec<String>,
}

impl PromptEvaluation {
    pub fn passed(&self, threshold: f64) -> bool {
        self.score >= threshold && self.flagged_issues.is_empty()
    }
}
