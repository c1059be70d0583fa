//! Multi-step form wizards.
//!
//! A wizard walks an ordered list of steps. `next()` only advances when the
//! current step validates; `back()` is always allowed except on the first
//! step. `submit()` re-validates every step, then issues a create call
//! followed by a follow-up call (execute / start). Failures come back as one
//! [`WizardError`] whose [`messages`](WizardError::messages) form a flat list.

pub mod backtest;
pub mod optimization;

use quantdash_core::validation::ValidationErrors;
use thiserror::Error;

use crate::api::ApiError;

pub use backtest::{BacktestForm, BacktestStep, BacktestWizard};
pub use optimization::{OptimizationForm, OptimizationStep, OptimizationWizard, MAX_GRID_SIZE};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WizardError {
    #[error("form is invalid: {0}")]
    Invalid(ValidationErrors),

    #[error("create failed: {0}")]
    Create(ApiError),

    /// The resource exists but the follow-up call failed.
    #[error("{resource} {id} was created but {action} failed: {source}")]
    FollowUp {
        resource: &'static str,
        id: String,
        action: &'static str,
        source: ApiError,
    },
}

impl WizardError {
    /// Flat list of user-facing messages.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Invalid(errors) => errors.errors().iter().map(ToString::to_string).collect(),
            Self::Create(e) => vec![e.summary().to_string(), e.to_string()],
            Self::FollowUp { .. } => match self.api_error() {
                Some(e) => vec![e.summary().to_string(), self.to_string()],
                None => vec![self.to_string()],
            },
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Invalid(_) => None,
            Self::Create(e) | Self::FollowUp { source: e, .. } => Some(e),
        }
    }

    /// Id of the resource that was created before the failure, if any.
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::FollowUp { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Ordered wizard steps.
pub trait Step: Copy + Eq + 'static {
    const ALL: &'static [Self];

    fn title(self) -> &'static str;

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    fn is_last(self) -> bool {
        self.next().is_none()
    }
}

/// Step cursor shared by the wizards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stepper<S: Step> {
    current: S,
}

impl<S: Step> Stepper<S> {
    pub fn new() -> Self {
        Self { current: S::ALL[0] }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Advance if `errors` is empty; otherwise stay and return them.
    pub fn advance(&mut self, errors: ValidationErrors) -> Result<S, ValidationErrors> {
        errors.into_result()?;
        if let Some(next) = self.current.next() {
            self.current = next;
        }
        Ok(self.current)
    }

    /// Go back one step. Returns false on the first step.
    pub fn back(&mut self) -> bool {
        match self.current.prev() {
            Some(prev) => {
                self.current = prev;
                true
            }
            None => false,
        }
    }

    /// "Step 2 of 5: Universe"
    pub fn progress_label(&self) -> String {
        format!(
            "Step {} of {}: {}",
            self.current.index() + 1,
            S::ALL.len(),
            self.current.title()
        )
    }
}

impl<S: Step> Default for Stepper<S> {
    fn default() -> Self {
        Self::new()
    }
}
