//! Optimization setup wizard: Target → Parameters → Objective → Review.

use std::collections::HashSet;

use quantdash_core::domain::{
    CreateOptimizationRequest, Optimization, OptimizationObjective, ParameterRange,
};
use quantdash_core::validation::ValidationErrors;

use super::{Step, Stepper, WizardError};
use crate::api::ApiClient;

/// Upper bound on the number of parameter combinations in one sweep.
pub const MAX_GRID_SIZE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationStep {
    Target,
    Parameters,
    Objective,
    Review,
}

impl Step for OptimizationStep {
    const ALL: &'static [Self] = &[Self::Target, Self::Parameters, Self::Objective, Self::Review];

    fn title(self) -> &'static str {
        match self {
            Self::Target => "Target",
            Self::Parameters => "Parameters",
            Self::Objective => "Objective",
            Self::Review => "Review",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationForm {
    pub backtest_id: String,
    pub parameters: Vec<ParameterRange>,
    pub objective: OptimizationObjective,
    /// `None` follows the objective's natural direction.
    pub maximize: Option<bool>,
    pub max_trials: u32,
}

impl Default for OptimizationForm {
    fn default() -> Self {
        Self {
            backtest_id: String::new(),
            parameters: Vec::new(),
            objective: OptimizationObjective::Sharpe,
            maximize: None,
            max_trials: 100,
        }
    }
}

impl OptimizationForm {
    /// Total combinations across all ranges, saturating on overflow.
    pub fn grid_size(&self) -> usize {
        self.parameters
            .iter()
            .fold(1usize, |acc, p| acc.saturating_mul(p.grid_len()))
    }

    pub fn maximize(&self) -> bool {
        self.maximize
            .unwrap_or_else(|| self.objective.default_maximize())
    }

    fn validate(&self, step: OptimizationStep) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match step {
            OptimizationStep::Target => {
                errors.check(
                    !self.backtest_id.trim().is_empty(),
                    "backtest_id",
                    "a base backtest is required",
                );
            }
            OptimizationStep::Parameters => {
                if self.parameters.is_empty() {
                    errors.push("parameters", "at least one parameter range is required");
                }
                let mut seen = HashSet::new();
                for p in &self.parameters {
                    let name = p.name.trim();
                    if name.is_empty() {
                        errors.push("parameters", "parameter name is required");
                    } else if !seen.insert(name) {
                        errors.push("parameters", format!("duplicate parameter '{name}'"));
                    }
                    errors.check(
                        p.min.is_finite() && p.max.is_finite() && p.min < p.max,
                        "parameters",
                        format!("'{name}': min must be less than max"),
                    );
                    errors.check(
                        p.step.is_finite() && p.step > 0.0,
                        "parameters",
                        format!("'{name}': step must be greater than 0"),
                    );
                }
                if errors.is_empty() && self.grid_size() > MAX_GRID_SIZE {
                    errors.push(
                        "parameters",
                        format!(
                            "{} combinations exceeds the limit of {MAX_GRID_SIZE}",
                            self.grid_size()
                        ),
                    );
                }
            }
            OptimizationStep::Objective => {
                errors.check(self.max_trials >= 1, "max_trials", "max trials must be at least 1");
            }
            OptimizationStep::Review => {}
        }
        errors
    }

    fn to_request(&self) -> CreateOptimizationRequest {
        CreateOptimizationRequest {
            backtest_id: self.backtest_id.trim().to_string(),
            parameters: self
                .parameters
                .iter()
                .map(|p| ParameterRange {
                    name: p.name.trim().to_string(),
                    ..p.clone()
                })
                .collect(),
            objective: self.objective,
            maximize: self.maximize(),
            max_trials: self.max_trials,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OptimizationWizard {
    pub form: OptimizationForm,
    stepper: Stepper<OptimizationStep>,
}

impl OptimizationWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the target step pre-filled (launched from a backtest's page).
    pub fn for_backtest(backtest_id: impl Into<String>) -> Self {
        Self {
            form: OptimizationForm {
                backtest_id: backtest_id.into(),
                ..OptimizationForm::default()
            },
            stepper: Stepper::new(),
        }
    }

    pub fn step(&self) -> OptimizationStep {
        self.stepper.current()
    }

    pub fn progress_label(&self) -> String {
        self.stepper.progress_label()
    }

    pub fn validate_step(&self, step: OptimizationStep) -> ValidationErrors {
        self.form.validate(step)
    }

    pub fn validate_all(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for step in OptimizationStep::ALL {
            errors.extend(self.validate_step(*step));
        }
        errors
    }

    pub fn next(&mut self) -> Result<OptimizationStep, ValidationErrors> {
        let errors = self.validate_step(self.step());
        self.stepper.advance(errors)
    }

    pub fn back(&mut self) -> bool {
        self.stepper.back()
    }

    pub fn request(&self) -> Result<CreateOptimizationRequest, ValidationErrors> {
        self.validate_all().into_result()?;
        Ok(self.form.to_request())
    }

    /// Create the optimization job, then start it.
    pub fn submit(&self, api: &dyn ApiClient) -> Result<Optimization, WizardError> {
        let request = self.request().map_err(WizardError::Invalid)?;
        let created = api
            .create_optimization(&request)
            .map_err(WizardError::Create)?;
        tracing::info!(id = %created.id, backtest = %created.backtest_id, "optimization created");

        let started = api
            .start_optimization(&created.id)
            .map_err(|source| WizardError::FollowUp {
                resource: "optimization",
                id: created.id.clone(),
                action: "start",
                source,
            })?;
        tracing::info!(id = %started.id, status = ?started.status, "optimization started");
        Ok(started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(name: &str, min: f64, max: f64, step: f64) -> ParameterRange {
        ParameterRange {
            name: name.into(),
            min,
            max,
            step,
        }
    }

    fn valid_form() -> OptimizationForm {
        OptimizationForm {
            backtest_id: "bt-1".into(),
            parameters: vec![range("fast", 5.0, 20.0, 5.0), range("slow", 20.0, 60.0, 10.0)],
            ..OptimizationForm::default()
        }
    }

    #[test]
    fn target_required() {
        let mut wizard = OptimizationWizard::new();
        assert!(wizard.next().unwrap_err().has_field("backtest_id"));
        assert_eq!(wizard.step(), OptimizationStep::Target);
    }

    #[test]
    fn walks_to_review() {
        let mut wizard = OptimizationWizard::for_backtest("bt-1");
        wizard.form = valid_form();
        assert_eq!(wizard.next().unwrap(), OptimizationStep::Parameters);
        assert_eq!(wizard.next().unwrap(), OptimizationStep::Objective);
        assert_eq!(wizard.next().unwrap(), OptimizationStep::Review);
        assert_eq!(wizard.progress_label(), "Step 4 of 4: Review");
    }

    #[test]
    fn grid_size_multiplies_ranges() {
        // fast: 5,10,15,20 → 4; slow: 20..60 step 10 → 5
        assert_eq!(valid_form().grid_size(), 20);
    }

    #[test]
    fn parameter_rules_collect_every_failure() {
        let form = OptimizationForm {
            parameters: vec![
                range("fast", 10.0, 5.0, 1.0),
                range("fast", 1.0, 2.0, 0.0),
            ],
            ..valid_form()
        };
        let errors = OptimizationWizard {
            form,
            ..OptimizationWizard::default()
        }
        .validate_step(OptimizationStep::Parameters);
        assert_eq!(errors.len(), 3, "{errors}");
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let form = OptimizationForm {
            parameters: vec![range("a", 0.0, 200.0, 1.0), range("b", 0.0, 100.0, 1.0)],
            ..valid_form()
        };
        assert!(form.grid_size() > MAX_GRID_SIZE);
        assert!(form.validate(OptimizationStep::Parameters).has_field("parameters"));
    }

    #[test]
    fn astronomically_wide_range_is_rejected_not_panicking() {
        let form = OptimizationForm {
            parameters: vec![range("wide", 0.0, 1e300, 1e-300)],
            ..valid_form()
        };
        assert_eq!(form.grid_size(), usize::MAX);
        let errors = form.validate(OptimizationStep::Parameters);
        assert_eq!(errors.len(), 1, "{errors}");
        assert!(errors.to_string().contains("exceeds the limit"), "{errors}");
    }

    #[test]
    fn direction_defaults_from_objective() {
        let mut form = valid_form();
        assert!(form.maximize());
        form.objective = OptimizationObjective::MaxDrawdown;
        assert!(!form.maximize());
        form.maximize = Some(true);
        assert!(form.to_request().maximize);
    }

    #[test]
    fn zero_trials_rejected() {
        let form = OptimizationForm {
            max_trials: 0,
            ..valid_form()
        };
        assert!(form.validate(OptimizationStep::Objective).has_field("max_trials"));
    }
}
