//! Backtest creation wizard: Basics → Universe → Capital → Strategy → Review.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use quantdash_core::domain::{Backtest, BacktestConfig, CreateBacktestRequest};
use quantdash_core::validation::{validate_date_range, validate_symbols, ValidationErrors};

use super::{Step, Stepper, WizardError};
use crate::api::ApiClient;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COMMISSION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestStep {
    Basics,
    Universe,
    Capital,
    Strategy,
    Review,
}

impl Step for BacktestStep {
    const ALL: &'static [Self] = &[
        Self::Basics,
        Self::Universe,
        Self::Capital,
        Self::Strategy,
        Self::Review,
    ];

    fn title(self) -> &'static str {
        match self {
            Self::Basics => "Basics",
            Self::Universe => "Universe",
            Self::Capital => "Capital",
            Self::Strategy => "Strategy",
            Self::Review => "Review",
        }
    }
}

/// Raw form state, edited freely between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestForm {
    pub name: String,
    pub description: String,
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_cash: f64,
    pub commission: f64,
    pub strategy_id: Option<String>,
    pub parameters: BTreeMap<String, f64>,
}

impl Default for BacktestForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            symbols: Vec::new(),
            start_date: None,
            end_date: None,
            initial_cash: 100_000.0,
            commission: 0.001,
            strategy_id: None,
            parameters: BTreeMap::new(),
        }
    }
}

impl BacktestForm {
    /// Replace the symbol list from free text (`"aapl, msft  spy"`), upper-casing.
    pub fn set_symbols_from_text(&mut self, text: &str) {
        self.symbols = text
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_uppercase)
            .collect();
    }

    fn validate(&self, step: BacktestStep, today: NaiveDate) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match step {
            BacktestStep::Basics => {
                let name = self.name.trim();
                errors.check(!name.is_empty(), "name", "name is required");
                errors.check(
                    name.chars().count() <= MAX_NAME_LEN,
                    "name",
                    format!("name must be at most {MAX_NAME_LEN} characters"),
                );
            }
            BacktestStep::Universe => {
                validate_symbols("symbols", &self.symbols, &mut errors);
                validate_date_range(self.start_date, self.end_date, today, &mut errors);
            }
            BacktestStep::Capital => {
                errors.check(
                    self.initial_cash.is_finite() && self.initial_cash > 0.0,
                    "initial_cash",
                    "initial cash must be greater than 0",
                );
                errors.check(
                    (0.0..MAX_COMMISSION).contains(&self.commission),
                    "commission",
                    format!("commission must be in [0, {MAX_COMMISSION})"),
                );
            }
            BacktestStep::Strategy => {
                // A blank strategy id means "none" and is dropped from the request.
                for (name, value) in &self.parameters {
                    errors.check(
                        value.is_finite(),
                        "parameters",
                        format!("parameter '{name}' must be a finite number"),
                    );
                }
            }
            BacktestStep::Review => {}
        }
        errors
    }

    /// Assemble the create payload. Call only after validation.
    fn to_request(&self) -> Option<CreateBacktestRequest> {
        let description = self.description.trim();
        Some(CreateBacktestRequest {
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            config: BacktestConfig {
                start_date: self.start_date?,
                end_date: self.end_date?,
                symbols: self.symbols.clone(),
                initial_cash: self.initial_cash,
                commission: self.commission,
                strategy_id: self
                    .strategy_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                parameters: self.parameters.clone(),
            },
        })
    }
}

/// Backtest wizard state. `today` bounds the end date.
#[derive(Debug, Clone)]
pub struct BacktestWizard {
    pub form: BacktestForm,
    stepper: Stepper<BacktestStep>,
    today: NaiveDate,
}

impl BacktestWizard {
    pub fn new(today: NaiveDate) -> Self {
        Self::with_form(BacktestForm::default(), today)
    }

    pub fn with_form(form: BacktestForm, today: NaiveDate) -> Self {
        Self {
            form,
            stepper: Stepper::new(),
            today,
        }
    }

    pub fn step(&self) -> BacktestStep {
        self.stepper.current()
    }

    pub fn progress_label(&self) -> String {
        self.stepper.progress_label()
    }

    pub fn validate_step(&self, step: BacktestStep) -> ValidationErrors {
        self.form.validate(step, self.today)
    }

    /// Every step's errors, in step order.
    pub fn validate_all(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for step in BacktestStep::ALL {
            errors.extend(self.validate_step(*step));
        }
        errors
    }

    /// Advance past the current step if it validates.
    pub fn next(&mut self) -> Result<BacktestStep, ValidationErrors> {
        let errors = self.validate_step(self.step());
        self.stepper.advance(errors)
    }

    pub fn back(&mut self) -> bool {
        self.stepper.back()
    }

    /// The request that `submit` would send, if the form is valid.
    pub fn request(&self) -> Result<CreateBacktestRequest, ValidationErrors> {
        self.validate_all().into_result()?;
        self.form.to_request().ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.push("start_date", "start and end dates are required");
            errors
        })
    }

    /// Create the backtest, then execute it.
    pub fn submit(&self, api: &dyn ApiClient) -> Result<Backtest, WizardError> {
        let request = self.request().map_err(WizardError::Invalid)?;
        let created = api.create_backtest(&request).map_err(WizardError::Create)?;
        tracing::info!(id = %created.id, name = %created.name, "backtest created");

        let executed = api
            .execute_backtest(&created.id)
            .map_err(|source| WizardError::FollowUp {
                resource: "backtest",
                id: created.id.clone(),
                action: "execute",
                source,
            })?;
        tracing::info!(id = %executed.id, status = ?executed.status, "backtest execution started");
        Ok(executed)
    }
}
