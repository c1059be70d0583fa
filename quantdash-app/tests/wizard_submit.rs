//! Wizard submission against an in-memory backend.

mod common;

use chrono::NaiveDate;

use common::FakeApi;
use quantdash_app::api::ApiError;
use quantdash_app::wizard::{BacktestForm, OptimizationForm};
use quantdash_app::{BacktestWizard, OptimizationWizard, WizardError};
use quantdash_core::domain::{BacktestStatus, ParameterRange};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn backtest_wizard() -> BacktestWizard {
    let mut form = BacktestForm {
        name: "Momentum".into(),
        start_date: NaiveDate::from_ymd_opt(2023, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        ..BacktestForm::default()
    };
    form.set_symbols_from_text("aapl msft");
    BacktestWizard::with_form(form, today())
}

#[test]
fn backtest_is_created_then_executed() {
    let api = FakeApi::new();
    let backtest = backtest_wizard().submit(&api).unwrap();

    assert_eq!(backtest.status, BacktestStatus::Running);
    assert_eq!(backtest.name, "Momentum");
    assert_eq!(backtest.config.symbols, vec!["AAPL", "MSFT"]);
    assert_eq!(api.calls(), vec!["create_backtest", "execute_backtest"]);
}

#[test]
fn invalid_form_sends_nothing() {
    let api = FakeApi::new();
    let err = BacktestWizard::new(today()).submit(&api).unwrap_err();

    assert!(matches!(err, WizardError::Invalid(_)));
    assert!(err.messages().len() >= 2, "{:?}", err.messages());
    assert!(api.calls().is_empty());
}

#[test]
fn create_failure_skips_execute() {
    let api = FakeApi::new();
    api.fail(
        "create_backtest",
        ApiError::Status {
            status: 422,
            message: "symbol not supported".into(),
        },
    );

    let err = backtest_wizard().submit(&api).unwrap_err();
    assert!(matches!(err, WizardError::Create(_)));
    assert_eq!(err.created_id(), None);
    assert_eq!(api.count("execute_backtest"), 0);
}

#[test]
fn execute_failure_reports_created_id() {
    let api = FakeApi::new();
    api.fail("execute_backtest", ApiError::Network("connection reset".into()));

    let err = backtest_wizard().submit(&api).unwrap_err();
    let id = err.created_id().expect("backtest was created").to_string();
    assert_eq!(
        err.api_error(),
        Some(&ApiError::Network("connection reset".into()))
    );
    assert!(err.to_string().contains(&id));
    assert_eq!(err.messages()[0], "Could not reach the server");

    // The backtest exists but was never started.
    let state = api.state.lock().unwrap();
    assert_eq!(state.backtests.len(), 1);
    assert_eq!(state.backtests[0].status, BacktestStatus::Pending);
}

#[test]
fn optimization_is_created_then_started() {
    let api = FakeApi::new();
    let mut wizard = OptimizationWizard::for_backtest("bt-7");
    wizard.form = OptimizationForm {
        parameters: vec![ParameterRange {
            name: "lookback".into(),
            min: 10.0,
            max: 50.0,
            step: 10.0,
        }],
        ..wizard.form.clone()
    };

    let started = wizard.submit(&api).unwrap();
    assert_eq!(started.status, BacktestStatus::Running);
    assert_eq!(api.calls(), vec!["create_optimization", "start_optimization"]);
}

#[test]
fn optimization_start_failure_keeps_id() {
    let api = FakeApi::new();
    api.fail(
        "start_optimization",
        ApiError::Status {
            status: 409,
            message: "queue full".into(),
        },
    );
    let mut wizard = OptimizationWizard::for_backtest("bt-7");
    wizard.form.parameters.push(ParameterRange {
        name: "lookback".into(),
        min: 10.0,
        max: 50.0,
        step: 10.0,
    });

    let err = wizard.submit(&api).unwrap_err();
    assert!(err.created_id().is_some_and(|id| id.starts_with("opt-")));
}
