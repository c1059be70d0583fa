//! Backtest DTOs mirrored from the backend schema.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl BacktestStatus {
    /// Terminal statuses never change again; monitoring stops on them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether a cancel request makes sense in this status.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

/// Configuration a backtest was (or will be) run with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub symbols: Vec<String>,
    pub initial_cash: f64,
    /// Commission as a fraction of traded notional (0.001 = 10 bps).
    pub commission: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, f64>,
}

/// Summary performance metrics reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    #[serde(default)]
    pub annualized_return: f64,
    #[serde(default)]
    pub sharpe_ratio: f64,
    /// Maximum drawdown as a positive fraction (0.25 = 25%).
    #[serde(default)]
    pub max_drawdown: f64,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub total_trades: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backtest {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: BacktestStatus,
    pub config: BacktestConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Payload for `POST /backtests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBacktestRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub config: BacktestConfig,
}

/// Objective metric an optimization maximizes or minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationObjective {
    Sharpe,
    TotalReturn,
    MaxDrawdown,
    WinRate,
}

impl OptimizationObjective {
    /// Natural direction: drawdown is minimized, everything else maximized.
    pub fn default_maximize(self) -> bool {
        !matches!(self, Self::MaxDrawdown)
    }
}

/// Inclusive numeric range swept by an optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    /// Number of grid points in `[min, max]` at `step`, or 0 if the range is invalid.
    pub fn grid_len(&self) -> usize {
        if !(self.min.is_finite() && self.max.is_finite() && self.step.is_finite())
            || self.step <= 0.0
            || self.min > self.max
        {
            return 0;
        }
        // Small tolerance so that e.g. 0.1..=0.3 step 0.1 counts 3 points.
        // The float-to-int cast saturates, so an astronomically wide range
        // still counts as usize::MAX rather than wrapping.
        let steps = ((self.max - self.min) / self.step + 1e-9).floor() as usize;
        steps.saturating_add(1)
    }
}

/// Payload for `POST /optimizations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOptimizationRequest {
    pub backtest_id: String,
    pub parameters: Vec<ParameterRange>,
    pub objective: OptimizationObjective,
    pub maximize: bool,
    pub max_trials: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub id: String,
    pub backtest_id: String,
    pub status: BacktestStatus,
    #[serde(default)]
    pub trials_completed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_parameters: Option<BTreeMap<String, f64>>,
}
