//! Domain types for QuantDash: candles plus the DTOs mirrored from the backend API.

pub mod alert;
pub mod backtest;
pub mod candle;
pub mod model;
pub mod prompt;
pub mod quote;
pub mod watchlist;

pub use alert::{DataQualityAlert, Severity};
pub use backtest::{
    Backtest, BacktestConfig, BacktestStatus, CreateBacktestRequest, CreateOptimizationRequest,
    Optimization, OptimizationObjective, ParameterRange, PerformanceMetrics,
};
pub use candle::Candle;
pub use model::{MlModel, ModelMetrics, ModelStatus, TrainModelRequest};
pub use prompt::{
    PromptAction, PromptEvaluation, PromptStatus, PromptTemplate, ReviewDecision, RiskLevel,
    RiskMetadata, TransitionError,
};
pub use quote::{CryptoPrice, Quote};
pub use watchlist::{Watchlist, WatchlistRequest};

/// Symbol type alias
pub type Symbol = String;
