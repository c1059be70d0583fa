//! Backend API seam.
//!
//! Every backend operation is one method on [`ApiClient`]. The HTTP client in
//! [`http`] is the production implementation; tests use in-memory fakes.

pub mod http;

use quantdash_core::chart::Interval;
use quantdash_core::domain::{
    Backtest, Candle, CreateBacktestRequest, CreateOptimizationRequest, CryptoPrice,
    DataQualityAlert, MlModel, Optimization, PromptAction, PromptEvaluation, PromptTemplate, Quote,
    ReviewDecision, TrainModelRequest, TransitionError, Watchlist, WatchlistRequest,
};
use quantdash_core::indicators::{IndicatorSpec, OverlaySet};
use thiserror::Error;

pub use http::HttpApiClient;

/// Errors from talking to the backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// `Approve` or `Reject` without a named reviewer; nothing was sent.
    #[error("cannot {0:?} prompt without a reviewer")]
    MissingReviewer(PromptAction),
}

impl ApiError {
    /// Short, user-facing category for banners; the `Display` text is the detail.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Network(_) => "Could not reach the server",
            Self::NotFound(_) => "The requested item was not found",
            Self::Status { .. } => "The server rejected the request",
            Self::Decode(_) => "The server sent an unexpected response",
            Self::Config(_) => "The client is misconfigured",
            Self::Transition(_) => "That action is not allowed right now",
            Self::MissingReviewer(_) => "A reviewer name is required",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// One method per backend operation.
pub trait ApiClient: Send + Sync {
    // Backtests
    fn list_backtests(&self) -> Result<Vec<Backtest>, ApiError>;
    fn get_backtest(&self, id: &str) -> Result<Backtest, ApiError>;
    fn create_backtest(&self, request: &CreateBacktestRequest) -> Result<Backtest, ApiError>;
    fn execute_backtest(&self, id: &str) -> Result<Backtest, ApiError>;
    fn cancel_backtest(&self, id: &str) -> Result<Backtest, ApiError>;
    fn delete_backtest(&self, id: &str) -> Result<(), ApiError>;

    // Optimizations
    fn create_optimization(
        &self,
        request: &CreateOptimizationRequest,
    ) -> Result<Optimization, ApiError>;
    fn start_optimization(&self, id: &str) -> Result<Optimization, ApiError>;

    // Watchlists
    fn list_watchlists(&self) -> Result<Vec<Watchlist>, ApiError>;
    fn get_watchlist(&self, id: &str) -> Result<Watchlist, ApiError>;
    fn create_watchlist(&self, request: &WatchlistRequest) -> Result<Watchlist, ApiError>;
    fn update_watchlist(&self, id: &str, request: &WatchlistRequest)
        -> Result<Watchlist, ApiError>;
    fn delete_watchlist(&self, id: &str) -> Result<(), ApiError>;

    // Market data
    fn get_quote(&self, symbol: &str) -> Result<Quote, ApiError>;
    fn get_intraday(&self, symbol: &str, interval: Interval) -> Result<Vec<Candle>, ApiError>;
    fn get_crypto_prices(&self, symbols: &[String]) -> Result<Vec<CryptoPrice>, ApiError>;
    fn get_technical_indicators(
        &self,
        symbol: &str,
        interval: Interval,
        specs: &[IndicatorSpec],
    ) -> Result<OverlaySet, ApiError>;

    // Data quality
    fn list_alerts(&self, symbol: Option<&str>) -> Result<Vec<DataQualityAlert>, ApiError>;

    // ML models
    fn list_models(&self) -> Result<Vec<MlModel>, ApiError>;
    fn train_model(&self, request: &TrainModelRequest) -> Result<MlModel, ApiError>;
    fn delete_model(&self, version: &str) -> Result<(), ApiError>;

    // Prompt governance
    fn list_prompts(&self) -> Result<Vec<PromptTemplate>, ApiError>;
    fn submit_prompt(&self, prompt_id: &str, version: u32) -> Result<PromptTemplate, ApiError>;
    fn approve_prompt(
        &self,
        prompt_id: &str,
        version: u32,
        decision: &ReviewDecision,
    ) -> Result<PromptTemplate, ApiError>;
    fn reject_prompt(
        &self,
        prompt_id: &str,
        version: u32,
        decision: &ReviewDecision,
    ) -> Result<PromptTemplate, ApiError>;
    fn evaluate_prompt(&self, prompt_id: &str, version: u32)
        -> Result<PromptEvaluation, ApiError>;
}
