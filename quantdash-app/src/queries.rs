//! Cached reads and invalidating mutations over an [`ApiClient`].
//!
//! Reads go through the [`QueryCache`]; each mutation invalidates the
//! resources it changes so the next read refetches. Prompt actions are
//! checked against the review workflow before anything is sent. Wizard
//! submissions go through here too so the lists they add to are refetched.

use std::sync::Arc;
use std::time::Duration;

use quantdash_core::chart::Interval;
use quantdash_core::domain::{
    Backtest, Candle, CryptoPrice, DataQualityAlert, MlModel, Optimization, PromptAction,
    PromptEvaluation, PromptTemplate, Quote, ReviewDecision, TrainModelRequest, Watchlist,
    WatchlistRequest,
};
use quantdash_core::indicators::{IndicatorSpec, OverlaySet};

use crate::api::{ApiClient, ApiError};
use crate::query_cache::QueryCache;
use crate::refresh::{AutoRefresh, Tick};
use crate::wizard::{BacktestWizard, OptimizationWizard, WizardError};

/// Resource names used as cache namespaces.
pub mod resource {
    pub const BACKTESTS: &str = "backtests";
    pub const BACKTEST: &str = "backtest";
    pub const WATCHLISTS: &str = "watchlists";
    pub const WATCHLIST: &str = "watchlist";
    pub const QUOTE: &str = "quote";
    pub const CRYPTO: &str = "crypto";
    pub const INTRADAY: &str = "intraday";
    pub const INDICATORS: &str = "indicators";
    pub const ALERTS: &str = "alerts";
    pub const MODELS: &str = "models";
    pub const PROMPTS: &str = "prompts";
}

/// Query layer shared by every view.
#[derive(Clone)]
pub struct Queries {
    api: Arc<dyn ApiClient>,
    cache: QueryCache,
}

impl Queries {
    pub fn new(api: Arc<dyn ApiClient>, stale_time: Duration) -> Self {
        Self {
            api,
            cache: QueryCache::new(stale_time),
        }
    }

    pub fn api(&self) -> &Arc<dyn ApiClient> {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn backtests(&self) -> Result<Vec<Backtest>, ApiError> {
        let api = Arc::clone(&self.api);
        self.cache
            .get(resource::BACKTESTS, &(), move || api.list_backtests())
    }

    pub fn backtest(&self, id: &str) -> Result<Backtest, ApiError> {
        let api = Arc::clone(&self.api);
        let owned = id.to_string();
        self.cache
            .get(resource::BACKTEST, id, move || api.get_backtest(&owned))
    }

    pub fn watchlists(&self) -> Result<Vec<Watchlist>, ApiError> {
        let api = Arc::clone(&self.api);
        self.cache
            .get(resource::WATCHLISTS, &(), move || api.list_watchlists())
    }

    pub fn watchlist(&self, id: &str) -> Result<Watchlist, ApiError> {
        let api = Arc::clone(&self.api);
        let owned = id.to_string();
        self.cache
            .get(resource::WATCHLIST, id, move || api.get_watchlist(&owned))
    }

    pub fn quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        let api = Arc::clone(&self.api);
        let owned = symbol.to_string();
        self.cache
            .get(resource::QUOTE, symbol, move || api.get_quote(&owned))
    }

    /// Spot prices for `symbols`, keyed by the symbol list in request order.
    pub fn crypto_prices(&self, symbols: &[String]) -> Result<Vec<CryptoPrice>, ApiError> {
        let api = Arc::clone(&self.api);
        let owned = symbols.to_vec();
        self.cache
            .get(resource::CRYPTO, symbols, move || api.get_crypto_prices(&owned))
    }

    pub fn intraday(&self, symbol: &str, interval: Interval) -> Result<Vec<Candle>, ApiError> {
        let api = Arc::clone(&self.api);
        let owned = symbol.to_string();
        self.cache.get(
            resource::INTRADAY,
            &(symbol, interval.as_str()),
            move || api.get_intraday(&owned, interval),
        )
    }

    pub fn technical_indicators(
        &self,
        symbol: &str,
        interval: Interval,
        specs: &[IndicatorSpec],
    ) -> Result<OverlaySet, ApiError> {
        let api = Arc::clone(&self.api);
        let owned = symbol.to_string();
        let owned_specs = specs.to_vec();
        self.cache.get(
            resource::INDICATORS,
            &(symbol, interval.as_str(), specs),
            move || api.get_technical_indicators(&owned, interval, &owned_specs),
        )
    }

    pub fn alerts(&self, symbol: Option<&str>) -> Result<Vec<DataQualityAlert>, ApiError> {
        let api = Arc::clone(&self.api);
        let owned = symbol.map(str::to_string);
        self.cache
            .get(resource::ALERTS, &symbol, move || api.list_alerts(owned.as_deref()))
    }

    pub fn models(&self) -> Result<Vec<MlModel>, ApiError> {
        let api = Arc::clone(&self.api);
        self.cache.get(resource::MODELS, &(), move || api.list_models())
    }

    pub fn prompts(&self) -> Result<Vec<PromptTemplate>, ApiError> {
        let api = Arc::clone(&self.api);
        self.cache.get(resource::PROMPTS, &(), move || api.list_prompts())
    }

    // ── Mutations ────────────────────────────────────────────────────

    fn invalidate_backtests(&self) {
        self.cache.invalidate(resource::BACKTESTS);
        self.cache.invalidate(resource::BACKTEST);
    }

    /// Submit the backtest wizard, then refetch the backtest lists.
    ///
    /// The lists are invalidated whenever the backtest was created, including
    /// when the follow-up execute call failed.
    pub fn submit_backtest(&self, wizard: &BacktestWizard) -> Result<Backtest, WizardError> {
        let result = wizard.submit(&*self.api);
        if created(&result) {
            self.invalidate_backtests();
        }
        result
    }

    /// Submit the optimization wizard, then refetch the backtest lists.
    pub fn submit_optimization(
        &self,
        wizard: &OptimizationWizard,
    ) -> Result<Optimization, WizardError> {
        let result = wizard.submit(&*self.api);
        if created(&result) {
            self.invalidate_backtests();
        }
        result
    }

    pub fn cancel_backtest(&self, id: &str) -> Result<Backtest, ApiError> {
        let result = self.api.cancel_backtest(id);
        self.invalidate_backtests();
        result
    }

    pub fn delete_backtest(&self, id: &str) -> Result<(), ApiError> {
        let result = self.api.delete_backtest(id);
        self.invalidate_backtests();
        result
    }

    pub fn create_watchlist(&self, request: &WatchlistRequest) -> Result<Watchlist, ApiError> {
        let created = self.api.create_watchlist(&request.clone().normalized())?;
        self.cache.invalidate(resource::WATCHLISTS);
        Ok(created)
    }

    pub fn update_watchlist(
        &self,
        id: &str,
        request: &WatchlistRequest,
    ) -> Result<Watchlist, ApiError> {
        let updated = self.api.update_watchlist(id, &request.clone().normalized())?;
        self.cache.invalidate(resource::WATCHLISTS);
        self.cache.set(resource::WATCHLIST, id, updated.clone());
        Ok(updated)
    }

    pub fn delete_watchlist(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete_watchlist(id)?;
        self.cache.invalidate(resource::WATCHLISTS);
        self.cache.invalidate(resource::WATCHLIST);
        Ok(())
    }

    pub fn train_model(&self, request: &TrainModelRequest) -> Result<MlModel, ApiError> {
        let model = self.api.train_model(request)?;
        self.cache.invalidate(resource::MODELS);
        Ok(model)
    }

    pub fn delete_model(&self, version: &str) -> Result<(), ApiError> {
        self.api.delete_model(version)?;
        self.cache.invalidate(resource::MODELS);
        Ok(())
    }

    /// Apply a governance action to `prompt` after checking the transition locally.
    ///
    /// `Approve` and `Reject` require a `decision` with a non-blank reviewer;
    /// without one the call fails with [`ApiError::MissingReviewer`] and
    /// nothing is sent.
    pub fn prompt_action(
        &self,
        prompt: &PromptTemplate,
        action: PromptAction,
        decision: Option<&ReviewDecision>,
    ) -> Result<PromptOutcome, ApiError> {
        prompt.status.apply(action)?;
        let reviewed = || {
            decision
                .filter(|d| !d.reviewer.trim().is_empty())
                .ok_or(ApiError::MissingReviewer(action))
        };
        let (id, version) = (prompt.prompt_id.as_str(), prompt.version);

        let outcome = match action {
            PromptAction::Submit => PromptOutcome::Updated(self.api.submit_prompt(id, version)?),
            PromptAction::Approve => {
                PromptOutcome::Updated(self.api.approve_prompt(id, version, reviewed()?)?)
            }
            PromptAction::Reject => {
                PromptOutcome::Updated(self.api.reject_prompt(id, version, reviewed()?)?)
            }
            PromptAction::Evaluate => {
                return Ok(PromptOutcome::Evaluated(self.api.evaluate_prompt(id, version)?))
            }
        };
        self.cache.invalidate(resource::PROMPTS);
        Ok(outcome)
    }

    // ── Monitoring ───────────────────────────────────────────────────

    /// Poll a backtest every `interval` until it reaches a terminal status.
    ///
    /// `on_update` sees every fetched state; fetch errors are passed through
    /// and stop the timer only when the backtest no longer exists.
    pub fn monitor_backtest<F>(
        &self,
        id: &str,
        interval: Duration,
        mut on_update: F,
    ) -> std::io::Result<AutoRefresh>
    where
        F: FnMut(Result<&Backtest, &ApiError>) + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let cache = self.cache.clone();
        let id = id.to_string();
        AutoRefresh::start(interval, move || match api.get_backtest(&id) {
            Ok(backtest) => {
                on_update(Ok(&backtest));
                let terminal = backtest.status.is_terminal();
                cache.set(resource::BACKTEST, id.as_str(), backtest);
                if terminal {
                    cache.invalidate(resource::BACKTESTS);
                    Tick::Stop
                } else {
                    Tick::Continue
                }
            }
            Err(e) => {
                on_update(Err(&e));
                if e.is_not_found() {
                    Tick::Stop
                } else {
                    Tick::Continue
                }
            }
        })
    }
}

/// Whether a wizard submission got as far as creating its resource.
fn created<T>(result: &Result<T, WizardError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => e.created_id().is_some(),
    }
}

/// Result of a prompt governance action.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome {
    Updated(PromptTemplate),
    Evaluated(PromptEvaluation),
}
