//! In-memory backend fake shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{NaiveDate, TimeZone, Utc};

use quantdash_app::api::{ApiClient, ApiError};
use quantdash_core::chart::Interval;
use quantdash_core::data::candles_from_closes;
use quantdash_core::domain::{
    Backtest, BacktestConfig, BacktestStatus, Candle, CreateBacktestRequest,
    CreateOptimizationRequest, CryptoPrice, DataQualityAlert, MlModel, ModelMetrics, ModelStatus,
    Optimization, PromptEvaluation, PromptStatus, PromptTemplate, Quote, ReviewDecision,
    RiskLevel, RiskMetadata, TrainModelRequest, Watchlist, WatchlistRequest,
};
use quantdash_core::indicators::{compute_overlays, IndicatorSpec, OverlaySet};

#[derive(Default)]
pub struct FakeState {
    pub backtests: Vec<Backtest>,
    pub watchlists: Vec<Watchlist>,
    pub prompts: Vec<PromptTemplate>,
    pub models: Vec<MlModel>,
    /// Statuses handed out by successive `get_backtest` calls.
    pub status_script: VecDeque<BacktestStatus>,
    /// Method name → error returned instead of doing the work.
    pub failures: HashMap<&'static str, ApiError>,
    pub calls: Vec<String>,
    next_id: u32,
}

#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, method: &'static str, error: ApiError) {
        self.state.lock().unwrap().failures.insert(method, error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.as_str() == method)
            .count()
    }

    fn record(&self, method: &'static str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());
        match state.failures.get(method) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }

    fn with_backtest(
        &self,
        id: &str,
        f: impl FnOnce(&mut Backtest),
    ) -> Result<Backtest, ApiError> {
        let mut state = self.state.lock().unwrap();
        let bt = state
            .backtests
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("/backtests/{id}")))?;
        f(bt);
        Ok(bt.clone())
    }

    fn with_prompt(
        &self,
        prompt_id: &str,
        version: u32,
        f: impl FnOnce(&mut PromptTemplate),
    ) -> Result<PromptTemplate, ApiError> {
        let mut state = self.state.lock().unwrap();
        let p = state
            .prompts
            .iter_mut()
            .find(|p| p.prompt_id == prompt_id && p.version == version)
            .ok_or_else(|| ApiError::NotFound(format!("/prompts/{prompt_id}")))?;
        f(p);
        Ok(p.clone())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

pub fn sample_backtest(id: &str, status: BacktestStatus) -> Backtest {
    Backtest {
        id: id.to_string(),
        name: format!("Backtest {id}"),
        description: None,
        status,
        config: BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            symbols: vec!["AAPL".into()],
            initial_cash: 100_000.0,
            commission: 0.001,
            strategy_id: None,
            parameters: Default::default(),
        },
        performance: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
        updated_at: None,
        error_message: None,
    }
}

pub fn sample_prompt(prompt_id: &str, status: PromptStatus) -> PromptTemplate {
    PromptTemplate {
        prompt_id: prompt_id.to_string(),
        version: 1,
        status,
        content: "Summarize the market for {symbol}.".into(),
        risk: RiskMetadata {
            risk_level: RiskLevel::Low,
            pii_risk: false,
            notes: None,
        },
        reviewer: None,
        review_comment: None,
        updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
    }
}

pub fn sample_model(version: &str, f1: f64) -> MlModel {
    MlModel {
        version: version.to_string(),
        model_type: "gradient_boosting".into(),
        status: ModelStatus::Ready,
        metrics: ModelMetrics {
            accuracy: 0.6,
            precision: 0.55,
            recall: 0.5,
            f1,
        },
        features: vec!["rsi_14".into(), "macd_12_26_9".into()],
        trained_at: None,
    }
}

// ── ApiClient ────────────────────────────────────────────────────────

impl ApiClient for FakeApi {
    fn list_backtests(&self) -> Result<Vec<Backtest>, ApiError> {
        self.record("list_backtests")?;
        Ok(self.state.lock().unwrap().backtests.clone())
    }

    fn get_backtest(&self, id: &str) -> Result<Backtest, ApiError> {
        self.record("get_backtest")?;
        let scripted = self.state.lock().unwrap().status_script.pop_front();
        self.with_backtest(id, |b| {
            if let Some(status) = scripted {
                b.status = status;
            }
        })
    }

    fn create_backtest(&self, request: &CreateBacktestRequest) -> Result<Backtest, ApiError> {
        self.record("create_backtest")?;
        let id = self.next_id("bt");
        let mut bt = sample_backtest(&id, BacktestStatus::Pending);
        bt.name = request.name.clone();
        bt.description = request.description.clone();
        bt.config = request.config.clone();
        self.state.lock().unwrap().backtests.push(bt.clone());
        Ok(bt)
    }

    fn execute_backtest(&self, id: &str) -> Result<Backtest, ApiError> {
        self.record("execute_backtest")?;
        self.with_backtest(id, |b| b.status = BacktestStatus::Running)
    }

    fn cancel_backtest(&self, id: &str) -> Result<Backtest, ApiError> {
        self.record("cancel_backtest")?;
        self.with_backtest(id, |b| b.status = BacktestStatus::Cancelled)
    }

    fn delete_backtest(&self, id: &str) -> Result<(), ApiError> {
        self.record("delete_backtest")?;
        self.state.lock().unwrap().backtests.retain(|b| b.id != id);
        Ok(())
    }

    fn create_optimization(
        &self,
        request: &CreateOptimizationRequest,
    ) -> Result<Optimization, ApiError> {
        self.record("create_optimization")?;
        Ok(Optimization {
            id: self.next_id("opt"),
            backtest_id: request.backtest_id.clone(),
            status: BacktestStatus::Pending,
            trials_completed: 0,
            best_parameters: None,
        })
    }

    fn start_optimization(&self, id: &str) -> Result<Optimization, ApiError> {
        self.record("start_optimization")?;
        Ok(Optimization {
            id: id.to_string(),
            backtest_id: "bt-1".into(),
            status: BacktestStatus::Running,
            trials_completed: 0,
            best_parameters: None,
        })
    }

    fn list_watchlists(&self) -> Result<Vec<Watchlist>, ApiError> {
        self.record("list_watchlists")?;
        Ok(self.state.lock().unwrap().watchlists.clone())
    }

    fn get_watchlist(&self, id: &str) -> Result<Watchlist, ApiError> {
        self.record("get_watchlist")?;
        self.state
            .lock()
            .unwrap()
            .watchlists
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("/watchlists/{id}")))
    }

    fn create_watchlist(&self, request: &WatchlistRequest) -> Result<Watchlist, ApiError> {
        self.record("create_watchlist")?;
        let watchlist = Watchlist {
            id: self.next_id("wl"),
            name: request.name.clone(),
            description: request.description.clone(),
            symbols: request.symbols.clone(),
            auto_update: request.auto_update,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
        };
        self.state.lock().unwrap().watchlists.push(watchlist.clone());
        Ok(watchlist)
    }

    fn update_watchlist(
        &self,
        id: &str,
        request: &WatchlistRequest,
    ) -> Result<Watchlist, ApiError> {
        self.record("update_watchlist")?;
        let mut state = self.state.lock().unwrap();
        let w = state
            .watchlists
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("/watchlists/{id}")))?;
        w.name = request.name.clone();
        w.symbols = request.symbols.clone();
        w.auto_update = request.auto_update;
        Ok(w.clone())
    }

    fn delete_watchlist(&self, id: &str) -> Result<(), ApiError> {
        self.record("delete_watchlist")?;
        self.state.lock().unwrap().watchlists.retain(|w| w.id != id);
        Ok(())
    }

    fn get_quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        self.record("get_quote")?;
        Ok(Quote {
            symbol: symbol.to_string(),
            price: 101.5,
            change: 1.5,
            change_percent: 1.5,
            volume: 1_000_000.0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap(),
        })
    }

    fn get_intraday(&self, _symbol: &str, _interval: Interval) -> Result<Vec<Candle>, ApiError> {
        self.record("get_intraday")?;
        Ok(candles_from_closes(&[100.0, 101.0, 102.0]))
    }

    fn get_crypto_prices(&self, symbols: &[String]) -> Result<Vec<CryptoPrice>, ApiError> {
        self.record("get_crypto_prices")?;
        Ok(symbols
            .iter()
            .map(|s| CryptoPrice {
                symbol: s.clone(),
                price_usd: 42_000.0,
                change_24h: 1.5,
                market_cap: None,
                timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap(),
            })
            .collect())
    }

    fn get_technical_indicators(
        &self,
        _symbol: &str,
        _interval: Interval,
        specs: &[IndicatorSpec],
    ) -> Result<OverlaySet, ApiError> {
        self.record("get_technical_indicators")?;
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        compute_overlays(&candles_from_closes(&closes), specs)
            .map_err(|e| ApiError::Status {
                status: 422,
                message: e.to_string(),
            })
    }

    fn list_alerts(&self, _symbol: Option<&str>) -> Result<Vec<DataQualityAlert>, ApiError> {
        self.record("list_alerts")?;
        Ok(Vec::new())
    }

    fn list_models(&self) -> Result<Vec<MlModel>, ApiError> {
        self.record("list_models")?;
        Ok(self.state.lock().unwrap().models.clone())
    }

    fn train_model(&self, request: &TrainModelRequest) -> Result<MlModel, ApiError> {
        self.record("train_model")?;
        let mut model = sample_model(&self.next_id("model"), 0.0);
        model.model_type = request.model_type.clone();
        model.status = ModelStatus::Training;
        self.state.lock().unwrap().models.push(model.clone());
        Ok(model)
    }

    fn delete_model(&self, version: &str) -> Result<(), ApiError> {
        self.record("delete_model")?;
        self.state.lock().unwrap().models.retain(|m| m.version != version);
        Ok(())
    }

    fn list_prompts(&self) -> Result<Vec<PromptTemplate>, ApiError> {
        self.record("list_prompts")?;
        Ok(self.state.lock().unwrap().prompts.clone())
    }

    fn submit_prompt(&self, prompt_id: &str, version: u32) -> Result<PromptTemplate, ApiError> {
        self.record("submit_prompt")?;
        self.with_prompt(prompt_id, version, |p| p.status = PromptStatus::InReview)
    }

    fn approve_prompt(
        &self,
        prompt_id: &str,
        version: u32,
        decision: &ReviewDecision,
    ) -> Result<PromptTemplate, ApiError> {
        self.record("approve_prompt")?;
        self.with_prompt(prompt_id, version, |p| {
            p.status = PromptStatus::Approved;
            p.reviewer = Some(decision.reviewer.clone());
            p.review_comment = decision.comment.clone();
        })
    }

    fn reject_prompt(
        &self,
        prompt_id: &str,
        version: u32,
        decision: &ReviewDecision,
    ) -> Result<PromptTemplate, ApiError> {
        self.record("reject_prompt")?;
        self.with_prompt(prompt_id, version, |p| {
            p.status = PromptStatus::Rejected;
            p.reviewer = Some(decision.reviewer.clone());
            p.review_comment = decision.comment.clone();
        })
    }

    fn evaluate_prompt(
        &self,
        prompt_id: &str,
        version: u32,
    ) -> Result<PromptEvaluation, ApiError> {
        self.record("evaluate_prompt")?;
        Ok(PromptEvaluation {
            prompt_id: prompt_id.to_string(),
            version,
            score: 0.92,
            flagged_issues: Vec::new(),
        })
    }
}
