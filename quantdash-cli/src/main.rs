//! QuantDash CLI: indicator computation, chart settings, and backend commands.
//!
//! Commands:
//! - `indicators` computes overlays over CSV, synthetic, or inline candles
//! - `settings show|set|reset|list` manages per-symbol chart settings on disk
//! - `backtest list|show|create|monitor|cancel`
//! - `watchlist list|create`
//! - `models list`
//! - `prompts list|submit|approve|reject|evaluate`
//! - `alerts` lists data-quality alerts
//! - `crypto` shows spot prices for crypto symbols
//!
//! Logs go to stderr; stdout carries only command output.

mod output;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quantdash_app::wizard::BacktestForm;
use quantdash_app::{
    ApiClient, ApiError, AppConfig, BacktestWizard, ChartSettingsStore, FileStore, HttpApiClient,
    PromptOutcome, Queries, WizardError,
};
use quantdash_core::chart::{ChartType, DateRange, Interval};
use quantdash_core::data::{candles_from_closes, load_candles, synthetic_candles};
use quantdash_core::domain::{
    alert::sort_by_priority, PromptAction, PromptTemplate, ReviewDecision, WatchlistRequest,
};
use quantdash_core::format::backtest_status_label;
use quantdash_core::indicators::{compute_overlays, IndicatorSpec};

#[derive(Parser)]
#[command(
    name = "quantdash",
    version,
    about = "QuantDash CLI: indicators, chart settings, backtests, and governance"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to $QUANTDASH_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute technical indicators over a candle series.
    Indicators {
        /// CSV file with time,open,high,low,close[,volume] columns.
        #[arg(long, conflicts_with_all = ["synthetic", "closes"])]
        csv: Option<PathBuf>,

        /// Generate a deterministic random walk for this symbol.
        #[arg(long, conflicts_with = "closes")]
        synthetic: Option<String>,

        /// Inline close prices, comma separated.
        #[arg(long, value_delimiter = ',')]
        closes: Option<Vec<f64>>,

        /// Number of synthetic candles.
        #[arg(long, default_value_t = 120)]
        count: usize,

        /// Indicator specs such as `rsi:14`, `macd:12,26,9`, `bb:20,2`.
        /// Defaults to RSI, MACD, and Bollinger Bands.
        #[arg(long = "indicator", short = 'i')]
        indicators: Vec<IndicatorSpec>,

        /// Points to show per overlay in table output.
        #[arg(long, default_value_t = 5)]
        tail: usize,

        /// Emit the full overlay set as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Per-symbol chart settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Backtests on the backend.
    Backtest {
        #[command(subcommand)]
        action: BacktestAction,
    },
    /// Watchlists on the backend.
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
    /// ML models on the backend.
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// Prompt template governance.
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },
    /// Data-quality alerts, most severe first.
    Alerts {
        /// Only alerts for this symbol.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Crypto spot prices.
    Crypto {
        /// Symbols such as `BTC ETH`.
        #[arg(default_values_t = ["BTC".to_string(), "ETH".to_string()])]
        symbols: Vec<String>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the settings for a symbol as JSON.
    Show { symbol: String },
    /// Change settings for a symbol. Unspecified fields keep their value.
    Set {
        symbol: String,

        #[arg(long)]
        chart_type: Option<ChartType>,

        /// Candle interval: 1m, 5m, 15m, 30m, 1h, 1d, 1wk.
        #[arg(long)]
        interval: Option<Interval>,

        /// Date range: 1d, 5d, 1m, 3m, 6m, 1y, 5y, max, or YYYY-MM-DD..YYYY-MM-DD.
        #[arg(long)]
        range: Option<DateRange>,

        /// Replace the indicator list.
        #[arg(long = "indicator", short = 'i')]
        indicators: Vec<IndicatorSpec>,

        /// Toggle one indicator on or off.
        #[arg(long)]
        toggle: Vec<IndicatorSpec>,
    },
    /// Forget the settings for a symbol.
    Reset { symbol: String },
    /// Symbols with saved settings.
    List,
}

#[derive(Subcommand)]
enum BacktestAction {
    List,
    Show {
        id: String,
    },
    /// Create a backtest and start it.
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Symbols, comma or space separated.
        #[arg(long)]
        symbols: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long, default_value_t = 100_000.0)]
        cash: f64,

        /// Commission as a fraction of trade value.
        #[arg(long, default_value_t = 0.001)]
        commission: f64,

        #[arg(long)]
        strategy: Option<String>,

        /// Strategy parameter, `name=value`. Repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, f64)>,

        /// Keep polling until the backtest finishes.
        #[arg(long, default_value_t = false)]
        monitor: bool,
    },
    /// Poll a backtest until it reaches a terminal status.
    Monitor {
        id: String,

        /// Poll interval in seconds. Defaults to `monitor.refresh_secs`.
        #[arg(long)]
        every: Option<u64>,
    },
    Cancel {
        id: String,
    },
}

#[derive(Subcommand)]
enum WatchlistAction {
    List,
    Create {
        name: String,

        /// Symbols, comma or space separated.
        symbols: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, default_value_t = false)]
        auto_update: bool,
    },
}

#[derive(Subcommand)]
enum ModelsAction {
    List,
}

#[derive(Subcommand)]
enum PromptsAction {
    List,
    Submit {
        prompt_id: String,
        /// Defaults to the latest version.
        #[arg(long)]
        version: Option<u32>,
    },
    Approve {
        prompt_id: String,
        #[arg(long)]
        version: Option<u32>,
        #[arg(long)]
        reviewer: String,
        #[arg(long)]
        comment: Option<String>,
    },
    Reject {
        prompt_id: String,
        #[arg(long)]
        version: Option<u32>,
        #[arg(long)]
        reviewer: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Run the automated evaluation for a prompt version.
    Evaluate {
        prompt_id: String,
        #[arg(long)]
        version: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Indicators {
            csv,
            synthetic,
            closes,
            count,
            indicators,
            tail,
            json,
        } => run_indicators(csv, synthetic, closes, count, indicators, tail, json),
        Commands::Settings { action } => run_settings(&config, action),
        Commands::Backtest { action } => run_backtest(&config, action),
        Commands::Watchlist { action } => run_watchlist(&config, action),
        Commands::Models {
            action: ModelsAction::List,
        } => {
            let models = queries(&config)?.models().or_summary()?;
            output::print_models(&models);
            Ok(())
        }
        Commands::Prompts { action } => run_prompts(&config, action),
        Commands::Alerts { symbol } => {
            let mut alerts = queries(&config)?.alerts(symbol.as_deref()).or_summary()?;
            sort_by_priority(&mut alerts);
            output::print_alerts(&alerts);
            Ok(())
        }
        Commands::Crypto { symbols } => {
            let symbols: Vec<String> = symbols.iter().map(|s| s.to_ascii_uppercase()).collect();
            let prices = queries(&config)?.crypto_prices(&symbols).or_summary()?;
            output::print_crypto(&prices);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Attach the short user-facing summary to an API error; the error itself
/// stays as the detail line.
trait ApiResultExt<T> {
    fn or_summary(self) -> Result<T>;
}

impl<T> ApiResultExt<T> for std::result::Result<T, ApiError> {
    fn or_summary(self) -> Result<T> {
        self.map_err(|e| {
            let summary = e.summary();
            anyhow::Error::new(e).context(summary)
        })
    }
}

fn api_client(config: &AppConfig) -> Result<Arc<dyn ApiClient>> {
    let client = HttpApiClient::new(&config.api).or_summary()?;
    tracing::debug!(base_url = %config.api.base_url, "using backend");
    Ok(Arc::new(client))
}

fn queries(config: &AppConfig) -> Result<Queries> {
    Ok(Queries::new(api_client(config)?, config.stale_time()))
}

fn parse_param(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value for '{name}': {e}"))?;
    Ok((name.trim().to_string(), value))
}

// ── indicators ───────────────────────────────────────────────────────

fn run_indicators(
    csv: Option<PathBuf>,
    synthetic: Option<String>,
    closes: Option<Vec<f64>>,
    count: usize,
    mut specs: Vec<IndicatorSpec>,
    tail: usize,
    json: bool,
) -> Result<()> {
    let candles = match (csv, synthetic, closes) {
        (Some(path), _, _) => load_candles(&path)
            .with_context(|| format!("failed to read candles from {}", path.display()))?,
        (None, Some(symbol), _) => {
            let start = Utc::now() - chrono::Duration::days(count as i64);
            synthetic_candles(&symbol, start, count, chrono::Duration::days(1))
        }
        (None, None, Some(closes)) => candles_from_closes(&closes),
        (None, None, None) => bail!("one of --csv, --synthetic, or --closes is required"),
    };
    if specs.is_empty() {
        specs = vec![
            IndicatorSpec::rsi_default(),
            IndicatorSpec::macd_default(),
            IndicatorSpec::bollinger_default(),
        ];
    }
    tracing::info!(candles = candles.len(), indicators = specs.len(), "computing overlays");

    let overlays = compute_overlays(&candles, &specs).context("indicator computation failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&overlays)?);
    } else {
        println!("Candles: {}", candles.len());
        output::print_overlays(&overlays, tail);
    }
    Ok(())
}

// ── settings ─────────────────────────────────────────────────────────

fn settings_store(config: &AppConfig) -> Result<ChartSettingsStore> {
    let fallback = dirs::config_dir()
        .map(|d| d.join("quantdash"))
        .unwrap_or_else(|| PathBuf::from("."));
    let path = config.settings_file(&fallback);
    tracing::debug!(path = %path.display(), "chart settings file");
    let store = ChartSettingsStore::new(Arc::new(FileStore::new(path)), config.debounce())
        .context("failed to start settings writer")?;
    Ok(store)
}

fn run_settings(config: &AppConfig, action: SettingsAction) -> Result<()> {
    let store = settings_store(config)?;
    match action {
        SettingsAction::Show { symbol } => {
            let symbol = symbol.to_ascii_uppercase();
            let settings = match store.load(&symbol) {
                Some(settings) => settings,
                None => {
                    eprintln!("No saved settings for {symbol}; showing defaults.");
                    store.load_or_default(&symbol)
                }
            };
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set {
            symbol,
            chart_type,
            interval,
            range,
            indicators,
            toggle,
        } => {
            let symbol = symbol.to_ascii_uppercase();
            let mut settings = store.load_or_default(&symbol);
            if let Some(chart_type) = chart_type {
                settings.chart_type = chart_type;
            }
            if let Some(interval) = interval {
                settings.interval = interval;
            }
            if let Some(range) = range {
                settings.date_range = range;
            }
            if !indicators.is_empty() {
                settings.indicators = indicators;
            }
            for spec in toggle {
                let key = spec.key();
                let on = settings.toggle_indicator(spec);
                println!("{key}: {}", if on { "on" } else { "off" });
            }
            store.save(&symbol, &settings)?;
            store.flush()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Reset { symbol } => {
            let symbol = symbol.to_ascii_uppercase();
            store.remove(&symbol)?;
            println!("Settings for {symbol} reset to defaults.");
        }
        SettingsAction::List => {
            let symbols = store.symbols()?;
            if symbols.is_empty() {
                println!("No saved chart settings.");
            }
            for symbol in symbols {
                println!("{symbol}");
            }
        }
    }
    Ok(())
}

// ── backtests ────────────────────────────────────────────────────────

fn run_backtest(config: &AppConfig, action: BacktestAction) -> Result<()> {
    let queries = queries(config)?;
    match action {
        BacktestAction::List => {
            let backtests = queries.backtests().or_summary()?;
            output::print_backtests(&backtests);
        }
        BacktestAction::Show { id } => {
            let backtest = queries.backtest(&id).or_summary()?;
            output::print_backtest(&backtest);
        }
        BacktestAction::Create {
            name,
            description,
            symbols,
            start,
            end,
            cash,
            commission,
            strategy,
            params,
            monitor,
        } => {
            let today = Utc::now().date_naive();
            let mut form = BacktestForm {
                name,
                description: description.unwrap_or_default(),
                start_date: Some(start),
                end_date: Some(end.unwrap_or(today)),
                initial_cash: cash,
                commission,
                strategy_id: strategy,
                parameters: params.into_iter().collect::<BTreeMap<_, _>>(),
                ..BacktestForm::default()
            };
            form.set_symbols_from_text(&symbols);

            let backtest = create_backtest(&queries, form, today)?;
            println!(
                "Backtest {} created ({}).",
                backtest.id,
                backtest_status_label(backtest.status)
            );
            if monitor {
                monitor_backtest(&queries, &backtest.id, config.refresh_interval())?;
            }
        }
        BacktestAction::Monitor { id, every } => {
            let interval = every.map_or(config.refresh_interval(), Duration::from_secs);
            monitor_backtest(&queries, &id, interval)?;
        }
        BacktestAction::Cancel { id } => {
            let current = queries.backtest(&id).or_summary()?;
            if !current.status.is_cancellable() {
                bail!(
                    "backtest {id} is {} and cannot be cancelled",
                    backtest_status_label(current.status)
                );
            }
            let cancelled = queries.cancel_backtest(&id).or_summary()?;
            println!(
                "Backtest {} is now {}.",
                cancelled.id,
                backtest_status_label(cancelled.status)
            );
        }
    }
    Ok(())
}

/// Walk the wizard step by step so errors are reported against the first
/// failing step, then submit.
fn create_backtest(
    queries: &Queries,
    form: BacktestForm,
    today: NaiveDate,
) -> Result<quantdash_core::domain::Backtest> {
    let mut wizard = BacktestWizard::with_form(form, today);
    loop {
        let label = wizard.progress_label();
        let before = wizard.step();
        match wizard.next() {
            Ok(step) if step == before => break,
            Ok(_) => tracing::debug!(step = %label, "step valid"),
            Err(errors) => {
                eprintln!("{label}");
                for e in errors.errors() {
                    eprintln!("  - {e}");
                }
                bail!("backtest form has {} error(s)", errors.len());
            }
        }
    }

    match queries.submit_backtest(&wizard) {
        Ok(backtest) => Ok(backtest),
        Err(e) => {
            for message in e.messages() {
                eprintln!("{message}");
            }
            if let WizardError::FollowUp { id, .. } = &e {
                eprintln!("Backtest {id} exists; run `quantdash backtest show {id}` to inspect it.");
            }
            Err(e.into())
        }
    }
}

fn monitor_backtest(queries: &Queries, id: &str, interval: Duration) -> Result<()> {
    println!("Monitoring {id} every {}s (Ctrl-C to stop)", interval.as_secs_f64());
    let monitor = queries
        .monitor_backtest(id, interval, |update| match update {
            Ok(bt) => {
                let progress = bt
                    .performance
                    .as_ref()
                    .map(|p| format!("  trades={}", p.total_trades))
                    .unwrap_or_default();
                println!(
                    "[{}] {}{progress}",
                    Utc::now().format("%H:%M:%S"),
                    backtest_status_label(bt.status)
                );
            }
            Err(e) => eprintln!("{}: {e}", e.summary()),
        })
        .context("failed to start monitor")?;
    monitor.wait();

    let finished = queries.backtest(id).or_summary()?;
    output::print_backtest(&finished);
    Ok(())
}

// ── watchlists ───────────────────────────────────────────────────────

fn run_watchlist(config: &AppConfig, action: WatchlistAction) -> Result<()> {
    let queries = queries(config)?;
    match action {
        WatchlistAction::List => {
            let watchlists = queries.watchlists().or_summary()?;
            output::print_watchlists(&watchlists);
        }
        WatchlistAction::Create {
            name,
            symbols,
            description,
            auto_update,
        } => {
            let request = WatchlistRequest {
                name,
                description,
                symbols: symbols
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                auto_update,
            };
            let created = queries.create_watchlist(&request).or_summary()?;
            println!(
                "Watchlist {} created with {} symbol(s).",
                created.id,
                created.symbols.len()
            );
        }
    }
    Ok(())
}

// ── prompts ──────────────────────────────────────────────────────────

/// The requested version of `prompt_id`, or its latest.
fn find_prompt(queries: &Queries, prompt_id: &str, version: Option<u32>) -> Result<PromptTemplate> {
    let prompts = queries.prompts().or_summary()?;
    prompts
        .into_iter()
        .filter(|p| p.prompt_id == prompt_id)
        .filter(|p| version.map_or(true, |v| p.version == v))
        .max_by_key(|p| p.version)
        .with_context(|| match version {
            Some(v) => format!("prompt {prompt_id} v{v} not found"),
            None => format!("prompt {prompt_id} not found"),
        })
}

fn run_prompts(config: &AppConfig, action: PromptsAction) -> Result<()> {
    let queries = queries(config)?;
    let (prompt_id, version, action, decision) = match action {
        PromptsAction::List => {
            output::print_prompts(&queries.prompts().or_summary()?);
            return Ok(());
        }
        PromptsAction::Submit { prompt_id, version } => {
            (prompt_id, version, PromptAction::Submit, None)
        }
        PromptsAction::Approve {
            prompt_id,
            version,
            reviewer,
            comment,
        } => (
            prompt_id,
            version,
            PromptAction::Approve,
            Some(ReviewDecision { reviewer, comment }),
        ),
        PromptsAction::Reject {
            prompt_id,
            version,
            reviewer,
            comment,
        } => (
            prompt_id,
            version,
            PromptAction::Reject,
            Some(ReviewDecision { reviewer, comment }),
        ),
        PromptsAction::Evaluate { prompt_id, version } => {
            (prompt_id, version, PromptAction::Evaluate, None)
        }
    };

    let prompt = find_prompt(&queries, &prompt_id, version)?;
    match queries
        .prompt_action(&prompt, action, decision.as_ref())
        .or_summary()?
    {
        PromptOutcome::Updated(updated) => output::print_prompts(&[updated]),
        PromptOutcome::Evaluated(eval) => {
            println!(
                "{} v{}: score {:.2}",
                eval.prompt_id, eval.version, eval.score
            );
            for issue in &eval.flagged_issues {
                println!("  - {issue}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_indicator_specs() {
        let cli = Cli::try_parse_from([
            "quantdash",
            "indicators",
            "--closes",
            "1,2,3",
            "-i",
            "rsi:5",
            "-i",
            "macd",
        ])
        .unwrap();
        match cli.command {
            Commands::Indicators {
                closes, indicators, ..
            } => {
                assert_eq!(closes, Some(vec![1.0, 2.0, 3.0]));
                assert_eq!(indicators.len(), 2);
                assert_eq!(indicators[1], IndicatorSpec::macd_default());
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn rejects_bad_indicator_spec() {
        assert!(Cli::try_parse_from(["quantdash", "indicators", "-i", "rsi:0"]).is_err());
    }

    #[test]
    fn csv_conflicts_with_closes() {
        assert!(Cli::try_parse_from([
            "quantdash",
            "indicators",
            "--csv",
            "a.csv",
            "--closes",
            "1,2"
        ])
        .is_err());
    }

    #[test]
    fn crypto_defaults_to_btc_and_eth() {
        let cli = Cli::try_parse_from(["quantdash", "crypto"]).unwrap();
        match cli.command {
            Commands::Crypto { symbols } => assert_eq!(symbols, vec!["BTC", "ETH"]),
            _ => panic!("wrong subcommand"),
        }
        let cli = Cli::try_parse_from(["quantdash", "crypto", "sol"]).unwrap();
        assert!(matches!(cli.command, Commands::Crypto { symbols } if symbols == ["sol"]));
    }

    #[test]
    fn param_parser() {
        assert_eq!(parse_param("lookback=20").unwrap(), ("lookback".into(), 20.0));
        assert_eq!(parse_param(" k = 1.5").unwrap(), ("k".into(), 1.5));
        assert!(parse_param("lookback").is_err());
        assert!(parse_param("lookback=abc").is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["quantdash", "models", "list", "-v", "--config", "q.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some(Path::new("q.toml")));
    }

    #[test]
    fn api_errors_carry_summary_and_detail() {
        let err = Err::<(), _>(ApiError::NotFound("/backtests/x".into()))
            .or_summary()
            .unwrap_err();
        assert_eq!(err.to_string(), "The requested item was not found");
        assert_eq!(err.root_cause().to_string(), "not found: /backtests/x");
    }
}
