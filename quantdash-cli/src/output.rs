//! Plain-text tables for terminal output.

use chrono::Utc;

use quantdash_core::domain::{
    Backtest, CryptoPrice, DataQualityAlert, MlModel, PromptTemplate, Watchlist,
};
use quantdash_core::format::{
    backtest_status_label, format_compact_currency, format_currency, format_date, format_number,
    format_percent, format_relative, format_timestamp, model_status_label, prompt_status_label,
    severity_label,
};
use quantdash_core::indicators::{IndicatorSeries, OverlaySet};

pub fn print_backtests(backtests: &[Backtest]) {
    if backtests.is_empty() {
        println!("No backtests.");
        return;
    }
    let now = Utc::now();
    println!(
        "{:<12} {:<28} {:<10} {:>10} {:>8} {:<10}",
        "ID", "Name", "Status", "Return", "Sharpe", "Created"
    );
    println!("{}", "-".repeat(84));
    for bt in backtests {
        let (ret, sharpe) = match &bt.performance {
            Some(p) => (
                format_percent(p.total_return, 2, true),
                format_number(p.sharpe_ratio, 2),
            ),
            None => ("-".into(), "-".into()),
        };
        println!(
            "{:<12} {:<28} {:<10} {:>10} {:>8} {:<10}",
            truncate(&bt.id, 12),
            truncate(&bt.name, 28),
            backtest_status_label(bt.status),
            ret,
            sharpe,
            format_relative(bt.created_at, now),
        );
    }
}

pub fn print_backtest(bt: &Backtest) {
    println!();
    println!("=== {} ===", bt.name);
    println!("ID:             {}", bt.id);
    println!("Status:         {}", backtest_status_label(bt.status));
    if let Some(desc) = &bt.description {
        println!("Description:    {desc}");
    }
    println!(
        "Period:         {} to {}",
        format_date(bt.config.start_date),
        format_date(bt.config.end_date)
    );
    println!("Symbols:        {}", bt.config.symbols.join(", "));
    println!("Initial Cash:   {}", format_currency(bt.config.initial_cash));
    println!("Commission:     {}", format_percent(bt.config.commission, 2, false));
    if let Some(strategy) = &bt.config.strategy_id {
        println!("Strategy:       {strategy}");
    }
    for (name, value) in &bt.config.parameters {
        println!("  {name:<14}{value}");
    }
    println!("Created:        {}", format_timestamp(bt.created_at));
    if let Some(updated) = bt.updated_at {
        println!("Updated:        {}", format_timestamp(updated));
    }
    if let Some(p) = &bt.performance {
        println!();
        println!("--- Performance ---");
        println!("Total Return:   {}", format_percent(p.total_return, 2, true));
        println!("Annualized:     {}", format_percent(p.annualized_return, 2, true));
        println!("Sharpe:         {}", format_number(p.sharpe_ratio, 3));
        println!("Max Drawdown:   {}", format_percent(p.max_drawdown, 2, false));
        println!("Win Rate:       {}", format_percent(p.win_rate, 1, false));
        println!("Trades:         {}", p.total_trades);
    }
    if let Some(err) = &bt.error_message {
        println!();
        println!("ERROR: {err}");
    }
    println!();
}

pub fn print_watchlists(watchlists: &[Watchlist]) {
    if watchlists.is_empty() {
        println!("No watchlists.");
        return;
    }
    println!("{:<12} {:<24} {:<6} Symbols", "ID", "Name", "Auto");
    println!("{}", "-".repeat(70));
    for w in watchlists {
        println!(
            "{:<12} {:<24} {:<6} {}",
            truncate(&w.id, 12),
            truncate(&w.name, 24),
            if w.auto_update { "yes" } else { "no" },
            w.symbols.join(" "),
        );
    }
}

pub fn print_models(models: &[MlModel]) {
    if models.is_empty() {
        println!("No models.");
        return;
    }
    println!(
        "{:<16} {:<20} {:<10} {:>8} {:>8}",
        "Version", "Type", "Status", "Acc", "F1"
    );
    println!("{}", "-".repeat(66));
    for m in models {
        println!(
            "{:<16} {:<20} {:<10} {:>8} {:>8}",
            truncate(&m.version, 16),
            truncate(&m.model_type, 20),
            model_status_label(m.status),
            format_percent(m.metrics.accuracy, 1, false),
            format_number(m.metrics.f1, 3),
        );
    }
}

pub fn print_prompts(prompts: &[PromptTemplate]) {
    if prompts.is_empty() {
        println!("No prompt templates.");
        return;
    }
    println!(
        "{:<24} {:>4} {:<10} {:<7} {:<12}",
        "Prompt", "Ver", "Status", "Risk", "Reviewer"
    );
    println!("{}", "-".repeat(62));
    for p in prompts {
        println!(
            "{:<24} {:>4} {:<10} {:<7} {:<12}",
            truncate(&p.prompt_id, 24),
            p.version,
            prompt_status_label(p.status),
            format!("{:?}", p.risk.risk_level).to_lowercase(),
            p.reviewer.as_deref().unwrap_or("-"),
        );
    }
}

pub fn print_alerts(alerts: &[DataQualityAlert]) {
    if alerts.is_empty() {
        println!("No data-quality alerts.");
        return;
    }
    let now = Utc::now();
    println!("{:<8} {:<9} {:>6} {:<10} Message", "Symbol", "Severity", "Score", "When");
    println!("{}", "-".repeat(70));
    for a in alerts {
        let score = a
            .max_score()
            .map_or_else(|| "-".to_string(), |s| format_number(s, 2));
        println!(
            "{:<8} {:<9} {:>6} {:<10} {}",
            a.symbol,
            severity_label(a.severity),
            score,
            format_relative(a.timestamp, now),
            a.message,
        );
    }
}

pub fn print_crypto(prices: &[CryptoPrice]) {
    if prices.is_empty() {
        println!("No prices.");
        return;
    }
    println!("{:<8} {:>14} {:>9} {:>10}  As of", "Symbol", "Price", "24h", "Mkt Cap");
    println!("{}", "-".repeat(66));
    for p in prices {
        let change = format_number(p.change_24h, 2);
        let change = if p.change_24h > 0.0 { format!("+{change}") } else { change };
        println!(
            "{:<8} {:>14} {:>9} {:>10}  {}",
            p.symbol,
            format_currency(p.price_usd),
            change,
            p.market_cap.map_or_else(|| "-".to_string(), format_compact_currency),
            format_timestamp(p.timestamp),
        );
    }
}

/// Last `tail` points of every overlay.
pub fn print_overlays(overlays: &OverlaySet, tail: usize) {
    for (key, series) in overlays.iter() {
        println!();
        println!("--- {key} ({} points) ---", series.len());
        match series {
            IndicatorSeries::Line(points) => {
                for p in last(points, tail) {
                    println!("{}  {:>12}", format_timestamp(p.time), format_number(p.value, 4));
                }
            }
            IndicatorSeries::Macd(points) => {
                println!("{:<20}  {:>12} {:>12} {:>12}", "Time", "MACD", "Signal", "Hist");
                for p in last(points, tail) {
                    println!(
                        "{}  {:>12} {:>12} {:>12}",
                        format_timestamp(p.time),
                        format_number(p.macd, 4),
                        format_number(p.signal, 4),
                        format_number(p.histogram, 4),
                    );
                }
            }
            IndicatorSeries::Bands(points) => {
                println!("{:<20}  {:>12} {:>12} {:>12}", "Time", "Upper", "Middle", "Lower");
                for p in last(points, tail) {
                    println!(
                        "{}  {:>12} {:>12} {:>12}",
                        format_timestamp(p.time),
                        format_number(p.upper, 4),
                        format_number(p.middle, 4),
                        format_number(p.lower, 4),
                    );
                }
            }
        }
    }
}

fn last<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-name", 6), "a-ver…");
        assert_eq!(truncate("a-very-long-name", 6).chars().count(), 6);
    }

    #[test]
    fn last_clamps() {
        assert_eq!(last(&[1, 2, 3], 2), &[2, 3]);
        assert_eq!(last(&[1, 2, 3], 10), &[1, 2, 3]);
    }
}
