//! Per-symbol chart configuration.
//!
//! This is the shape persisted by the chart settings store. Unknown or missing
//! fields fall back to defaults so that settings written by an older version
//! still load.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSpec;

/// Storage key prefix for chart settings.
pub const SETTINGS_KEY_PREFIX: &str = "react-financial-chart:";

/// Storage key for a symbol's chart settings.
pub fn settings_key(symbol: &str) -> String {
    format!("{SETTINGS_KEY_PREFIX}{symbol}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Candlestick,
    Line,
    Area,
    Ohlc,
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "candlestick" | "candle" => Ok(Self::Candlestick),
            "line" => Ok(Self::Line),
            "area" => Ok(Self::Area),
            "ohlc" => Ok(Self::Ohlc),
            other => Err(format!("unknown chart type '{other}'")),
        }
    }
}

/// Candle interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1wk")]
    OneWeek,
}

impl Interval {
    pub const ALL: [Interval; 7] = [
        Self::OneMinute,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::OneDay,
        Self::OneWeek,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::OneWeek => "1wk",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::OneMinute => Duration::minutes(1),
            Self::FiveMinutes => Duration::minutes(5),
            Self::FifteenMinutes => Duration::minutes(15),
            Self::ThirtyMinutes => Duration::minutes(30),
            Self::OneHour => Duration::hours(1),
            Self::OneDay => Duration::days(1),
            Self::OneWeek => Duration::weeks(1),
        }
    }

    pub fn is_intraday(self) -> bool {
        self.duration() < Duration::days(1)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| format!("unknown interval '{s}'"))
    }
}

/// Visible date range: a preset lookback or explicit bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "5y")]
    FiveYears,
    Max,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl Default for DateRange {
    fn default() -> Self {
        Self::ThreeMonths
    }
}

impl DateRange {
    /// Concrete `(start, end)` bounds relative to `now`. `Max` has no start.
    pub fn bounds(self, now: DateTime<Utc>) -> (Option<NaiveDate>, NaiveDate) {
        let today = now.date_naive();
        let back = |d: Duration| Some(today - d);
        match self {
            Self::OneDay => (back(Duration::days(1)), today),
            Self::FiveDays => (back(Duration::days(5)), today),
            Self::OneMonth => (back(Duration::days(30)), today),
            Self::ThreeMonths => (back(Duration::days(91)), today),
            Self::SixMonths => (back(Duration::days(182)), today),
            Self::OneYear => (back(Duration::days(365)), today),
            Self::FiveYears => (back(Duration::days(5 * 365)), today),
            Self::Max => (None, today),
            Self::Custom { start, end } => (Some(start), end),
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    /// Accepts a preset (`1d`, `5d`, `1m`, `3m`, `6m`, `1y`, `5y`, `max`) or
    /// `YYYY-MM-DD..YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((start, end)) = s.split_once("..") {
            let parse = |v: &str| {
                NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                    .map_err(|e| format!("bad date '{v}': {e}"))
            };
            let (start, end) = (parse(start)?, parse(end)?);
            if start > end {
                return Err(format!("range start {start} is after end {end}"));
            }
            return Ok(Self::Custom { start, end });
        }
        match s.to_ascii_lowercase().as_str() {
            "1d" => Ok(Self::OneDay),
            "5d" => Ok(Self::FiveDays),
            "1m" => Ok(Self::OneMonth),
            "3m" => Ok(Self::ThreeMonths),
            "6m" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "5y" => Ok(Self::FiveYears),
            "max" => Ok(Self::Max),
            other => Err(format!("unknown date range '{other}'")),
        }
    }
}

/// Everything a chart remembers for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub chart_type: ChartType,
    pub indicators: Vec<IndicatorSpec>,
    pub date_range: DateRange,
    pub interval: Interval,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            chart_type: ChartType::Candlestick,
            indicators: Vec::new(),
            date_range: DateRange::default(),
            interval: Interval::OneDay,
        }
    }
}

impl ChartSettings {
    /// Toggle an indicator on or off (by display key). Returns true if now active.
    pub fn toggle_indicator(&mut self, spec: IndicatorSpec) -> bool {
        let key = spec.key();
        if let Some(pos) = self.indicators.iter().position(|s| s.key() == key) {
            self.indicators.remove(pos);
            false
        } else {
            self.indicators.push(spec);
            true
        }
    }
}
