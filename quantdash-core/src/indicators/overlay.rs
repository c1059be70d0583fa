//! Active chart overlays: which indicators to draw, and their computed series.
//!
//! An `IndicatorSpec` is what a chart's settings persist; an `OverlaySet` is
//! what gets drawn. Overlays are computed once per candle set, keyed by the
//! spec's display key.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    Bollinger, BollingerPoint, Ema, Indicator, IndicatorError, LinePoint, Macd, MacdPoint, Rsi,
    Sma,
};
use crate::domain::Candle;

/// One active indicator with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Sma { period: usize },
    Ema { period: usize },
    Rsi { period: usize },
    Macd { fast: usize, slow: usize, signal: usize },
    Bollinger { period: usize, k: f64 },
}

impl IndicatorSpec {
    pub fn rsi_default() -> Self {
        Self::Rsi { period: 14 }
    }

    pub fn macd_default() -> Self {
        Self::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }

    pub fn bollinger_default() -> Self {
        Self::Bollinger { period: 20, k: 2.0 }
    }

    /// Stable display key, identical to the indicator's `name()`.
    pub fn key(&self) -> String {
        match self {
            Self::Sma { period } => format!("sma_{period}"),
            Self::Ema { period } => format!("ema_{period}"),
            Self::Rsi { period } => format!("rsi_{period}"),
            Self::Macd { fast, slow, signal } => format!("macd_{fast}_{slow}_{signal}"),
            Self::Bollinger { period, k } => format!("bollinger_{period}_{k}"),
        }
    }

    /// Whether the overlay shares the price axis (vs. a separate pane).
    pub fn is_price_overlay(&self) -> bool {
        matches!(self, Self::Sma { .. } | Self::Ema { .. } | Self::Bollinger { .. })
    }

    pub fn validate(&self) -> Result<(), IndicatorError> {
        self.compute(&[]).map(|_| ())
    }

    pub fn compute(&self, candles: &[Candle]) -> Result<IndicatorSeries, IndicatorError> {
        Ok(match *self {
            Self::Sma { period } => IndicatorSeries::Line(Sma::new(period)?.compute(candles)),
            Self::Ema { period } => IndicatorSeries::Line(Ema::new(period)?.compute(candles)),
            Self::Rsi { period } => IndicatorSeries::Line(Rsi::new(period)?.compute(candles)),
            Self::Macd { fast, slow, signal } => {
                IndicatorSeries::Macd(Macd::new(fast, slow, signal)?.compute(candles))
            }
            Self::Bollinger { period, k } => {
                IndicatorSeries::Bands(Bollinger::new(period, k)?.compute(candles))
            }
        })
    }
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sma { period } => write!(f, "sma:{period}"),
            Self::Ema { period } => write!(f, "ema:{period}"),
            Self::Rsi { period } => write!(f, "rsi:{period}"),
            Self::Macd { fast, slow, signal } => write!(f, "macd:{fast},{slow},{signal}"),
            Self::Bollinger { period, k } => write!(f, "bollinger:{period},{k}"),
        }
    }
}

/// Parses `name[:p1,p2,...]`, e.g. `rsi`, `rsi:21`, `macd:12,26,9`, `bb:20,2.5`.
/// Missing parameters take the conventional defaults.
impl FromStr for IndicatorSpec {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || IndicatorError::Parse(s.to_string());
        let (name, params) = match s.trim().split_once(':') {
            Some((name, params)) => (name, params),
            None => (s.trim(), ""),
        };
        let params: Vec<&str> = params
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let usize_at = |i: usize, default: usize| -> Result<usize, IndicatorError> {
            params
                .get(i)
                .map_or(Ok(default), |p| p.parse().map_err(|_| parse_err()))
        };

        let spec = match name.to_ascii_lowercase().as_str() {
            "sma" if params.len() <= 1 => Self::Sma {
                period: usize_at(0, 20)?,
            },
            "ema" if params.len() <= 1 => Self::Ema {
                period: usize_at(0, 20)?,
            },
            "rsi" if params.len() <= 1 => Self::Rsi {
                period: usize_at(0, 14)?,
            },
            "macd" if params.len() <= 3 => Self::Macd {
                fast: usize_at(0, 12)?,
                slow: usize_at(1, 26)?,
                signal: usize_at(2, 9)?,
            },
            "bollinger" | "bb" if params.len() <= 2 => Self::Bollinger {
                period: usize_at(0, 20)?,
                k: params
                    .get(1)
                    .map_or(Ok(2.0), |p| p.parse().map_err(|_| parse_err()))?,
            },
            _ => return Err(parse_err()),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Computed points for one overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum IndicatorSeries {
    Line(Vec<LinePoint>),
    Macd(Vec<MacdPoint>),
    Bands(Vec<BollingerPoint>),
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        match self {
            Self::Line(p) => p.len(),
            Self::Macd(p) => p.len(),
            Self::Bands(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Container for computed overlays, keyed by display key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlaySet {
    series: BTreeMap<String, IndicatorSeries>,
}

impl OverlaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, series: IndicatorSeries) {
        self.series.insert(key.into(), series);
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorSeries> {
        self.series.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndicatorSeries)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Compute every active overlay for one candle set.
///
/// Duplicate specs collapse onto the same key. Any invalid spec fails the
/// whole set so a bad setting is reported rather than silently skipped.
pub fn compute_overlays(
    candles: &[Candle],
    specs: &[IndicatorSpec],
) -> Result<OverlaySet, IndicatorError> {
    let mut set = OverlaySet::new();
    for spec in specs {
        let series = spec.compute(candles)?;
        tracing::debug!(key = %spec.key(), points = series.len(), "computed overlay");
        set.insert(spec.key(), series);
    }
    Ok(set)
}

/// Compute the same overlays for many symbols in parallel (watchlist view).
pub fn compute_overlays_batch(
    candles_by_symbol: &HashMap<String, Vec<Candle>>,
    specs: &[IndicatorSpec],
) -> BTreeMap<String, Result<OverlaySet, IndicatorError>> {
    candles_by_symbol
        .par_iter()
        .map(|(symbol, candles)| (symbol.clone(), compute_overlays(candles, specs)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
