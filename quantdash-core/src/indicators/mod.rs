//! Technical indicator calculator for chart overlays.
//!
//! Every indicator is a pure function from an ordered candle slice to a list
//! of points, one per candle from the first index where the indicator is
//! defined. Inputs shorter than the required length produce an empty list,
//! never an error; only invalid parameters are errors.
//!
//! A NaN close truncates recursive indicators (EMA, MACD, RSI) at that candle
//! and drops any rolling window (SMA, Bollinger) that contains it.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod overlay;
pub mod rsi;
pub mod sma;

pub use bollinger::Bollinger;
pub use ema::Ema;
pub use macd::Macd;
pub use overlay::{compute_overlays, compute_overlays_batch, IndicatorSeries, IndicatorSpec, OverlaySet};
pub use rsi::Rsi;
pub use sma::Sma;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Candle;

/// Errors for invalid indicator parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("{indicator} period must be >= 1 (got {value})")]
    InvalidPeriod {
        indicator: &'static str,
        value: usize,
    },

    #[error("MACD fast period ({fast}) must be shorter than slow period ({slow})")]
    InvalidMacdPeriods { fast: usize, slow: usize },

    #[error("band multiplier must be finite and >= 0 (got {0})")]
    InvalidMultiplier(f64),

    #[error("cannot parse indicator '{0}' (expected e.g. rsi:14, macd:12,26,9, bollinger:20,2)")]
    Parse(String),
}

/// Trait for indicators.
///
/// Indicators take a full candle series and produce points aligned to the
/// candles they are defined on. No point at candle t may depend on candles
/// after t.
pub trait Indicator: Send + Sync {
    type Point;

    /// Stable display key (e.g., "rsi_14", "macd_12_26_9").
    fn name(&self) -> &str;

    /// Minimum number of candles needed to produce the first point.
    fn min_len(&self) -> usize;

    fn compute(&self, candles: &[Candle]) -> Vec<Self::Point>;
}

/// Single-valued overlay point (SMA, EMA, RSI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub time: DateTime<Utc>,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerPoint {
    pub time: DateTime<Utc>,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub(crate) fn check_period(indicator: &'static str, value: usize) -> Result<(), IndicatorError> {
    if value == 0 {
        Err(IndicatorError::InvalidPeriod { indicator, value })
    } else {
        Ok(())
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
