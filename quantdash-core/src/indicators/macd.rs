//! Moving Average Convergence Divergence (MACD).
//!
//! - MACD line: EMA(close, fast) - EMA(close, slow), from index slow - 1
//! - Signal line: EMA(MACD line, signal)
//! - Histogram: MACD line - signal line
//!
//! All EMAs are seeded with their first input value (see `ema_of_series`).

use super::ema::ema_of_series;
use super::{check_period, Indicator, IndicatorError, MacdPoint};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, IndicatorError> {
        check_period("MACD fast", fast)?;
        check_period("MACD slow", slow)?;
        check_period("MACD signal", signal)?;
        if fast >= slow {
            return Err(IndicatorError::InvalidMacdPeriods { fast, slow });
        }
        Ok(Self {
            fast,
            slow,
            signal,
            name: format!("macd_{fast}_{slow}_{signal}"),
        })
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            name: "macd_12_26_9".into(),
        }
    }
}

impl Indicator for Macd {
    type Point = MacdPoint;

    fn name(&self) -> &str {
        &self.name
    }

    fn min_len(&self) -> usize {
        self.slow
    }

    fn compute(&self, candles: &[Candle]) -> Vec<MacdPoint> {
        if candles.len() < self.slow {
            return Vec::new();
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast_ema = ema_of_series(&closes, self.fast);
        let slow_ema = ema_of_series(&closes, self.slow);

        let start = self.slow - 1;
        let macd_line: Vec<f64> = (start..candles.len())
            .map(|i| fast_ema[i] - slow_ema[i])
            .take_while(|v| !v.is_nan())
            .collect();
        let signal_line = ema_of_series(&macd_line, self.signal);

        candles[start..]
            .iter()
            .zip(macd_line.iter().zip(signal_line.iter()))
            .map(|(c, (&macd, &signal))| MacdPoint {
                time: c.time,
                macd,
                signal,
                histogram: macd - signal,
            })
            .collect()
    }
}
