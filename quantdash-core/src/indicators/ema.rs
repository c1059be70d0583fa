//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = EMA[t-1] + alpha * (close[t] - EMA[t-1]), alpha = 2 / (period + 1).
//! Seed: EMA[0] = first close.
//! Points are emitted from index period - 1, where the seed's weight has decayed
//! enough for the line to be meaningful on a chart.

use super::{check_period, Indicator, IndicatorError, LinePoint};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("EMA", period)?;
        Ok(Self {
            period,
            name: format!("ema_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
    type Point = LinePoint;

    fn name(&self) -> &str {
        &self.name
    }

    fn min_len(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<LinePoint> {
        if candles.len() < self.period {
            return Vec::new();
        }
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let values = ema_of_series(&closes, self.period);
        candles
            .iter()
            .zip(values)
            .skip(self.period - 1)
            .take_while(|(_, v)| !v.is_nan())
            .map(|(c, value)| LinePoint {
                time: c.time,
                value,
            })
            .collect()
    }
}

/// Compute raw EMA values over an arbitrary series, one value per input.
///
/// Seeded with the first value. Used by MACD for both the price EMAs and the
/// signal line. The incremental form keeps a constant series exactly constant.
/// Once a NaN enters, every later value is NaN.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut prev = first;
    result.push(prev);
    for &v in &values[1..] {
        prev += alpha * (v - prev);
        result.push(prev);
    }
    result
}
