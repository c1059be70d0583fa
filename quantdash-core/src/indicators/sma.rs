//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! First point at index period - 1.

use super::{check_period, Indicator, IndicatorError, LinePoint};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("SMA", period)?;
        Ok(Self {
            period,
            name: format!("sma_{period}"),
        })
    }
}

impl Indicator for Sma {
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

        candles
            .windows(self.period)
            .filter_map(|window| {
                let sum: f64 = window.iter().map(|c| c.close).sum();
                if sum.is_nan() {
                    return None;
                }
                let last = window.last()?;
                Some(LinePoint {
                    time: last.time,
                    value: sum / self.period as f64,
                })
            })
            .collect()
    }
}
