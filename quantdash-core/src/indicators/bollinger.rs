//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + k * stddev(close, period)
//! - Lower: middle - k * stddev(close, period)
//!
//! Uses population stddev (divide by N). First point at index period - 1.

use super::{check_period, BollingerPoint, Indicator, IndicatorError};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    k: f64,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, k: f64) -> Result<Self, IndicatorError> {
        check_period("Bollinger", period)?;
        if !k.is_finite() || k < 0.0 {
            return Err(IndicatorError::InvalidMultiplier(k));
        }
        Ok(Self {
            period,
            k,
            name: format!("bollinger_{period}_{k}"),
        })
    }
}

impl Default for Bollinger {
    fn default() -> Self {
        Self {
            period: 20,
            k: 2.0,
            name: "bollinger_20_2".into(),
        }
    }
}

impl Indicator for Bollinger {
    type Point = BollingerPoint;

    fn name(&self) -> &str {
        &self.name
    }

    fn min_len(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<BollingerPoint> {
        if candles.len() < self.period {
            return Vec::new();
        }

        let n = self.period as f64;
        candles
            .windows(self.period)
            .filter_map(|window| {
                let sum: f64 = window.iter().map(|c| c.close).sum();
                if sum.is_nan() {
                    return None;
                }
                let mean = sum / n;
                let variance = window
                    .iter()
                    .map(|c| {
                        let diff = c.close - mean;
                        diff * diff
                    })
                    .sum::<f64>()
                    / n;
                let width = self.k * variance.sqrt();

                Some(BollingerPoint {
                    time: window.last()?.time,
                    upper: mean + width,
                    middle: mean,
                    lower: mean - width,
                })
            })
            .collect()
    }
}
