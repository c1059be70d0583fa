//! Relative Strength Index (RSI).
//!
//! Seed: simple mean of gains and losses over the first `period` changes.
//! Then Wilder smoothing: avg = (avg * (period - 1) + new) / period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! First point at index `period`, so at least period + 1 candles are needed.
//! Edge cases: avg_loss == 0 is replaced by a tiny epsilon (RSI ≈ 100);
//! a flat series (both averages 0) reads as the neutral 50.

use super::{check_period, Indicator, IndicatorError, LinePoint};
use crate::domain::Candle;

/// Stand-in for a zero average loss.
pub const LOSS_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("RSI", period)?;
        Ok(Self {
            period,
            name: format!("rsi_{period}"),
        })
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self {
            period: 14,
            name: "rsi_14".into(),
        }
    }
}

impl Indicator for Rsi {
    type Point = LinePoint;

    fn name(&self) -> &str {
        &self.name
    }

    fn min_len(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<LinePoint> {
        let n = candles.len();
        if n < self.min_len() {
            return Vec::new();
        }

        let period = self.period as f64;
        let change = |i: usize| candles[i].close - candles[i - 1].close;

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let ch = change(i);
            if ch.is_nan() {
                return Vec::new();
            }
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= period;
        avg_loss /= period;

        let mut points = Vec::with_capacity(n - self.period);
        points.push(LinePoint {
            time: candles[self.period].time,
            value: rsi_value(avg_gain, avg_loss),
        });

        for i in (self.period + 1)..n {
            let ch = change(i);
            if ch.is_nan() {
                break;
            }
            let gain = ch.max(0.0);
            let loss = (-ch).max(0.0);
            avg_gain = (avg_gain * (period - 1.0) + gain) / period;
            avg_loss = (avg_loss * (period - 1.0) + loss) / period;

            points.push(LinePoint {
                time: candles[i].time,
                value: rsi_value(avg_gain, avg_loss),
            });
        }

        points
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return 50.0;
    }
    let loss = if avg_loss == 0.0 { LOSS_EPSILON } else { avg_loss };
    100.0 - 100.0 / (1.0 + avg_gain / loss)
}
