//! Property tests for indicator invariants.
//!
//! Uses proptest to verify:
//! 1. Short input: every calculator returns an empty sequence
//! 2. RSI bounds: every RSI value lies in [0, 100]
//! 3. MACD identity: histogram == macd - signal, exactly
//! 4. Band ordering: upper >= middle >= lower for any k >= 0
//! 5. Constant series: RSI neutral, MACD zero, bands collapsed
//! 6. Look-ahead: truncating the input never changes earlier points

use proptest::prelude::*;
use quantdash_core::data::candles_from_closes;
use quantdash_core::indicators::{Bollinger, Indicator, Macd, Rsi, Sma};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..10_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), min..max)
}

// ── 1. Short input ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn short_input_yields_empty(period in 2usize..40, extra in 0usize..5) {
        let len = period.saturating_sub(1 + extra);
        let closes = vec![100.0; len];
        let candles = candles_from_closes(&closes);

        prop_assert!(Rsi::new(period).unwrap().compute(&candles).is_empty());
        prop_assert!(Sma::new(period).unwrap().compute(&candles).is_empty());
        prop_assert!(Bollinger::new(period, 2.0).unwrap().compute(&candles).is_empty());
        prop_assert!(Macd::new(1, period, 9).unwrap().compute(&candles).is_empty());
    }

    /// Exactly `period` candles is still one short for RSI (it needs a change per bar).
    #[test]
    fn rsi_needs_one_more_than_period(period in 1usize..30) {
        let candles = candles_from_closes(&vec![50.0; period]);
        prop_assert!(Rsi::new(period).unwrap().compute(&candles).is_empty());
        let candles = candles_from_closes(&vec![50.0; period + 1]);
        prop_assert_eq!(Rsi::new(period).unwrap().compute(&candles).len(), 1);
    }
}

// ── 2. RSI bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_within_bounds(closes in arb_closes(2, 200), period in 1usize..30) {
        let candles = candles_from_closes(&closes);
        let points = Rsi::new(period).unwrap().compute(&candles);
        let expected = closes.len().saturating_sub(period);
        prop_assert_eq!(points.len(), expected);
        for p in &points {
            prop_assert!((0.0..=100.0).contains(&p.value), "RSI out of bounds: {}", p.value);
        }
    }
}

// ── 3. MACD identity ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn macd_histogram_is_difference(
        closes in arb_closes(1, 200),
        fast in 1usize..15,
        gap in 1usize..20,
        signal in 1usize..15,
    ) {
        let slow = fast + gap;
        let candles = candles_from_closes(&closes);
        let points = Macd::new(fast, slow, signal).unwrap().compute(&candles);
        prop_assert_eq!(points.len(), closes.len().saturating_sub(slow - 1));
        for p in &points {
            prop_assert_eq!(p.histogram, p.macd - p.signal);
        }
    }
}

// ── 4. Band ordering ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn bands_are_ordered(
        closes in arb_closes(1, 200),
        period in 1usize..40,
        k in 0.0..5.0_f64,
    ) {
        let candles = candles_from_closes(&closes);
        let points = Bollinger::new(period, k).unwrap().compute(&candles);
        prop_assert_eq!(points.len(), closes.len().saturating_sub(period - 1));
        for p in &points {
            prop_assert!(p.upper >= p.middle, "upper {} < middle {}", p.upper, p.middle);
            prop_assert!(p.middle >= p.lower, "middle {} < lower {}", p.middle, p.lower);
        }
    }
}

// ── 5. Constant series ───────────────────────────────────────────────

proptest! {
    #[test]
    fn constant_series_degenerates(price in 1u32..10_000, len in 30usize..120) {
        let closes = vec![price as f64; len];
        let candles = candles_from_closes(&closes);

        for p in Rsi::default().compute(&candles) {
            prop_assert_eq!(p.value, 50.0);
        }
        for p in Macd::default().compute(&candles) {
            prop_assert_eq!(p.macd, 0.0);
            prop_assert_eq!(p.signal, 0.0);
            prop_assert_eq!(p.histogram, 0.0);
        }
        for p in Bollinger::default().compute(&candles) {
            prop_assert_eq!(p.upper, p.middle);
            prop_assert_eq!(p.lower, p.middle);
        }
    }
}

// ── 6. Look-ahead ────────────────────────────────────────────────────

proptest! {
    /// A point at candle t is identical whether or not later candles exist.
    #[test]
    fn truncation_does_not_change_history(closes in arb_closes(40, 120), cut in 30usize..40) {
        let full = candles_from_closes(&closes);
        let truncated = &full[..cut];

        let rsi = Rsi::default();
        let full_rsi = rsi.compute(&full);
        let cut_rsi = rsi.compute(truncated);
        prop_assert_eq!(&full_rsi[..cut_rsi.len()], &cut_rsi[..]);

        let macd = Macd::default();
        let full_macd = macd.compute(&full);
        let cut_macd = macd.compute(truncated);
        prop_assert_eq!(&full_macd[..cut_macd.len()], &cut_macd[..]);

        let bb = Bollinger::default();
        let full_bb = bb.compute(&full);
        let cut_bb = bb.compute(truncated);
        prop_assert_eq!(&full_bb[..cut_bb.len()], &cut_bb[..]);
    }
}

// ── Worked example: linear uptrend ───────────────────────────────────

#[test]
fn linear_uptrend_macd_positive_and_rsi_near_100() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let candles = candles_from_closes(&closes);

    let macd = Macd::default().compute(&candles);
    assert_eq!(macd.len(), 5);
    // Signal is seeded with the first MACD value, so the histogram starts at 0
    // and grows while the MACD line keeps rising.
    assert_eq!(macd[0].histogram, 0.0);
    for w in macd.windows(2) {
        assert!(w[1].macd > w[0].macd, "MACD line should rise: {:?}", w);
        assert!(w[1].histogram > w[0].histogram, "histogram should rise: {:?}", w);
    }
    assert!(macd.iter().skip(1).all(|p| p.histogram > 0.0));

    let rsi = Rsi::default().compute(&candles);
    assert_eq!(rsi.len(), 16);
    assert!(rsi.iter().all(|p| p.value > 99.99));
}
