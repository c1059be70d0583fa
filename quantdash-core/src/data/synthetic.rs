//! Synthetic candles for offline use, tests, and benchmarks.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Candle;

/// Build daily candles from a close series.
///
/// Plausible OHLC: open = previous close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, volume = 1000.
/// Times are consecutive days starting 2024-01-02 UTC.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let base = Utc
        .with_ymd_and_hms(2024, 1, 2, 0, 0, 0)
        .single()
        .unwrap_or_default();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                time: base + Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Generate a random-walk candle series.
///
/// Deterministic per symbol: the RNG seed is derived from the symbol name, so
/// the same symbol always charts the same way. Starts at 100.0 with daily
/// returns uniform in ±3%.
pub fn synthetic_candles(
    symbol: &str,
    start: DateTime<Utc>,
    count: usize,
    step: Duration,
) -> Vec<Candle> {
    let seed = blake3::hash(symbol.as_bytes());
    let mut rng = StdRng::from_seed(*seed.as_bytes());

    let mut candles = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut time = start;

    for _ in 0..count {
        let ret: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + ret);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

        candles.push(Candle {
            time,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        time += step;
    }

    candles
}
