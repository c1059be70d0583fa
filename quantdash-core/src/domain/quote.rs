//! Market-data quotes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    /// Change as a fraction of the previous close (0.0123 = +1.23%).
    #[serde(default)]
    pub change_percent: f64,
    #[serde(default)]
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

/// Crypto spot price row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoPrice {
    pub symbol: String,
    pub price_usd: f64,
    #[serde(default)]
    pub change_24h: f64,
    #[serde(default)]
    pub market_cap: Option<f64>,
    pub timestamp: DateTime<Utc>,
}
