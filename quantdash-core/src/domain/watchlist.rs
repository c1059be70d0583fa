//! Watchlist DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub auto_update: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating or replacing a watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub symbols: Vec<String>,
    pub auto_update: bool,
}

impl WatchlistRequest {
    /// Upper-case and de-duplicate symbols, preserving first-seen order.
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.symbols = self
            .symbols
            .into_iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        self.name = self.name.trim().to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_dedups_and_uppercases() {
        let req = WatchlistRequest {
            name: "  Tech ".into(),
            description: None,
            symbols: vec!["aapl".into(), "MSFT".into(), " AAPL ".into(), "".into()],
            auto_update: true,
        }
        .normalized();
        assert_eq!(req.name, "Tech");
        assert_eq!(req.symbols, vec!["AAPL".to_string(), "MSFT".to_string()]);
    }
}
