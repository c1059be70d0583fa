//! QuantDash App: application services on top of `quantdash-core`.
//!
//! This crate provides:
//! - The backend seam ([`api::ApiClient`]) and its HTTP implementation
//! - A query cache with staleness and background revalidation
//! - Cached reads and invalidating mutations ([`queries::Queries`])
//! - Fixed-interval auto refresh for monitoring views
//! - Per-symbol chart settings with debounced persistence
//! - Backtest and optimization wizards
//! - TOML configuration with environment overrides

pub mod api;
pub mod config;
pub mod queries;
pub mod query_cache;
pub mod refresh;
pub mod settings;
pub mod store;
pub mod wizard;

pub use api::{ApiClient, ApiError, HttpApiClient};
pub use config::{AppConfig, ConfigError};
pub use queries::{PromptOutcome, Queries};
pub use query_cache::{Lookup, QueryCache, QueryKey};
pub use refresh::{AutoRefresh, Tick};
pub use settings::{ChartSettingsStore, DEFAULT_DEBOUNCE};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use wizard::{BacktestWizard, OptimizationWizard, WizardError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: services shared across threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<QueryCache>();
        require_sync::<QueryCache>();
        require_send::<Queries>();
        require_sync::<Queries>();
        require_send::<ChartSettingsStore>();
        require_send::<HttpApiClient>();
        require_sync::<HttpApiClient>();
        require_send::<ApiError>();
        require_sync::<ApiError>();
        require_send::<WizardError>();
        require_sync::<WizardError>();
    }
}
