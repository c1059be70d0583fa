//! QuantDash Core: domain DTOs, candles, indicator calculator, chart settings.
//!
//! This crate holds everything that is pure computation or plain data:
//! - Domain types mirrored from the backend API (backtests, watchlists,
//!   data-quality alerts, prompt templates, ML models, quotes)
//! - Technical indicators (SMA, EMA, RSI, MACD, Bollinger Bands) and overlay sets
//! - Per-symbol chart settings and their storage key
//! - Client-side form validation and display formatting
//! - Candle import from CSV and synthetic candle generation

pub mod chart;
pub mod data;
pub mod domain;
pub mod format;
pub mod indicators;
pub mod validation;
