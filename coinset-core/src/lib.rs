//! Coinset Core — domain types, feature engine, schema derivation, market data providers.
//!
//! This crate contains everything that does not depend on the output layout:
//! - Domain types (asset candidates, raw price tables, output columns)
//! - Feature engine (daily return, high/low spread, 7/30-day SMA) with length gating
//! - Canonical field catalog and per-asset schema derivation
//! - Ticker mapping from ranking symbols to history-provider tickers
//! - Ranking and history provider traits plus CoinGecko / Yahoo Finance clients

pub mod domain;
pub mod features;
pub mod providers;
pub mod schema;
pub mod ticker;

pub use domain::{AssetCandidate, Column, PriceTable, RawPriceRow};
pub use features::{enrich, EnrichedRow, EnrichedTable, Identity};
pub use providers::{DataError, HistoryProvider, RankingProvider, RankingRequest, SortOrder};
pub use schema::{canonical_fields, derive_schema, FieldDescriptor, FieldType};
pub use ticker::TickerMap;
