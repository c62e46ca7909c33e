//! Provider traits and structured error types.
//!
//! The ranking and history providers are injected collaborators: the pipeline
//! only sees these traits, so tests swap in in-memory fakes and no client is a
//! process-wide global.

pub mod coingecko;
pub mod yahoo;

use crate::domain::{AssetCandidate, PriceTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub use coingecko::CoinGeckoProvider;
pub use yahoo::YahooProvider;

/// Largest page the ranking endpoint serves.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Structured error types for provider calls.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} from {provider}")]
    HttpStatus { provider: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("http client setup failed: {0}")]
    ClientSetup(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Ranking sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    MarketCapDesc,
}

impl SortOrder {
    pub fn as_query(self) -> &'static str {
        match self {
            SortOrder::MarketCapDesc => "market_cap_desc",
        }
    }
}

/// One page request to a ranking provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRequest {
    pub quote_currency: String,
    pub order: SortOrder,
    pub page_size: u32,
    /// 1-based.
    pub page: u32,
}

/// "Given a request, return ranked candidates."
pub trait RankingProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch one page of candidates in rank order.
    fn rank(&self, request: &RankingRequest) -> Result<Vec<AssetCandidate>, DataError>;
}

/// "Given a ticker, return a price table."
///
/// An unknown ticker is an empty table, not an error.
pub trait HistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Full daily history for `ticker`.
    fn history(&self, ticker: &str) -> Result<PriceTable, DataError>;
}

/// Fetch the top `count` candidates, paging as needed.
///
/// Stops early when a page comes back short. Identifiers repeated across pages
/// (rankings shift between requests) keep their first occurrence.
pub fn fetch_ranked(
    provider: &dyn RankingProvider,
    quote_currency: &str,
    count: usize,
) -> Result<Vec<AssetCandidate>, DataError> {
    let first_page = count.min(MAX_PAGE_SIZE as usize);
    let mut out: Vec<AssetCandidate> = Vec::with_capacity(first_page);
    let mut seen: HashSet<String> = HashSet::new();
    // Fixed page size across pages so page offsets line up.
    let page_size = first_page as u32;
    let mut page = 1u32;

    while out.len() < count {
        let request = RankingRequest {
            quote_currency: quote_currency.to_lowercase(),
            order: SortOrder::MarketCapDesc,
            page_size,
            page,
        };
        let batch = provider.rank(&request)?;
        let got = batch.len();
        tracing::debug!(provider = provider.name(), page, got, "ranking page");

        for candidate in batch {
            if out.len() == count {
                break;
            }
            if seen.insert(candidate.identifier.clone()) {
                out.push(candidate);
            }
        }

        if (got as u32) < page_size {
            break;
        }
        page += 1;
    }

    Ok(out)
}
