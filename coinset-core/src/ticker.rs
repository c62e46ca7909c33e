//! Ticker mapping — ranking-provider symbols to history-provider tickers.
//!
//! Most assets resolve to `{SYMBOL}-{QUOTE}` (e.g. `BTC-USD`). Some symbols
//! collide with listed equities or other coins on the history provider and are
//! only addressable under a suffixed ticker; those go in the override table.
//!
//! Extra overrides can be loaded from a TOML file:
//!
//! ```toml
//! [tickers]
//! UNI = "UNI7083-USD"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Known Yahoo Finance tickers that differ from `{SYMBOL}-USD`.
const DEFAULT_USD_OVERRIDES: &[(&str, &str)] = &[
    ("UNI", "UNI7083-USD"),
    ("SUI", "SUI20947-USD"),
    ("TON", "TON11419-USD"),
    ("APT", "APT21794-USD"),
    ("PEPE", "PEPE24478-USD"),
    ("ARB", "ARB11841-USD"),
    ("STX", "STX4847-USD"),
    ("IMX", "IMX10603-USD"),
    ("GRT", "GRT6719-USD"),
    ("MNT", "MNT27075-USD"),
    ("TAO", "TAO22974-USD"),
    ("BEAM", "BEAM28298-USD"),
];

/// Override file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OverrideFile {
    #[serde(default)]
    tickers: BTreeMap<String, String>,
}

/// Resolves symbols to provider tickers.
#[derive(Debug, Clone)]
pub struct TickerMap {
    quote: String,
    overrides: BTreeMap<String, String>,
}

impl TickerMap {
    /// Plain `{SYMBOL}-{QUOTE}` mapping with no overrides.
    pub fn new(quote_currency: &str) -> Self {
        Self {
            quote: quote_currency.to_uppercase(),
            overrides: BTreeMap::new(),
        }
    }

    /// Mapping with the built-in overrides for the quote currency.
    pub fn with_defaults(quote_currency: &str) -> Self {
        let mut map = Self::new(quote_currency);
        if map.quote == "USD" {
            for (symbol, ticker) in DEFAULT_USD_OVERRIDES {
                map.insert(symbol, ticker);
            }
        }
        map
    }

    /// Add or replace an override. Symbols are matched case-insensitively.
    pub fn insert(&mut self, symbol: &str, ticker: &str) {
        self.overrides
            .insert(symbol.trim().to_uppercase(), ticker.trim().to_string());
    }

    /// Merge overrides from a TOML file.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read ticker overrides: {e}"))?;
        self.load_toml(&content)
    }

    /// Merge overrides from a TOML string. Returns how many entries were read.
    pub fn load_toml(&mut self, content: &str) -> Result<usize, String> {
        let file: OverrideFile =
            toml::from_str(content).map_err(|e| format!("parse ticker overrides TOML: {e}"))?;
        let count = file.tickers.len();
        for (symbol, ticker) in &file.tickers {
            if ticker.trim().is_empty() {
                return Err(format!("empty ticker for symbol '{symbol}'"));
            }
            self.insert(symbol, ticker);
        }
        Ok(count)
    }

    /// Provider ticker for a trading symbol.
    pub fn resolve(&self, symbol: &str) -> String {
        let key = symbol.trim().to_uppercase();
        match self.overrides.get(&key) {
            Some(ticker) => ticker.clone(),
            None => format!("{key}-{}", self.quote),
        }
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}
