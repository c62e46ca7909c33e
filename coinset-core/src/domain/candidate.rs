//! AssetCandidate — an asset proposed by the ranking provider.

use serde::{Deserialize, Serialize};

/// A ranked asset not yet confirmed to have usable history.
///
/// Produced in descending market-cap order and consumed once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCandidate {
    /// Provider identifier (e.g. `bitcoin`).
    pub identifier: String,
    /// Trading symbol, upper-cased (e.g. `BTC`).
    pub symbol: String,
    /// Human-readable name (e.g. `Bitcoin`). May be empty.
    pub display_name: String,
    /// 1-based market-cap rank.
    pub rank: u32,
}

impl AssetCandidate {
    pub fn new(
        identifier: impl Into<String>,
        symbol: impl Into<String>,
        display_name: impl Into<String>,
        rank: u32,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            symbol: symbol.into().to_uppercase(),
            display_name: display_name.into(),
            rank,
        }
    }

    /// Display name, falling back to the identifier when the provider sent none.
    pub fn label(&self) -> &str {
        let name = self.display_name.trim();
        if name.is_empty() {
            &self.identifier
        } else {
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_is_uppercased() {
        let c = AssetCandidate::new("bitcoin", "btc", "Bitcoin", 1);
        assert_eq!(c.symbol, "BTC");
    }

    #[test]
    fn label_falls_back_to_identifier() {
        let named = AssetCandidate::new("bitcoin", "btc", "Bitcoin", 1);
        assert_eq!(named.label(), "Bitcoin");

        let unnamed = AssetCandidate::new("wrapped-thing", "wth", "  ", 7);
        assert_eq!(unnamed.label(), "wrapped-thing");
    }
}
