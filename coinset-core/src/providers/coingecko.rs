//! CoinGecko ranking provider.
//!
//! Uses the public `/coins/markets` endpoint, which returns assets ordered by
//! the requested sort key. An optional demo API key raises the rate limit.

use super::{DataError, RankingProvider, RankingRequest};
use crate::domain::AssetCandidate;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// One entry of the `/coins/markets` response. Fields we don't use are ignored.
#[derive(Debug, Deserialize)]
struct CoinMarket {
    id: String,
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    market_cap_rank: Option<u32>,
}

/// CoinGecko ranking provider.
pub struct CoinGeckoProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(api_key: Option<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("coinset/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Point at a different host (proxies, mirrors, local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn markets_url(&self, request: &RankingRequest) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&order={}&per_page={}&page={}&sparkline=false",
            self.base_url,
            request.quote_currency,
            request.order.as_query(),
            request.page_size,
            request.page
        )
    }

    /// Convert a response page into candidates. Rank falls back to the
    /// absolute position when the provider leaves `market_cap_rank` null.
    fn parse_markets(request: &RankingRequest, markets: Vec<CoinMarket>) -> Vec<AssetCandidate> {
        let offset = (request.page.saturating_sub(1)) * request.page_size;
        markets
            .into_iter()
            .enumerate()
            .filter(|(_, m)| !m.id.trim().is_empty() && !m.symbol.trim().is_empty())
            .map(|(i, m)| {
                let rank = m.market_cap_rank.unwrap_or(offset + i as u32 + 1);
                AssetCandidate::new(m.id, m.symbol, m.name.unwrap_or_default(), rank)
            })
            .collect()
    }
}

impl RankingProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn rank(&self, request: &RankingRequest) -> Result<Vec<AssetCandidate>, DataError> {
        let url = self.markets_url(request);
        let mut req = self.client.get(&url).header("accept", "application/json");
        if let Some(key) = &self.api_key {
            req = req.header("x-cg-demo-api-key", key);
        }

        let resp = req
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                provider: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let markets: Vec<CoinMarket> = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse coins/markets: {e}"))
        })?;
        Ok(Self::parse_markets(request, markets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SortOrder;

    fn request(page: u32) -> RankingRequest {
        RankingRequest {
            quote_currency: "usd".into(),
            order: SortOrder::MarketCapDesc,
            page_size: 100,
            page,
        }
    }

    #[test]
    fn markets_url_has_all_parameters() {
        let p = CoinGeckoProvider::new(None)
            .unwrap()
            .with_base_url("http://localhost:9000/api/v3/");
        let url = p.markets_url(&request(2));
        assert_eq!(
            url,
            "http://localhost:9000/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=100&page=2&sparkline=false"
        );
    }

    #[test]
    fn parses_markets_payload() {
        let json = r#"[
            {"id":"bitcoin","symbol":"btc","name":"Bitcoin","market_cap_rank":1,"current_price":1.0},
            {"id":"ethereum","symbol":"eth","name":"Ethereum","market_cap_rank":null},
            {"id":"","symbol":"bad"}
        ]"#;
        let markets: Vec<CoinMarket> = serde_json::from_str(json).unwrap();
        let out = CoinGeckoProvider::parse_markets(&request(3), markets);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], AssetCandidate::new("bitcoin", "BTC", "Bitcoin", 1));
        // null rank → absolute position: page 3, index 1 → 202
        assert_eq!(out[1].rank, 202);
        assert_eq!(out[1].symbol, "ETH");
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let p = CoinGeckoProvider::new(Some("  ".into())).unwrap();
        assert!(p.api_key.is_none());
    }
}
