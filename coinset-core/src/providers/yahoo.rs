//! Yahoo Finance history provider.
//!
//! Fetches the maximum available daily history from Yahoo's v8 chart API.
//! One request per call: pacing between requests is the caller's job.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; those surface as `DataError::ResponseFormatChanged`.

use super::{DataError, HistoryProvider};
use crate::domain::{Column, PriceTable, RawPriceRow};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

/// Per-column series. A series Yahoo omits deserializes empty and marks the
/// column absent.
#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance history provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Chart API URL for the full daily history of a ticker.
    fn chart_url(&self, ticker: &str) -> String {
        format!(
            "{}/v8/finance/chart/{ticker}?range=max&interval=1d&events=history",
            self.base_url
        )
    }

    /// Parse the chart API response into a table.
    ///
    /// "Not Found" maps to an empty table; any other chart error is a format error.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<PriceTable, DataError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => return Ok(PriceTable::empty()),
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(PriceTable::empty());
        };
        // Listed but never traded: no timestamps at all.
        let Some(timestamps) = data.timestamp else {
            return Ok(PriceTable::empty());
        };
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let n = timestamps.len();
        let mut columns = vec![Column::Date];
        for (col, series) in [
            (Column::Open, &quote.open),
            (Column::High, &quote.high),
            (Column::Low, &quote.low),
            (Column::Close, &quote.close),
            (Column::Volume, &quote.volume),
        ] {
            if !series.is_empty() {
                if series.len() != n {
                    return Err(DataError::ResponseFormatChanged(format!(
                        "{ticker}: {col} has {} values for {n} timestamps",
                        series.len()
                    )));
                }
                columns.push(col);
            }
        }

        fn at(series: &[Option<f64>], i: usize) -> Option<f64> {
            series.get(i).copied().flatten()
        }

        let mut rows = Vec::with_capacity(n);
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = at(&quote.open, i);
            let high = at(&quote.high, i);
            let low = at(&quote.low, i);
            let close = at(&quote.close, i);
            let volume = at(&quote.volume, i);

            // All-null rows are placeholders, not trading days.
            if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none() {
                continue;
            }

            rows.push(RawPriceRow {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(f64::NAN),
            });
        }

        Ok(PriceTable::new(rows, columns))
    }
}

impl HistoryProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn history(&self, ticker: &str) -> Result<PriceTable, DataError> {
        let url = self.chart_url(ticker);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(PriceTable::empty());
        }
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

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
        })?;
        Self::parse_response(ticker, chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<PriceTable, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("BTC-USD", resp)
    }

    #[test]
    fn chart_url_requests_max_range() {
        let p = YahooProvider::new().unwrap().with_base_url("http://stub/");
        assert_eq!(
            p.chart_url("BTC-USD"),
            "http://stub/v8/finance/chart/BTC-USD?range=max&interval=1d&events=history"
        );
    }

    #[test]
    fn parses_rows_and_skips_null_placeholders() {
        // 2024-01-01, 2024-01-02, 2024-01-03 at 00:00 UTC
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704067200,1704153600,1704240000],
            "indicators":{"quote":[{
                "open":[1.0,null,3.0],"high":[2.0,null,4.0],"low":[0.5,null,2.5],
                "close":[1.5,null,3.5],"volume":[100,null,300]
            }]}
        }],"error":null}}"#;
        let t = parse(json).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[0].date.to_string(), "2024-01-01");
        assert_eq!(t.rows()[1].date.to_string(), "2024-01-03");
        assert_eq!(t.rows()[1].volume, 300.0);
        assert!(t.has(Column::Volume));
    }

    #[test]
    fn partial_null_becomes_nan() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704067200],
            "indicators":{"quote":[{
                "open":[null],"high":[2.0],"low":[1.0],"close":[1.5],"volume":[10]
            }]}
        }],"error":null}}"#;
        let t = parse(json).unwrap();
        assert!(t.rows()[0].open.is_nan());
    }

    #[test]
    fn missing_series_marks_column_absent() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704067200,1704153600],
            "indicators":{"quote":[{"close":[1.0,2.0]}]}
        }],"error":null}}"#;
        let t = parse(json).unwrap();
        assert!(t.has(Column::Close));
        assert!(!t.has(Column::High));
        assert!(!t.has(Column::Volume));
    }

    #[test]
    fn not_found_is_empty() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse(json).unwrap().is_empty());
    }

    #[test]
    fn other_chart_error_is_format_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }

    #[test]
    fn no_timestamps_is_empty() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse(json).unwrap().is_empty());
    }

    #[test]
    fn mismatched_series_length_is_rejected() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704067200,1704153600],
            "indicators":{"quote":[{"close":[1.0]}]}
        }],"error":null}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }
}
