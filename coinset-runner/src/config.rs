//! Pipeline configuration.
//!
//! Four options are operator-facing (publish account, target count, fetch
//! buffer, output directory); the CLI fills them from flags or environment.
//! The remaining fields are fixed policy with code-level defaults.

use chrono::NaiveDate;
use coinset_core::TickerMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TARGET_COUNT: usize = 100;
pub const DEFAULT_FETCH_BUFFER: usize = 150;
/// Upper bound on ranked candidates requested in one run.
pub const MAX_FETCH_BUFFER: usize = 10_000;
pub const DEFAULT_OUTPUT_DIR: &str = "crypto_data";
pub const DEFAULT_ACCOUNT: &str = "your-username";
pub const DEFAULT_QUOTE_CURRENCY: &str = "usd";
/// Tables shorter than this are not worth publishing.
pub const MIN_VIABLE_ROWS: usize = 10;
pub const DEFAULT_PACING: Duration = Duration::from_millis(150);

/// Errors from configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target count must be at least 1")]
    ZeroTarget,

    #[error("fetch buffer ({buffer}) must be at least the target count ({target})")]
    BufferBelowTarget { buffer: usize, target: usize },

    #[error("fetch buffer ({buffer}) exceeds the maximum of {max}")]
    BufferTooLarge { buffer: usize, max: usize },

    #[error("output directory must not be empty")]
    EmptyOutputDir,

    #[error("quote currency must not be empty")]
    EmptyQuoteCurrency,
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Publish account used in the manifest id; `None` falls back to a placeholder.
    pub account: Option<String>,
    /// Number of assets the dataset should contain.
    pub target_count: usize,
    /// Candidates requested from the ranking provider (over-fetch for backfill).
    pub fetch_buffer: usize,
    pub output_dir: PathBuf,
    pub quote_currency: String,
    pub min_rows: usize,
    /// Fixed delay after each history request.
    pub pacing: Duration,
    pub tickers: TickerMap,
    /// Append `Symbol` / `Name` columns to every asset table.
    pub include_identifiers: bool,
    /// Also write `data_dictionary.csv` and list it in the manifest.
    pub data_dictionary: bool,
    /// Date stamped into the manifest description; `None` means today (UTC).
    pub generated_on: Option<NaiveDate>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            account: None,
            target_count: DEFAULT_TARGET_COUNT,
            fetch_buffer: DEFAULT_FETCH_BUFFER,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            quote_currency: DEFAULT_QUOTE_CURRENCY.to_string(),
            min_rows: MIN_VIABLE_ROWS,
            pacing: DEFAULT_PACING,
            tickers: TickerMap::with_defaults(DEFAULT_QUOTE_CURRENCY),
            include_identifiers: true,
            data_dictionary: false,
            generated_on: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_count == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if self.fetch_buffer < self.target_count {
            return Err(ConfigError::BufferBelowTarget {
                buffer: self.fetch_buffer,
                target: self.target_count,
            });
        }
        if self.fetch_buffer > MAX_FETCH_BUFFER {
            return Err(ConfigError::BufferTooLarge {
                buffer: self.fetch_buffer,
                max: MAX_FETCH_BUFFER,
            });
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputDir);
        }
        if self.quote_currency.trim().is_empty() {
            return Err(ConfigError::EmptyQuoteCurrency);
        }
        Ok(())
    }

    /// Account for the manifest id, placeholder when unset or blank.
    pub fn account_or_default(&self) -> &str {
        self.account
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_ACCOUNT)
    }

    pub fn generated_on(&self) -> NaiveDate {
        self.generated_on
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_target() {
        let cfg = PipelineConfig {
            target_count: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTarget));
    }

    #[test]
    fn rejects_buffer_below_target() {
        let cfg = PipelineConfig {
            target_count: 50,
            fetch_buffer: 40,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::BufferBelowTarget {
                buffer: 40,
                target: 50
            })
        );
    }

    #[test]
    fn rejects_oversized_buffer() {
        let cfg = PipelineConfig {
            fetch_buffer: u32::MAX as usize + 1,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::BufferTooLarge {
                buffer: u32::MAX as usize + 1,
                max: MAX_FETCH_BUFFER
            })
        );
        let at_limit = PipelineConfig {
            fetch_buffer: MAX_FETCH_BUFFER,
            ..Default::default()
        };
        assert_eq!(at_limit.validate(), Ok(()));
    }

    #[test]
    fn account_falls_back_to_placeholder() {
        let mut cfg = PipelineConfig::default();
        assert_eq!(cfg.account_or_default(), "your-username");
        cfg.account = Some("  ".into());
        assert_eq!(cfg.account_or_default(), "your-username");
        cfg.account = Some("alice".into());
        assert_eq!(cfg.account_or_default(), "alice");
    }

    #[test]
    fn generated_on_override() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let cfg = PipelineConfig {
            generated_on: Some(day),
            ..Default::default()
        };
        assert_eq!(cfg.generated_on(), day);
    }
}
