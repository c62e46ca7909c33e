//! Run controller — rank, select, write, flush.
//!
//! A ranking failure is fatal and happens before anything touches the disk.
//! Once the output directory exists, the index and manifest are flushed on
//! every path out of the run: target reached, candidates exhausted, or
//! interrupted.

use coinset_core::providers::fetch_ranked;
use coinset_core::{enrich, AssetCandidate, DataError, HistoryProvider, Identity, RankingProvider};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::backfill::{BackfillSelector, FixedPacing, LogProgress, SelectionPolicy, SelectionReport, SkipReason};
use crate::config::{ConfigError, PipelineConfig};
use crate::dataset::{DatasetBuilder, DatasetPaths, ManifestInfo, DICTIONARY_FILE, INDEX_FILE};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to fetch ranked assets: {0}")]
    Ranking(#[source] DataError),

    #[error("ranking provider returned no assets")]
    NoCandidates,

    #[error("failed to prepare {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub target: usize,
    pub candidates: usize,
    pub attempted: usize,
    pub accepted: usize,
    /// No rows from the history provider.
    pub empty: usize,
    /// Below the minimum viable history.
    pub too_short: usize,
    /// Fetch, enrichment, or write failures.
    pub errors: usize,
    pub interrupted: bool,
    pub output_dir: PathBuf,
    pub index_path: PathBuf,
    pub manifest_path: PathBuf,
    pub dictionary_path: Option<PathBuf>,
    /// BLAKE3 over the asset tables, in write order.
    pub fingerprint: String,
    #[serde(skip)]
    pub elapsed: Duration,
    #[serde(skip)]
    pub report: SelectionReport,
}

impl RunSummary {
    fn new(report: SelectionReport, paths: DatasetPaths, fingerprint: String, elapsed: Duration) -> Self {
        let count = |pred: fn(&SkipReason) -> bool| report.skipped.iter().filter(|s| pred(&s.reason)).count();
        let empty = count(|r| matches!(r, SkipReason::Empty));
        let too_short = count(|r| matches!(r, SkipReason::TooShort { .. }));
        let errors = count(SkipReason::is_error);
        Self {
            target: report.target,
            candidates: report.candidates,
            attempted: report.attempted,
            accepted: report.accepted.len(),
            empty,
            too_short,
            errors,
            interrupted: report.interrupted,
            output_dir: paths.output_dir,
            index_path: paths.index,
            manifest_path: paths.manifest,
            dictionary_path: paths.dictionary,
            fingerprint,
            elapsed,
            report,
        }
    }

    pub fn target_reached(&self) -> bool {
        self.accepted >= self.target
    }

    pub fn log_summary(&self) {
        tracing::info!(
            target_count = self.target,
            accepted = self.accepted,
            attempted = self.attempted,
            empty = self.empty,
            too_short = self.too_short,
            errors = self.errors,
            interrupted = self.interrupted,
            fingerprint = %self.fingerprint,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "run complete"
        );
        if self.interrupted {
            tracing::warn!(
                "interrupted with {}/{} assets; index and manifest cover what was written",
                self.accepted,
                self.target
            );
        } else if !self.target_reached() {
            tracing::warn!(
                "candidates exhausted with {}/{} assets; raise the fetch buffer for a full dataset",
                self.accepted,
                self.target
            );
        }
    }
}

fn identity_for(candidate: &AssetCandidate) -> Identity {
    Identity {
        symbol: candidate.symbol.clone(),
        name: candidate.label().to_string(),
    }
}

/// Execute one full run against the given providers.
pub fn run_pipeline(
    config: &PipelineConfig,
    ranking: &dyn RankingProvider,
    history: &dyn HistoryProvider,
    cancel: Option<&AtomicBool>,
) -> Result<RunSummary, PipelineError> {
    config.validate()?;
    let started = Instant::now();

    tracing::info!(
        provider = ranking.name(),
        count = config.fetch_buffer,
        quote = %config.quote_currency,
        "fetching ranked assets"
    );
    let candidates = fetch_ranked(ranking, &config.quote_currency, config.fetch_buffer)
        .map_err(PipelineError::Ranking)?;
    if candidates.is_empty() {
        return Err(PipelineError::NoCandidates);
    }
    tracing::info!(
        candidates = candidates.len(),
        target_count = config.target_count,
        history = history.name(),
        "ranking fetched"
    );

    std::fs::create_dir_all(&config.output_dir).map_err(|source| PipelineError::Io {
        path: config.output_dir.clone(),
        source,
    })?;

    let info = ManifestInfo {
        account: config.account_or_default().to_string(),
        target_count: config.target_count,
        quote_currency: config.quote_currency.clone(),
        generated_on: config.generated_on(),
        index_file: INDEX_FILE.to_string(),
        dictionary_file: config.data_dictionary.then(|| DICTIONARY_FILE.to_string()),
    };
    let mut builder = DatasetBuilder::new(&config.output_dir, info)?;

    let pacing = FixedPacing(config.pacing);
    let policy = SelectionPolicy {
        target: config.target_count,
        min_rows: config.min_rows,
    };
    let mut selector = BackfillSelector::new(policy, &config.tickers)
        .with_pacing(&pacing)
        .with_progress(&LogProgress);
    if let Some(flag) = cancel {
        selector = selector.with_cancel(flag);
    }

    let include_identifiers = config.include_identifiers;
    let report = selector.run(
        &candidates,
        |ticker| history.history(ticker),
        |candidate, table| {
            let identity = include_identifiers.then(|| identity_for(candidate));
            Ok(enrich(table, identity.as_ref()))
        },
        &mut builder,
    );

    let paths = builder.finish()?;
    let summary = RunSummary::new(report, paths, builder.fingerprint(), started.elapsed());
    summary.log_summary();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_falls_back_to_identifier() {
        let c = AssetCandidate::new("wrapped-thing", "wt", " ", 9);
        let id = identity_for(&c);
        assert_eq!(id.symbol, "WT");
        assert_eq!(id.name, "wrapped-thing");
    }

    #[test]
    fn invalid_config_is_rejected_before_ranking() {
        struct Unreachable;
        impl RankingProvider for Unreachable {
            fn name(&self) -> &str {
                "unreachable"
            }
            fn rank(&self, _: &coinset_core::RankingRequest) -> Result<Vec<AssetCandidate>, DataError> {
                panic!("ranking must not be called");
            }
        }
        impl HistoryProvider for Unreachable {
            fn name(&self) -> &str {
                "unreachable"
            }
            fn history(&self, _: &str) -> Result<coinset_core::PriceTable, DataError> {
                panic!("history must not be called");
            }
        }

        let cfg = PipelineConfig {
            target_count: 5,
            fetch_buffer: 2,
            ..Default::default()
        };
        let err = run_pipeline(&cfg, &Unreachable, &Unreachable, None).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::BufferBelowTarget { buffer: 2, target: 5 })
        ));
    }
}
