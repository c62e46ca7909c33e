//! Backfill selector — over-fetch candidates, keep the first `target` viable ones.
//!
//! Candidates are processed one at a time in rank order. Each one is fetched,
//! checked for a minimum history length, enriched, and handed to a sink. Only
//! sink-accepted candidates count towards the target; everything else is a
//! per-candidate skip that never aborts the loop.
//!
//! Iteration ends when the target is reached (no further fetches), the
//! candidates run out (a degraded but valid outcome), or the cancel flag is
//! observed. The flag is checked between candidates, never mid-acquisition.

use coinset_core::{AssetCandidate, DataError, EnrichedTable, PriceTable, TickerMap};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Receives each finalized table in success order.
pub trait AssetSink {
    /// Persist or keep the table. An error turns the candidate into a skip.
    fn accept(&mut self, candidate: &AssetCandidate, table: EnrichedTable) -> anyhow::Result<()>;
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub selected: Vec<(AssetCandidate, EnrichedTable)>,
}

impl AssetSink for CollectSink {
    fn accept(&mut self, candidate: &AssetCandidate, table: EnrichedTable) -> anyhow::Result<()> {
        self.selected.push((candidate.clone(), table));
        Ok(())
    }
}

/// Why a candidate did not make it into the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Provider returned no rows.
    Empty,
    /// Fewer rows than the minimum viable history.
    TooShort { rows: usize, min_rows: usize },
    FetchFailed { message: String },
    EnrichFailed { message: String },
    WriteFailed { message: String },
}

impl SkipReason {
    /// True for failures (as opposed to "no usable data").
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SkipReason::FetchFailed { .. }
                | SkipReason::EnrichFailed { .. }
                | SkipReason::WriteFailed { .. }
        )
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "no data available"),
            SkipReason::TooShort { rows, min_rows } => {
                write!(f, "only {rows} rows (minimum {min_rows})")
            }
            SkipReason::FetchFailed { message } => write!(f, "fetch failed: {message}"),
            SkipReason::EnrichFailed { message } => write!(f, "enrichment failed: {message}"),
            SkipReason::WriteFailed { message } => write!(f, "write failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkipRecord {
    pub candidate: AssetCandidate,
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedAsset {
    pub candidate: AssetCandidate,
    pub ticker: String,
    pub rows: usize,
}

/// Outcome of one acquisition attempt, as seen by the pacing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted,
    Skipped,
    Failed,
}

/// Delay inserted after each acquisition attempt.
///
/// Provider-aware backoff plugs in here.
pub trait PacingPolicy {
    fn delay_after(&self, outcome: AttemptOutcome) -> Duration;
}

/// Same delay after every attempt.
#[derive(Debug, Clone, Copy)]
pub struct FixedPacing(pub Duration);

impl FixedPacing {
    pub const NONE: FixedPacing = FixedPacing(Duration::ZERO);
}

impl PacingPolicy for FixedPacing {
    fn delay_after(&self, _outcome: AttemptOutcome) -> Duration {
        self.0
    }
}

/// Progress callbacks for the candidate loop.
pub trait SelectionProgress {
    /// Called before fetching a candidate. `index` is 0-based.
    fn on_start(&self, candidate: &AssetCandidate, ticker: &str, index: usize, total: usize);

    fn on_accepted(&self, asset: &AcceptedAsset, success_count: usize, target: usize);

    fn on_skipped(&self, skip: &SkipRecord);

    fn on_complete(&self, report: &SelectionReport);
}

/// Progress reporter that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl SelectionProgress for LogProgress {
    fn on_start(&self, candidate: &AssetCandidate, ticker: &str, index: usize, total: usize) {
        tracing::info!(
            rank = candidate.rank,
            id = %candidate.identifier,
            symbol = %candidate.symbol,
            ticker,
            "[{}/{}] fetching {}",
            index + 1,
            total,
            candidate.label()
        );
    }

    fn on_accepted(&self, asset: &AcceptedAsset, success_count: usize, target: usize) {
        tracing::info!(
            id = %asset.candidate.identifier,
            rows = asset.rows,
            "  ok ({success_count}/{target})"
        );
    }

    fn on_skipped(&self, skip: &SkipRecord) {
        if skip.reason.is_error() {
            tracing::warn!(id = %skip.candidate.identifier, ticker = %skip.ticker, "  error: {}", skip.reason);
        } else {
            tracing::info!(id = %skip.candidate.identifier, ticker = %skip.ticker, "  skipped: {}", skip.reason);
        }
    }

    fn on_complete(&self, report: &SelectionReport) {
        tracing::info!(
            accepted = report.accepted.len(),
            skipped = report.skipped.len(),
            attempted = report.attempted,
            candidates = report.candidates,
            target_count = report.target,
            interrupted = report.interrupted,
            "selection complete"
        );
    }
}

/// What the candidate loop did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionReport {
    pub target: usize,
    /// Candidates offered.
    pub candidates: usize,
    /// Candidates for which acquisition was attempted.
    pub attempted: usize,
    /// Accepted assets, success order (= rank order among successes).
    pub accepted: Vec<AcceptedAsset>,
    pub skipped: Vec<SkipRecord>,
    pub interrupted: bool,
}

impl SelectionReport {
    pub fn target_reached(&self) -> bool {
        self.accepted.len() >= self.target
    }

    /// Skips caused by failures rather than missing or short data.
    pub fn error_count(&self) -> usize {
        self.skipped.iter().filter(|s| s.reason.is_error()).count()
    }
}

/// Selection policy values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub target: usize,
    pub min_rows: usize,
}

/// Drives the fetch → check → enrich → accept loop.
pub struct BackfillSelector<'a> {
    policy: SelectionPolicy,
    tickers: &'a TickerMap,
    pacing: &'a dyn PacingPolicy,
    progress: &'a dyn SelectionProgress,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> BackfillSelector<'a> {
    /// Selector with no pacing, log progress, and no cancellation.
    pub fn new(policy: SelectionPolicy, tickers: &'a TickerMap) -> Self {
        Self {
            policy,
            tickers,
            pacing: &FixedPacing::NONE,
            progress: &LogProgress,
            cancel: None,
        }
    }

    pub fn with_pacing(mut self, pacing: &'a dyn PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn SelectionProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Run the loop over `candidates` in the given order.
    ///
    /// `fetch` receives the resolved provider ticker. Errors from `fetch`,
    /// `enrich` or the sink skip that candidate only.
    pub fn run<F, E, S>(
        &self,
        candidates: &[AssetCandidate],
        mut fetch: F,
        mut enrich: E,
        sink: &mut S,
    ) -> SelectionReport
    where
        F: FnMut(&str) -> Result<PriceTable, DataError>,
        E: FnMut(&AssetCandidate, &PriceTable) -> anyhow::Result<EnrichedTable>,
        S: AssetSink + ?Sized,
    {
        let total = candidates.len();
        let target = self.policy.target;
        let mut report = SelectionReport {
            target,
            candidates: total,
            ..Default::default()
        };

        for (i, candidate) in candidates.iter().enumerate() {
            if report.accepted.len() >= target {
                break;
            }
            if self.cancelled() {
                report.interrupted = true;
                tracing::warn!(
                    accepted = report.accepted.len(),
                    "interrupted; stopping before candidate {}",
                    i + 1
                );
                break;
            }

            let ticker = self.tickers.resolve(&candidate.symbol);
            self.progress.on_start(candidate, &ticker, i, total);
            report.attempted += 1;

            let outcome = match self.attempt(candidate, &ticker, &mut fetch, &mut enrich, sink) {
                Ok(rows) => {
                    let asset = AcceptedAsset {
                        candidate: candidate.clone(),
                        ticker,
                        rows,
                    };
                    self.progress
                        .on_accepted(&asset, report.accepted.len() + 1, target);
                    report.accepted.push(asset);
                    AttemptOutcome::Accepted
                }
                Err(reason) => {
                    let outcome = if reason.is_error() {
                        AttemptOutcome::Failed
                    } else {
                        AttemptOutcome::Skipped
                    };
                    let skip = SkipRecord {
                        candidate: candidate.clone(),
                        ticker,
                        reason,
                    };
                    self.progress.on_skipped(&skip);
                    report.skipped.push(skip);
                    outcome
                }
            };

            let more_work = report.accepted.len() < target && i + 1 < total;
            if more_work {
                let delay = self.pacing.delay_after(outcome);
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            }
        }

        self.progress.on_complete(&report);
        report
    }

    /// One candidate: returns the accepted row count or the skip reason.
    fn attempt<F, E, S>(
        &self,
        candidate: &AssetCandidate,
        ticker: &str,
        fetch: &mut F,
        enrich: &mut E,
        sink: &mut S,
    ) -> Result<usize, SkipReason>
    where
        F: FnMut(&str) -> Result<PriceTable, DataError>,
        E: FnMut(&AssetCandidate, &PriceTable) -> anyhow::Result<EnrichedTable>,
        S: AssetSink + ?Sized,
    {
        let raw = fetch(ticker).map_err(|e| SkipReason::FetchFailed {
            message: e.to_string(),
        })?;

        if raw.is_empty() {
            return Err(SkipReason::Empty);
        }
        if raw.len() < self.policy.min_rows {
            return Err(SkipReason::TooShort {
                rows: raw.len(),
                min_rows: self.policy.min_rows,
            });
        }

        let table = enrich(candidate, &raw).map_err(|e| SkipReason::EnrichFailed {
            message: format!("{e:#}"),
        })?;
        let rows = table.len();

        sink.accept(candidate, table)
            .map_err(|e| SkipReason::WriteFailed {
                message: format!("{e:#}"),
            })?;
        Ok(rows)
    }
}

/// Select up to `target` viable candidates into memory, rank order kept.
pub fn select<F, E>(
    candidates: &[AssetCandidate],
    policy: SelectionPolicy,
    tickers: &TickerMap,
    fetch: F,
    enrich: E,
) -> Vec<(AssetCandidate, EnrichedTable)>
where
    F: FnMut(&str) -> Result<PriceTable, DataError>,
    E: FnMut(&AssetCandidate, &PriceTable) -> anyhow::Result<EnrichedTable>,
{
    let mut sink = CollectSink::default();
    BackfillSelector::new(policy, tickers).run(candidates, fetch, enrich, &mut sink);
    sink.selected
}
