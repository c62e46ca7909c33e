//! Coinset Runner — backfill selection, dataset writing, and the run controller.
//!
//! - `backfill`: walks ranked candidates until the target count is met
//! - `dataset`: per-asset CSV tables, the index table, and the manifest document
//! - `config`: operator options and fixed policy values
//! - `pipeline`: one full run from ranking to manifest flush

pub mod backfill;
pub mod config;
pub mod dataset;
pub mod pipeline;

pub use backfill::{
    select, AssetSink, BackfillSelector, FixedPacing, LogProgress, PacingPolicy, SelectionPolicy,
    SelectionProgress, SelectionReport, SkipReason,
};
pub use config::{ConfigError, PipelineConfig};
pub use dataset::{DatasetBuilder, DatasetManifest, DatasetPaths};
pub use pipeline::{run_pipeline, PipelineError, RunSummary};
