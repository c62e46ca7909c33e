//! Coinset CLI — build the top-N crypto history dataset.
//!
//! Commands:
//! - `build` — rank assets, fetch and enrich their histories, write the dataset
//! - `fields` — print the canonical field list

mod logging;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use coinset_core::providers::{CoinGeckoProvider, YahooProvider};
use coinset_core::{canonical_fields, TickerMap};
use coinset_runner::config::{
    DEFAULT_FETCH_BUFFER, DEFAULT_OUTPUT_DIR, DEFAULT_QUOTE_CURRENCY, DEFAULT_TARGET_COUNT,
};
use coinset_runner::{run_pipeline, PipelineConfig, RunSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit status after an interrupted run (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "coinset",
    version,
    about = "Coinset — top-N cryptocurrency daily history dataset builder"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank assets, fetch full daily histories, and write the dataset.
    Build(BuildArgs),
    /// Print the canonical field list (name, type, description).
    Fields,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Publish account used in the dataset id.
    #[arg(long, env = "KAGGLE_USERNAME")]
    account: Option<String>,

    /// Number of assets the dataset should contain.
    #[arg(long, env = "TARGET_COUNT", default_value_t = DEFAULT_TARGET_COUNT)]
    target_count: usize,

    /// Candidates requested from the ranking provider (must be >= target count).
    #[arg(long, env = "FETCH_BUFFER", default_value_t = DEFAULT_FETCH_BUFFER)]
    fetch_buffer: usize,

    /// Directory the dataset is written to.
    #[arg(long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// CoinGecko demo API key.
    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    coingecko_api_key: Option<String>,

    /// TOML file with a `[tickers]` table of extra symbol → ticker overrides.
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Also write `data_dictionary.csv` and list it in the manifest.
    #[arg(long, default_value_t = false)]
    data_dictionary: bool,

    /// Leave the Symbol / Name columns out of the asset tables.
    #[arg(long, default_value_t = false)]
    no_identifiers: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    let result = match cli.command {
        Commands::Build(args) => run_build(args),
        Commands::Fields => run_fields().map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(args: &BuildArgs) -> Result<PipelineConfig> {
    let mut tickers = TickerMap::with_defaults(DEFAULT_QUOTE_CURRENCY);
    if let Some(path) = &args.overrides {
        let added = tickers
            .load_file(path)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("Failed to load ticker overrides from {}", path.display()))?;
        tracing::info!(
            added,
            total = tickers.override_count(),
            file = %path.display(),
            "ticker overrides loaded"
        );
    }

    Ok(PipelineConfig {
        account: args.account.clone(),
        target_count: args.target_count,
        fetch_buffer: args.fetch_buffer,
        output_dir: args.output_dir.clone(),
        tickers,
        include_identifiers: !args.no_identifiers,
        data_dictionary: args.data_dictionary,
        ..Default::default()
    })
}

fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            tracing::warn!("already stopping; waiting for the current asset to finish");
        } else {
            tracing::warn!("interrupt received; stopping after the current asset");
        }
    })
    .context("Failed to install Ctrl-C handler")?;
    Ok(cancel)
}

fn run_build(args: BuildArgs) -> Result<ExitCode> {
    let config = build_config(&args)?;
    config.validate().context("Invalid configuration")?;

    let ranking = CoinGeckoProvider::new(args.coingecko_api_key.clone())
        .context("Failed to set up the ranking provider")?;
    let history = YahooProvider::new().context("Failed to set up the history provider")?;
    let cancel = install_interrupt_handler()?;

    tracing::info!(
        target_count = config.target_count,
        buffer = config.fetch_buffer,
        output = %config.output_dir.display(),
        "building dataset"
    );

    let summary = run_pipeline(&config, &ranking, &history, Some(cancel.as_ref()))?;
    print_summary(&summary);

    if summary.interrupted {
        Ok(ExitCode::from(EXIT_INTERRUPTED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Dataset Summary ===");
    println!("Assets:        {}/{}", summary.accepted, summary.target);
    println!("Attempted:     {} of {} candidates", summary.attempted, summary.candidates);
    println!(
        "Skipped:       {} empty, {} too short, {} errors",
        summary.empty, summary.too_short, summary.errors
    );
    if summary.interrupted {
        println!("Status:        interrupted");
    } else if !summary.target_reached() {
        println!("Status:        incomplete (candidates exhausted)");
    } else {
        println!("Status:        complete");
    }
    println!("Output:        {}", summary.output_dir.display());
    println!("Index:         {}", summary.index_path.display());
    println!("Manifest:      {}", summary.manifest_path.display());
    if let Some(dict) = &summary.dictionary_path {
        println!("Dictionary:    {}", dict.display());
    }
    println!("Fingerprint:   {}", summary.fingerprint);
    println!("Elapsed:       {:.1}s", summary.elapsed.as_secs_f64());
}

fn run_fields() -> Result<()> {
    let fields = canonical_fields(DEFAULT_QUOTE_CURRENCY);
    let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for field in &fields {
        println!("{:<width$}  {:<8}  {}", field.name, field.field_type.as_str(), field.description);
    }
    Ok(())
}
