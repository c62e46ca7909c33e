//! Dataset manifest (`dataset-metadata.json`).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use coinset_core::FieldDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const KEYWORDS: &[&str] = &[
    "cryptocurrencies",
    "cryptocurrency",
    "bitcoin",
    "ethereum",
    "finance",
    "time series analysis",
    "trading",
    "technical analysis",
    "automated",
    "market data",
    "ohlcv",
    "daily data",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    pub fields: Vec<FieldDescriptor>,
}

/// One published file: path, description, column schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestResource {
    pub path: String,
    pub description: String,
    pub schema: ResourceSchema,
}

impl ManifestResource {
    pub fn new(path: impl Into<String>, description: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
            schema: ResourceSchema { fields },
        }
    }
}

/// The structured manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub title: String,
    pub id: String,
    pub licenses: Vec<License>,
    pub description: String,
    pub keywords: Vec<String>,
    pub resources: Vec<ManifestResource>,
}

/// Inputs for the title, id, and description text.
#[derive(Debug, Clone)]
pub struct ManifestInfo {
    pub account: String,
    pub target_count: usize,
    pub quote_currency: String,
    pub generated_on: NaiveDate,
    pub index_file: String,
    pub dictionary_file: Option<String>,
}

impl ManifestInfo {
    pub fn title(&self) -> String {
        format!(
            "Top {} Cryptocurrency Historical Data (Automated)",
            self.target_count
        )
    }

    pub fn slug(&self) -> String {
        format!("top-{}-cryptocurrency-historical-data", self.target_count)
    }

    pub fn id(&self) -> String {
        format!("{}/{}", self.account, self.slug())
    }
}

/// Per-asset resource description.
pub fn asset_description(name: &str, symbol: &str, rows: usize, quote: &str) -> String {
    format!(
        "Historical daily OHLCV data for {name} ({symbol}) in {quote}, {rows} trading days. \
         Includes price data (Open, High, Low, Close), trading volume, and the technical \
         indicators the history length supports (Daily Return, High-Low Spread, 7/30-day SMA). \
         Data sourced from Yahoo Finance with maximum available history."
    )
}

pub fn index_description() -> String {
    "Index of every asset file in this dataset, in market-cap rank order among assets \
     with usable history. Columns: Index, Name, File Name."
        .to_string()
}

pub fn dictionary_description() -> String {
    "Data dictionary explaining every column that can appear in the asset CSV files. \
     Each row describes a column name, its meaning, and data type."
        .to_string()
}

/// Markdown description for the dataset page.
pub fn dataset_description(info: &ManifestInfo, asset_count: usize) -> String {
    let quote = info.quote_currency.to_uppercase();
    let dictionary_line = match &info.dictionary_file {
        Some(f) => format!("- **1 data dictionary** (`{f}`) - Documentation of every column\n"),
        None => String::new(),
    };
    format!(
        "# {title}\n\
         \n\
         Daily OHLCV (Open, High, Low, Close, Volume) data for the top {target} cryptocurrencies \
         by market capitalization that have usable price history.\n\
         \n\
         ## Dataset Contents\n\
         \n\
         - **{asset_count} cryptocurrency CSV files** - One file per coin with its complete daily history\n\
         - **1 index file** (`{index}`) - Index, name and file name of every coin\n\
         {dictionary_line}\
         \n\
         ## Column Information\n\
         \n\
         - **Price Data**: Open, High, Low, Close ({quote})\n\
         - **Volume**: Total trading volume ({quote})\n\
         - **Technical Indicators**: Daily Return, High-Low Spread, 7-day SMA, 30-day SMA\n\
         \n\
         Moving averages are only present for coins with enough history (7 and 30 days); each \
         file's schema lists exactly the columns it contains.\n\
         \n\
         ## Data Source\n\
         \n\
         - Rankings from CoinGecko, price history from Yahoo Finance\n\
         - Maximum available history for each cryptocurrency\n\
         \n\
         ## File Naming Convention\n\
         \n\
         Files are named `{{coin_id}}_{{SYMBOL}}.csv`, e.g. `bitcoin_BTC.csv`, `ethereum_ETH.csv`.\n\
         \n\
         Last updated: {date}\n",
        title = info.title(),
        target = info.target_count,
        index = info.index_file,
        date = info.generated_on.format("%Y-%m-%d"),
    )
}

pub fn build_manifest(info: &ManifestInfo, resources: Vec<ManifestResource>, asset_count: usize) -> DatasetManifest {
    DatasetManifest {
        title: info.title(),
        id: info.id(),
        licenses: vec![License {
            name: "other".to_string(),
        }],
        description: dataset_description(info, asset_count),
        keywords: KEYWORDS.iter().map(|k| k.to_string()).collect(),
        resources,
    }
}

pub fn write_manifest(path: &Path, manifest: &DatasetManifest) -> Result<()> {
    let json =
        serde_json::to_string_pretty(manifest).context("Failed to serialize dataset manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}
