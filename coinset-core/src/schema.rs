//! Canonical field catalog and per-asset schema derivation.
//!
//! The catalog lists every column an asset table can carry, independent of any
//! one asset's data. Published metadata uses `derive_schema` to keep only the
//! fields a table actually contains.

use crate::domain::Column;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Column data type as declared in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Datetime,
    Number,
    Integer,
    String,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Datetime => "datetime",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::String => "string",
        }
    }
}

/// One column's name, meaning, and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            field_type,
        }
    }
}

/// The full catalog of asset-table columns, canonical order.
///
/// `quote_currency` (e.g. `usd`) is used in the price/volume descriptions.
pub fn canonical_fields(quote_currency: &str) -> Vec<FieldDescriptor> {
    let quote = quote_currency.to_uppercase();
    Column::ALL
        .iter()
        .map(|&col| {
            let (description, field_type) = match col {
                Column::Date => (
                    "The trading date (YYYY-MM-DD format)".to_string(),
                    FieldType::Datetime,
                ),
                Column::Open => (
                    format!("Price at the start of the day (00:00 UTC) in {quote}"),
                    FieldType::Number,
                ),
                Column::High => (
                    format!("Highest price reached during the day in {quote}"),
                    FieldType::Number,
                ),
                Column::Low => (
                    format!("Lowest price reached during the day in {quote}"),
                    FieldType::Number,
                ),
                Column::Close => (
                    format!("Price at the end of the day (23:59 UTC) in {quote}"),
                    FieldType::Number,
                ),
                Column::Volume => (
                    format!("Total trading volume in {quote}"),
                    FieldType::Number,
                ),
                Column::DailyReturn => (
                    "Percentage change from the previous day's close".to_string(),
                    FieldType::Number,
                ),
                Column::HighLowSpread => (
                    "Intraday volatility calculated as (High - Low)".to_string(),
                    FieldType::Number,
                ),
                Column::Sma7 => (
                    "Simple Moving Average over 7 days (7-day trend)".to_string(),
                    FieldType::Number,
                ),
                Column::Sma30 => (
                    "Simple Moving Average over 30 days (30-day trend)".to_string(),
                    FieldType::Number,
                ),
                Column::Symbol => (
                    "Trading symbol of the asset".to_string(),
                    FieldType::String,
                ),
                Column::Name => (
                    "Display name of the asset".to_string(),
                    FieldType::String,
                ),
            };
            FieldDescriptor::new(col.name(), description, field_type)
        })
        .collect()
}

/// Fields of the index (directory) table.
pub fn directory_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new(
            "Index",
            "Position of the asset among successfully exported assets (market-cap order)",
            FieldType::Integer,
        ),
        FieldDescriptor::new("Name", "Display name of the asset", FieldType::String),
        FieldDescriptor::new(
            "File Name",
            "CSV file holding the asset's daily history",
            FieldType::String,
        ),
    ]
}

/// Columns of the data dictionary table.
pub fn dictionary_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("Column Name", "Name of the column in the asset files", FieldType::String),
        FieldDescriptor::new("Description", "What the column contains", FieldType::String),
        FieldDescriptor::new("Data Type", "Declared type of the column", FieldType::String),
    ]
}

/// The subsequence of `canonical` whose names are in `present`, canonical order kept.
pub fn derive_schema(canonical: &[FieldDescriptor], present: &BTreeSet<&str>) -> Vec<FieldDescriptor> {
    canonical
        .iter()
        .filter(|f| present.contains(f.name.as_str()))
        .cloned()
        .collect()
}
