//! CSV rendering for asset tables, the index table, and the data dictionary.
//!
//! Numbers use Rust's shortest round-trip `f64` formatting; undefined values
//! are empty cells; dates are `YYYY-MM-DD`. Output is a pure function of the
//! input, so identical inputs give byte-identical files.

use anyhow::{Context, Result};
use coinset_core::features::Cell;
use coinset_core::{Column, EnrichedTable, FieldDescriptor};
use serde::{Deserialize, Serialize};

/// One row of the index (directory) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(rename = "Index")]
    pub index: usize,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "File Name")]
    pub filename: String,
}

fn render(cell: Cell<'_>) -> String {
    match cell {
        Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        Cell::Number(Some(v)) => v.to_string(),
        Cell::Number(None) => String::new(),
        Cell::Text(s) => s.to_string(),
    }
}

/// Render an asset table with exactly its present columns, header first.
pub fn asset_csv(table: &EnrichedTable) -> Result<Vec<u8>> {
    let columns: Vec<Column> = table.columns();
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(columns.iter().map(|c| c.name()))?;
    for row in table.rows() {
        wtr.write_record(columns.iter().map(|&c| render(table.cell(row, c))))?;
    }

    wtr.into_inner().context("failed to flush CSV writer")
}

/// Render the index table (`Index,Name,File Name`), ascending by index.
pub fn index_csv(entries: &[DirectoryEntry]) -> Result<Vec<u8>> {
    let mut sorted: Vec<&DirectoryEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.index);

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Index", "Name", "File Name"])?;
    for e in sorted {
        wtr.write_record([e.index.to_string().as_str(), &e.name, &e.filename])?;
    }
    wtr.into_inner().context("failed to flush CSV writer")
}

/// Render the data dictionary (`Column Name,Description,Data Type`).
pub fn dictionary_csv(fields: &[FieldDescriptor]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Column Name", "Description", "Data Type"])?;
    for f in fields {
        wtr.write_record([f.name.as_str(), &f.description, f.field_type.as_str()])?;
    }
    wtr.into_inner().context("failed to flush CSV writer")
}
