//! Raw daily price rows and the per-asset table a history provider returns.

use super::column::Column;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One trading day of OHLCV data as delivered by the history provider.
///
/// A value the provider left out is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl RawPriceRow {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Ordered daily history for one asset plus the source columns actually present.
///
/// Invariant: dates are strictly increasing. Construction sorts ascending and
/// keeps the last row for a repeated date (providers re-send the in-progress day).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    rows: Vec<RawPriceRow>,
    columns: BTreeSet<Column>,
}

impl PriceTable {
    /// Build a table from rows and the set of source columns the provider delivered.
    ///
    /// Non-source columns in `columns` are ignored.
    pub fn new(mut rows: Vec<RawPriceRow>, columns: impl IntoIterator<Item = Column>) -> Self {
        rows.sort_by_key(|r| r.date);
        // Stable sort keeps arrival order among equal dates; keep the last one.
        let mut deduped: Vec<RawPriceRow> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(prev) if prev.date == row.date => *prev = row,
                _ => deduped.push(row),
            }
        }

        let mut columns: BTreeSet<Column> = columns
            .into_iter()
            .filter(|c| Column::SOURCE.contains(c))
            .collect();
        columns.insert(Column::Date);

        Self {
            rows: deduped,
            columns,
        }
    }

    /// Table with every OHLCV column present.
    pub fn from_rows(rows: Vec<RawPriceRow>) -> Self {
        Self::new(rows, Column::SOURCE)
    }

    /// An empty result: the provider had nothing for the ticker.
    pub fn empty() -> Self {
        Self::new(Vec::new(), [Column::Date])
    }

    pub fn rows(&self) -> &[RawPriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the provider delivered this source column.
    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Source columns present, canonical order.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.iter().copied()
    }

    /// Close prices in row order.
    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }
}
