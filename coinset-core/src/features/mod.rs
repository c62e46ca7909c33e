//! Feature engine — derived columns for one asset's daily history.
//!
//! `enrich` is pure and total. Each derived column is gated once per table:
//!
//! | column            | requires                 | defined from row |
//! |-------------------|--------------------------|------------------|
//! | `Daily_Return`    | `Close`, ≥ 2 rows        | 1                |
//! | `High_Low_Spread` | `High` + `Low`, ≥ 1 row  | 0                |
//! | `SMA_7`           | `Close`, ≥ 7 rows        | 6                |
//! | `SMA_30`          | `Close`, ≥ 30 rows       | 29               |
//!
//! A column that fails its gate is absent from the table, so schema
//! derivation only has to intersect with what exists.

pub mod rolling;

use crate::domain::{Column, PriceTable};
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub use rolling::trailing_mean;

pub const SMA_SHORT_WINDOW: usize = 7;
pub const SMA_LONG_WINDOW: usize = 30;

/// Identifier columns appended to every row when requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub symbol: String,
    pub name: String,
}

/// Raw row plus the derived fields computable at its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub daily_return: Option<f64>,
    pub high_low_spread: Option<f64>,
    pub sma_7: Option<f64>,
    pub sma_30: Option<f64>,
}

/// A single cell value, as seen by writers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Date(NaiveDate),
    Number(Option<f64>),
    Text(&'a str),
}

/// Finalized per-asset table: rows plus the column set decided after enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTable {
    rows: Vec<EnrichedRow>,
    columns: BTreeSet<Column>,
    identity: Option<Identity>,
}

impl EnrichedTable {
    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Present columns, canonical order.
    pub fn columns(&self) -> Vec<Column> {
        self.columns.iter().copied().collect()
    }

    /// Header names of the present columns, for schema derivation.
    pub fn column_names(&self) -> BTreeSet<&'static str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Value of `column` at `row`. Columns not present read as an empty number.
    pub fn cell(&self, row: &EnrichedRow, column: Column) -> Cell<'_> {
        let number = |v: f64| Cell::Number(if v.is_nan() { None } else { Some(v) });
        match column {
            Column::Date => Cell::Date(row.date),
            Column::Open => number(row.open),
            Column::High => number(row.high),
            Column::Low => number(row.low),
            Column::Close => number(row.close),
            Column::Volume => number(row.volume),
            Column::DailyReturn => Cell::Number(row.daily_return),
            Column::HighLowSpread => Cell::Number(row.high_low_spread),
            Column::Sma7 => Cell::Number(row.sma_7),
            Column::Sma30 => Cell::Number(row.sma_30),
            Column::Symbol => Cell::Text(self.identity.as_ref().map_or("", |i| i.symbol.as_str())),
            Column::Name => Cell::Text(self.identity.as_ref().map_or("", |i| i.name.as_str())),
        }
    }
}

/// Compute derived columns for one asset's history.
///
/// Never fails: an empty table yields an empty output with no derived columns;
/// a missing source column drops the derived columns that depend on it.
pub fn enrich(table: &PriceTable, identity: Option<&Identity>) -> EnrichedTable {
    let n = table.len();
    let mut columns: BTreeSet<Column> = table.columns().collect();

    let has_close = table.has(Column::Close);
    let closes = table.closes();

    let daily_return = if has_close && n >= 2 {
        columns.insert(Column::DailyReturn);
        pct_change(&closes)
    } else {
        vec![None; n]
    };

    let spread = if table.has(Column::High) && table.has(Column::Low) && n >= 1 {
        columns.insert(Column::HighLowSpread);
        table
            .rows()
            .iter()
            .map(|r| finite(r.high - r.low))
            .collect()
    } else {
        vec![None; n]
    };

    let sma_7 = gated_mean(&closes, has_close, SMA_SHORT_WINDOW, Column::Sma7, &mut columns);
    let sma_30 = gated_mean(&closes, has_close, SMA_LONG_WINDOW, Column::Sma30, &mut columns);

    if identity.is_some() {
        columns.insert(Column::Symbol);
        columns.insert(Column::Name);
    }

    let rows = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, r)| EnrichedRow {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
            daily_return: daily_return[i],
            high_low_spread: spread[i],
            sma_7: sma_7[i],
            sma_30: sma_30[i],
        })
        .collect();

    EnrichedTable {
        rows,
        columns,
        identity: identity.cloned(),
    }
}

fn gated_mean(
    closes: &[f64],
    has_close: bool,
    window: usize,
    column: Column,
    columns: &mut BTreeSet<Column>,
) -> Vec<Option<f64>> {
    if has_close && closes.len() >= window {
        columns.insert(column);
        trailing_mean(closes, window)
    } else {
        vec![None; closes.len()]
    }
}

/// Percent change vs. the previous row. Undefined at row 0 and where the
/// previous close is zero or either close is NaN.
fn pct_change(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    for (i, &close) in closes.iter().enumerate() {
        if i == 0 {
            out.push(None);
            continue;
        }
        let prev = closes[i - 1];
        if prev == 0.0 {
            out.push(None);
        } else {
            out.push(finite((close - prev) / prev * 100.0));
        }
    }
    out
}

fn finite(v: f64) -> Option<f64> {
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}
