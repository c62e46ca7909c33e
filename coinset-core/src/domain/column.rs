//! Output columns in canonical order.

use serde::{Deserialize, Serialize};

/// Every column an asset table can carry.
///
/// Declaration order is the canonical order: `Ord` follows it, so a
/// `BTreeSet<Column>` iterates columns the way they are written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
    DailyReturn,
    HighLowSpread,
    Sma7,
    Sma30,
    Symbol,
    Name,
}

impl Column {
    /// All columns, canonical order.
    pub const ALL: [Column; 12] = [
        Column::Date,
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
        Column::DailyReturn,
        Column::HighLowSpread,
        Column::Sma7,
        Column::Sma30,
        Column::Symbol,
        Column::Name,
    ];

    /// Columns a history provider can deliver.
    pub const SOURCE: [Column; 6] = [
        Column::Date,
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    /// Header name as written to CSV and referenced by the manifest.
    pub fn name(self) -> &'static str {
        match self {
            Column::Date => "Date",
            Column::Open => "Open",
            Column::High => "High",
            Column::Low => "Low",
            Column::Close => "Close",
            Column::Volume => "Volume",
            Column::DailyReturn => "Daily_Return",
            Column::HighLowSpread => "High_Low_Spread",
            Column::Sma7 => "SMA_7",
            Column::Sma30 => "SMA_30",
            Column::Symbol => "Symbol",
            Column::Name => "Name",
        }
    }

    /// True for columns computed by the feature engine.
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Column::DailyReturn | Column::HighLowSpread | Column::Sma7 | Column::Sma30
        )
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn ord_matches_canonical_order() {
        let shuffled: BTreeSet<Column> = [Column::Sma30, Column::Date, Column::Name, Column::Close]
            .into_iter()
            .collect();
        let ordered: Vec<Column> = shuffled.into_iter().collect();
        assert_eq!(
            ordered,
            vec![Column::Date, Column::Close, Column::Sma30, Column::Name]
        );
    }

    #[test]
    fn names_are_unique() {
        let names: BTreeSet<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Column::ALL.len());
    }

    #[test]
    fn derived_flags() {
        assert!(Column::Sma7.is_derived());
        assert!(!Column::Close.is_derived());
        assert!(!Column::Symbol.is_derived());
    }
}
