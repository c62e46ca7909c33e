//! Property tests for the feature engine and schema derivation.
//!
//! Uses proptest to verify:
//! 1. Length gating — derived columns appear exactly when the history supports them
//! 2. SMA values equal the arithmetic mean of the trailing window
//! 3. Daily return follows (close[i] / close[i-1] - 1) * 100 and is undefined at row 0
//! 4. Determinism — identical input gives identical output
//! 5. Derived schema is an order-preserving subsequence of the catalog

use chrono::NaiveDate;
use coinset_core::{
    canonical_fields, derive_schema, enrich, Column, FieldDescriptor, PriceTable, RawPriceRow,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        (0.0001..100_000.0_f64).prop_map(|p| (p * 10_000.0).round() / 10_000.0 + 0.0001),
        0..max_len,
    )
}

fn table_from(closes: &[f64]) -> PriceTable {
    let base = NaiveDate::from_ymd_opt(2015, 3, 1).unwrap();
    let rows = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            RawPriceRow::new(
                base + chrono::Duration::days(i as i64),
                c,
                c * 1.05,
                c * 0.95,
                c,
                c * 1_000.0,
            )
        })
        .collect();
    PriceTable::from_rows(rows)
}

fn close_enough(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

// ── 1. Length gating ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn derived_columns_gate_on_length(closes in arb_closes(80)) {
        let n = closes.len();
        let out = enrich(&table_from(&closes), None);

        prop_assert_eq!(out.has(Column::Sma30), n >= 30);
        prop_assert_eq!(out.has(Column::Sma7), n >= 7);
        prop_assert_eq!(out.has(Column::DailyReturn), n >= 2);
        prop_assert_eq!(out.has(Column::HighLowSpread), n >= 1);
        prop_assert_eq!(out.len(), n);
    }
}

// ── 2. SMA equals window mean ────────────────────────────────────────

proptest! {
    #[test]
    fn sma_equals_window_mean(closes in arb_closes(90)) {
        let out = enrich(&table_from(&closes), None);
        for (i, row) in out.rows().iter().enumerate() {
            for (window, value) in [(7usize, row.sma_7), (30usize, row.sma_30)] {
                if i + 1 < window {
                    prop_assert!(value.is_none(), "row {} window {} should be undefined", i, window);
                } else {
                    let mean = closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                    let v = value.expect("defined");
                    prop_assert!(close_enough(v, mean), "row {}: {} vs {}", i, v, mean);
                }
            }
        }
    }
}

// ── 3. Daily return ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn daily_return_formula(closes in arb_closes(40)) {
        let out = enrich(&table_from(&closes), None);
        if let Some(first) = out.rows().first() {
            prop_assert!(first.daily_return.is_none());
        }
        for i in 1..closes.len() {
            let expected = (closes[i] / closes[i - 1] - 1.0) * 100.0;
            let v = out.rows()[i].daily_return.expect("defined");
            prop_assert!(close_enough(v, expected), "row {}: {} vs {}", i, v, expected);
        }
    }

    #[test]
    fn spread_is_high_minus_low(closes in arb_closes(20)) {
        let table = table_from(&closes);
        let out = enrich(&table, None);
        for (raw, row) in table.rows().iter().zip(out.rows()) {
            prop_assert_eq!(row.high_low_spread, Some(raw.high - raw.low));
        }
    }
}

// ── 4. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn enrich_is_deterministic(closes in arb_closes(60)) {
        let table = table_from(&closes);
        prop_assert_eq!(enrich(&table, None), enrich(&table, None));
    }
}

// ── 5. Schema derivation ─────────────────────────────────────────────

proptest! {
    #[test]
    fn derived_schema_is_ordered_subsequence(mask in prop::collection::vec(any::<bool>(), 12)) {
        let canonical = canonical_fields("usd");
        let present: BTreeSet<&str> = canonical
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(f, _)| f.name.as_str())
            .collect();

        let derived = derive_schema(&canonical, &present);
        prop_assert_eq!(derived.len(), present.len());

        let positions: Vec<usize> = derived
            .iter()
            .map(|d| canonical.iter().position(|c| c == d).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn short_history_schema_never_mentions_sma_30() {
    let closes: Vec<f64> = (1..=20).map(f64::from).collect();
    let out = enrich(&table_from(&closes), None);
    let schema: Vec<FieldDescriptor> = derive_schema(&canonical_fields("usd"), &out.column_names());
    assert!(schema.iter().all(|f| f.name != "SMA_30"));
    assert!(schema.iter().any(|f| f.name == "SMA_7"));
}
