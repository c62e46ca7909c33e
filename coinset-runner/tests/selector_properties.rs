//! Property tests for the backfill selector.
//!
//! Uses proptest to verify, over random availability patterns:
//! 1. Output length is min(target, viable candidates)
//! 2. Output order is rank order restricted to viable candidates
//! 3. No fetch happens after the target is reached

use chrono::NaiveDate;
use coinset_core::{enrich, AssetCandidate, DataError, PriceTable, RawPriceRow, TickerMap};
use coinset_runner::backfill::CollectSink;
use coinset_runner::{BackfillSelector, SelectionPolicy};
use proptest::prelude::*;

const MIN_ROWS: usize = 10;

/// What the history provider has for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Availability {
    Viable,
    Empty,
    TooShort,
    Unreachable,
}

fn arb_availability() -> impl Strategy<Value = Availability> {
    prop_oneof![
        3 => Just(Availability::Viable),
        1 => Just(Availability::Empty),
        1 => Just(Availability::TooShort),
        1 => Just(Availability::Unreachable),
    ]
}

fn rows(n: usize) -> PriceTable {
    let base = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    PriceTable::from_rows(
        (0..n)
            .map(|i| {
                let c = 1.0 + i as f64;
                RawPriceRow::new(base + chrono::Duration::days(i as i64), c, c, c, c, c)
            })
            .collect(),
    )
}

fn fetch_for(availability: Availability) -> Result<PriceTable, DataError> {
    match availability {
        Availability::Viable => Ok(rows(MIN_ROWS + 2)),
        Availability::Empty => Ok(PriceTable::empty()),
        Availability::TooShort => Ok(rows(MIN_ROWS - 1)),
        Availability::Unreachable => Err(DataError::NetworkUnreachable("down".into())),
    }
}

proptest! {
    #[test]
    fn selection_is_rank_ordered_prefix_of_viable(
        mask in prop::collection::vec(arb_availability(), 0..40),
        target in 1usize..15,
    ) {
        let tickers = TickerMap::new("usd");
        let candidates: Vec<AssetCandidate> = (0..mask.len())
            .map(|i| AssetCandidate::new(format!("coin{i}"), format!("c{i}"), format!("Coin {i}"), i as u32 + 1))
            .collect();

        let mut fetches = 0usize;
        let mut sink = CollectSink::default();
        let report = BackfillSelector::new(SelectionPolicy { target, min_rows: MIN_ROWS }, &tickers).run(
            &candidates,
            |ticker| {
                fetches += 1;
                let i: usize = ticker
                    .trim_start_matches('C')
                    .trim_end_matches("-USD")
                    .parse()
                    .unwrap();
                fetch_for(mask[i])
            },
            |_, t| Ok(enrich(t, None)),
            &mut sink,
        );

        let viable: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, a)| **a == Availability::Viable)
            .map(|(i, _)| i)
            .collect();
        let expected: Vec<String> = viable.iter().take(target).map(|i| format!("coin{i}")).collect();
        let got: Vec<String> = sink.selected.iter().map(|(c, _)| c.identifier.clone()).collect();

        prop_assert_eq!(got.len(), target.min(viable.len()));
        prop_assert_eq!(&got, &expected);
        prop_assert_eq!(report.accepted.len(), got.len());

        let expected_fetches = if viable.len() >= target {
            viable[target - 1] + 1
        } else {
            mask.len()
        };
        prop_assert_eq!(fetches, expected_fetches);
        prop_assert_eq!(report.attempted, expected_fetches);
    }
}
