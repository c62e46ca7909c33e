//! Deterministic, collision-free asset filenames.

use std::collections::HashSet;

/// Placeholder for every character that is not ASCII alphanumeric.
pub const PLACEHOLDER: char = '_';

/// Replace every non-ASCII-alphanumeric character with `_`.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { PLACEHOLDER })
        .collect()
}

/// `sanitize(identifier) + "_" + sanitize(SYMBOL) + ".csv"`.
pub fn base_filename(identifier: &str, symbol: &str) -> String {
    format!(
        "{}_{}.csv",
        sanitize(identifier),
        sanitize(&symbol.to_uppercase())
    )
}

/// Tracks filenames used in a run.
///
/// Comparison is case-insensitive: `Foo_X.csv` and `foo_X.csv` are the same
/// file on common filesystems. A clash gets `_2`, `_3`, … before `.csv`.
#[derive(Debug, Default)]
pub struct FilenameRegistry {
    taken: HashSet<String>,
    reserved_names: HashSet<String>,
}

impl FilenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names that must never be handed out (index, manifest, dictionary).
    pub fn reserve(&mut self, name: &str) {
        self.reserved_names.insert(name.to_lowercase());
    }

    fn is_free(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        !self.taken.contains(&key) && !self.reserved_names.contains(&key)
    }

    /// First free name for this asset. Does not claim it.
    pub fn propose(&self, identifier: &str, symbol: &str) -> String {
        let base = base_filename(identifier, symbol);
        if self.is_free(&base) {
            return base;
        }
        let stem = base.trim_end_matches(".csv");
        (2usize..)
            .map(|n| format!("{stem}_{n}.csv"))
            .find(|candidate| self.is_free(candidate))
            .unwrap_or(base)
    }

    /// Mark a name as used.
    pub fn claim(&mut self, name: &str) {
        self.taken.insert(name.to_lowercase());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_non_alphanumerics() {
        assert_eq!(sanitize("bitcoin"), "bitcoin");
        assert_eq!(sanitize("wrapped-bitcoin"), "wrapped_bitcoin");
        assert_eq!(sanitize("usd coin (bridged)"), "usd_coin__bridged_");
        assert_eq!(sanitize("café"), "caf_");
    }

    #[test]
    fn base_filename_pattern() {
        assert_eq!(base_filename("bitcoin", "btc"), "bitcoin_BTC.csv");
        assert_eq!(base_filename("usd-coin", "USDC.e"), "usd_coin_USDC_E.csv");
    }

    #[test]
    fn clash_gets_numeric_suffix() {
        let mut reg = FilenameRegistry::new();
        let first = reg.propose("a-b", "X");
        reg.claim(&first);
        let second = reg.propose("a.b", "X");
        assert_eq!(first, "a_b_X.csv");
        assert_eq!(second, "a_b_X_2.csv");
        reg.claim(&second);
        assert_eq!(reg.propose("a b", "x"), "a_b_X_3.csv");
    }

    #[test]
    fn clash_is_case_insensitive() {
        let mut reg = FilenameRegistry::new();
        reg.claim("Foo_X.csv");
        assert_eq!(reg.propose("foo", "x"), "foo_X_2.csv");
    }

    #[test]
    fn propose_does_not_claim() {
        let mut reg = FilenameRegistry::new();
        assert_eq!(reg.propose("a", "b"), reg.propose("a", "b"));
        reg.claim(&reg.propose("a", "b"));
        assert_eq!(reg.propose("a", "b"), "a_B_2.csv");
    }

    #[test]
    fn reserved_names_are_avoided() {
        let mut reg = FilenameRegistry::new();
        reg.reserve("data_DICT.csv");
        assert_eq!(reg.propose("data", "dict"), "data_DICT_2.csv");
    }
}
