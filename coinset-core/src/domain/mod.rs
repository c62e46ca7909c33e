//! Domain types: ranked candidates, raw daily price tables, output columns.

pub mod candidate;
pub mod column;
pub mod price;

pub use candidate::AssetCandidate;
pub use column::Column;
pub use price::{PriceTable, RawPriceRow};
