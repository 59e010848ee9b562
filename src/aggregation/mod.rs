//! County-to-district aggregation engine.
//!
//! Raw QCEW records flow through [`shares`] (allocation key for placeholder
//! rows), [`quarterly`] (district sums, residual reconciliation, average
//! weekly wage) and finally [`annual`] (four-quarter fold).

pub mod annual;
pub mod quarterly;
pub mod shares;
pub mod types;
pub mod utility;

pub use annual::aggregate_annual;
pub use quarterly::{aggregate_slice, QuarterlyAggregator};
pub use shares::{DistrictShareCalculator, ShareTable};
