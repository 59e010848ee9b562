//! Error types for the aggregation engine.
//!
//! The engine returns [`AggregationError`]; the I/O edges (store, export,
//! fetch, CLI) propagate with `anyhow` and attach context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregationError {
    /// A county row references a geography the crosswalk does not contain.
    #[error("county {0} is not in the crosswalk")]
    UnknownCounty(String),

    /// A state-placeholder row belongs to a state with no crosswalk counties.
    #[error("state {state} (from {area_fips}) has no districts in the crosswalk")]
    UnknownState { state: String, area_fips: String },

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("invalid crosswalk: {0}")]
    InvalidCrosswalk(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
