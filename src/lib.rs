pub mod aggregation;
pub mod config;
pub mod crosswalk;
pub mod district;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod period;
pub mod pipeline;
pub mod store;
