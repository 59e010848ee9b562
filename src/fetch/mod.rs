//! Retrieval of QCEW slices from the open-data API.
//!
//! Each quarter is published as one CSV at
//! `{base}/{year}/{qtr}/industry/10.csv`. A slice that has not been
//! published yet answers with a non-success status and is reported as
//! `None` rather than an error.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;
use tracing::{debug, info};

use crate::period::Quarter;

/// Default base URL of the QCEW open-data API.
pub const DEFAULT_API_BASE_URL: &str = "http://www.bls.gov/cew/data/api";

/// URL of the all-industries slice for one quarter.
pub fn slice_url(base_url: &str, year: i32, quarter: Quarter) -> String {
    format!(
        "{}/{}/{}/industry/10.csv",
        base_url.trim_end_matches('/'),
        year,
        quarter.marker()
    )
}

/// Quarters refreshed on every update: all of `current_year` and the year
/// before, since QCEW revises back quarters after first publication.
pub fn update_window(current_year: i32) -> Vec<(i32, Quarter)> {
    [current_year, current_year - 1]
        .into_iter()
        .flat_map(|year| Quarter::QUARTERS.into_iter().map(move |q| (year, q)))
        .collect()
}

/// Fetches `url`, returning `None` when the server answers with a
/// non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Option<Vec<u8>>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        info!(url, status = status.as_u16(), "Slice not available");
        return Ok(None);
    }

    let bytes = resp.bytes().await?.to_vec();
    debug!(url, bytes = bytes.len(), "Slice downloaded");
    Ok(Some(bytes))
}
