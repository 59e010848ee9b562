//! Pipeline steps that connect record sources to the aggregation engine.
//!
//! Every file or API slice is one aggregation pass; its periods are merged
//! into the quarterly store with whole-period overwrite.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::aggregation::aggregate_slice;
use crate::crosswalk::Crosswalk;
use crate::fetch::{fetch_bytes, slice_url, update_window, HttpClient};
use crate::parser::parse_records;
use crate::store::QuarterlyStore;

/// Aggregates one CSV file as a single pass.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn aggregate_file(crosswalk: &Crosswalk, path: &Path) -> Result<QuarterlyStore> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records =
        parse_records(file).with_context(|| format!("Failed to parse {}", path.display()))?;
    let store = aggregate_slice(crosswalk, &records)
        .with_context(|| format!("Failed to aggregate {}", path.display()))?;
    info!(records = records.len(), periods = store.len(), "File aggregated");
    Ok(store)
}

/// CSV files directly inside `dir`, sorted by name.
pub fn input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Builds a quarterly store from every historical file in `input_dir`.
#[instrument(skip_all, fields(input_dir = %input_dir.display()))]
pub fn build_history(crosswalk: &Crosswalk, input_dir: &Path) -> Result<QuarterlyStore> {
    let files = input_files(input_dir)?;
    info!(files = files.len(), "Building quarterly store from history");

    let mut store = QuarterlyStore::default();
    for path in files {
        store = store.merge(aggregate_file(crosswalk, &path)?);
    }

    info!(periods = store.len(), "Historical build complete");
    Ok(store)
}

/// Refreshes the current and previous year from the API.
///
/// Slices are fetched one after another; unpublished quarters are skipped.
#[instrument(skip(client, crosswalk, store))]
pub async fn update_from_api<C: HttpClient>(
    client: &C,
    base_url: &str,
    current_year: i32,
    crosswalk: &Crosswalk,
    mut store: QuarterlyStore,
) -> Result<QuarterlyStore> {
    let mut merged = 0;

    for (year, quarter) in update_window(current_year) {
        let url = slice_url(base_url, year, quarter);
        let Some(bytes) = fetch_bytes(client, &url).await? else {
            continue;
        };

        let records =
            parse_records(bytes.as_slice()).with_context(|| format!("Failed to parse {url}"))?;
        let fresh = aggregate_slice(crosswalk, &records)
            .with_context(|| format!("Failed to aggregate {url}"))?;

        merged += fresh.len();
        store = store.merge(fresh);
    }

    info!(merged, periods = store.len(), "API update complete");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::district::District;
    use crate::period::{Period, Quarter};
    use async_trait::async_trait;
    use std::collections::HashMap;

    const API_BASE: &str = "http://qcew.test/api";

    const HEADER: &str = "area_fips,agglvl_code,year,qtr,disclosure_code,qtrly_estabs,month1_emplvl,month2_emplvl,month3_emplvl,total_qtrly_wages";

    #[test]
    fn test_input_files_only_lists_csv_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2021.q1-q4.csv"), "").unwrap();
        fs::write(dir.path().join("2020.q1-q4.CSV"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let names: Vec<_> = input_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2020.q1-q4.CSV", "2021.q1-q4.csv"]);
    }

    #[test]
    fn test_later_file_overwrites_shared_period() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.csv"),
            format!("{HEADER}\n17031,70,2022,4,,1,10,10,10,100\n"),
        )
        .unwrap();
        fs::write(
            dir.path().join("b.csv"),
            format!("{HEADER}\n17031,70,2022,4,,2,20,20,20,200\n"),
        )
        .unwrap();

        let crosswalk = Crosswalk::from_pairs([("17031", District::Chicago)]).unwrap();
        let store = build_history(&crosswalk, dir.path()).unwrap();

        let entry = store.get(&Period::quarterly(2022, Quarter::Q4)).unwrap();
        assert_eq!(entry[&District::Chicago].qtrly_estabs_count, 2);
    }

    #[test]
    fn test_unknown_county_fails_the_build() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.csv"),
            format!("{HEADER}\n17043,70,2022,4,,1,10,10,10,100\n"),
        )
        .unwrap();

        let crosswalk = Crosswalk::from_pairs([("17031", District::Chicago)]).unwrap();
        let err = build_history(&crosswalk, dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("17043"));
    }

    /// Serves fixture slices by URL and answers 404 for everything else.
    /// Non-HTTP URLs go to a real client, which refuses them.
    struct StubClient {
        published: HashMap<String, &'static str>,
    }

    impl StubClient {
        fn new(slices: &[(i32, Quarter, &'static str)]) -> Self {
            let published = slices
                .iter()
                .map(|(year, quarter, body)| (slice_url(API_BASE, *year, *quarter), *body))
                .collect();
            Self { published }
        }
    }

    #[async_trait]
    impl HttpClient for StubClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            if req.url().scheme() != "http" {
                return reqwest::Client::new().execute(req).await;
            }

            let response = match self.published.get(req.url().as_str()) {
                Some(body) => http::Response::builder().status(200).body(*body),
                None => http::Response::builder().status(404).body(""),
            };
            Ok(response.unwrap().into())
        }
    }

    fn fixture_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    #[tokio::test]
    async fn test_update_skips_unpublished_slices() {
        let crosswalk = Crosswalk::load(fixture_dir().join("crosswalk.csv")).unwrap();
        let history = build_history(&crosswalk, &fixture_dir().join("history")).unwrap();
        let client = StubClient::new(&[
            (2023, Quarter::Q1, include_str!("../tests/fixtures/api_2023_1_revised.csv")),
            (2023, Quarter::Q4, include_str!("../tests/fixtures/api_2023_4.csv")),
        ]);

        let updated = update_from_api(&client, API_BASE, 2023, &crosswalk, history.clone())
            .await
            .unwrap();

        assert_eq!(updated.len(), 8);
        let q4 = updated.get(&Period::quarterly(2023, Quarter::Q4)).unwrap();
        assert_eq!(q4.len(), 14);

        let q1 = Period::quarterly(2023, Quarter::Q1);
        assert_eq!(updated.get(&q1).unwrap()[&District::Chicago].qtrly_estabs_count, 43);
        assert_ne!(updated.get(&q1), history.get(&q1));

        for period in [
            Period::quarterly(2023, Quarter::Q2),
            Period::quarterly(2023, Quarter::Q3),
            Period::quarterly(2022, Quarter::Q1),
            Period::quarterly(2022, Quarter::Q4),
        ] {
            assert_eq!(updated.get(&period), history.get(&period), "{period}");
        }
    }

    #[tokio::test]
    async fn test_update_with_nothing_published_keeps_store() {
        let crosswalk = Crosswalk::load(fixture_dir().join("crosswalk.csv")).unwrap();
        let history = build_history(&crosswalk, &fixture_dir().join("history")).unwrap();
        let client = StubClient::new(&[]);

        let updated = update_from_api(&client, API_BASE, 2025, &crosswalk, history.clone())
            .await
            .unwrap();

        assert_eq!(updated, history);
    }

    #[tokio::test]
    async fn test_update_propagates_transport_errors() {
        let crosswalk = Crosswalk::load(fixture_dir().join("crosswalk.csv")).unwrap();
        let client = StubClient::new(&[]);

        let result = update_from_api(
            &client,
            "ftp://qcew.test/api",
            2023,
            &crosswalk,
            QuarterlyStore::default(),
        )
        .await;

        assert!(result.is_err());
    }
}
