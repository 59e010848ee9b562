//! Period-keyed stores and their JSON persistence.
//!
//! Stored on disk as a JSON object keyed by period, then district code:
//! ```json
//! {
//!   "2023_1": {
//!     "FRD01": { "qtrly_estabs_count": 10, ..., "avg_wkly_wage": 733 },
//!     "USDPV": { ... }
//!   }
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::aggregation::types::{AnnualMetrics, DistrictMap, QuarterlyMetrics};
use crate::district::District;
use crate::period::Period;

/// Period → district → bundle, ordered by period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(serialize = "M: Serialize", deserialize = "M: Deserialize<'de>"))]
pub struct Store<M> {
    periods: BTreeMap<Period, DistrictMap<M>>,
}

pub type QuarterlyStore = Store<QuarterlyMetrics>;
pub type AnnualStore = Store<AnnualMetrics>;

impl<M> Default for Store<M> {
    fn default() -> Self {
        Self {
            periods: BTreeMap::new(),
        }
    }
}

impl<M> Store<M> {
    /// Replaces any existing entry for `period`.
    pub fn insert(&mut self, period: Period, districts: DistrictMap<M>) {
        self.periods.insert(period, districts);
    }

    pub fn get(&self, period: &Period) -> Option<&DistrictMap<M>> {
        self.periods.get(period)
    }

    pub fn contains(&self, period: &Period) -> bool {
        self.periods.contains_key(period)
    }

    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Period, &DistrictMap<M>)> {
        self.periods.iter()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Whole-period upsert: every period of `fresh` replaces the existing
    /// entry for that key. Periods absent from `fresh` are left untouched.
    pub fn merge(mut self, fresh: Store<M>) -> Store<M> {
        for (period, districts) in fresh.periods {
            if self.periods.insert(period, districts).is_some() {
                debug!(%period, "Replaced period");
            } else {
                debug!(%period, "Added period");
            }
        }
        self
    }
}

/// Loads a store from a JSON file.
///
/// Fails when any period entry lacks one of the fourteen districts.
pub fn load_store<M: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Store<M>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store {}", path.display()))?;
    let store: Store<M> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse store {}", path.display()))?;

    for (period, districts) in store.iter() {
        let missing: Vec<_> = District::ALL
            .iter()
            .filter(|d| !districts.contains_key(*d))
            .map(|d| d.code())
            .collect();
        if !missing.is_empty() {
            bail!(
                "Store {} is missing districts {} in period {period}",
                path.display(),
                missing.join(", ")
            );
        }
    }

    debug!(path = %path.display(), periods = store.len(), "Store loaded");
    Ok(store)
}

/// Writes a store as pretty-printed JSON, creating parent directories.
pub fn save_store<M: Serialize>(path: impl AsRef<Path>, store: &Store<M>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(store)?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write store {}", path.display()))?;
    info!(path = %path.display(), periods = store.len(), "Store written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::types::empty_district_map;
    use crate::period::Quarter;

    fn entry(emplvl: i64) -> DistrictMap<QuarterlyMetrics> {
        let mut districts: DistrictMap<QuarterlyMetrics> = empty_district_map();
        districts.get_mut(&District::Chicago).unwrap().month1_emplvl = emplvl;
        districts
    }

    #[test]
    fn test_merge_replaces_whole_period() {
        let q1 = Period::quarterly(2023, Quarter::Q1);
        let q2 = Period::quarterly(2023, Quarter::Q2);

        let mut existing = QuarterlyStore::default();
        let mut stale = entry(100);
        stale.get_mut(&District::Boston).unwrap().avg_wkly_wage = Some(900);
        existing.insert(q1, stale);
        existing.insert(q2, entry(200));

        let mut fresh = QuarterlyStore::default();
        fresh.insert(q1, entry(150));

        let merged = existing.merge(fresh);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get(&q1).unwrap()[&District::Chicago].month1_emplvl, 150);
        assert_eq!(merged.get(&q1).unwrap()[&District::Boston].avg_wkly_wage, None);
        assert_eq!(merged.get(&q2).unwrap()[&District::Chicago].month1_emplvl, 200);
    }

    #[test]
    fn test_merge_into_empty_store() {
        let q1 = Period::quarterly(2020, Quarter::Q1);
        let mut fresh = QuarterlyStore::default();
        fresh.insert(q1, entry(1));

        let merged = QuarterlyStore::default().merge(fresh.clone());
        assert_eq!(merged, fresh);
    }

    #[test]
    fn test_save_and_load_preserve_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("01_json/quarterly_data.json");

        let mut store = QuarterlyStore::default();
        store.insert(Period::quarterly(2021, Quarter::Q4), entry(12));
        save_store(&path, &store).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"2021_4\""));
        assert!(raw.contains("\"FRD07\""));
        assert!(raw.contains("\"avg_wkly_wage\": null"));

        let loaded: QuarterlyStore = load_store(&path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_rejects_incomplete_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarterly_data.json");

        let mut districts = entry(5);
        districts.remove(&District::Residual);
        districts.remove(&District::UsTotal);
        let mut store = QuarterlyStore::default();
        store.insert(Period::quarterly(2022, Quarter::Q2), districts);
        save_store(&path, &store).unwrap();

        let err = load_store::<QuarterlyMetrics>(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("FRD99, USDPV"), "{msg}");
        assert!(msg.contains("2022_2"), "{msg}");
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_store::<QuarterlyMetrics>(dir.path().join("nope.json")).is_err());
    }
}
