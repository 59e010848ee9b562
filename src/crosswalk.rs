//! County-to-district crosswalk.
//!
//! Stored on disk as a two-column CSV:
//! ```text
//! county_fips,district
//! 01001,FRD06
//! 36061,FRD02
//! ```
//! Loaded once at startup and never mutated.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::district::District;
use crate::error::AggregationError;

#[derive(Debug, Deserialize)]
struct CrosswalkRow {
    county_fips: String,
    district: String,
}

/// Read-only county → district lookup with a per-state reverse view.
#[derive(Debug, Clone, Default)]
pub struct Crosswalk {
    counties: HashMap<String, District>,
    by_state: HashMap<String, BTreeSet<District>>,
}

impl Crosswalk {
    /// Builds a crosswalk from `(county_fips, district)` pairs.
    ///
    /// Only the twelve regional districts are valid targets, every county
    /// code must be five ASCII digits and no county may be listed twice.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, AggregationError>
    where
        I: IntoIterator<Item = (S, District)>,
        S: Into<String>,
    {
        let mut crosswalk = Crosswalk::default();

        for (county, district) in pairs {
            let county: String = county.into();
            if county.len() != 5 || !county.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AggregationError::InvalidCrosswalk(format!(
                    "county code '{county}' is not five digits"
                )));
            }
            if !district.is_regional() {
                return Err(AggregationError::InvalidCrosswalk(format!(
                    "county {county} maps to non-regional district {district}"
                )));
            }

            if let Some(existing) = crosswalk.counties.get(&county) {
                return Err(AggregationError::InvalidCrosswalk(format!(
                    "county {county} listed twice ({existing} and {district})"
                )));
            }

            crosswalk
                .by_state
                .entry(county[0..2].to_string())
                .or_default()
                .insert(district);
            crosswalk.counties.insert(county, district);
        }

        Ok(crosswalk)
    }

    /// Reads a crosswalk CSV from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AggregationError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut pairs = Vec::new();

        for result in rdr.deserialize() {
            let row: CrosswalkRow = result?;
            pairs.push((row.county_fips.trim().to_string(), row.district.parse::<District>()?));
        }

        Self::from_pairs(pairs)
    }

    /// Loads the crosswalk CSV at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AggregationError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading crosswalk");
        let file = std::fs::File::open(path)?;
        let crosswalk = Self::from_reader(file)?;
        info!(
            counties = crosswalk.counties.len(),
            states = crosswalk.by_state.len(),
            "Crosswalk loaded"
        );
        Ok(crosswalk)
    }

    /// Returns the district of `county`, failing with
    /// [`AggregationError::UnknownCounty`] when it is not mapped.
    pub fn district_for(&self, county: &str) -> Result<District, AggregationError> {
        self.counties
            .get(county)
            .copied()
            .ok_or_else(|| AggregationError::UnknownCounty(county.to_string()))
    }

    /// Districts that any county of `state` (two-digit FIPS) belongs to.
    pub fn districts_in_state(&self, state: &str) -> Option<&BTreeSet<District>> {
        self.by_state.get(state)
    }

    pub fn states(&self) -> impl Iterator<Item = (&str, &BTreeSet<District>)> {
        self.by_state.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader_builds_reverse_view() {
        let csv = "county_fips,district\n29510,FRD08\n29095,FRD10\n17031,FRD07\n";
        let crosswalk = Crosswalk::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(crosswalk.len(), 3);
        assert_eq!(crosswalk.district_for("29510").unwrap(), District::StLouis);

        let missouri: Vec<_> = crosswalk.districts_in_state("29").unwrap().iter().copied().collect();
        assert_eq!(missouri, vec![District::StLouis, District::KansasCity]);
        assert!(crosswalk.districts_in_state("06").is_none());
    }

    #[test]
    fn test_unknown_county_is_an_error() {
        let crosswalk = Crosswalk::from_pairs([("17031", District::Chicago)]).unwrap();
        match crosswalk.district_for("17999") {
            Err(AggregationError::UnknownCounty(county)) => assert_eq!(county, "17999"),
            other => panic!("expected UnknownCounty, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_synthetic_districts() {
        let result = Crosswalk::from_pairs([("17031", District::Residual)]);
        assert!(matches!(result, Err(AggregationError::InvalidCrosswalk(_))));

        let csv = "county_fips,district\n17031,USDPV\n";
        assert!(Crosswalk::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_duplicate_counties() {
        let result = Crosswalk::from_pairs([
            ("29510", District::StLouis),
            ("29510", District::KansasCity),
        ]);
        match result {
            Err(AggregationError::InvalidCrosswalk(msg)) => {
                assert!(msg.contains("29510"));
                assert!(msg.contains("FRD08"));
                assert!(msg.contains("FRD10"));
            }
            other => panic!("expected InvalidCrosswalk, got {other:?}"),
        }

        let csv = "county_fips,district\n17031,FRD07\n17031,FRD07\n";
        assert!(Crosswalk::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_bad_county_codes() {
        assert!(Crosswalk::from_pairs([("1703", District::Chicago)]).is_err());
        assert!(Crosswalk::from_pairs([("C1703", District::Chicago)]).is_err());
    }
}
