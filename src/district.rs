//! The fixed set of aggregation targets: twelve Federal Reserve districts,
//! the residual district and the national total.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AggregationError;

/// One of the fourteen keys of every period entry in a store.
///
/// Variant order matches the lexical order of the codes, so iterating a
/// `BTreeMap<District, _>` yields rows sorted by area code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum District {
    #[serde(rename = "FRD01")]
    Boston,
    #[serde(rename = "FRD02")]
    NewYork,
    #[serde(rename = "FRD03")]
    Philadelphia,
    #[serde(rename = "FRD04")]
    Cleveland,
    #[serde(rename = "FRD05")]
    Richmond,
    #[serde(rename = "FRD06")]
    Atlanta,
    #[serde(rename = "FRD07")]
    Chicago,
    #[serde(rename = "FRD08")]
    StLouis,
    #[serde(rename = "FRD09")]
    Minneapolis,
    #[serde(rename = "FRD10")]
    KansasCity,
    #[serde(rename = "FRD11")]
    Dallas,
    #[serde(rename = "FRD12")]
    SanFrancisco,
    /// Gap between the national total and the twelve regional districts.
    #[serde(rename = "FRD99")]
    Residual,
    /// National total, summed from state-total rows.
    #[serde(rename = "USDPV")]
    UsTotal,
}

impl District {
    /// The twelve regional districts a county can belong to.
    pub const REGIONAL: [District; 12] = [
        District::Boston,
        District::NewYork,
        District::Philadelphia,
        District::Cleveland,
        District::Richmond,
        District::Atlanta,
        District::Chicago,
        District::StLouis,
        District::Minneapolis,
        District::KansasCity,
        District::Dallas,
        District::SanFrancisco,
    ];

    /// Every key present in a store period entry.
    pub const ALL: [District; 14] = [
        District::Boston,
        District::NewYork,
        District::Philadelphia,
        District::Cleveland,
        District::Richmond,
        District::Atlanta,
        District::Chicago,
        District::StLouis,
        District::Minneapolis,
        District::KansasCity,
        District::Dallas,
        District::SanFrancisco,
        District::Residual,
        District::UsTotal,
    ];

    pub fn code(self) -> &'static str {
        match self {
            District::Boston => "FRD01",
            District::NewYork => "FRD02",
            District::Philadelphia => "FRD03",
            District::Cleveland => "FRD04",
            District::Richmond => "FRD05",
            District::Atlanta => "FRD06",
            District::Chicago => "FRD07",
            District::StLouis => "FRD08",
            District::Minneapolis => "FRD09",
            District::KansasCity => "FRD10",
            District::Dallas => "FRD11",
            District::SanFrancisco => "FRD12",
            District::Residual => "FRD99",
            District::UsTotal => "USDPV",
        }
    }

    /// Short name of the district's reserve bank city.
    pub fn name(self) -> &'static str {
        match self {
            District::Boston => "Boston",
            District::NewYork => "New York",
            District::Philadelphia => "Philadelphia",
            District::Cleveland => "Cleveland",
            District::Richmond => "Richmond",
            District::Atlanta => "Atlanta",
            District::Chicago => "Chicago",
            District::StLouis => "St. Louis",
            District::Minneapolis => "Minneapolis",
            District::KansasCity => "Kansas City",
            District::Dallas => "Dallas",
            District::SanFrancisco => "San Francisco",
            District::Residual => "Unknown",
            District::UsTotal => "Total U.S.",
        }
    }

    /// Display title used in tabular exports.
    pub fn title(self) -> String {
        match self {
            District::UsTotal => self.name().to_string(),
            _ => format!("{} -- Federal Reserve District", self.name()),
        }
    }

    pub fn is_regional(self) -> bool {
        !matches!(self, District::Residual | District::UsTotal)
    }
}

impl fmt::Display for District {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for District {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        District::ALL
            .into_iter()
            .find(|d| d.code() == s.trim())
            .ok_or_else(|| AggregationError::InvalidCrosswalk(format!("unknown district code '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_str() {
        for district in District::ALL {
            assert_eq!(district.code().parse::<District>().unwrap(), district);
        }
        assert!("FRD13".parse::<District>().is_err());
    }

    #[test]
    fn test_order_matches_code_order() {
        let mut codes: Vec<&str> = District::ALL.iter().map(|d| d.code()).collect();
        let declared = codes.clone();
        codes.sort();
        assert_eq!(codes, declared);
    }

    #[test]
    fn test_titles() {
        assert_eq!(District::UsTotal.title(), "Total U.S.");
        assert_eq!(
            District::StLouis.title(),
            "St. Louis -- Federal Reserve District"
        );
        assert_eq!(District::Residual.title(), "Unknown -- Federal Reserve District");
    }

    #[test]
    fn test_only_twelve_are_regional() {
        assert_eq!(District::ALL.iter().filter(|d| d.is_regional()).count(), 12);
    }
}
