//! Period keys: a year plus a quarter, or a year plus the annual marker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AggregationError;

/// Position within a year. `Annual` sorts after the four quarters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
    Annual,
}

impl Quarter {
    pub const QUARTERS: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Marker used in store keys and the `qtr` export column.
    pub fn marker(self) -> &'static str {
        match self {
            Quarter::Q1 => "1",
            Quarter::Q2 => "2",
            Quarter::Q3 => "3",
            Quarter::Q4 => "4",
            Quarter::Annual => "A",
        }
    }
}

impl FromStr for Quarter {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Quarter::Q1),
            "2" => Ok(Quarter::Q2),
            "3" => Ok(Quarter::Q3),
            "4" => Ok(Quarter::Q4),
            "A" | "a" => Ok(Quarter::Annual),
            other => Err(AggregationError::MalformedRecord(format!(
                "invalid quarter '{other}'"
            ))),
        }
    }
}

/// Top-level key of both stores, serialized as `YYYY_Q` or `YYYY_A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    pub year: i32,
    pub quarter: Quarter,
}

impl Period {
    pub fn quarterly(year: i32, quarter: Quarter) -> Self {
        Self { year, quarter }
    }

    pub fn annual(year: i32) -> Self {
        Self {
            year,
            quarter: Quarter::Annual,
        }
    }

    pub fn is_annual(&self) -> bool {
        self.quarter == Quarter::Annual
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.year, self.quarter.marker())
    }
}

impl FromStr for Period {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, quarter) = s
            .split_once('_')
            .ok_or_else(|| AggregationError::MalformedRecord(format!("invalid period '{s}'")))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| AggregationError::MalformedRecord(format!("invalid period year '{s}'")))?;
        Ok(Self {
            year,
            quarter: quarter.parse()?,
        })
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = AggregationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
