//! CSV parser for QCEW record slices.
//!
//! Accepts both the historical single-file layout and the open-data API
//! layout. The two differ in the establishment-count column name
//! (`qtrly_estabs` vs `qtrly_estabs_count`); both deserialize into the same
//! field. Every other expected column must be present.

use serde::Deserialize;
use std::io::Read;
use tracing::debug;

use crate::aggregation::types::FieldValues;
use crate::error::AggregationError;
use crate::period::{Period, Quarter};

/// Code marking a placeholder geography (`SS999`) in characters 3 and 4.
const PLACEHOLDER_MARKER: &str = "99";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationLevel {
    /// `70`: a single county, total covered, all industries.
    County,
    /// `50`: a state total, all industries.
    StateTotal,
    Other,
}

impl AggregationLevel {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "70" => AggregationLevel::County,
            "50" => AggregationLevel::StateTotal,
            _ => AggregationLevel::Other,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    area_fips: String,
    agglvl_code: String,
    year: i32,
    qtr: String,
    disclosure_code: String,
    #[serde(alias = "qtrly_estabs")]
    qtrly_estabs_count: i64,
    month1_emplvl: i64,
    month2_emplvl: i64,
    month3_emplvl: i64,
    total_qtrly_wages: i64,
}

/// One source row for a single period, geography and aggregation level.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub period: Period,
    pub area_fips: String,
    pub level: AggregationLevel,
    pub disclosure_code: String,
    pub values: FieldValues,
}

impl RawRecord {
    /// Two-digit state code of the geography.
    pub fn state(&self) -> &str {
        self.area_fips.get(0..2).unwrap_or_default()
    }

    /// True for `SS99x` rows that stand in for undisclosed counties.
    pub fn is_state_placeholder(&self) -> bool {
        self.area_fips.get(2..4) == Some(PLACEHOLDER_MARKER)
    }

    pub fn is_suppressed(&self) -> bool {
        !self.disclosure_code.is_empty()
    }

    fn from_row(row: CsvRow) -> Result<Self, AggregationError> {
        let quarter: Quarter = row.qtr.parse()?;
        if quarter == Quarter::Annual {
            return Err(AggregationError::MalformedRecord(format!(
                "annual row for {} in a quarterly slice",
                row.area_fips
            )));
        }

        let level = AggregationLevel::from_code(&row.agglvl_code);
        let area_fips = row.area_fips.trim().to_string();
        if level != AggregationLevel::Other && (area_fips.len() != 5 || !area_fips.is_ascii()) {
            return Err(AggregationError::MalformedRecord(format!(
                "geography code '{area_fips}' is not five characters"
            )));
        }

        Ok(RawRecord {
            period: Period::quarterly(row.year, quarter),
            area_fips,
            level,
            disclosure_code: row.disclosure_code.trim().to_string(),
            values: FieldValues {
                qtrly_estabs_count: row.qtrly_estabs_count,
                month1_emplvl: row.month1_emplvl,
                month2_emplvl: row.month2_emplvl,
                month3_emplvl: row.month3_emplvl,
                total_qtrly_wages: row.total_qtrly_wages,
            },
        })
    }
}

/// Parses a full CSV slice. Any malformed row fails the whole slice.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<RawRecord>, AggregationError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for result in rdr.deserialize() {
        let row: CsvRow = result?;
        records.push(RawRecord::from_row(row)?);
    }

    debug!(records = records.len(), "Parsed QCEW slice");
    Ok(records)
}
