//! Tabular CSV export of the stores.
//!
//! One row per (period, district) with data, sorted by year, quarter and
//! area code. Rows whose values are all zero, negative or null are skipped.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::aggregation::types::{AnnualMetrics, QuarterlyMetrics};
use crate::district::District;
use crate::period::Period;
use crate::store::Store;

/// A store bundle that can be flattened into one export row.
pub trait Exportable {
    type Row: Serialize;

    /// True when at least one value is a positive number.
    fn has_data(&self) -> bool;

    fn to_row(&self, period: &Period, district: District) -> Self::Row;
}

#[derive(Debug, Serialize, PartialEq)]
pub struct QuarterlyRow {
    pub year: i32,
    pub qtr: &'static str,
    pub area_code: &'static str,
    pub area_title: String,
    pub qtrly_estabs_count: i64,
    pub month1_emplvl: i64,
    pub month2_emplvl: i64,
    pub month3_emplvl: i64,
    pub total_qtrly_wages: i64,
    pub avg_wkly_wage: Option<i64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AnnualRow {
    pub year: i32,
    pub qtr: &'static str,
    pub area_code: &'static str,
    pub area_title: String,
    pub annual_avg_estabs_count: i64,
    pub annual_avg_emplvl: i64,
    pub total_annual_wages: i64,
    pub annual_avg_wkly_wage: Option<i64>,
    pub avg_annual_pay: Option<i64>,
}

impl Exportable for QuarterlyMetrics {
    type Row = QuarterlyRow;

    fn has_data(&self) -> bool {
        [
            self.qtrly_estabs_count,
            self.month1_emplvl,
            self.month2_emplvl,
            self.month3_emplvl,
            self.total_qtrly_wages,
        ]
        .into_iter()
        .chain(self.avg_wkly_wage)
        .any(|v| v > 0)
    }

    fn to_row(&self, period: &Period, district: District) -> QuarterlyRow {
        QuarterlyRow {
            year: period.year,
            qtr: period.quarter.marker(),
            area_code: district.code(),
            area_title: district.title(),
            qtrly_estabs_count: self.qtrly_estabs_count,
            month1_emplvl: self.month1_emplvl,
            month2_emplvl: self.month2_emplvl,
            month3_emplvl: self.month3_emplvl,
            total_qtrly_wages: self.total_qtrly_wages,
            avg_wkly_wage: self.avg_wkly_wage,
        }
    }
}

impl Exportable for AnnualMetrics {
    type Row = AnnualRow;

    fn has_data(&self) -> bool {
        [
            self.annual_avg_estabs_count,
            self.annual_avg_emplvl,
            self.total_annual_wages,
        ]
        .into_iter()
        .chain(self.annual_avg_wkly_wage)
        .chain(self.avg_annual_pay)
        .any(|v| v > 0)
    }

    fn to_row(&self, period: &Period, district: District) -> AnnualRow {
        AnnualRow {
            year: period.year,
            qtr: period.quarter.marker(),
            area_code: district.code(),
            area_title: district.title(),
            annual_avg_estabs_count: self.annual_avg_estabs_count,
            annual_avg_emplvl: self.annual_avg_emplvl,
            total_annual_wages: self.total_annual_wages,
            annual_avg_wkly_wage: self.annual_avg_wkly_wage,
            avg_annual_pay: self.avg_annual_pay,
        }
    }
}

/// Flattens a store into sorted export rows.
pub fn tabulate<M: Exportable>(store: &Store<M>) -> Vec<M::Row> {
    store
        .iter()
        .flat_map(|(period, districts)| {
            districts
                .iter()
                .filter(|(_, metrics)| metrics.has_data())
                .map(move |(district, metrics)| metrics.to_row(period, *district))
        })
        .collect()
}

/// Writes the export rows of `store` to a CSV file, replacing it.
///
/// Returns the number of data rows written.
pub fn write_csv<M: Exportable>(path: impl AsRef<Path>, store: &Store<M>) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    debug!(path = %path.display(), "Writing CSV export");

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let rows = tabulate(store);
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "CSV export written");
    Ok(rows.len())
}
