//! Data types used by the aggregation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::district::District;

/// The five additive fields carried by every raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    EstabsCount,
    Month1Emplvl,
    Month2Emplvl,
    Month3Emplvl,
    TotalWages,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::EstabsCount,
        Field::Month1Emplvl,
        Field::Month2Emplvl,
        Field::Month3Emplvl,
        Field::TotalWages,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::EstabsCount => "qtrly_estabs_count",
            Field::Month1Emplvl => "month1_emplvl",
            Field::Month2Emplvl => "month2_emplvl",
            Field::Month3Emplvl => "month3_emplvl",
            Field::TotalWages => "total_qtrly_wages",
        }
    }
}

/// Values of the five additive fields. Zero-initialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValues {
    pub qtrly_estabs_count: i64,
    pub month1_emplvl: i64,
    pub month2_emplvl: i64,
    pub month3_emplvl: i64,
    pub total_qtrly_wages: i64,
}

impl FieldValues {
    pub fn get(&self, field: Field) -> i64 {
        match field {
            Field::EstabsCount => self.qtrly_estabs_count,
            Field::Month1Emplvl => self.month1_emplvl,
            Field::Month2Emplvl => self.month2_emplvl,
            Field::Month3Emplvl => self.month3_emplvl,
            Field::TotalWages => self.total_qtrly_wages,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut i64 {
        match field {
            Field::EstabsCount => &mut self.qtrly_estabs_count,
            Field::Month1Emplvl => &mut self.month1_emplvl,
            Field::Month2Emplvl => &mut self.month2_emplvl,
            Field::Month3Emplvl => &mut self.month3_emplvl,
            Field::TotalWages => &mut self.total_qtrly_wages,
        }
    }

    pub fn add(&mut self, other: &FieldValues) {
        for field in Field::ALL {
            *self.get_mut(field) += other.get(field);
        }
    }

    /// Sum of the three monthly employment levels.
    pub fn total_emplvl(&self) -> i64 {
        self.month1_emplvl + self.month2_emplvl + self.month3_emplvl
    }
}

/// Per-district bundle of a quarterly store entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyMetrics {
    pub qtrly_estabs_count: i64,
    pub month1_emplvl: i64,
    pub month2_emplvl: i64,
    pub month3_emplvl: i64,
    pub total_qtrly_wages: i64,
    /// `None` when average monthly employment is not positive.
    pub avg_wkly_wage: Option<i64>,
}

impl QuarterlyMetrics {
    pub fn totals(&self) -> FieldValues {
        FieldValues {
            qtrly_estabs_count: self.qtrly_estabs_count,
            month1_emplvl: self.month1_emplvl,
            month2_emplvl: self.month2_emplvl,
            month3_emplvl: self.month3_emplvl,
            total_qtrly_wages: self.total_qtrly_wages,
        }
    }

    pub fn from_totals(totals: FieldValues, avg_wkly_wage: Option<i64>) -> Self {
        Self {
            qtrly_estabs_count: totals.qtrly_estabs_count,
            month1_emplvl: totals.month1_emplvl,
            month2_emplvl: totals.month2_emplvl,
            month3_emplvl: totals.month3_emplvl,
            total_qtrly_wages: totals.total_qtrly_wages,
            avg_wkly_wage,
        }
    }
}

/// Per-district bundle of an annual store entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualMetrics {
    pub annual_avg_estabs_count: i64,
    pub annual_avg_emplvl: i64,
    pub total_annual_wages: i64,
    pub annual_avg_wkly_wage: Option<i64>,
    pub avg_annual_pay: Option<i64>,
}

/// One store period entry: all fourteen districts.
pub type DistrictMap<M> = BTreeMap<District, M>;

/// A district map with every district present and zeroed.
pub fn empty_district_map<M: Default>() -> DistrictMap<M> {
    District::ALL.into_iter().map(|d| (d, M::default())).collect()
}

/// Fractional weight per field; `None` when the state total is not positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldWeights([Option<f64>; 5]);

impl FieldWeights {
    pub fn get(&self, field: Field) -> Option<f64> {
        self.0[field.index()]
    }

    pub fn set(&mut self, field: Field, weight: Option<f64>) {
        self.0[field.index()] = weight;
    }
}
