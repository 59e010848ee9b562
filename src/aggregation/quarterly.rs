//! County-to-district aggregation for quarterly periods.

use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::aggregation::shares::{DistrictShareCalculator, ShareTable};
use crate::aggregation::types::{
    empty_district_map, DistrictMap, Field, FieldValues, QuarterlyMetrics,
};
use crate::aggregation::utility::{average_weekly_wage, round_half_even};
use crate::crosswalk::Crosswalk;
use crate::district::District;
use crate::error::AggregationError;
use crate::parser::{AggregationLevel, RawRecord};
use crate::period::Period;
use crate::store::QuarterlyStore;

pub struct QuarterlyAggregator<'a> {
    crosswalk: &'a Crosswalk,
}

impl<'a> QuarterlyAggregator<'a> {
    pub fn new(crosswalk: &'a Crosswalk) -> Self {
        Self { crosswalk }
    }

    /// Aggregates one slice of raw records into complete period entries.
    ///
    /// Every period present in `records` comes back with all fourteen
    /// districts, the residual reconciled and average weekly wages computed.
    pub fn aggregate(
        &self,
        records: &[RawRecord],
        shares: &ShareTable,
    ) -> Result<QuarterlyStore, AggregationError> {
        let mut sums: BTreeMap<Period, DistrictMap<FieldValues>> = BTreeMap::new();

        for record in records {
            let districts = sums.entry(record.period).or_insert_with(empty_district_map);

            match record.level {
                AggregationLevel::County if !record.is_suppressed() => {
                    if record.is_state_placeholder() {
                        self.prorate(record, shares, districts)?;
                    } else {
                        let district = self.crosswalk.district_for(&record.area_fips)?;
                        add_to(districts, district, &record.values);
                    }
                }
                AggregationLevel::StateTotal => {
                    add_to(districts, District::UsTotal, &record.values);
                }
                _ => {}
            }
        }

        let mut store = QuarterlyStore::default();
        for (period, mut districts) in sums {
            reconcile(&mut districts);
            debug!(%period, "Period aggregated");
            store.insert(period, finalize(districts));
        }

        Ok(store)
    }

    /// Spreads a placeholder row over its state's districts.
    ///
    /// Each district receives `round(value × weight)` per field; fields whose
    /// weight is undefined are not distributed.
    fn prorate(
        &self,
        record: &RawRecord,
        shares: &ShareTable,
        districts: &mut DistrictMap<FieldValues>,
    ) -> Result<(), AggregationError> {
        let weights = shares.weights(record.period, record.state()).ok_or_else(|| {
            AggregationError::UnknownState {
                state: record.state().to_string(),
                area_fips: record.area_fips.clone(),
            }
        })?;

        for (district, weights) in weights {
            let target = districts.entry(*district).or_default();
            for field in Field::ALL {
                if let Some(weight) = weights.get(field) {
                    *target.get_mut(field) +=
                        round_half_even(record.values.get(field) as f64 * weight);
                }
            }
        }

        Ok(())
    }
}

/// Computes shares and aggregates a slice in one pass.
#[instrument(skip_all, fields(records = records.len()))]
pub fn aggregate_slice(
    crosswalk: &Crosswalk,
    records: &[RawRecord],
) -> Result<QuarterlyStore, AggregationError> {
    let shares = DistrictShareCalculator::new(crosswalk).compute(records)?;
    QuarterlyAggregator::new(crosswalk).aggregate(records, &shares)
}

fn add_to(districts: &mut DistrictMap<FieldValues>, district: District, values: &FieldValues) {
    districts.entry(district).or_default().add(values);
}

/// Sets the residual district to the national total minus the twelve
/// regional districts, per field.
pub fn reconcile(districts: &mut DistrictMap<FieldValues>) {
    let national = districts.get(&District::UsTotal).copied().unwrap_or_default();

    let mut regional = FieldValues::default();
    for district in District::REGIONAL {
        if let Some(values) = districts.get(&district) {
            regional.add(values);
        }
    }

    let residual = districts.entry(District::Residual).or_default();
    for field in Field::ALL {
        *residual.get_mut(field) = national.get(field) - regional.get(field);
    }
}

fn finalize(districts: DistrictMap<FieldValues>) -> DistrictMap<QuarterlyMetrics> {
    districts
        .into_iter()
        .map(|(district, totals)| {
            let wage = average_weekly_wage(totals.total_qtrly_wages, totals.total_emplvl());
            (district, QuarterlyMetrics::from_totals(totals, wage))
        })
        .collect()
}
