//! District shares of each state's disclosed county data.
//!
//! Placeholder rows (`SS999`) carry county data that cannot be attributed to a
//! single county. They are prorated across the state's districts using the
//! distribution observed among the state's disclosed counties in the same
//! period, which is what this module computes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::aggregation::types::{Field, FieldValues, FieldWeights};
use crate::crosswalk::Crosswalk;
use crate::district::District;
use crate::error::AggregationError;
use crate::parser::{AggregationLevel, RawRecord};
use crate::period::Period;

/// Allocation key for one aggregation pass, keyed by (period, state).
#[derive(Debug, Clone, Default)]
pub struct ShareTable {
    entries: HashMap<(Period, String), BTreeMap<District, FieldWeights>>,
}

impl ShareTable {
    /// Weights for every district of `state` in `period`.
    pub fn weights(&self, period: Period, state: &str) -> Option<&BTreeMap<District, FieldWeights>> {
        self.entries.get(&(period, state.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct DistrictShareCalculator<'a> {
    crosswalk: &'a Crosswalk,
}

impl<'a> DistrictShareCalculator<'a> {
    pub fn new(crosswalk: &'a Crosswalk) -> Self {
        Self { crosswalk }
    }

    /// Builds the share table for every period present in `records` and every
    /// state known to the crosswalk.
    ///
    /// A weight is `district / state total` when the state total for that field
    /// is positive, otherwise `None` for every district of the state.
    pub fn compute(&self, records: &[RawRecord]) -> Result<ShareTable, AggregationError> {
        let mut periods = BTreeSet::new();
        let mut observed: HashMap<(Period, String), BTreeMap<District, FieldValues>> =
            HashMap::new();

        for record in records {
            periods.insert(record.period);

            if record.level != AggregationLevel::County || record.is_state_placeholder() {
                continue;
            }

            let district = self.crosswalk.district_for(&record.area_fips)?;
            observed
                .entry((record.period, record.state().to_string()))
                .or_default()
                .entry(district)
                .or_default()
                .add(&record.values);
        }

        let mut table = ShareTable::default();

        for period in periods {
            for (state, districts) in self.crosswalk.states() {
                let key = (period, state.to_string());
                let by_district = observed.get(&key);

                let mut state_total = FieldValues::default();
                if let Some(by_district) = by_district {
                    for values in by_district.values() {
                        state_total.add(values);
                    }
                }

                let weights = districts
                    .iter()
                    .map(|district| {
                        let value = by_district
                            .and_then(|m| m.get(district))
                            .copied()
                            .unwrap_or_default();

                        let mut weights = FieldWeights::default();
                        for field in Field::ALL {
                            let total = state_total.get(field);
                            weights.set(
                                field,
                                (total > 0).then(|| value.get(field) as f64 / total as f64),
                            );
                        }
                        (*district, weights)
                    })
                    .collect();

                table.entries.insert(key, weights);
            }
        }

        debug!(entries = table.len(), "District shares computed");
        Ok(table)
    }
}
