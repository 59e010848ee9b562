//! Quarterly-to-annual fold.

use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

use crate::aggregation::types::{empty_district_map, AnnualMetrics, DistrictMap};
use crate::aggregation::utility::rounded_ratio;
use crate::district::District;
use crate::period::{Period, Quarter};
use crate::store::{AnnualStore, QuarterlyStore};

/// Running sums for one district over the four quarters of a year.
#[derive(Debug, Default, Clone, Copy)]
struct AnnualSums {
    estabs: i64,
    emplvl: i64,
    wages: i64,
}

impl AnnualSums {
    fn finish(self) -> AnnualMetrics {
        let annual_avg_estabs_count = rounded_ratio(self.estabs, 4).unwrap_or_default();
        let annual_avg_emplvl = rounded_ratio(self.emplvl, 12).unwrap_or_default();

        let (avg_annual_pay, annual_avg_wkly_wage) = if annual_avg_emplvl > 0 {
            let pay = rounded_ratio(self.wages, annual_avg_emplvl);
            (pay, pay.and_then(|pay| rounded_ratio(pay, 52)))
        } else {
            (None, None)
        };

        AnnualMetrics {
            annual_avg_estabs_count,
            annual_avg_emplvl,
            total_annual_wages: self.wages,
            annual_avg_wkly_wage,
            avg_annual_pay,
        }
    }
}

/// Years for which all four quarters are present.
pub fn complete_years(quarterly: &QuarterlyStore) -> Vec<i32> {
    let years: BTreeSet<i32> = quarterly
        .periods()
        .filter(|p| !p.is_annual())
        .map(|p| p.year)
        .collect();

    years
        .into_iter()
        .filter(|&year| {
            let complete = Quarter::QUARTERS
                .iter()
                .all(|&q| quarterly.contains(&Period::quarterly(year, q)));
            if !complete {
                debug!(year, "Skipping incomplete year");
            }
            complete
        })
        .collect()
}

/// Rebuilds the annual store from scratch.
///
/// Establishments are the average of the four quarterly counts, employment
/// the average of the twelve monthly levels, and wages the plain sum. Annual
/// pay and weekly wage are `None` unless average employment is positive.
#[instrument(skip_all, fields(quarters = quarterly.len()))]
pub fn aggregate_annual(quarterly: &QuarterlyStore) -> AnnualStore {
    let mut annual = AnnualStore::default();

    for year in complete_years(quarterly) {
        let mut sums: DistrictMap<AnnualSums> = empty_district_map();

        for quarter in Quarter::QUARTERS {
            let Some(districts) = quarterly.get(&Period::quarterly(year, quarter)) else {
                continue;
            };
            for district in District::ALL {
                let Some(metrics) = districts.get(&district) else {
                    continue;
                };
                let totals = metrics.totals();
                let entry = sums.entry(district).or_default();
                entry.estabs += totals.qtrly_estabs_count;
                entry.emplvl += totals.total_emplvl();
                entry.wages += totals.total_qtrly_wages;
            }
        }

        let districts = sums
            .into_iter()
            .map(|(district, sums)| (district, sums.finish()))
            .collect();
        annual.insert(Period::annual(year), districts);
    }

    info!(years = annual.len(), "Annual store rebuilt");
    annual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::types::QuarterlyMetrics;

    fn quarter_entry(estabs: i64, emplvl: [i64; 3], wages: i64) -> DistrictMap<QuarterlyMetrics> {
        let mut districts: DistrictMap<QuarterlyMetrics> = empty_district_map();
        let richmond = districts.get_mut(&District::Richmond).unwrap();
        richmond.qtrly_estabs_count = estabs;
        richmond.month1_emplvl = emplvl[0];
        richmond.month2_emplvl = emplvl[1];
        richmond.month3_emplvl = emplvl[2];
        richmond.total_qtrly_wages = wages;
        districts
    }

    fn store_with(quarters: &[Quarter]) -> QuarterlyStore {
        let mut store = QuarterlyStore::default();
        for &q in quarters {
            store.insert(Period::quarterly(2022, q), quarter_entry(10, [100, 110, 105], 1_000_000));
        }
        store
    }

    #[test]
    fn test_incomplete_year_is_excluded() {
        let store = store_with(&[Quarter::Q1, Quarter::Q2, Quarter::Q3]);
        assert!(complete_years(&store).is_empty());
        assert!(aggregate_annual(&store).is_empty());
    }

    #[test]
    fn test_complete_year_is_averaged() {
        let mut store = store_with(&[Quarter::Q1, Quarter::Q2, Quarter::Q4]);
        store.insert(
            Period::quarterly(2022, Quarter::Q3),
            quarter_entry(11, [120, 130, 125], 1_200_000),
        );

        let annual = aggregate_annual(&store);
        let entry = annual.get(&Period::annual(2022)).unwrap();
        let richmond = entry[&District::Richmond];

        assert_eq!(entry.len(), 14);
        // (10 * 3 + 11) / 4 = 10.25
        assert_eq!(richmond.annual_avg_estabs_count, 10);
        // (315 * 3 + 375) / 12 = 110
        assert_eq!(richmond.annual_avg_emplvl, 110);
        assert_eq!(richmond.total_annual_wages, 4_200_000);
        // 4_200_000 / 110 = 38181.8 -> 38182; 38182 / 52 = 734.27 -> 734
        assert_eq!(richmond.avg_annual_pay, Some(38_182));
        assert_eq!(richmond.annual_avg_wkly_wage, Some(734));
    }

    #[test]
    fn test_zero_employment_yields_undefined_pay() {
        let store = store_with(&Quarter::QUARTERS);
        let annual = aggregate_annual(&store);
        let boston = annual.get(&Period::annual(2022)).unwrap()[&District::Boston];

        assert_eq!(boston.annual_avg_emplvl, 0);
        assert_eq!(boston.avg_annual_pay, None);
        assert_eq!(boston.annual_avg_wkly_wage, None);
    }

    #[test]
    fn test_estabs_rounding_is_half_even() {
        let mut store = QuarterlyStore::default();
        for (q, estabs) in Quarter::QUARTERS.into_iter().zip([1, 1, 0, 0]) {
            store.insert(Period::quarterly(2022, q), quarter_entry(estabs, [0, 0, 0], 0));
        }
        // 2 / 4 = 0.5 rounds to 0
        let annual = aggregate_annual(&store);
        assert_eq!(
            annual.get(&Period::annual(2022)).unwrap()[&District::Richmond].annual_avg_estabs_count,
            0
        );
    }
}
