/// Rounds half-way cases to the nearest even integer, the convention used by
/// the published QCEW tables this series is checked against.
pub fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Rounded quotient, or `None` when the denominator is zero.
pub fn rounded_ratio(numerator: i64, denominator: i64) -> Option<i64> {
    if denominator == 0 {
        return None;
    }
    Some(round_half_even(numerator as f64 / denominator as f64))
}

/// Average weekly wage for one quarter (13 weeks).
///
/// Returns `None` unless the rounded average monthly employment is positive.
pub fn average_weekly_wage(total_wages: i64, total_emplvl: i64) -> Option<i64> {
    let avg_monthly_emplvl = round_half_even(total_emplvl as f64 / 3.0);
    if avg_monthly_emplvl <= 0 {
        return None;
    }
    Some(round_half_even(
        total_wages as f64 / avg_monthly_emplvl as f64 / 13.0,
    ))
}
