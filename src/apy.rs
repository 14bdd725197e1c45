/// Number of days a funding rate is compounded over.
pub const DAYS_PER_YEAR: i32 = 365;

/// 8-hour funding: three payments a day.
pub const DEFAULT_PERIODS_PER_DAY: u32 = 3;

/// Converts a periodic funding rate into a compounded annual yield, in percent.
///
/// `rate` is the fraction paid per funding period (0.0001 = 0.01%) and
/// `periods_per_day` the number of funding payments per day. The input
/// domain is not checked: rates at or below -1 produce NaN or nonsense,
/// and very large rates overflow to infinity.
pub fn calculate_apy(rate: f64, periods_per_day: u32) -> f64 {
    let daily_rate = (1.0 + rate).powf(f64::from(periods_per_day)) - 1.0;
    let annual_rate = (1.0 + daily_rate).powi(DAYS_PER_YEAR) - 1.0;
    annual_rate * 100.0
}
