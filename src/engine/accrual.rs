use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// 365 × 24 × 3600. Leap years are ignored.
pub const SECONDS_PER_YEAR: Decimal = Decimal::from_parts(31_536_000, 0, 0, false, 0);

pub const SECONDS_PER_HOUR: Decimal = Decimal::from_parts(3_600, 0, 0, false, 0);

/// Notional position every session earns against.
pub const DEFAULT_PRINCIPAL: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Simple-interest yield on `principal` at annualized `rate` over `elapsed_secs`.
///
/// Negative elapsed time is clamped to zero.
pub fn accrue(principal: Decimal, elapsed_secs: Decimal, rate: Decimal) -> Decimal {
    if elapsed_secs <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    principal * rate * elapsed_secs / SECONDS_PER_YEAR
}

/// Seconds between two instants at millisecond precision, never negative.
pub fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> Decimal {
    let millis = (to - from).num_milliseconds().max(0);
    Decimal::new(millis, 3)
}

/// Projected hourly yield, derived from what `elapsed_secs` would have earned.
pub fn hourly_rate(principal: Decimal, elapsed_secs: Decimal, rate: Decimal) -> Decimal {
    if elapsed_secs <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    accrue(principal, elapsed_secs, rate) / elapsed_secs * SECONDS_PER_HOUR
}
