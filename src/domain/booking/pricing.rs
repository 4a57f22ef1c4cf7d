//! Per-day linear pricing

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::DomainResult;
use crate::shared::DomainError;

/// Largest amount a `DECIMAL(10,2)` money column holds: 99 999 999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2);

/// Whole days billed for `[start, end)`; any partial day counts as a full day.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<i64> {
    let span = end - start;
    if span <= Duration::zero() {
        return Err(DomainError::Validation(
            "End date must be after start date".into(),
        ));
    }
    let whole = span.num_days();
    if span > Duration::days(whole) {
        Ok(whole + 1)
    } else {
        Ok(whole)
    }
}

pub fn quote(start: DateTime<Utc>, end: DateTime<Utc>, daily_rate: Decimal) -> DomainResult<Decimal> {
    let days = rental_days(start, end)?;
    Decimal::from(days)
        .checked_mul(daily_rate)
        .filter(|total| *total <= MAX_AMOUNT)
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "Total price exceeds the maximum of {} for a single booking",
                MAX_AMOUNT
            ))
        })
}
