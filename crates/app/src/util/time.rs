use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Timelike, Utc};

use crate::error::{AppError, Result};
use usage_core::{BillingPeriod, Granularity, TimeWindow};

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid month {year}-{month:02}")))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::InvalidInput(format!("month out of range {year}-{month:02}")))?;
    Ok(next.signed_duration_since(first).num_days() as u32)
}

pub fn billing_period(now: DateTime<Utc>) -> Result<BillingPeriod> {
    Ok(BillingPeriod::new(
        now.year(),
        now.month(),
        now.format("%B %Y").to_string(),
        now.day(),
        days_in_month(now.year(), now.month())?,
    ))
}

pub fn month_start(now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    utc(now.year(), now.month(), 1, 0)
}

/// Window for the consumption query: from the first instant of the month to
/// the end of the bucket containing `now`, aligned to `granularity`.
pub fn consumption_window(now: DateTime<Utc>, granularity: Granularity) -> Result<TimeWindow> {
    let from = month_start(now)?;
    let to = match granularity {
        Granularity::Hourly => {
            utc(now.year(), now.month(), now.day(), now.hour())? + Duration::hours(1)
        }
        Granularity::Daily => utc(now.year(), now.month(), now.day(), 0)? + Duration::days(1),
        Granularity::Monthly => from
            .checked_add_months(Months::new(1))
            .ok_or_else(|| AppError::InvalidInput("month out of range".to_string()))?,
    };
    Ok(TimeWindow { from, to })
}

fn utc(year: i32, month: u32, day: u32, hour: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .ok_or_else(|| AppError::InvalidInput("invalid utc date".to_string()))
}
