//! Quota cycle boundaries.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use vestibulare_core::config::QuotaCycle;

/// Start of the quota cycle containing `now`, or `None` when the cycle never resets.
///
/// Monthly and annual cycles follow calendar boundaries in `offset`.
pub fn cycle_start(
    cycle: QuotaCycle,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let local = now.with_timezone(&offset);
    let first_day = match cycle {
        QuotaCycle::Lifetime => return None,
        QuotaCycle::Monthly => NaiveDate::from_ymd_opt(local.year(), local.month(), 1)?,
        QuotaCycle::Annual => NaiveDate::from_ymd_opt(local.year(), 1, 1)?,
    };
    offset
        .from_local_datetime(&first_day.and_time(NaiveTime::MIN))
        .single()
        .map(|start| start.with_timezone(&Utc))
}
