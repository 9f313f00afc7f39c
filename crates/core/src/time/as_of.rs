use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};

/// Date the analysis prompt is stamped with.
///
/// With an explicit offset the date is taken in that zone, otherwise in the host's local zone.
pub fn resolve_as_of_date(
    now_utc: DateTime<Utc>,
    utc_offset_hours: Option<i32>,
) -> anyhow::Result<NaiveDate> {
    match utc_offset_hours {
        Some(hours) => {
            let offset = hours
                .checked_mul(3600)
                .and_then(FixedOffset::east_opt)
                .with_context(|| format!("invalid UTC offset: {hours}h"))?;
            Ok(now_utc.with_timezone(&offset).date_naive())
        }
        None => Ok(now_utc.with_timezone(&Local).date_naive()),
    }
}
