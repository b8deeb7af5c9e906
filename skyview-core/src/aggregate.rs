//! Folding three-hour forecast samples into one record per calendar day.
//!
//! The fold is a single pass that relies on the provider returning samples
//! in ascending time order. Output days appear in the order their first
//! sample appears; unordered input therefore yields appearance order, which
//! is accepted rather than corrected.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use std::collections::HashMap;

use crate::{
    config::DayBoundary,
    model::{DailyAggregate, RawConditionsSample},
};

/// Calendar date of `timestamp` in `tz`, or `None` if it is out of range.
pub fn local_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(tz).date_naive())
}

/// Aggregate samples per day using the given day boundary.
///
/// `utc_offset_secs` is the location's offset and only matters for
/// [`DayBoundary::Location`].
pub fn aggregate_daily(
    samples: &[RawConditionsSample],
    boundary: DayBoundary,
    utc_offset_secs: i32,
) -> Vec<DailyAggregate> {
    match boundary {
        DayBoundary::Local => aggregate_daily_in(samples, &Local),
        DayBoundary::Location => aggregate_daily_in(samples, &location_offset(utc_offset_secs)),
    }
}

/// Fixed offset for a location, falling back to UTC for out-of-range values.
pub fn location_offset(utc_offset_secs: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| {
        tracing::warn!(utc_offset_secs, "invalid location offset, using UTC");
        Utc.fix()
    })
}

pub fn aggregate_daily_in<Tz: TimeZone>(
    samples: &[RawConditionsSample],
    tz: &Tz,
) -> Vec<DailyAggregate> {
    let mut days: Vec<DailyAggregate> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for sample in samples {
        let Some(date) = local_date(sample.timestamp, tz) else {
            tracing::warn!(timestamp = sample.timestamp, "skipping sample with invalid timestamp");
            continue;
        };

        match index.get(&date) {
            Some(&i) => {
                let day = &mut days[i];
                day.temp_min = day.temp_min.min(sample.temp_min);
                day.temp_max = day.temp_max.max(sample.temp_max);
            }
            None => {
                index.insert(date, days.len());
                days.push(DailyAggregate {
                    date,
                    first_timestamp: sample.timestamp,
                    temp_min: sample.temp_min,
                    temp_max: sample.temp_max,
                    weather: sample.weather.clone(),
                });
            }
        }
    }

    days
}
