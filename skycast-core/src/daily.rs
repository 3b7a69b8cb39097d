//! Rolling the 3-hourly forecast up into per-day summaries.

use chrono::NaiveDate;

use crate::{clock::unix_to_day, model::ForecastItem};

/// Samples per day in the provider's 3-hourly list.
pub const SAMPLES_PER_DAY: usize = 8;
/// Entries the provider returns for five days.
pub const FIVE_DAY_SAMPLES: usize = 5 * SAMPLES_PER_DAY;

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    /// Short weekday of the chunk's first sample.
    pub day: String,
    /// Kelvin.
    pub min_temp: f64,
    /// Kelvin.
    pub max_temp: f64,
}

/// Summarize one chunk of samples. `None` for an empty chunk.
pub fn summarize_day(samples: &[ForecastItem], tz_offset: i32) -> Option<DailySummary> {
    let first = samples.first()?;

    let (min_temp, max_temp) = samples.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), s| (lo.min(s.main.temp_min), hi.max(s.main.temp_max)),
    );

    Some(DailySummary {
        day: unix_to_day(first.dt, tz_offset),
        min_temp,
        max_temp,
    })
}

/// Partition the first 40 samples into contiguous chunks of 8 and summarize
/// each one.
///
/// The provider contract is exactly 40 entries. A shorter list is not padded
/// or validated: the trailing chunk comes out short and missing chunks are
/// simply absent.
pub fn aggregate_five_day(list: &[ForecastItem], tz_offset: i32) -> Vec<DailySummary> {
    let window = &list[..list.len().min(FIVE_DAY_SAMPLES)];

    window
        .chunks(SAMPLES_PER_DAY)
        .filter_map(|chunk| summarize_day(chunk, tz_offset))
        .collect()
}

/// Samples whose `dt_txt` (UTC) falls on `today`.
pub fn todays_entries(list: &[ForecastItem], today: NaiveDate) -> Vec<&ForecastItem> {
    let prefix = today.format("%Y-%m-%d").to_string();
    list.iter().filter(|item| item.dt_txt.starts_with(&prefix)).collect()
}
