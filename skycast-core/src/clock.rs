//! Timezone-adjusted time formatting and the live city clock.
//!
//! Offsets are the provider's "seconds east of UTC" values.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};

fn offset(tz_offset: i32) -> FixedOffset {
    FixedOffset::east_opt(tz_offset).unwrap_or_else(|| {
        tracing::warn!(tz_offset, "timezone offset out of range, using UTC");
        Utc.fix()
    })
}

fn local(unix: i64, tz_offset: i32) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(unix, 0).map(|utc| utc.with_timezone(&offset(tz_offset)))
}

/// "HH:MM" at the city's offset.
pub fn unix_to_time(unix: i64, tz_offset: i32) -> String {
    local(unix, tz_offset).map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
}

/// Short weekday ("Mon") at the city's offset.
pub fn unix_to_day(unix: i64, tz_offset: i32) -> String {
    local(unix, tz_offset).map(|t| t.format("%a").to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CityTime {
    /// "HH:MM:SS"
    pub time: String,
    /// "Monday"
    pub day: String,
}

pub fn city_time(now: DateTime<Utc>, tz_offset: i32) -> CityTime {
    let t = now.with_timezone(&offset(tz_offset));
    CityTime {
        time: t.format("%H:%M:%S").to_string(),
        day: t.format("%A").to_string(),
    }
}

/// Ticks once per second, publishing the city's local time. The ticker stops
/// when the clock is dropped.
#[derive(Debug)]
pub struct CityClock {
    rx: watch::Receiver<CityTime>,
    ticker: JoinHandle<()>,
}

impl CityClock {
    pub fn start(tz_offset: i32) -> Self {
        let (tx, rx) = watch::channel(city_time(Utc::now(), tz_offset));

        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                if tx.send(city_time(Utc::now(), tz_offset)).is_err() {
                    break;
                }
            }
        });

        Self { rx, ticker }
    }

    pub fn now(&self) -> CityTime {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CityTime> {
        self.rx.clone()
    }
}

impl Drop for CityClock {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
