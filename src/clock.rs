//! Time source for daybook.
//!
//! Timestamps are unix seconds. A "day stamp" is the unix-seconds value of
//! local midnight for a calendar day; it is the unit stored in
//! `datesActive`.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Unix seconds.
pub type Timestamp = i64;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn timestamp(&self) -> Timestamp {
        self.now().timestamp()
    }

    /// The current local calendar day.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }

    /// Day stamp for the current local calendar day.
    fn today_stamp(&self) -> Timestamp {
        day_stamp(self.today())
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    at: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at: Mutex::new(at) }
    }

    /// A clock at noon local time on `date`.
    pub fn on_date(date: NaiveDate) -> Self {
        Self::new(Utc.timestamp_opt(day_stamp(date) + 12 * 3600, 0).single().unwrap_or_default())
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut guard) = self.at.lock() {
            *guard = at;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.at.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at.lock().map(|guard| *guard).unwrap_or_default()
    }
}

/// Unix seconds of the first instant of `date` in local time.
///
/// Falls back to the first valid hour when midnight does not exist locally
/// (DST gaps), and to UTC midnight if the zone rejects both.
pub fn day_stamp(date: NaiveDate) -> Timestamp {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map(|start| start.timestamp())
        .unwrap_or_else(|| midnight.and_utc().timestamp())
}

/// Local calendar day containing `stamp`.
pub fn date_of(stamp: Timestamp) -> Option<NaiveDate> {
    Local
        .timestamp_opt(stamp, 0)
        .earliest()
        .map(|at| at.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_stamp_is_start_of_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).expect("date");
        let stamp = day_stamp(date);
        assert_eq!(date_of(stamp), Some(date));
        assert_eq!(date_of(stamp - 1), date.pred_opt());
    }

    #[test]
    fn day_stamps_increase_by_day() {
        let first = NaiveDate::from_ymd_opt(2026, 10, 17).expect("date");
        let second = first.succ_opt().expect("next day");
        assert!(day_stamp(second) > day_stamp(first));
    }

    #[test]
    fn fixed_clock_advances() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).expect("date");
        let clock = FixedClock::on_date(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.today_stamp(), day_stamp(date));

        clock.advance(Duration::days(1));
        assert_eq!(clock.today(), date.succ_opt().expect("next day"));
    }
}
