use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// Recurrence of billing runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Midnight UTC on the first day of every month
    Monthly,
    /// Fixed interval between triggers
    Every(Duration),
}

impl Schedule {
    /// Time to wait from `now` until the next trigger
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Self::Every(period) => *period,
            Self::Monthly => (next_month_start(now) - now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// First instant of the month after `now`
pub fn next_month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = match now.month() {
        12 => (now.year() + 1, 1),
        m => (now.year(), m + 1),
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn next_month_rolls_over_year() {
        assert_eq!(next_month_start(at(2024, 12, 15, 8)), at(2025, 1, 1, 0));
        assert_eq!(next_month_start(at(2024, 2, 29, 23)), at(2024, 3, 1, 0));
    }

    #[test]
    fn trigger_instant_schedules_following_month() {
        assert_eq!(next_month_start(at(2024, 5, 1, 0)), at(2024, 6, 1, 0));
    }

    #[test]
    fn monthly_delay_reaches_first_of_month() {
        let delay = Schedule::Monthly.delay_from(at(2024, 4, 30, 12));
        assert_eq!(delay, Duration::from_secs(12 * 3600));
    }

    #[test]
    fn interval_delay_is_constant() {
        let schedule = Schedule::Every(Duration::from_secs(30));
        assert_eq!(schedule.delay_from(Utc::now()), Duration::from_secs(30));
    }
}
