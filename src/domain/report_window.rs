use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("year {0} is out of range")]
    InvalidYear(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ReportWindow {
    pub fn month_to_date<C: Clock>(clock: &C) -> Self {
        let now = clock.now();
        let start = now
            .date()
            .with_day(1)
            .unwrap_or_else(|| now.date())
            .and_time(chrono::NaiveTime::MIN);

        Self { start, end: now }
    }

    pub fn calendar_month<C: Clock>(
        clock: &C,
        month: u32,
        year: Option<i32>,
    ) -> Result<Self, WindowError> {
        if !(1..=12).contains(&month) {
            return Err(WindowError::InvalidMonth(month));
        }
        let year = year.unwrap_or_else(|| clock.now().year());

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(WindowError::InvalidYear(year))?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or(WindowError::InvalidYear(year))?;

        Ok(Self {
            start: first.and_time(chrono::NaiveTime::MIN),
            end: next_first.and_time(chrono::NaiveTime::MIN) - Duration::seconds(1),
        })
    }

    pub fn resolve<C: Clock>(
        clock: &C,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Self, WindowError> {
        match month {
            Some(month) => Self::calendar_month(clock, month, year),
            None => Ok(Self::month_to_date(clock)),
        }
    }

    pub fn day_count(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days() + 1
    }

    pub fn start_wire(&self) -> String {
        self.start.format(WIRE_TIMESTAMP_FORMAT).to_string()
    }

    pub fn end_wire(&self) -> String {
        self.end.format(WIRE_TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{ReportWindow, WindowError};
    use crate::test_support::FixedClock;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .expect("valid fixture date")
    }

    #[test]
    fn month_to_date_starts_at_local_midnight_on_the_first() {
        let clock = FixedClock(at(2024, 5, 17, 14, 32, 9));

        let window = ReportWindow::month_to_date(&clock);

        assert_eq!(window.start, at(2024, 5, 1, 0, 0, 0));
        assert_eq!(window.end, at(2024, 5, 17, 14, 32, 9));
        assert_eq!(window.day_count(), 17);
    }

    #[test]
    fn calendar_month_ends_one_second_before_next_month() {
        let clock = FixedClock(at(2024, 5, 17, 14, 32, 9));

        let window = ReportWindow::calendar_month(&clock, 2, None).expect("valid month");

        assert_eq!(window.start, at(2024, 2, 1, 0, 0, 0));
        assert_eq!(window.end, at(2024, 2, 29, 23, 59, 59));
        assert_eq!(window.day_count(), 29);
        assert_eq!(window.start_wire(), "2024-02-01T00:00:00");
        assert_eq!(window.end_wire(), "2024-02-29T23:59:59");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let clock = FixedClock(at(2024, 5, 17, 0, 0, 0));

        let window = ReportWindow::calendar_month(&clock, 12, Some(2023)).expect("valid month");

        assert_eq!(window.start, at(2023, 12, 1, 0, 0, 0));
        assert_eq!(window.end, at(2023, 12, 31, 23, 59, 59));
        assert_eq!(window.day_count(), 31);
    }

    #[test]
    fn resolve_defaults_to_month_to_date() {
        let clock = FixedClock(at(2024, 5, 17, 14, 32, 9));

        assert_eq!(
            ReportWindow::resolve(&clock, None, None),
            Ok(ReportWindow::month_to_date(&clock))
        );
        assert_eq!(
            ReportWindow::resolve(&clock, Some(4), None)
                .expect("valid month")
                .end,
            at(2024, 4, 30, 23, 59, 59)
        );
    }

    #[test]
    fn rejects_month_out_of_range() {
        let clock = FixedClock(at(2024, 5, 17, 0, 0, 0));

        assert_eq!(
            ReportWindow::calendar_month(&clock, 13, None),
            Err(WindowError::InvalidMonth(13))
        );
        assert_eq!(
            ReportWindow::calendar_month(&clock, 0, Some(2024)),
            Err(WindowError::InvalidMonth(0))
        );
    }
}
