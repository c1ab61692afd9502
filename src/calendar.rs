//! Date helpers for week grids, month calendars and reporting periods.
//!
//! Everything here is a pure function of a reference date. The `*_from`
//! variants take that date explicitly; the short forms use the local clock.

use crate::entities::{CalendarMonth, DateRange, Period};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Duration, Local, Month, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const WEEK_DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Short label used on report charts, e.g. `15 Jan`.
pub fn format_date_for_display(date: NaiveDate) -> String {
    format!("{} {}", date.day(), date.format("%b"))
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_dates(today: NaiveDate) -> Vec<NaiveDate> {
    DateRange::week(week_start(today)).days().collect()
}

/// The current week, Monday first, as `YYYY-MM-DD` strings.
pub fn week_days() -> Vec<String> {
    week_dates(today()).into_iter().map(format_date).collect()
}

pub fn calendar_grid(year: i32, month: u32) -> Result<CalendarMonth> {
    let range = DateRange::month(year, month)
        .ok_or_else(|| anyhow!("Invalid calendar month {}-{:02}", year, month))?;
    let name = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .ok_or_else(|| anyhow!("Invalid month number {}", month))?;

    let mut weeks = Vec::new();
    let mut week = [0u32; 7];
    let mut column = range.start.weekday().num_days_from_monday() as usize;

    for day in range.days() {
        week[column] = day.day();
        column += 1;
        if column == 7 {
            weeks.push(week);
            week = [0; 7];
            column = 0;
        }
    }
    if column > 0 {
        weeks.push(week);
    }

    Ok(CalendarMonth {
        year,
        month,
        name,
        weeks,
    })
}

pub fn period_range(period: Period, today: NaiveDate) -> DateRange {
    match period {
        Period::SevenDays => DateRange::trailing(today, 7),
        Period::ThirtyDays => DateRange::trailing(today, 30),
        Period::Week => DateRange::week(week_start(today)),
        Period::Month => DateRange::month(today.year(), today.month())
            .unwrap_or_else(|| DateRange::trailing(today, 7)),
    }
}

pub fn period_dates_from(period: Period, today: NaiveDate) -> Vec<NaiveDate> {
    period_range(period, today).days().collect()
}

/// Dates for a named period; unknown names mean the trailing seven days.
pub fn period_dates(period: &str) -> Vec<NaiveDate> {
    period_dates_from(Period::parse(period), today())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_dates_start_on_monday() {
        // 2024-01-03 is a Wednesday
        let dates = week_dates(date(2024, 1, 3));
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], date(2024, 1, 1));
        assert_eq!(dates[0].weekday(), Weekday::Mon);
        assert_eq!(dates[6], date(2024, 1, 7));

        // Sunday belongs to the week that started six days earlier
        assert_eq!(week_start(date(2024, 1, 7)), date(2024, 1, 1));
        assert_eq!(week_start(date(2024, 1, 8)), date(2024, 1, 8));
    }

    #[test]
    fn test_week_days_are_ascending_strings() {
        let days = week_days();
        assert_eq!(days.len(), 7);
        let mut sorted = days.clone();
        sorted.sort();
        assert_eq!(days, sorted);
        assert!(days.iter().all(|d| parse_date(d).is_ok()));
    }

    #[test]
    fn test_leap_february_grid_covers_each_day_once() {
        let grid = calendar_grid(2024, 2).unwrap();
        assert_eq!(grid.name, "February");

        let mut days: Vec<u32> = grid.weeks.iter().flatten().copied().filter(|&d| d != 0).collect();
        days.sort();
        assert_eq!(days, (1..=29).collect::<Vec<_>>());

        // 2024-02-01 was a Thursday
        assert_eq!(grid.weeks[0], [0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(grid.weeks.last().unwrap(), &[26, 27, 28, 29, 0, 0, 0]);
        assert_eq!(grid.dates().len(), 29);
    }

    #[test]
    fn test_grid_for_month_starting_on_monday() {
        // 2024-01-01 was a Monday
        let grid = calendar_grid(2024, 1).unwrap();
        assert_eq!(grid.weeks[0], [1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(grid.weeks.len(), 5);
        assert_eq!(grid.name, "January");
    }

    #[test]
    fn test_invalid_month_is_an_error() {
        assert!(calendar_grid(2024, 13).is_err());
        assert!(calendar_grid(2024, 0).is_err());
    }

    #[test]
    fn test_thirty_days_end_today() {
        let today = date(2024, 3, 10);
        let dates = period_dates_from(Period::ThirtyDays, today);
        assert_eq!(dates.len(), 30);
        assert_eq!(*dates.last().unwrap(), today);
        assert_eq!(dates[0], date(2024, 2, 10));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_named_periods() {
        let today = date(2024, 2, 14); // Wednesday

        let seven = period_dates_from(Period::SevenDays, today);
        assert_eq!(seven.first(), Some(&date(2024, 2, 8)));
        assert_eq!(seven.last(), Some(&today));

        let week = period_dates_from(Period::Week, today);
        assert_eq!(week.first(), Some(&date(2024, 2, 12)));
        assert_eq!(week.last(), Some(&date(2024, 2, 18)));

        let month = period_dates_from(Period::Month, today);
        assert_eq!(month.len(), 29);
        assert_eq!(month.first(), Some(&date(2024, 2, 1)));
        assert_eq!(month.last(), Some(&date(2024, 2, 29)));
    }

    #[test]
    fn test_unknown_period_uses_trailing_week() {
        let dates = period_dates("quarter");
        assert_eq!(dates.len(), 7);
        assert_eq!(*dates.last().unwrap(), today());
    }

    #[test]
    fn test_date_formatting() {
        assert_eq!(format_date(date(2024, 1, 5)), "2024-01-05");
        assert_eq!(format_date_for_display(date(2024, 1, 15)), "15 Jan");
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), date(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("yesterday").is_err());
    }
}
