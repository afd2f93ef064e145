//! Business-day arithmetic over an explicit holiday calendar.
//!
//! Nothing here reads process-wide state: every query takes the calendar as an
//! argument, so the same price series can be replayed against different
//! jurisdictions (or against a hand-written holiday set in tests).

use std::collections::BTreeSet;
use time::{Date, Month, Weekday};

/// A set of non-weekend dates on which the market is treated as closed.
pub trait HolidayCalendar {
    /// Returns `true` if `date` is a holiday. Weekends are handled separately.
    fn is_holiday(&self, date: Date) -> bool;

    /// A business day is a weekday that is not a holiday.
    fn is_business_day(&self, date: Date) -> bool {
        !is_weekend(date) && !self.is_holiday(date)
    }
}

pub fn is_weekend(date: Date) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}

/// Returns the earliest business day strictly after `date`.
///
/// `None` only when the walk runs past the last date `time` can represent.
pub fn next_business_day<C: HolidayCalendar + ?Sized>(date: Date, calendar: &C) -> Option<Date> {
    let mut next = date.next_day()?;
    while !calendar.is_business_day(next) {
        next = next.next_day()?;
    }
    Some(next)
}

/// `true` when the next business day after `date` falls in another month.
pub fn is_last_business_day<C: HolidayCalendar + ?Sized>(date: Date, calendar: &C) -> bool {
    next_business_day(date, calendar).map_or(true, |next| next.month() != date.month())
}

/// Weekends only, no holidays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekendsOnly;

impl HolidayCalendar for WeekendsOnly {
    fn is_holiday(&self, _date: Date) -> bool {
        false
    }
}

/// An explicit list of holiday dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedHolidays {
    dates: BTreeSet<Date>,
}

impl FixedHolidays {
    pub fn new(dates: impl IntoIterator<Item = Date>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl FromIterator<Date> for FixedHolidays {
    fn from_iter<I: IntoIterator<Item = Date>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl HolidayCalendar for FixedHolidays {
    fn is_holiday(&self, date: Date) -> bool {
        self.dates.contains(&date)
    }
}

/// United States federal holidays, including observed dates.
///
/// Fixed-date holidays falling on a Saturday are observed the Friday before,
/// those falling on a Sunday the Monday after. A Saturday New Year's Day is
/// therefore observed on December 31 of the previous year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsFederalHolidays;

impl UsFederalHolidays {
    /// All holiday dates (actual and observed) that fall within `year`, sorted.
    pub fn holidays_in(year: i32) -> Vec<Date> {
        let mut days = Vec::with_capacity(24);
        for date in fixed_dates(year).into_iter().flatten() {
            days.push(date);
            days.extend(observed(date).filter(|d| d.year() == year));
        }
        days.extend(saturday_new_year_eve(year));
        days.extend(floating_dates(year).into_iter().flatten());

        days.sort_unstable();
        days.dedup();
        days
    }
}

impl HolidayCalendar for UsFederalHolidays {
    fn is_holiday(&self, date: Date) -> bool {
        let year = date.year();
        fixed_dates(year)
            .into_iter()
            .flatten()
            .any(|d| d == date || observed(d) == Some(date))
            || floating_dates(year).into_iter().flatten().any(|d| d == date)
            || saturday_new_year_eve(year) == Some(date)
    }
}

/// Holidays tied to a calendar date, before observed shifting.
fn fixed_dates(year: i32) -> [Option<Date>; 8] {
    use Month::*;

    let before_monday_act = year < 1971;
    [
        ymd(year, January, 1),
        ymd(year, July, 4),
        ymd(year, December, 25),
        // Juneteenth
        ymd(year, June, 19).filter(|_| year >= 2021),
        // Washington's Birthday and Memorial Day before the Uniform Monday Holiday Act
        ymd(year, February, 22).filter(|_| before_monday_act),
        ymd(year, May, 30).filter(|_| before_monday_act),
        ymd(year, October, 12).filter(|_| (1937..1971).contains(&year)),
        ymd(year, November, 11).filter(|_| year >= 1938 && !(1971..=1977).contains(&year)),
    ]
}

/// Holidays defined as the n-th or last weekday of a month.
fn floating_dates(year: i32) -> [Option<Date>; 7] {
    use Month::*;
    use Weekday::*;

    [
        nth_weekday(year, September, Monday, 1).filter(|_| year >= 1894),
        nth_weekday(year, January, Monday, 3).filter(|_| year >= 1986),
        nth_weekday(year, February, Monday, 3).filter(|_| year >= 1971),
        last_weekday(year, May, Monday).filter(|_| year >= 1971),
        nth_weekday(year, October, Monday, 2).filter(|_| year >= 1971),
        // Veterans Day moved to October
        nth_weekday(year, October, Monday, 4).filter(|_| (1971..=1977).contains(&year)),
        if year >= 1942 {
            nth_weekday(year, November, Thursday, 4)
        } else {
            last_weekday(year, November, Thursday)
        },
    ]
}

/// December 31 of `year` when the following New Year's Day is a Saturday.
fn saturday_new_year_eve(year: i32) -> Option<Date> {
    ymd(year + 1, Month::January, 1)
        .filter(|d| d.weekday() == Weekday::Saturday)
        .and_then(|_| ymd(year, Month::December, 31))
}

/// Closed set of built-in calendars, selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CalendarKind {
    /// United States federal holidays
    #[default]
    Us,
    /// Weekends only
    Weekends,
}

impl HolidayCalendar for CalendarKind {
    fn is_holiday(&self, date: Date) -> bool {
        match self {
            CalendarKind::Us => UsFederalHolidays.is_holiday(date),
            CalendarKind::Weekends => WeekendsOnly.is_holiday(date),
        }
    }
}

fn ymd(year: i32, month: Month, day: u8) -> Option<Date> {
    Date::from_calendar_date(year, month, day).ok()
}

fn observed(date: Date) -> Option<Date> {
    match date.weekday() {
        Weekday::Saturday => date.previous_day(),
        Weekday::Sunday => date.next_day(),
        _ => None,
    }
}

/// The `n`-th (1-based) `weekday` of the month.
fn nth_weekday(year: i32, month: Month, weekday: Weekday, n: u8) -> Option<Date> {
    let first = ymd(year, month, 1)?;
    let offset = (7 + weekday.number_days_from_monday() - first.weekday().number_days_from_monday()) % 7;
    ymd(year, month, 1 + offset + 7 * n.checked_sub(1)?)
}

fn last_weekday(year: i32, month: Month, weekday: Weekday) -> Option<Date> {
    let last = last_day_of_month(year, month)?;
    let back = (7 + last.weekday().number_days_from_monday() - weekday.number_days_from_monday()) % 7;
    ymd(year, month, last.day() - back)
}

fn last_day_of_month(year: i32, month: Month) -> Option<Date> {
    let (next_year, next_month) = match month {
        Month::December => (year + 1, Month::January),
        other => (year, other.next()),
    };
    ymd(next_year, next_month, 1)?.previous_day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_friday_rolls_to_monday() {
        let next = next_business_day(date!(2024 - 01 - 05), &WeekendsOnly);
        assert_eq!(next, Some(date!(2024 - 01 - 08)));
    }

    #[test]
    fn test_never_returns_the_input_date() {
        let monday = date!(2024 - 01 - 08);
        assert_eq!(next_business_day(monday, &WeekendsOnly), Some(date!(2024 - 01 - 09)));
    }

    #[test]
    fn test_day_before_holiday_skips_the_holiday() {
        // Independence Day 2024 is a Thursday.
        let next = next_business_day(date!(2024 - 07 - 03), &UsFederalHolidays);
        assert_eq!(next, Some(date!(2024 - 07 - 05)));
    }

    #[test]
    fn test_fixed_holidays_are_skipped() {
        let calendar = FixedHolidays::new([date!(2024 - 03 - 12), date!(2024 - 03 - 13)]);
        assert_eq!(calendar.len(), 2);
        let next = next_business_day(date!(2024 - 03 - 11), &calendar);
        assert_eq!(next, Some(date!(2024 - 03 - 14)));
    }

    #[test]
    fn test_us_holidays_2024() {
        let expected = vec![
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 15),
            date!(2024 - 02 - 19),
            date!(2024 - 05 - 27),
            date!(2024 - 06 - 19),
            date!(2024 - 07 - 04),
            date!(2024 - 09 - 02),
            date!(2024 - 10 - 14),
            date!(2024 - 11 - 11),
            date!(2024 - 11 - 28),
            date!(2024 - 12 - 25),
        ];
        assert_eq!(UsFederalHolidays::holidays_in(2024), expected);
    }

    #[test]
    fn test_saturday_holiday_observed_on_friday() {
        // July 4, 2026 is a Saturday.
        assert!(UsFederalHolidays.is_holiday(date!(2026 - 07 - 03)));
        assert!(!UsFederalHolidays.is_business_day(date!(2026 - 07 - 03)));
    }

    #[test]
    fn test_sunday_holiday_observed_on_monday() {
        // Juneteenth 2022 is a Sunday.
        assert!(UsFederalHolidays.is_holiday(date!(2022 - 06 - 20)));
    }

    #[test]
    fn test_saturday_new_year_observed_in_previous_december() {
        // January 1, 2022 is a Saturday.
        assert!(UsFederalHolidays.is_holiday(date!(2021 - 12 - 31)));
        assert!(is_last_business_day(date!(2021 - 12 - 30), &UsFederalHolidays));
        assert!(!is_last_business_day(date!(2021 - 12 - 30), &WeekendsOnly));
    }

    #[test]
    fn test_pre_1971_fixed_dates() {
        let holidays = UsFederalHolidays::holidays_in(1960);
        assert!(holidays.contains(&date!(1960 - 02 - 22)));
        assert!(holidays.contains(&date!(1960 - 05 - 30)));
        assert!(holidays.contains(&date!(1960 - 10 - 12)));
        // No MLK day before 1986.
        assert!(!holidays.contains(&date!(1960 - 01 - 18)));
    }

    #[test]
    fn test_thanksgiving_before_1942_is_last_thursday() {
        // November 1939 had five Thursdays; the last was the 30th.
        assert!(UsFederalHolidays::holidays_in(1939).contains(&date!(1939 - 11 - 30)));
        assert!(UsFederalHolidays::holidays_in(1950).contains(&date!(1950 - 11 - 23)));
    }

    #[test]
    fn test_month_end_detection() {
        // 2021-01-29 is a Friday; the next business day is February 1.
        assert!(is_last_business_day(date!(2021 - 01 - 29), &UsFederalHolidays));
        assert!(!is_last_business_day(date!(2021 - 01 - 28), &UsFederalHolidays));
        // Year boundary.
        assert!(is_last_business_day(date!(2020 - 12 - 31), &UsFederalHolidays));
    }

    #[test]
    fn test_is_holiday_agrees_with_yearly_list() {
        for year in 1930..=2030 {
            let listed = UsFederalHolidays::holidays_in(year);
            let mut day = Date::from_calendar_date(year, Month::January, 1).unwrap();
            while day.year() == year {
                assert_eq!(
                    UsFederalHolidays.is_holiday(day),
                    listed.binary_search(&day).is_ok(),
                    "{day}"
                );
                day = day.next_day().unwrap();
            }
        }
    }

    #[test]
    fn test_calendar_kind_dispatches() {
        assert!(CalendarKind::Us.is_holiday(date!(2024 - 12 - 25)));
        assert!(!CalendarKind::Weekends.is_holiday(date!(2024 - 12 - 25)));
    }
}
