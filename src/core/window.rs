//! Spend window resolution.
//!
//! A budget's period (weekly/monthly/yearly) is abstract; spending is
//! aggregated over a concrete, closed calendar-date interval anchored
//! at the current day. This module performs that translation. Both
//! endpoints are inclusive and cover the full calendar day, matching
//! the date-part comparison the aggregate query performs.

use crate::models::BudgetPeriod;
use chrono::{Datelike, Duration, NaiveDate};

/// A closed calendar-date interval derived from a budget period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendWindow {
    /// First day of the interval (inclusive).
    pub start: NaiveDate,
    /// Last day of the interval (inclusive).
    pub end: NaiveDate,
}

/// Resolves a budget period into the spend window containing `today`.
///
/// - `Weekly`: the Monday through Sunday of the week containing `today`.
/// - `Monthly`: the first through last calendar day of `today`'s month.
/// - `Yearly`: January 1 through December 31 of `today`'s year.
///
/// The period enum is closed; values that arrive as unrecognized
/// strings have already been folded to `Monthly` at the parsing
/// boundary ([`BudgetPeriod::from_db_value`]).
#[must_use]
pub fn resolve_window(period: BudgetPeriod, today: NaiveDate) -> SpendWindow {
    match period {
        BudgetPeriod::Weekly => {
            let days_from_monday = i64::from(today.weekday().num_days_from_monday());
            let start = today - Duration::days(days_from_monday);
            SpendWindow {
                start,
                end: start + Duration::days(6),
            }
        }
        BudgetPeriod::Monthly => SpendWindow {
            // Day 1 and the month's own last day are valid for any valid `today`
            start: today.with_day(1).unwrap_or(today),
            end: today
                .with_day(days_in_month(today.year(), today.month()))
                .unwrap_or(today),
        },
        BudgetPeriod::Yearly => SpendWindow {
            // Day is normalized to 1 before the month switch so the
            // intermediate date stays valid
            start: today.with_day(1).and_then(|d| d.with_month(1)).unwrap_or(today),
            end: today.with_month(12).and_then(|d| d.with_day(31)).unwrap_or(today),
        },
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekly_window_is_monday_through_sunday() {
        // 2026-08-07 is a Friday
        let window = resolve_window(BudgetPeriod::Weekly, date(2026, 8, 7));
        assert_eq!(window.start, date(2026, 8, 3));
        assert_eq!(window.end, date(2026, 8, 9));
        assert_eq!(window.start.weekday(), Weekday::Mon);
        assert_eq!(window.end.weekday(), Weekday::Sun);
    }

    #[test]
    fn test_weekly_window_anchored_on_monday_and_sunday() {
        // Monday anchors at itself
        let monday = resolve_window(BudgetPeriod::Weekly, date(2026, 8, 3));
        assert_eq!(monday.start, date(2026, 8, 3));
        assert_eq!(monday.end, date(2026, 8, 9));

        // Sunday still belongs to the week that started the previous Monday
        let sunday = resolve_window(BudgetPeriod::Weekly, date(2026, 8, 9));
        assert_eq!(sunday.start, date(2026, 8, 3));
        assert_eq!(sunday.end, date(2026, 8, 9));
    }

    #[test]
    fn test_weekly_window_spans_month_boundary() {
        // 2026-07-01 is a Wednesday; its week starts in June
        let window = resolve_window(BudgetPeriod::Weekly, date(2026, 7, 1));
        assert_eq!(window.start, date(2026, 6, 29));
        assert_eq!(window.end, date(2026, 7, 5));
    }

    #[test]
    fn test_monthly_window_covers_whole_month() {
        let window = resolve_window(BudgetPeriod::Monthly, date(2026, 8, 7));
        assert_eq!(window.start, date(2026, 8, 1));
        assert_eq!(window.end, date(2026, 8, 31));

        let thirty = resolve_window(BudgetPeriod::Monthly, date(2026, 9, 15));
        assert_eq!(thirty.end, date(2026, 9, 30));
    }

    #[test]
    fn test_monthly_window_february_leap_year() {
        let leap = resolve_window(BudgetPeriod::Monthly, date(2024, 2, 10));
        assert_eq!(leap.end, date(2024, 2, 29));

        let common = resolve_window(BudgetPeriod::Monthly, date(2026, 2, 10));
        assert_eq!(common.end, date(2026, 2, 28));
    }

    #[test]
    fn test_yearly_window_covers_whole_year() {
        let window = resolve_window(BudgetPeriod::Yearly, date(2026, 8, 7));
        assert_eq!(window.start, date(2026, 1, 1));
        assert_eq!(window.end, date(2026, 12, 31));
    }

    #[test]
    fn test_window_lengths_are_canonical() {
        let today = date(2026, 8, 7);

        let weekly = resolve_window(BudgetPeriod::Weekly, today);
        assert_eq!((weekly.end - weekly.start).num_days(), 6);

        let monthly = resolve_window(BudgetPeriod::Monthly, today);
        assert_eq!((monthly.end - monthly.start).num_days(), 30); // August has 31 days

        let yearly = resolve_window(BudgetPeriod::Yearly, today);
        assert_eq!((yearly.end - yearly.start).num_days(), 364); // 2026 is not a leap year

        for period in [
            BudgetPeriod::Weekly,
            BudgetPeriod::Monthly,
            BudgetPeriod::Yearly,
        ] {
            let window = resolve_window(period, today);
            assert!(window.start <= window.end);
            assert!(window.start <= today && today <= window.end);
        }
    }
}
