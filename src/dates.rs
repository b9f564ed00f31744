// src/dates.rs
//
// Calendar-date arithmetic for review schedules. Everything here is pure and
// works on `NaiveDate`, so time of day never leaks into a schedule.

use crate::constants::{DATE_FORMAT, NEAR_TERM_DAYS};
use crate::models::DueStatus;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// Calendar-correct day addition. `n` may be negative. Results outside
/// chrono's representable range saturate at `NaiveDate::MIN`/`MAX`.
pub fn add_days(base: NaiveDate, n: i64) -> NaiveDate {
    Duration::try_days(n)
        .and_then(|delta| base.checked_add_signed(delta))
        .unwrap_or(if n < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Whole calendar days from `a` to `b` (`b - a`). Inverse of [`add_days`].
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    b.signed_duration_since(a).num_days()
}

/// Maps each offset to `base + offset`. The result is sorted ascending with
/// duplicates removed, whatever order the offsets came in.
pub fn dates_from_intervals(base: NaiveDate, intervals: &[i64]) -> Vec<NaiveDate> {
    intervals
        .iter()
        .map(|&offset| add_days(base, offset))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Human label for an offset in days, as shown next to a preview date.
pub fn classify_offset(days: i64) -> String {
    match days {
        d if d < 0 => format!("{} day{} ago", -d, plural(-d)),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        d if d < 7 => format!("In {} days", d),
        7 => "In 1 week".to_string(),
        d if d < 30 => {
            let weeks = round_div(d, 7);
            format!("In {} week{}", weeks, plural(weeks))
        }
        d => {
            let months = round_div(d, 30);
            format!("In {} month{}", months, plural(months))
        }
    }
}

pub fn due_status(date: NaiveDate, today: NaiveDate, is_completed: bool) -> DueStatus {
    if is_completed {
        return DueStatus::Completed;
    }
    match days_between(today, date) {
        d if d < 0 => DueStatus::Overdue,
        0 => DueStatus::DueToday,
        1 => DueStatus::Tomorrow,
        d if d <= NEAR_TERM_DAYS => DueStatus::InDays(d),
        _ => DueStatus::Upcoming,
    }
}

/// Short label for a problem's next review in the management listing.
pub fn next_review_label(next: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(date) = next else {
        return "Completed".to_string();
    };
    match days_between(today, date) {
        d if d < 0 => "Overdue".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        d if d <= NEAR_TERM_DAYS => format!("{} days", d),
        _ => date.format("%b %-d").to_string(),
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// Half-up rounding for positive integers.
fn round_div(value: i64, divisor: i64) -> i64 {
    (value + divisor / 2) / divisor
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_days_rolls_over_months_and_years() {
        assert_eq!(add_days(date(2024, 1, 31), 1), date(2024, 2, 1));
        assert_eq!(add_days(date(2024, 2, 28), 1), date(2024, 2, 29));
        assert_eq!(add_days(date(2023, 12, 31), 1), date(2024, 1, 1));
        assert_eq!(add_days(date(2024, 1, 1), -1), date(2023, 12, 31));
    }

    #[test]
    fn add_days_saturates_instead_of_panicking() {
        assert_eq!(add_days(date(2024, 1, 1), i64::MAX), NaiveDate::MAX);
        assert_eq!(add_days(date(2024, 1, 1), i64::MIN), NaiveDate::MIN);
    }

    #[test]
    fn classify_offset_boundaries() {
        assert_eq!(classify_offset(1), "Tomorrow");
        assert_eq!(classify_offset(2), "In 2 days");
        assert_eq!(classify_offset(6), "In 6 days");
        assert_eq!(classify_offset(7), "In 1 week");
        assert_eq!(classify_offset(10), "In 1 week");
        assert_eq!(classify_offset(11), "In 2 weeks");
        assert_eq!(classify_offset(14), "In 2 weeks");
        assert_eq!(classify_offset(29), "In 4 weeks");
        assert_eq!(classify_offset(30), "In 1 month");
        assert_eq!(classify_offset(44), "In 1 month");
        assert_eq!(classify_offset(45), "In 2 months");
        assert_eq!(classify_offset(365), "In 12 months");
    }

    #[test]
    fn due_status_classification() {
        let today = date(2024, 1, 10);
        assert_eq!(due_status(date(2024, 1, 9), today, false), DueStatus::Overdue);
        assert_eq!(due_status(date(2024, 1, 10), today, false), DueStatus::DueToday);
        assert_eq!(due_status(date(2024, 1, 11), today, false), DueStatus::Tomorrow);
        assert_eq!(due_status(date(2024, 1, 17), today, false), DueStatus::InDays(7));
        assert_eq!(due_status(date(2024, 1, 18), today, false), DueStatus::Upcoming);
        assert_eq!(due_status(date(2024, 1, 9), today, true), DueStatus::Completed);
    }

    #[test]
    fn next_review_label_variants() {
        let today = date(2024, 1, 10);
        assert_eq!(next_review_label(None, today), "Completed");
        assert_eq!(next_review_label(Some(date(2024, 1, 8)), today), "Overdue");
        assert_eq!(next_review_label(Some(today), today), "Today");
        assert_eq!(next_review_label(Some(date(2024, 1, 11)), today), "Tomorrow");
        assert_eq!(next_review_label(Some(date(2024, 1, 15)), today), "5 days");
        assert_eq!(next_review_label(Some(date(2024, 2, 3)), today), "Feb 3");
    }

    #[test]
    fn parse_and_format_use_iso_calendar_strings() {
        assert_eq!(parse_date(" 2024-03-05 "), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("03/05/2024"), None);
        assert_eq!(format_date(date(2024, 3, 5)), "2024-03-05");
    }

    #[test]
    fn preset_scenario_dates() {
        let dates = dates_from_intervals(date(2024, 1, 1), &[7, 1, 3, 3]);
        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 4), date(2024, 1, 8)]);
    }

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (-200_000i32..200_000).prop_map(|offset| add_days(date(2000, 1, 1), offset as i64))
    }

    proptest! {
        #[test]
        fn add_days_round_trips(base in any_date(), n in -100_000i64..100_000) {
            prop_assert_eq!(days_between(base, add_days(base, n)), n);
        }

        #[test]
        fn dates_from_intervals_sorted_unique_members(
            base in any_date(),
            intervals in prop::collection::vec(-400i64..400, 1..20),
        ) {
            let dates = dates_from_intervals(base, &intervals);
            prop_assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
            for d in &dates {
                prop_assert!(intervals.iter().any(|&i| add_days(base, i) == *d));
            }
            for &i in &intervals {
                prop_assert!(dates.contains(&add_days(base, i)));
            }
        }
    }
}
