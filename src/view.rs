// src/view.rs
//
// Browsing state for the calendar and management list, kept in one value
// the caller owns and hands to the query functions.

use crate::constants::{CALENDAR_GRID_CELLS, CALENDAR_MAX_MARKERS, DATE_FORMAT, MONTH_FORMAT};
use crate::dates::add_days;
use crate::models::{SortDirection, SortKey};
use crate::query::{filter_and_sort, problems_due_on, ProblemRow};
use crate::repository::ProblemRepository;
use crate::store::Store;
use chrono::{Datelike, Months, NaiveDate};
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    month: NaiveDate,
    selected_date: Option<NaiveDate>,
    search: String,
    sort_key: SortKey,
    direction: SortDirection,
}

impl ViewState {
    pub fn new(today: NaiveDate) -> Self {
        ViewState {
            month: first_of_month(today),
            selected_date: Some(today),
            search: String::new(),
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
        }
    }

    /// First day of the displayed month.
    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn month_key(&self) -> String {
        self.month.format(MONTH_FORMAT).to_string()
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn show_month(&mut self, any_day: NaiveDate) {
        self.month = first_of_month(any_day);
    }

    pub fn next_month(&mut self) {
        if let Some(next) = self.month.checked_add_months(Months::new(1)) {
            self.month = next;
        }
    }

    pub fn prev_month(&mut self) {
        if let Some(prev) = self.month.checked_sub_months(Months::new(1)) {
            self.month = prev;
        }
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.month = first_of_month(today);
        self.selected_date = Some(today);
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = Some(date);
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.trim().to_lowercase();
    }

    /// Clicking the active column flips direction; a new column starts ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.flipped();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Asc;
        }
        debug!("sort by {:?} {:?}", self.sort_key, self.direction);
    }

    pub fn listing<'a, S: Store>(
        &self,
        repo: &'a ProblemRepository<S>,
        today: NaiveDate,
    ) -> Vec<ProblemRow<'a>> {
        filter_and_sort(repo, &self.search, self.sort_key, self.direction, today)
    }
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), DATE_FORMAT).ok()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayMarker {
    Completed,
    Overdue,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub count: usize,
    pub markers: Vec<DayMarker>,
}

/// Six weeks of days starting on the Sunday on or before the 1st.
pub fn month_grid<S: Store>(
    view: &ViewState,
    repo: &ProblemRepository<S>,
    today: NaiveDate,
) -> Vec<CalendarDay> {
    let first = view.month();
    let lead = i64::from(first.weekday().num_days_from_sunday());
    let start = add_days(first, -lead);

    (0..CALENDAR_GRID_CELLS as i64)
        .map(|offset| {
            let date = add_days(start, offset);
            let due = problems_due_on(repo, date);
            let markers = due
                .iter()
                .take(CALENDAR_MAX_MARKERS)
                .map(|entry| {
                    if entry.is_completed {
                        DayMarker::Completed
                    } else if date < today {
                        DayMarker::Overdue
                    } else {
                        DayMarker::Pending
                    }
                })
                .collect();
            CalendarDay {
                date,
                in_current_month: date.year() == first.year() && date.month() == first.month(),
                is_today: date == today,
                is_selected: view.selected_date() == Some(date),
                count: due.len(),
                markers,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Problem};
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn problem(scheduled: &[NaiveDate], done: &[NaiveDate]) -> Problem {
        Problem {
            title: "P".to_string(),
            difficulty: Difficulty::Medium,
            category: None,
            topics: Vec::new(),
            url: String::new(),
            added_date: date(2024, 1, 1),
            scheduled_dates: scheduled.iter().copied().collect(),
            completed_dates: done.iter().copied().collect(),
        }
    }

    #[test]
    fn month_navigation_wraps_years() {
        let mut view = ViewState::new(date(2024, 1, 15));
        assert_eq!(view.month(), date(2024, 1, 1));
        view.prev_month();
        assert_eq!(view.month_key(), "2023-12");
        view.next_month();
        view.next_month();
        assert_eq!(view.month(), date(2024, 2, 1));
        view.go_to_today(date(2024, 1, 15));
        assert_eq!(view.month(), date(2024, 1, 1));
        assert_eq!(view.selected_date(), Some(date(2024, 1, 15)));
    }

    #[test]
    fn toggle_sort_flips_or_resets() {
        let mut view = ViewState::new(date(2024, 1, 1));
        assert_eq!(view.sort_key(), SortKey::NextReview);
        assert_eq!(view.direction(), SortDirection::Asc);
        view.toggle_sort(SortKey::NextReview);
        assert_eq!(view.direction(), SortDirection::Desc);
        view.toggle_sort(SortKey::Title);
        assert_eq!(view.sort_key(), SortKey::Title);
        assert_eq!(view.direction(), SortDirection::Asc);
    }

    #[test]
    fn search_is_normalised() {
        let mut view = ViewState::new(date(2024, 1, 1));
        view.set_search("  Two SUM ");
        assert_eq!(view.search(), "two sum");
    }

    #[test]
    fn parse_month_accepts_year_month() {
        assert_eq!(parse_month("2024-02"), Some(date(2024, 2, 1)));
        assert_eq!(parse_month("2024-13"), None);
        assert_eq!(parse_month("Feb"), None);
    }

    #[test]
    fn grid_starts_on_sunday_and_marks_days() {
        let today = date(2024, 1, 10);
        let mut repo = ProblemRepository::new(MemoryStore::new());
        repo.upsert(
            "a",
            problem(&[date(2024, 1, 2), date(2024, 1, 12)], &[date(2024, 1, 2)]),
        )
        .unwrap();
        repo.upsert("b", problem(&[date(2024, 1, 2)], &[])).unwrap();
        repo.upsert("c", problem(&[date(2024, 1, 12)], &[])).unwrap();

        let mut view = ViewState::new(today);
        view.select_date(date(2024, 1, 12));
        let grid = month_grid(&view, &repo, today);

        assert_eq!(grid.len(), 42);
        // 2024-01-01 is a Monday
        assert_eq!(grid[0].date, date(2023, 12, 31));
        assert!(!grid[0].in_current_month);
        assert!(grid[1].in_current_month);

        let jan2 = &grid[2];
        assert_eq!(jan2.count, 2);
        assert_eq!(jan2.markers, vec![DayMarker::Completed, DayMarker::Overdue]);

        let jan10 = &grid[10];
        assert!(jan10.is_today);
        assert_eq!(jan10.count, 0);

        let jan12 = &grid[12];
        assert!(jan12.is_selected);
        assert_eq!(jan12.markers, vec![DayMarker::Pending, DayMarker::Pending]);
    }
}
