// src/query.rs
//
// Read-only views over the repository. Nothing is cached; every call
// recomputes from the current in-memory problems.

use crate::dates::add_days;
use crate::models::{Problem, ProblemStatus, ReviewStats, SortDirection, SortKey};
use crate::repository::ProblemRepository;
use crate::store::Store;
use chrono::NaiveDate;
use log::debug;
use std::cmp::Ordering;

/// One problem scheduled on a given date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueEntry<'a> {
    pub id: &'a str,
    pub problem: &'a Problem,
    pub repetition_ordinal: usize,
    pub total_repetitions: usize,
    pub is_completed: bool,
}

/// One row of the management listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemRow<'a> {
    pub id: &'a str,
    pub problem: &'a Problem,
    pub next_review: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueEntry<'a> {
    pub id: &'a str,
    pub problem: &'a Problem,
    pub date: NaiveDate,
}

pub fn problems_due_on<S: Store>(
    repo: &ProblemRepository<S>,
    date: NaiveDate,
) -> Vec<DueEntry<'_>> {
    repo.iter()
        .filter_map(|(id, problem)| {
            let ordinal = problem.repetition_ordinal(date)?;
            Some(DueEntry {
                id: id.as_str(),
                problem,
                repetition_ordinal: ordinal,
                total_repetitions: problem.total_repetitions(),
                is_completed: problem.is_completed_on(date),
            })
        })
        .collect()
}

/// Earliest scheduled date on or after `today` that is not completed.
pub fn next_due_date(problem: &Problem, today: NaiveDate) -> Option<NaiveDate> {
    problem
        .scheduled_dates
        .range(today..)
        .find(|date| !problem.is_completed_on(**date))
        .copied()
}

/// Open repetitions falling in `[today, today + horizon_days)`, summed over
/// all problems.
pub fn upcoming_count<S: Store>(
    repo: &ProblemRepository<S>,
    today: NaiveDate,
    horizon_days: u32,
) -> usize {
    let end = add_days(today, i64::from(horizon_days));
    repo.iter()
        .map(|(_, problem)| {
            problem
                .scheduled_dates
                .range(today..end)
                .filter(|date| !problem.is_completed_on(**date))
                .count()
        })
        .sum()
}

pub fn problem_status(problem: &Problem, today: NaiveDate) -> ProblemStatus {
    match next_due_date(problem, today) {
        None => ProblemStatus::Completed,
        Some(next) if next <= today => ProblemStatus::Due,
        Some(_) => ProblemStatus::Upcoming,
    }
}

pub fn stats<S: Store>(
    repo: &ProblemRepository<S>,
    today: NaiveDate,
    horizon_days: u32,
) -> ReviewStats {
    ReviewStats {
        due_today: problems_due_on(repo, today)
            .iter()
            .filter(|entry| !entry.is_completed)
            .count(),
        upcoming: upcoming_count(repo, today, horizon_days),
        total: repo.len(),
    }
}

/// Every uncompleted repetition before `today`, oldest first.
pub fn overdue<S: Store>(repo: &ProblemRepository<S>, today: NaiveDate) -> Vec<OverdueEntry<'_>> {
    let mut entries: Vec<OverdueEntry<'_>> = repo
        .iter()
        .flat_map(|(id, problem)| {
            problem
                .scheduled_dates
                .range(..today)
                .filter(move |date| !problem.is_completed_on(**date))
                .map(move |date| OverdueEntry {
                    id: id.as_str(),
                    problem,
                    date: *date,
                })
        })
        .collect();
    entries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(b.id)));
    entries
}

/// Problems with a repetition on `today`, completed or not.
pub fn badge_count<S: Store>(repo: &ProblemRepository<S>, today: NaiveDate) -> usize {
    repo.iter()
        .filter(|(_, problem)| problem.scheduled_dates.contains(&today))
        .count()
}

pub fn badge_text<S: Store>(repo: &ProblemRepository<S>, today: NaiveDate) -> Option<String> {
    match badge_count(repo, today) {
        0 => None,
        n => Some(n.to_string()),
    }
}

/// Case-insensitive search over titles and topics, then sort.
///
/// Problems without a next review always sort last under
/// `SortKey::NextReview`, in either direction.
pub fn filter_and_sort<'a, S: Store>(
    repo: &'a ProblemRepository<S>,
    query: &str,
    key: SortKey,
    direction: SortDirection,
    today: NaiveDate,
) -> Vec<ProblemRow<'a>> {
    let needle = query.trim().to_lowercase();
    let mut rows: Vec<ProblemRow<'a>> = repo
        .iter()
        .filter(|(_, problem)| problem.matches(&needle))
        .map(|(id, problem)| ProblemRow {
            id: id.as_str(),
            problem,
            next_review: next_due_date(problem, today),
        })
        .collect();
    debug!(
        "filter_and_sort: {} of {} problems match {:?}",
        rows.len(),
        repo.len(),
        needle
    );

    rows.sort_by(|a, b| compare_rows(a, b, key, direction));
    rows
}

fn compare_rows(
    a: &ProblemRow<'_>,
    b: &ProblemRow<'_>,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    let directed = |ord: Ordering| match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    };
    match key {
        SortKey::Title => directed(
            a.problem
                .title
                .to_lowercase()
                .cmp(&b.problem.title.to_lowercase())
                .then_with(|| a.problem.title.cmp(&b.problem.title)),
        ),
        SortKey::Difficulty => {
            directed(a.problem.difficulty.rank().cmp(&b.problem.difficulty.rank()))
        }
        SortKey::NextReview => match (a.next_review, b.next_review) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}
