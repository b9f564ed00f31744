// src/reschedule.rs

use crate::constants::{INTERVAL_MAX_DAYS, INTERVAL_MIN_DAYS, RESCHEDULE_STEP_DAYS};
use crate::dates::add_days;
use crate::error::{SchedulerError, SchedulerResult, ValidationError};
use crate::models::ProblemId;
use crate::repository::{ProblemRepository, ScheduleChange};
use crate::store::Store;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeSet;

/// Date-based edit of an existing problem's schedule. Works on a copy of
/// the scheduled dates; nothing reaches the repository until `commit`.
#[derive(Debug, Clone)]
pub struct RescheduleSession {
    id: ProblemId,
    title: String,
    today: NaiveDate,
    dates: Vec<NaiveDate>,
    completed: BTreeSet<NaiveDate>,
    closed: bool,
}

impl RescheduleSession {
    /// `None` when the problem is not (or no longer) tracked.
    pub fn open<S: Store>(
        repo: &ProblemRepository<S>,
        id: &str,
        today: NaiveDate,
    ) -> Option<Self> {
        let problem = repo.get(id)?;
        Some(RescheduleSession {
            id: id.to_string(),
            title: problem.title.clone(),
            today,
            dates: problem.scheduled_dates.iter().copied().collect(),
            completed: problem.completed_dates.clone(),
            closed: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn is_locked(&self, index: usize) -> bool {
        self.dates
            .get(index)
            .is_some_and(|date| self.completed.contains(date))
    }

    /// Appends one week after the last date (or after today when empty).
    /// Returns the new date, or `None` if it was already scheduled.
    pub fn add_date(&mut self) -> SchedulerResult<Option<NaiveDate>> {
        self.ensure_open()?;
        let base = self.dates.last().copied().unwrap_or(self.today);
        let next = add_days(base, RESCHEDULE_STEP_DAYS);
        if self.dates.contains(&next) {
            debug!("add_date: {} already scheduled for {}", next, self.id);
            return Ok(None);
        }
        self.insert_sorted(next);
        Ok(Some(next))
    }

    pub fn remove_date(&mut self, date: NaiveDate) -> SchedulerResult<bool> {
        self.ensure_open()?;
        let before = self.dates.len();
        self.dates.retain(|d| *d != date);
        Ok(self.dates.len() != before)
    }

    /// Moves the repetition at `index`. Completed repetitions stay put.
    pub fn set_date(&mut self, index: usize, date: NaiveDate) -> SchedulerResult<()> {
        self.ensure_open()?;
        let current = *self.dates.get(index).ok_or(ValidationError::RepetitionOutOfRange {
            index,
            len: self.dates.len(),
        })?;
        if self.completed.contains(&current) {
            return Err(ValidationError::CompletedRepetitionLocked(current).into());
        }
        self.dates.remove(index);
        if !self.dates.contains(&date) {
            self.insert_sorted(date);
        }
        Ok(())
    }

    pub fn set_days(&mut self, index: usize, days: i64) -> SchedulerResult<()> {
        let days = days.clamp(INTERVAL_MIN_DAYS, INTERVAL_MAX_DAYS);
        self.set_date(index, add_days(self.today, days))
    }

    /// Writes the edited dates back and persists. An empty list deletes the
    /// problem.
    pub fn commit<S: Store>(
        &mut self,
        repo: &mut ProblemRepository<S>,
    ) -> SchedulerResult<ScheduleChange> {
        self.ensure_open()?;
        let change = repo.replace_schedule(&self.id, self.dates.iter().copied());
        self.closed = true;
        info!("rescheduled {}: {:?}", self.id, change);
        repo.persist()?;
        Ok(change)
    }

    pub fn delete<S: Store>(&mut self, repo: &mut ProblemRepository<S>) -> SchedulerResult<bool> {
        self.ensure_open()?;
        let removed = repo.delete(&self.id);
        self.closed = true;
        repo.persist()?;
        Ok(removed)
    }

    pub fn cancel(&mut self) {
        self.closed = true;
    }

    fn ensure_open(&self) -> SchedulerResult<()> {
        if self.closed {
            return Err(SchedulerError::SessionClosed);
        }
        Ok(())
    }

    fn insert_sorted(&mut self, date: NaiveDate) {
        let pos = self.dates.partition_point(|d| *d < date);
        self.dates.insert(pos, date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Problem};
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 1, 1)
    }

    fn repo_with_two_sum() -> ProblemRepository<MemoryStore> {
        let mut repo = ProblemRepository::new(MemoryStore::new());
        let problem = Problem {
            title: "Two Sum".to_string(),
            difficulty: Difficulty::Easy,
            category: None,
            topics: Vec::new(),
            url: "https://leetcode.com/problems/two-sum/".to_string(),
            added_date: today(),
            scheduled_dates: [date(2024, 1, 2), date(2024, 1, 4), date(2024, 1, 8)]
                .into_iter()
                .collect(),
            completed_dates: [date(2024, 1, 2)].into_iter().collect(),
        };
        repo.upsert("two-sum", problem).unwrap();
        repo
    }

    #[test]
    fn open_on_missing_problem_is_none() {
        let repo = repo_with_two_sum();
        assert!(RescheduleSession::open(&repo, "ghost", today()).is_none());
    }

    #[test]
    fn add_date_steps_a_week_after_the_last() {
        let repo = repo_with_two_sum();
        let mut session = RescheduleSession::open(&repo, "two-sum", today()).unwrap();
        assert_eq!(session.add_date().unwrap(), Some(date(2024, 1, 15)));
        assert_eq!(session.dates().last(), Some(&date(2024, 1, 15)));

        for d in session.dates().to_vec() {
            session.remove_date(d).unwrap();
        }
        assert_eq!(session.add_date().unwrap(), Some(date(2024, 1, 8)));
        assert_eq!(session.add_date().unwrap(), Some(date(2024, 1, 15)));
    }

    #[test]
    fn completed_repetitions_cannot_move() {
        let repo = repo_with_two_sum();
        let mut session = RescheduleSession::open(&repo, "two-sum", today()).unwrap();
        assert!(session.is_locked(0));
        assert!(matches!(
            session.set_date(0, date(2024, 1, 3)),
            Err(SchedulerError::Validation(ValidationError::CompletedRepetitionLocked(_)))
        ));

        session.set_date(2, date(2024, 1, 3)).unwrap();
        assert_eq!(
            session.dates(),
            &[date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]
        );
        session.set_days(1, 10).unwrap();
        assert_eq!(session.dates().last(), Some(&date(2024, 1, 11)));
    }

    #[test]
    fn commit_writes_back_and_empty_cascades() {
        let mut repo = repo_with_two_sum();
        let mut session = RescheduleSession::open(&repo, "two-sum", today()).unwrap();
        session.remove_date(date(2024, 1, 4)).unwrap();
        assert_eq!(session.commit(&mut repo).unwrap(), ScheduleChange::Updated);
        assert_eq!(repo.get("two-sum").unwrap().total_repetitions(), 2);
        assert!(!repo.is_dirty());
        assert!(matches!(session.add_date(), Err(SchedulerError::SessionClosed)));

        let mut session = RescheduleSession::open(&repo, "two-sum", today()).unwrap();
        for d in session.dates().to_vec() {
            session.remove_date(d).unwrap();
        }
        assert_eq!(session.commit(&mut repo).unwrap(), ScheduleChange::Deleted);
        assert!(!repo.contains("two-sum"));
    }

    #[test]
    fn delete_and_cancel() {
        let mut repo = repo_with_two_sum();
        let mut cancelled = RescheduleSession::open(&repo, "two-sum", today()).unwrap();
        cancelled.remove_date(date(2024, 1, 8)).unwrap();
        cancelled.cancel();
        assert_eq!(repo.get("two-sum").unwrap().total_repetitions(), 3);

        let mut session = RescheduleSession::open(&repo, "two-sum", today()).unwrap();
        assert!(session.delete(&mut repo).unwrap());
        assert!(repo.is_empty());
    }
}
