// src/repository.rs

use crate::constants::STORE_KEY_PROBLEMS;
use crate::error::{SchedulerResult, StoreError, ValidationError};
use crate::models::{Problem, ProblemId};
use crate::store::Store;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of an edit to a problem's scheduled dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleChange {
    Updated,
    /// The schedule became empty and the problem was removed.
    Deleted,
    /// No problem with that id exists; nothing happened.
    Missing,
}

/// Canonical in-memory collection of tracked problems.
///
/// Mutations only touch memory and mark the repository dirty. Nothing is
/// durable until [`persist`](Self::persist) succeeds. A failed persist leaves
/// memory as it is so the caller can retry without redoing the edit.
pub struct ProblemRepository<S: Store> {
    store: S,
    problems: BTreeMap<ProblemId, Problem>,
    dirty: bool,
}

impl<S: Store> ProblemRepository<S> {
    pub fn new(store: S) -> Self {
        ProblemRepository {
            store,
            problems: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Creates the repository and loads it from the store in one step.
    pub fn open(store: S) -> SchedulerResult<Self> {
        let mut repo = Self::new(store);
        repo.load()?;
        Ok(repo)
    }

    pub fn load(&mut self) -> SchedulerResult<()> {
        let mut problems: BTreeMap<ProblemId, Problem> = match self.store.get(STORE_KEY_PROBLEMS) {
            Ok(None) | Ok(Some(Value::Null)) => {
                debug!("no stored problems, starting empty");
                BTreeMap::new()
            }
            Ok(Some(value)) => serde_json::from_value(value).map_err(|source| {
                StoreError::Malformed {
                    key: STORE_KEY_PROBLEMS.to_string(),
                    source,
                }
            })?,
            Err(err) => {
                error!("loading problems failed: {}", err);
                return Err(err.into());
            }
        };
        problems.retain(|id, problem| {
            if problem.scheduled_dates.is_empty() {
                warn!("dropping stored problem {} with no scheduled dates", id);
                return false;
            }
            true
        });
        info!("loaded {} tracked problems", problems.len());
        self.problems = problems;
        self.dirty = false;
        Ok(())
    }

    /// Writes the whole collection back under the problems key.
    pub fn persist(&mut self) -> SchedulerResult<()> {
        let value = serde_json::to_value(&self.problems).map_err(|source| StoreError::Encode {
            key: STORE_KEY_PROBLEMS.to_string(),
            source,
        })?;
        if let Err(err) = self.store.set(STORE_KEY_PROBLEMS, value) {
            error!("persisting {} problems failed: {}", self.problems.len(), err);
            return Err(err.into());
        }
        self.dirty = false;
        debug!("persisted {} problems", self.problems.len());
        Ok(())
    }

    // --- Reads ---

    pub fn get(&self, id: &str) -> Option<&Problem> {
        self.problems.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.problems.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProblemId, &Problem)> {
        self.problems.iter()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // --- Mutations ---

    /// Inserts or overwrites the complete record. An empty schedule is
    /// rejected because a problem without dates is not tracked.
    pub fn upsert(&mut self, id: &str, problem: Problem) -> SchedulerResult<()> {
        if id.trim().is_empty() {
            return Err(ValidationError::MissingProblemId.into());
        }
        if problem.scheduled_dates.is_empty() {
            return Err(ValidationError::EmptySchedule.into());
        }
        info!(
            "upsert problem {} ({} repetitions)",
            id,
            problem.scheduled_dates.len()
        );
        self.problems.insert(id.to_string(), problem);
        self.dirty = true;
        Ok(())
    }

    /// Returns whether a record was removed. Absent ids are a no-op.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.problems.remove(id).is_some();
        if removed {
            info!("deleted problem {}", id);
            self.dirty = true;
        } else {
            debug!("delete: problem {} not found, ignoring", id);
        }
        removed
    }

    /// Adds or removes `date` from the completed set. Returns whether
    /// anything changed; an unknown id is a no-op.
    pub fn set_completion(&mut self, id: &str, date: NaiveDate, completed: bool) -> bool {
        let Some(problem) = self.problems.get_mut(id) else {
            debug!("set_completion: problem {} not found, ignoring", id);
            return false;
        };
        let changed = if completed {
            problem.completed_dates.insert(date)
        } else {
            problem.completed_dates.remove(&date)
        };
        if changed {
            info!("problem {} on {} marked completed={}", id, date, completed);
            self.dirty = true;
        }
        changed
    }

    /// Flips completion for `date` and returns the new state, or `None` when
    /// the problem does not exist.
    pub fn toggle_completion(&mut self, id: &str, date: NaiveDate) -> Option<bool> {
        let completed = !self.problems.get(id)?.is_completed_on(date);
        self.set_completion(id, date, completed);
        Some(completed)
    }

    pub fn remove_scheduled_date(&mut self, id: &str, date: NaiveDate) -> ScheduleChange {
        let Some(problem) = self.problems.get_mut(id) else {
            debug!("remove_scheduled_date: problem {} not found, ignoring", id);
            return ScheduleChange::Missing;
        };
        if !problem.scheduled_dates.remove(&date) {
            return ScheduleChange::Updated;
        }
        self.dirty = true;
        if problem.scheduled_dates.is_empty() {
            self.problems.remove(id);
            info!("removed last repetition of {}, problem deleted", id);
            return ScheduleChange::Deleted;
        }
        info!("removed repetition {} from {}", date, id);
        ScheduleChange::Updated
    }

    /// Replaces the scheduled dates wholesale. Completed dates are kept.
    pub fn replace_schedule(
        &mut self,
        id: &str,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> ScheduleChange {
        let Some(problem) = self.problems.get_mut(id) else {
            debug!("replace_schedule: problem {} not found, ignoring", id);
            return ScheduleChange::Missing;
        };
        problem.scheduled_dates = dates.into_iter().collect();
        self.dirty = true;
        if problem.scheduled_dates.is_empty() {
            self.problems.remove(id);
            info!("schedule for {} emptied, problem deleted", id);
            return ScheduleChange::Deleted;
        }
        info!(
            "schedule for {} replaced ({} repetitions)",
            id,
            problem.scheduled_dates.len()
        );
        ScheduleChange::Updated
    }
}
