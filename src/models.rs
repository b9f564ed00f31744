// src/models.rs

use crate::error::{SchedulerError, SchedulerResult};
use crate::presets::PresetCatalog;
use crate::repository::ProblemRepository;
use crate::store::Store;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

// --- App State ---

/// Shared scheduler state. The single mutex serialises every
/// load/mutate/persist sequence against the repository.
pub struct AppState<S: Store> {
    pub repo: Mutex<ProblemRepository<S>>,
    pub presets: PresetCatalog,
}

impl<S: Store> AppState<S> {
    pub fn new(repo: ProblemRepository<S>, presets: PresetCatalog) -> Self {
        AppState {
            repo: Mutex::new(repo),
            presets,
        }
    }

    pub fn with_repo<T>(
        &self,
        f: impl FnOnce(&mut ProblemRepository<S>) -> SchedulerResult<T>,
    ) -> SchedulerResult<T> {
        let mut repo = self.repo.lock().map_err(|_| SchedulerError::StatePoisoned)?;
        f(&mut repo)
    }
}

// --- Data Models ---

pub type ProblemId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Difficulty {
    Easy = 1,
    Medium = 2,
    Hard = 3,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Sort rank used by the management listing.
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl FromStr for Difficulty {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Ok(Difficulty::Medium), // Default fallback
        }
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Difficulty::Medium)
    }
}

impl Serialize for Difficulty {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked problem as persisted under the problems key, keyed by its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub url: String,
    pub added_date: NaiveDate,
    pub scheduled_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
}

impl Problem {
    pub fn from_descriptor(
        descriptor: &ProblemDescriptor,
        added_date: NaiveDate,
        scheduled: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Problem {
            title: descriptor.title.clone(),
            difficulty: descriptor.difficulty,
            category: descriptor.category.clone(),
            topics: descriptor.topics.clone(),
            url: descriptor.url.clone(),
            added_date,
            scheduled_dates: scheduled.into_iter().collect(),
            completed_dates: BTreeSet::new(),
        }
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }

    /// 1-based position of `date` among the sorted scheduled dates.
    pub fn repetition_ordinal(&self, date: NaiveDate) -> Option<usize> {
        self.scheduled_dates
            .iter()
            .position(|d| *d == date)
            .map(|idx| idx + 1)
    }

    pub fn total_repetitions(&self) -> usize {
        self.scheduled_dates.len()
    }

    /// Case-insensitive substring match on the title or any topic.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(needle)
            || self
                .topics
                .iter()
                .any(|topic| topic.to_lowercase().contains(needle))
    }
}

/// What the submission detector hands over for an accepted problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDescriptor {
    pub title: String,
    pub slug: ProblemId,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub url: String,
}

/// Named, immutable list of day offsets from "today".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePreset {
    pub id: String,
    pub name: String,
    pub intervals: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Overdue,
    DueToday,
    Tomorrow,
    InDays(i64),
    Upcoming,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemStatus {
    Due,
    Upcoming,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Title,
    Difficulty,
    #[default]
    NextReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReviewStats {
    pub due_today: usize,
    pub upcoming: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn difficulty_orders_easy_medium_hard() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
        assert_eq!(Difficulty::Hard.rank(), 3);
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("Insane".parse::<Difficulty>(), Ok(Difficulty::Medium));
    }

    #[test]
    fn problem_record_matches_persisted_shape() {
        let raw = r#"{
            "title": "Two Sum",
            "difficulty": "Easy",
            "url": "https://leetcode.com/problems/two-sum/",
            "addedDate": "2024-01-01",
            "scheduledDates": ["2024-01-08", "2024-01-02", "2024-01-02"],
            "completedDates": ["2024-01-02"]
        }"#;
        let problem: Problem = serde_json::from_str(raw).unwrap();
        assert_eq!(problem.difficulty, Difficulty::Easy);
        assert_eq!(problem.category, None);
        assert!(problem.topics.is_empty());
        assert_eq!(problem.total_repetitions(), 2);
        assert_eq!(problem.repetition_ordinal(date(2024, 1, 8)), Some(2));
        assert!(problem.is_completed_on(date(2024, 1, 2)));

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["addedDate"], "2024-01-01");
        assert_eq!(json["scheduledDates"][0], "2024-01-02");
        assert_eq!(json["difficulty"], "Easy");
        assert!(json.get("category").is_none());
    }

    #[test]
    fn unknown_difficulty_in_stored_data_reads_as_medium() {
        let raw = r#"{"title":"X","difficulty":"?","url":"u","addedDate":"2024-01-01","scheduledDates":["2024-01-02"]}"#;
        let problem: Problem = serde_json::from_str(raw).unwrap();
        assert_eq!(problem.difficulty, Difficulty::Medium);
    }

    #[test]
    fn matches_title_or_topic_case_insensitively() {
        let problem = Problem {
            title: "Merge Intervals".into(),
            difficulty: Difficulty::Medium,
            category: Some("Array".into()),
            topics: vec!["Array".into(), "Sorting".into()],
            url: "https://leetcode.com/problems/merge-intervals/".into(),
            added_date: date(2024, 1, 1),
            scheduled_dates: BTreeSet::new(),
            completed_dates: BTreeSet::new(),
        };
        assert!(problem.matches("interval"));
        assert!(problem.matches("sort"));
        assert!(problem.matches(""));
        assert!(!problem.matches("graph"));
    }

    fn state() -> AppState<crate::store::MemoryStore> {
        AppState::new(
            ProblemRepository::new(crate::store::MemoryStore::new()),
            PresetCatalog::default(),
        )
    }

    #[test]
    fn with_repo_mutations_are_visible_afterwards() {
        let state = state();
        let problem = Problem {
            title: "Two Sum".into(),
            difficulty: Difficulty::Easy,
            category: None,
            topics: Vec::new(),
            url: "https://leetcode.com/problems/two-sum/".into(),
            added_date: date(2024, 1, 1),
            scheduled_dates: [date(2024, 1, 2)].into_iter().collect(),
            completed_dates: BTreeSet::new(),
        };

        state.with_repo(|repo| repo.upsert("two-sum", problem)).unwrap();

        let len = state.with_repo(|repo| Ok(repo.len())).unwrap();
        assert_eq!(len, 1);
        assert!(state.repo.lock().unwrap().contains("two-sum"));
    }

    #[test]
    fn with_repo_reports_poisoned_lock() {
        let state = state();
        std::thread::scope(|scope| {
            let handle = scope.spawn(|| {
                let _guard = state.repo.lock().unwrap();
                panic!("worker died holding the repository lock");
            });
            assert!(handle.join().is_err());
        });

        let result = state.with_repo(|_| Ok(()));
        assert!(matches!(result, Err(SchedulerError::StatePoisoned)));
    }
}
