// src/editor.rs
//
// One in-progress scheduling decision: pick a preset or build a custom
// interval list, preview the resulting dates, then commit or cancel.

use crate::constants::*;
use crate::dates::{add_days, classify_offset, dates_from_intervals, days_between};
use crate::error::{SchedulerError, SchedulerResult, ValidationError};
use crate::intake::validate_descriptor;
use crate::models::{Problem, ProblemDescriptor, ProblemId};
use crate::presets::PresetCatalog;
use crate::repository::{ProblemRepository, ScheduleChange};
use crate::store::Store;
use chrono::NaiveDate;
use log::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalSource {
    Preset(String),
    Custom(Vec<i64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    /// Preset selected, preview only.
    Browsing,
    /// Per-repetition fields are editable.
    Editing,
    Committed,
    Cancelled,
}

impl EditorPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, EditorPhase::Committed | EditorPhase::Cancelled)
    }
}

/// What moved the session from a preset onto a custom interval list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomTrigger {
    Explicit,
    AddRepetition,
    RemoveRepetition,
    SetRepetitionDays,
}

/// Where the committed schedule goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorTarget {
    NewProblem {
        descriptor: ProblemDescriptor,
        origin: Origin,
    },
    Existing(ProblemId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// From the submission detector. Re-adding overwrites the stored record.
    Detected,
    /// Entered by hand. Re-adding an existing id is rejected.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub days: i64,
    pub label: String,
    pub date: NaiveDate,
}

pub struct ScheduleEditor {
    presets: PresetCatalog,
    target: EditorTarget,
    today: NaiveDate,
    source: IntervalSource,
    phase: EditorPhase,
    custom_trigger: Option<CustomTrigger>,
}

impl ScheduleEditor {
    pub fn new(target: EditorTarget, presets: PresetCatalog, today: NaiveDate) -> Self {
        let source = if presets.default_id() == CUSTOM_PRESET_ID {
            IntervalSource::Custom(FALLBACK_INTERVALS.to_vec())
        } else {
            IntervalSource::Preset(presets.default_id().to_string())
        };
        ScheduleEditor {
            presets,
            target,
            today,
            source,
            phase: EditorPhase::Browsing,
            custom_trigger: None,
        }
    }

    pub fn for_new(
        descriptor: ProblemDescriptor,
        origin: Origin,
        presets: PresetCatalog,
        today: NaiveDate,
    ) -> Self {
        Self::new(EditorTarget::NewProblem { descriptor, origin }, presets, today)
    }

    /// Manual entry starts directly in an editable custom list.
    pub fn for_manual_add(
        descriptor: ProblemDescriptor,
        presets: PresetCatalog,
        today: NaiveDate,
    ) -> Self {
        let mut editor = Self::for_new(descriptor, Origin::Manual, presets, today);
        editor.source = IntervalSource::Custom(MANUAL_ADD_INTERVALS.to_vec());
        editor.custom_trigger = Some(CustomTrigger::Explicit);
        editor.phase = EditorPhase::Editing;
        editor
    }

    pub fn for_existing(id: &str, presets: PresetCatalog, today: NaiveDate) -> Self {
        Self::new(EditorTarget::Existing(id.to_string()), presets, today)
    }

    // --- Accessors ---

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn target(&self) -> &EditorTarget {
        &self.target
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn source(&self) -> &IntervalSource {
        &self.source
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.source, IntervalSource::Custom(_))
    }

    pub fn custom_trigger(&self) -> Option<CustomTrigger> {
        self.custom_trigger
    }

    pub fn active_preset_id(&self) -> &str {
        match &self.source {
            IntervalSource::Preset(id) => id,
            IntervalSource::Custom(_) => CUSTOM_PRESET_ID,
        }
    }

    /// The offsets the session would commit right now.
    pub fn intervals(&self) -> Vec<i64> {
        match &self.source {
            IntervalSource::Custom(list) => list.clone(),
            IntervalSource::Preset(id) => self.preset_intervals(id),
        }
    }

    pub fn preview(&self) -> Vec<PreviewEntry> {
        self.intervals()
            .into_iter()
            .map(|days| PreviewEntry {
                days,
                label: classify_offset(days),
                date: add_days(self.today, days),
            })
            .collect()
    }

    // --- Transitions ---

    /// Switches to a named preset, dropping any unsaved custom intervals.
    pub fn select_preset(&mut self, preset_id: &str) -> SchedulerResult<()> {
        self.ensure_open()?;
        if preset_id == CUSTOM_PRESET_ID {
            return self.switch_to_custom();
        }
        if self.presets.get(preset_id).is_none() {
            return Err(ValidationError::UnknownPreset(preset_id.to_string()).into());
        }
        if self.is_custom() {
            debug!("discarding custom intervals for preset {}", preset_id);
        }
        self.source = IntervalSource::Preset(preset_id.to_string());
        self.custom_trigger = None;
        Ok(())
    }

    pub fn switch_to_custom(&mut self) -> SchedulerResult<()> {
        self.ensure_open()?;
        self.edit_custom(CustomTrigger::Explicit, |_| ());
        Ok(())
    }

    /// Flips between Browsing and Editing. Intervals are untouched.
    pub fn toggle_edit(&mut self) -> SchedulerResult<EditorPhase> {
        self.ensure_open()?;
        self.phase = match self.phase {
            EditorPhase::Browsing => EditorPhase::Editing,
            _ => EditorPhase::Browsing,
        };
        Ok(self.phase)
    }

    pub fn add_repetition(&mut self) -> SchedulerResult<()> {
        self.ensure_open()?;
        self.edit_custom(CustomTrigger::AddRepetition, |list| {
            let next = list
                .last()
                .map(|last| last + ADD_REPETITION_STEP_DAYS)
                .unwrap_or(ADD_REPETITION_EMPTY_DAYS)
                .clamp(INTERVAL_MIN_DAYS, INTERVAL_MAX_DAYS);
            list.push(next);
        });
        Ok(())
    }

    pub fn remove_repetition(&mut self, index: usize) -> SchedulerResult<()> {
        self.ensure_open()?;
        self.check_index(index)?;
        self.edit_custom(CustomTrigger::RemoveRepetition, |list| {
            list.remove(index);
        });
        Ok(())
    }

    /// Clamps `days` into range, replaces the offset at `index` and re-sorts
    /// the list. The edited entry may end up at a different index.
    pub fn set_repetition_days(&mut self, index: usize, days: i64) -> SchedulerResult<()> {
        self.ensure_open()?;
        self.check_index(index)?;
        self.edit_custom(CustomTrigger::SetRepetitionDays, |list| {
            list[index] = days.clamp(INTERVAL_MIN_DAYS, INTERVAL_MAX_DAYS);
            list.sort_unstable();
        });
        Ok(())
    }

    /// Retargets a repetition to a calendar date. Today or past dates are
    /// ignored; returns whether the edit was applied.
    pub fn set_repetition_from_date(
        &mut self,
        index: usize,
        date: NaiveDate,
    ) -> SchedulerResult<bool> {
        self.ensure_open()?;
        let offset = days_between(self.today, date);
        if offset <= 0 {
            debug!("ignoring non-future date {} for repetition {}", date, index);
            return Ok(false);
        }
        self.set_repetition_days(index, offset)?;
        Ok(true)
    }

    /// Computes the final dates, writes them into the repository and persists.
    ///
    /// The session is `Committed` once memory has been updated. If the
    /// persist then fails the error is returned and the caller retries
    /// `repo.persist()` directly.
    pub fn commit<S: Store>(
        &mut self,
        repo: &mut ProblemRepository<S>,
    ) -> SchedulerResult<Vec<NaiveDate>> {
        self.ensure_open()?;
        let dates = dates_from_intervals(self.today, &self.intervals());
        if dates.is_empty() {
            return Err(ValidationError::EmptySchedule.into());
        }

        let applied = match &self.target {
            EditorTarget::NewProblem { descriptor, origin } => {
                validate_descriptor(descriptor)?;
                if *origin == Origin::Manual {
                    if let Some(existing) = repo.get(&descriptor.slug) {
                        return Err(ValidationError::DuplicateProblem {
                            id: descriptor.slug.clone(),
                            title: existing.title.clone(),
                        }
                        .into());
                    }
                }
                let problem = Problem::from_descriptor(descriptor, self.today, dates.clone());
                repo.upsert(&descriptor.slug, problem)?;
                dates
            }
            EditorTarget::Existing(id) => match repo.replace_schedule(id, dates.clone()) {
                ScheduleChange::Missing => {
                    warn!("commit: problem {} no longer exists, nothing to reschedule", id);
                    Vec::new()
                }
                _ => dates,
            },
        };

        self.phase = EditorPhase::Committed;
        info!(
            "committed {} repetitions from {} intervals",
            applied.len(),
            self.active_preset_id()
        );
        repo.persist()?;
        Ok(applied)
    }

    pub fn cancel(&mut self) -> SchedulerResult<()> {
        match self.phase {
            EditorPhase::Committed => Err(SchedulerError::SessionClosed),
            _ => {
                self.phase = EditorPhase::Cancelled;
                Ok(())
            }
        }
    }

    // --- Internals ---

    fn ensure_open(&self) -> SchedulerResult<()> {
        if self.phase.is_terminal() {
            return Err(SchedulerError::SessionClosed);
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> SchedulerResult<()> {
        let len = self.intervals().len();
        if index >= len {
            return Err(ValidationError::RepetitionOutOfRange { index, len }.into());
        }
        Ok(())
    }

    fn preset_intervals(&self, id: &str) -> Vec<i64> {
        self.presets
            .get(id)
            .map(|p| p.intervals.clone())
            .unwrap_or_else(|| FALLBACK_INTERVALS.to_vec())
    }

    /// Runs `edit` on the custom list, first materialising the active preset
    /// into an editable copy if the session is still on a preset.
    fn edit_custom<R>(
        &mut self,
        trigger: CustomTrigger,
        edit: impl FnOnce(&mut Vec<i64>) -> R,
    ) -> R {
        let current = std::mem::replace(&mut self.source, IntervalSource::Custom(Vec::new()));
        let mut list = match current {
            IntervalSource::Custom(list) => list,
            IntervalSource::Preset(id) => {
                debug!("preset {} -> custom ({:?})", id, trigger);
                self.custom_trigger = Some(trigger);
                self.preset_intervals(&id)
            }
        };
        let out = edit(&mut list);
        self.source = IntervalSource::Custom(list);
        out
    }
}
