// src/intake.rs
//
// Entry points that create scheduling prompts: an accepted submission from
// the detector, or a problem typed in by hand.

use crate::constants::{DEFAULT_CATEGORY, PROBLEM_URL_BASE};
use crate::editor::{Origin, ScheduleEditor};
use crate::error::ValidationError;
use crate::models::{Difficulty, ProblemDescriptor, ProblemId};
use crate::presets::PresetCatalog;
use chrono::NaiveDate;
use log::{debug, error, info};
use regex::Regex;
use std::sync::OnceLock;

const PROBLEM_ID_PATTERN: &str = r"leetcode\.com/problems/([^/?]+)|^([a-z0-9-]+)$";

fn problem_id_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| match Regex::new(PROBLEM_ID_PATTERN) {
            Ok(re) => Some(re),
            Err(err) => {
                error!("problem id pattern failed to compile: {}", err);
                None
            }
        })
        .as_ref()
}

/// Pulls the problem slug out of a problem URL or accepts a bare slug.
pub fn extract_problem_id(input: &str) -> Option<ProblemId> {
    let input = input.trim();
    let caps = problem_id_regex()?.captures(input)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_lowercase())
}

/// Keeps a LeetCode URL as typed; anything else becomes the canonical
/// problem URL for `id`.
pub fn canonical_url(input: &str, id: &str) -> String {
    if input.contains("leetcode.com") {
        input.trim().to_string()
    } else {
        format!("{}{}/", PROBLEM_URL_BASE, id)
    }
}

pub fn validate_descriptor(descriptor: &ProblemDescriptor) -> Result<(), ValidationError> {
    if descriptor.slug.trim().is_empty() {
        return Err(ValidationError::MissingProblemId);
    }
    if descriptor.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

/// Detector hook: one call per accepted submission, one prompt per call.
/// Returns `None` when automatic prompting is switched off.
pub fn on_accepted(
    mut descriptor: ProblemDescriptor,
    presets: &PresetCatalog,
    auto_detect: bool,
    today: NaiveDate,
) -> Option<ScheduleEditor> {
    if !auto_detect {
        debug!("auto-detect disabled, no prompt for {}", descriptor.slug);
        return None;
    }
    if descriptor.category.is_none() {
        descriptor.category = Some(
            descriptor
                .topics
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        );
    }
    info!("accepted submission for {} ({})", descriptor.slug, descriptor.difficulty);
    Some(ScheduleEditor::for_new(
        descriptor,
        Origin::Detected,
        presets.clone(),
        today,
    ))
}

/// A problem entered by hand.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub url: String,
    pub title: String,
    pub difficulty: Difficulty,
}

impl ManualEntry {
    pub fn into_descriptor(self) -> Result<ProblemDescriptor, ValidationError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingProblemId);
        }
        let slug = extract_problem_id(url).ok_or(ValidationError::MissingProblemId)?;
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(ProblemDescriptor {
            title: title.to_string(),
            url: canonical_url(url, &slug),
            slug,
            difficulty: self.difficulty,
            category: None,
            topics: Vec::new(),
        })
    }

    /// Validates the entry and opens an editor already in custom edit mode.
    pub fn open_editor(
        self,
        presets: &PresetCatalog,
        today: NaiveDate,
    ) -> Result<ScheduleEditor, ValidationError> {
        let descriptor = self.into_descriptor()?;
        Ok(ScheduleEditor::for_manual_add(descriptor, presets.clone(), today))
    }
}
