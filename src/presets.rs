// src/presets.rs

use crate::constants::{CUSTOM_PRESET_ID, STORE_KEY_PRESETS};
use crate::error::{SchedulerResult, StoreError, ValidationError};
use crate::models::SchedulePreset;
use crate::store::Store;
use log::{debug, warn};

pub fn builtin_presets() -> Vec<SchedulePreset> {
    vec![
        preset("standard", "Standard", &[1, 3, 7]),
        preset("intensive", "Intensive", &[1, 2, 4]),
        preset("relaxed", "Relaxed", &[2, 7, 14]),
    ]
}

fn preset(id: &str, name: &str, intervals: &[i64]) -> SchedulePreset {
    SchedulePreset {
        id: id.to_string(),
        name: name.to_string(),
        intervals: intervals.to_vec(),
    }
}

/// The presets offered in a scheduling prompt plus which one starts selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetCatalog {
    presets: Vec<SchedulePreset>,
    default_id: String,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::new(builtin_presets(), crate::constants::DEFAULT_PRESET_ID)
    }
}

impl PresetCatalog {
    /// Falls back to the first preset when `default_id` names none of them.
    pub fn new(presets: Vec<SchedulePreset>, default_id: &str) -> Self {
        let default_id = if presets.iter().any(|p| p.id == default_id) {
            default_id.to_string()
        } else {
            presets
                .first()
                .map(|p| p.id.clone())
                .unwrap_or_else(|| CUSTOM_PRESET_ID.to_string())
        };
        PresetCatalog {
            presets,
            default_id,
        }
    }

    /// Reads user presets from the store. Absent, empty or malformed entries
    /// leave the built-ins in place; a store failure is returned.
    pub fn load<S: Store>(store: &S, default_id: &str) -> SchedulerResult<Self> {
        let stored = match store.get(STORE_KEY_PRESETS)? {
            Some(value) => match serde_json::from_value::<Vec<SchedulePreset>>(value) {
                Ok(list) => list,
                Err(source) => {
                    let err = StoreError::Malformed {
                        key: STORE_KEY_PRESETS.to_string(),
                        source,
                    };
                    warn!("ignoring stored presets: {}", err);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if stored.is_empty() {
            return Ok(Self::new(builtin_presets(), default_id));
        }
        if let Some(bad) = stored.iter().find(|p| validate(p).is_err()) {
            warn!("ignoring stored presets: {}", ValidationError::InvalidInterval(bad.id.clone()));
            return Ok(Self::new(builtin_presets(), default_id));
        }
        debug!("loaded {} stored presets", stored.len());
        Ok(Self::new(stored, default_id))
    }

    pub fn get(&self, id: &str) -> Option<&SchedulePreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn presets(&self) -> &[SchedulePreset] {
        &self.presets
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }
}

fn validate(preset: &SchedulePreset) -> Result<(), ValidationError> {
    if preset.intervals.is_empty() || preset.intervals.iter().any(|&days| days <= 0) {
        return Err(ValidationError::InvalidInterval(preset.id.clone()));
    }
    Ok(())
}
