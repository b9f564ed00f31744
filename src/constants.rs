// src/constants.rs

// --- Store Keys ---
pub const STORE_KEY_PROBLEMS: &str = "spacedRepProblems";
pub const STORE_KEY_PRESETS: &str = "schedulePresets";

// --- Date Handling ---
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const MONTH_FORMAT: &str = "%Y-%m";

// --- Interval Bounds (days) ---
pub const INTERVAL_MIN_DAYS: i64 = 1;
pub const INTERVAL_MAX_DAYS: i64 = 365;

// --- Schedule Editor ---
pub const CUSTOM_PRESET_ID: &str = "custom";
pub const DEFAULT_PRESET_ID: &str = "standard";
pub const FALLBACK_INTERVALS: [i64; 3] = [1, 3, 7];
pub const MANUAL_ADD_INTERVALS: [i64; 5] = [1, 3, 7, 14, 30];
pub const ADD_REPETITION_STEP_DAYS: i64 = 14;
pub const ADD_REPETITION_EMPTY_DAYS: i64 = 30;

// --- Reschedule Session ---
pub const RESCHEDULE_STEP_DAYS: i64 = 7;

// --- Queries ---
pub const UPCOMING_HORIZON_DAYS: u32 = 7;
pub const NEAR_TERM_DAYS: i64 = 7;
pub const CALENDAR_GRID_CELLS: usize = 42;
pub const CALENDAR_MAX_MARKERS: usize = 3;

// --- Problem Defaults ---
pub const DEFAULT_CATEGORY: &str = "Algorithm";
pub const PROBLEM_URL_BASE: &str = "https://leetcode.com/problems/";
