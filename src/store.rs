// src/store.rs

use crate::error::StoreError;
use serde_json::Value;
use std::collections::HashMap;

/// Key/value persistence the scheduler saves into. Values are whole JSON
/// blobs; there are no partial writes.
pub trait Store {
    /// `Ok(None)` means "nothing stored yet", never a transport failure.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// How a [`MemoryStore`] should fail its next operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Unavailable,
    ContextInvalidated,
}

impl FailureMode {
    fn to_error(self) -> StoreError {
        match self {
            FailureMode::Unavailable => StoreError::Unavailable("injected failure".to_string()),
            FailureMode::ContextInvalidated => StoreError::ContextInvalidated,
        }
    }
}

/// In-process store, used for tests and for sessions that should not touch disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
    read_failure: Option<FailureMode>,
    write_failure: Option<FailureMode>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn fail_reads(&mut self, mode: Option<FailureMode>) {
        self.read_failure = mode;
    }

    pub fn fail_writes(&mut self, mode: Option<FailureMode>) {
        self.write_failure = mode;
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if let Some(mode) = self.read_failure {
            return Err(mode.to_error());
        }
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        if let Some(mode) = self.write_failure {
            return Err(mode.to_error());
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
