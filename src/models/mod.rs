//! Shared data models for rule, macro and audit records plus validation output.
//!
//! Records are decoded permissively: each field is read through an explicit
//! helper that falls back to a default when the key is absent or has the
//! wrong JSON type. Decoding never fails; validation reports problems.

pub mod macro_action;
pub mod rule;
pub mod source;

use serde::Serialize;
use serde_json::{Map, Value as Json};

#[derive(Serialize, Debug, Clone, Default)]
/// Result of validating one input document.
pub struct ValidationReport {
    /// Human label of what was validated (file path or `stdin`).
    pub subject: String,
    /// Number of records (or top-level items) inspected.
    pub total: usize,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn new(subject: impl Into<String>, total: usize) -> Self {
        Self {
            subject: subject.into(),
            total,
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            1
        }
    }
}

pub(crate) fn str_or(obj: &Map<String, Json>, key: &str, default: &str) -> String {
    opt_str(obj, key).unwrap_or_else(|| default.to_string())
}

pub(crate) fn opt_str(obj: &Map<String, Json>, key: &str) -> Option<String> {
    obj.get(key).and_then(Json::as_str).map(str::to_string)
}

pub(crate) fn int_or(obj: &Map<String, Json>, key: &str, default: i64) -> i64 {
    opt_int(obj, key).unwrap_or(default)
}

pub(crate) fn opt_int(obj: &Map<String, Json>, key: &str) -> Option<i64> {
    obj.get(key).and_then(Json::as_i64)
}
