//! Best Practice Analyzer rule record.

use super::{int_or, opt_int, opt_str, str_or};
use crate::catalog;
use serde::Serialize;
use serde_json::Value as Json;

#[derive(Serialize, Debug, Clone, PartialEq)]
/// A single analyzer rule as stored in `BPARules.json` and model annotations.
pub struct BpaRule {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Category", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Severity")]
    pub severity: i64,
    #[serde(rename = "Scope")]
    pub scope: String,
    #[serde(rename = "Expression")]
    pub expression: String,
    #[serde(rename = "FixExpression", skip_serializing_if = "Option::is_none")]
    pub fix_expression: Option<String>,
    #[serde(rename = "CompatibilityLevel", skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<i64>,
    #[serde(rename = "Source", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "Remarks", skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip)]
    pub is_builtin: bool,
    #[serde(skip)]
    pub is_enabled: bool,
    #[serde(skip)]
    pub is_ignored: bool,
}

impl BpaRule {
    /// Decode a rule object. Returns `None` when `value` is not an object.
    pub fn from_json(value: &Json) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: str_or(obj, "ID", "UNKNOWN"),
            name: str_or(obj, "Name", "Unnamed"),
            category: opt_str(obj, "Category"),
            description: opt_str(obj, "Description"),
            severity: int_or(obj, "Severity", 1),
            scope: str_or(obj, "Scope", ""),
            expression: str_or(obj, "Expression", ""),
            fix_expression: opt_str(obj, "FixExpression"),
            compatibility_level: opt_int(obj, "CompatibilityLevel"),
            source: opt_str(obj, "Source"),
            remarks: opt_str(obj, "Remarks"),
            is_builtin: false,
            is_enabled: true,
            is_ignored: false,
        })
    }

    /// Materialise a built-in rule from the catalog.
    pub fn builtin(id: &str, enabled: bool) -> Self {
        let (category, description) =
            catalog::builtin_rule(id).unwrap_or(("Unknown", "Unknown built-in rule"));
        Self {
            id: id.to_string(),
            name: description.to_string(),
            category: Some(category.to_string()),
            description: Some(description.to_string()),
            severity: 2,
            scope: "Various".to_string(),
            expression: "(built-in)".to_string(),
            fix_expression: None,
            compatibility_level: None,
            source: None,
            remarks: None,
            is_builtin: true,
            is_enabled: enabled,
            is_ignored: false,
        }
    }

    /// Individual scope tags from the comma-separated `Scope` field.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn severity_label(&self) -> String {
        match self.severity {
            1 => "Low".to_string(),
            2 => "Medium".to_string(),
            3 => "High".to_string(),
            n => n.to_string(),
        }
    }

    /// Enabled and not ignored at model level.
    pub fn is_active(&self) -> bool {
        self.is_enabled && !self.is_ignored
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_ignored {
            "Ignored"
        } else if !self.is_enabled {
            "Disabled"
        } else {
            "Active"
        }
    }
}

/// Decode a JSON array of rules; anything else is reported as an error string.
pub fn rules_from_json(value: &Json) -> Result<Vec<BpaRule>, String> {
    match value.as_array() {
        Some(items) => Ok(items.iter().filter_map(BpaRule::from_json).collect()),
        None => Err("Expected a JSON array of rules".to_string()),
    }
}
