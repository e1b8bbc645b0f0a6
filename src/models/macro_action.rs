//! Macro definitions stored in `MacroActions.json`.

use super::{int_or, str_or};
use serde::Serialize;
use serde_json::Value as Json;

#[derive(Serialize, Debug, Clone, PartialEq)]
/// One macro. `Enabled` stays a string literal because the editor reads it as
/// an expression, not a JSON boolean.
pub struct MacroAction {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Enabled")]
    pub enabled: String,
    #[serde(rename = "Execute")]
    pub execute: String,
    #[serde(rename = "Tooltip")]
    pub tooltip: String,
    #[serde(rename = "ValidContexts")]
    pub valid_contexts: String,
}

impl MacroAction {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        execute: impl Into<String>,
        tooltip: impl Into<String>,
        valid_contexts: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: "true".to_string(),
            execute: execute.into(),
            tooltip: tooltip.into(),
            valid_contexts: valid_contexts.into(),
        }
    }

    pub fn from_json(value: &Json) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: int_or(obj, "Id", 0),
            name: str_or(obj, "Name", ""),
            enabled: str_or(obj, "Enabled", "true"),
            execute: str_or(obj, "Execute", ""),
            tooltip: str_or(obj, "Tooltip", ""),
            valid_contexts: str_or(obj, "ValidContexts", "Model"),
        })
    }

    pub fn contexts(&self) -> Vec<&str> {
        self.valid_contexts
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
/// Root document of `MacroActions.json`.
pub struct MacroFile {
    #[serde(rename = "Actions")]
    pub actions: Vec<MacroAction>,
}

impl MacroFile {
    pub fn from_json(value: &Json) -> Self {
        let actions = value
            .get("Actions")
            .and_then(Json::as_array)
            .map(|items| items.iter().filter_map(MacroAction::from_json).collect())
            .unwrap_or_default();
        Self { actions }
    }

    /// Next free identifier: one past the current maximum, or 1 when empty.
    pub fn next_id(&self) -> i64 {
        self.actions.iter().map(|m| m.id).max().map_or(1, |m| m + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enabled_serialises_as_string() {
        let m = MacroAction::new(1, "Format DAX", "Info(\"x\");", "", "Model");
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["Enabled"], json!("true"));
        assert_eq!(v["Id"], json!(1));
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        let f = MacroFile::from_json(&json!({"Actions": [{"Id": 4}, {"Id": 2}]}));
        assert_eq!(f.next_id(), 5);
        assert_eq!(MacroFile::default().next_id(), 1);
    }

    #[test]
    fn test_contexts_split() {
        let m = MacroAction::new(1, "n", "", "", "Table, Measure");
        assert_eq!(m.contexts(), vec!["Table", "Measure"]);
    }
}
