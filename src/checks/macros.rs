//! Validation of `MacroActions.json` files.

use super::{CheckOptions, WarningSink};
use crate::catalog::VALID_MACRO_CONTEXTS;
use crate::models::ValidationReport;
use crate::schema;
use serde_json::{Map, Value as Json};
use std::collections::HashSet;

pub fn validate_macros(
    subject: &str,
    data: &Json,
    schema: Option<&Json>,
    opts: CheckOptions,
    sink: &mut dyn WarningSink,
) -> ValidationReport {
    let actions = match actions_of(data) {
        Ok(a) => a,
        Err(msg) => {
            let mut report = ValidationReport::new(subject, 0);
            report.errors.push(msg.to_string());
            return report;
        }
    };
    let mut report = ValidationReport::new(subject, actions.len());

    match schema {
        Some(schema) => {
            match schema::validate_against(schema, data) {
                Ok(errs) => report.errors.extend(errs),
                Err(e) => report.errors.push(e),
            }
            if opts.schema_only {
                return report;
            }
            for (i, action) in actions.iter().enumerate() {
                if let Some(obj) = action.as_object() {
                    report.errors.extend(check_contexts(obj, i));
                }
            }
        }
        None => {
            for (i, action) in actions.iter().enumerate() {
                if let Some(obj) = action.as_object() {
                    report.errors.extend(check_structure(obj, i));
                }
            }
        }
    }

    let mut seen_ids: HashSet<i64> = HashSet::new();
    let mut seen_names: HashSet<&str> = HashSet::new();
    for (i, action) in actions.iter().enumerate() {
        let Some(obj) = action.as_object() else {
            report.errors.push(format!("Action at index {} is not an object", i));
            continue;
        };
        report.errors.extend(validate_macro_extras(obj, i, sink));

        if let Some(id) = obj.get("Id").and_then(Json::as_i64) {
            if id != -1 && !seen_ids.insert(id) {
                let who = obj
                    .get("Name")
                    .and_then(Json::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| i.to_string());
                report.errors.push(format!("[{}] Duplicate Id: {}", who, id));
            }
        }
        if let Some(name) = obj.get("Name").and_then(Json::as_str).filter(|s| !s.is_empty()) {
            if !seen_names.insert(name) {
                sink.warn(format!("Duplicate Name: {}", name));
            }
        }
    }
    report
}

fn actions_of(data: &Json) -> Result<&Vec<Json>, &'static str> {
    let obj = data
        .as_object()
        .ok_or("File must be a JSON object with 'Actions' array")?;
    obj.get("Actions")
        .ok_or("Missing required 'Actions' array")?
        .as_array()
        .ok_or("'Actions' must be an array")
}

fn label(obj: &Map<String, Json>, index: usize) -> String {
    obj.get("Name")
        .and_then(Json::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Macro at index {}", index))
}

/// Type and context checks used when no schema is available.
pub fn check_structure(obj: &Map<String, Json>, index: usize) -> Vec<String> {
    let who = label(obj, index);
    let mut errors = Vec::new();
    if let Some(id) = obj.get("Id") {
        if !id.is_i64() {
            errors.push(format!("[{}] 'Id' must be an integer", who));
        }
    }
    for field in ["Name", "Execute", "Tooltip", "ValidContexts"] {
        if let Some(v) = obj.get(field) {
            if !v.is_string() {
                errors.push(format!("[{}] '{}' must be a string", who, field));
            }
        }
    }
    match obj.get("Enabled") {
        Some(Json::Bool(_)) => errors.push(format!(
            "[{}] 'Enabled' must be a string expression such as \"true\", not a boolean",
            who
        )),
        Some(Json::String(_)) | None => {}
        Some(_) => errors.push(format!("[{}] 'Enabled' must be a string", who)),
    }
    errors.extend(check_contexts(obj, index));
    errors
}

/// `ValidContexts` tags against the known editor contexts.
pub fn check_contexts(obj: &Map<String, Json>, index: usize) -> Vec<String> {
    let Some(ctx) = obj.get("ValidContexts").and_then(Json::as_str) else {
        return Vec::new();
    };
    let who = label(obj, index);
    ctx.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && !VALID_MACRO_CONTEXTS.contains(tag))
        .map(|tag| format!("[{}] Invalid context '{}'", who, tag))
        .collect()
}

/// Heuristics on a single macro. Returns errors; warnings go to `sink`.
pub fn validate_macro_extras(
    obj: &Map<String, Json>,
    index: usize,
    sink: &mut dyn WarningSink,
) -> Vec<String> {
    let who = label(obj, index);
    let mut errors = Vec::new();

    let has_name = obj
        .get("Name")
        .and_then(Json::as_str)
        .is_some_and(|s| !s.is_empty());
    if !has_name {
        sink.warn(format!("[{}] Macro has no Name", index));
    }

    let execute = obj.get("Execute").and_then(Json::as_str).unwrap_or("");
    if execute.trim().is_empty() {
        errors.push(format!("[{}] Execute script is empty", who));
    }

    if let Some(enabled) = obj.get("Enabled").and_then(Json::as_str) {
        if enabled.contains(';') {
            sink.warn(format!(
                "[{}] Enabled expression contains semicolon - should be expression, not statement",
                who
            ));
        }
    }

    if execute.contains("Delete()") {
        sink.warn(format!("[{}] Execute contains Delete() - ensure this is intended", who));
    }
    if execute.contains("Model.Database") && execute.contains("Deploy") {
        sink.warn(format!("[{}] Execute may perform deployment operations", who));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(data: &Json) -> (ValidationReport, Vec<String>) {
        let mut warnings = Vec::new();
        let report = validate_macros("m.json", data, None, CheckOptions::default(), &mut warnings);
        (report, warnings)
    }

    #[test]
    fn test_root_shape_errors() {
        assert_eq!(
            run(&json!([])).0.errors,
            vec!["File must be a JSON object with 'Actions' array"]
        );
        assert_eq!(run(&json!({})).0.errors, vec!["Missing required 'Actions' array"]);
        assert_eq!(
            run(&json!({"Actions": {}})).0.errors,
            vec!["'Actions' must be an array"]
        );
    }

    #[test]
    fn test_valid_file() {
        let data = json!({"Actions": [
            {"Id": 1, "Name": "Format DAX", "Enabled": "true", "Execute": "Selected.Measures.FormatDax();", "ValidContexts": "Measure, Model"},
            {"Id": -1, "Name": "Other", "Execute": "Info(\"x\");"},
            {"Id": -1, "Name": "Third", "Execute": "Info(\"y\");"}
        ]});
        let (report, warnings) = run(&data);
        assert!(report.is_valid(), "{:?}", report.errors);
        assert_eq!(report.total, 3);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_duplicate_id_and_name() {
        let data = json!({"Actions": [
            {"Id": 4, "Name": "A", "Execute": "x();"},
            {"Id": 4, "Name": "A", "Execute": "y();"}
        ]});
        let (report, warnings) = run(&data);
        assert_eq!(report.errors, vec!["[A] Duplicate Id: 4"]);
        assert_eq!(warnings, vec!["Duplicate Name: A"]);
    }

    #[test]
    fn test_heuristics() {
        let data = json!({"Actions": [
            {"Execute": "  "},
            {"Name": "Nuke", "Enabled": "x; y", "Execute": "Selected.Table.Delete(); Model.Database.Deploy();"}
        ]});
        let (report, warnings) = run(&data);
        assert_eq!(report.errors, vec!["[Macro at index 0] Execute script is empty"]);
        assert_eq!(warnings.len(), 4);
        assert_eq!(warnings[0], "[0] Macro has no Name");
        assert!(warnings[1].contains("semicolon"));
        assert!(warnings[2].contains("Delete()"));
        assert!(warnings[3].contains("deployment"));
    }

    #[test]
    fn test_structure_rejects_boolean_enabled_and_bad_context() {
        let data = json!({"Actions": [
            {"Name": "A", "Enabled": true, "Execute": "x();", "ValidContexts": "Measure,Banana"}
        ]});
        let (report, _) = run(&data);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].contains("not a boolean"));
        assert!(report.errors[1].contains("Invalid context 'Banana'"));
    }

    #[test]
    fn test_shipped_schema_still_reports_invalid_context() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("schema")
            .join(crate::catalog::MACROS_SCHEMA_FILE);
        let schema = schema::load_schema(&path).unwrap().unwrap();
        let data = json!({"Actions": [
            {"Id": 1, "Name": "A", "Execute": "x();", "ValidContexts": "Banana"}
        ]});
        let mut warnings: Vec<String> = Vec::new();
        let report = validate_macros(
            "m.json",
            &data,
            Some(&schema),
            CheckOptions::default(),
            &mut warnings,
        );
        assert_eq!(report.errors, vec!["[A] Invalid context 'Banana'"]);
    }
}
