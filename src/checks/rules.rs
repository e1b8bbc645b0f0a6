//! Validation of Best Practice Analyzer rule files (`BPARules.json`).

use super::{CheckOptions, WarningSink};
use crate::catalog::{
    RuleVocabulary, OPTIONAL_RULE_FIELDS, REQUIRED_RULE_FIELDS, RUNTIME_RULE_FIELDS,
    VALID_SEVERITIES,
};
use crate::models::ValidationReport;
use crate::schema;
use serde_json::{Map, Value as Json};
use std::collections::HashSet;

/// Line-ending style of a file. The editor only reads CRLF rule files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEndings {
    Crlf,
    LfOnly,
    SingleLine,
}

pub fn check_line_endings(content: &[u8]) -> LineEndings {
    let has_crlf = content.windows(2).any(|w| w == b"\r\n");
    if has_crlf {
        LineEndings::Crlf
    } else if content.contains(&b'\n') {
        LineEndings::LfOnly
    } else {
        LineEndings::SingleLine
    }
}

pub const LF_ONLY_MESSAGE: &str =
    "File uses Unix line endings (LF). Tabular Editor requires Windows line endings (CRLF).";

/// Validate a parsed rules document.
pub fn validate_rules(
    subject: &str,
    data: &Json,
    schema: Option<&Json>,
    vocab: &RuleVocabulary,
    opts: CheckOptions,
    sink: &mut dyn WarningSink,
) -> ValidationReport {
    let Some(rules) = data.as_array() else {
        let mut report = ValidationReport::new(subject, 0);
        report.errors.push("Rules file must be a JSON array".to_string());
        return report;
    };
    let mut report = ValidationReport::new(subject, rules.len());

    report.errors.extend(check_te_compatibility(rules));

    match schema {
        Some(schema) => {
            match schema::validate_against(schema, data) {
                Ok(errs) => report.errors.extend(errs),
                Err(e) => report.errors.push(e),
            }
            if opts.schema_only {
                return report;
            }
            for (i, rule) in rules.iter().enumerate() {
                if let Some(obj) = rule.as_object() {
                    report.errors.extend(check_scope(obj, i, vocab));
                }
            }
        }
        None => {
            for (i, rule) in rules.iter().enumerate() {
                if let Some(obj) = rule.as_object() {
                    report.errors.extend(check_structure(obj, i, vocab));
                }
            }
        }
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (i, rule) in rules.iter().enumerate() {
        let Some(obj) = rule.as_object() else {
            report.errors.push(format!("Rule at index {} is not an object", i));
            continue;
        };
        report.errors.extend(validate_rule_extras(obj, i, vocab, sink));
        if let Some(id) = obj.get("ID").and_then(Json::as_str).filter(|s| !s.is_empty()) {
            if !seen_ids.insert(id) {
                report.errors.push(format!("[{}] Duplicate rule ID", id));
            }
        }
    }
    report
}

fn rule_label(obj: &Map<String, Json>, index: usize) -> String {
    obj.get("ID")
        .and_then(Json::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Rule at index {}", index))
}

/// Fields the editor rejects or adds on its own.
pub fn check_te_compatibility(rules: &[Json]) -> Vec<String> {
    let mut errors = Vec::new();
    for (i, rule) in rules.iter().enumerate() {
        let Some(obj) = rule.as_object() else {
            continue;
        };
        let label = rule_label(obj, i);
        if obj.contains_key("_comment") {
            errors.push(format!(
                "[{}] Contains '_comment' field - TE doesn't allow extra properties",
                label
            ));
        }
        let runtime: Vec<&str> = obj
            .keys()
            .map(String::as_str)
            .filter(|k| RUNTIME_RULE_FIELDS.contains(k))
            .collect();
        if !runtime.is_empty() {
            errors.push(format!(
                "[{}] Contains runtime fields {:?} - remove these (TE adds them automatically)",
                label, runtime
            ));
        }
        let unknown: Vec<&str> = obj
            .keys()
            .map(String::as_str)
            .filter(|k| {
                *k != "_comment"
                    && !RUNTIME_RULE_FIELDS.contains(k)
                    && !REQUIRED_RULE_FIELDS.contains(k)
                    && !OPTIONAL_RULE_FIELDS.contains(k)
            })
            .collect();
        if !unknown.is_empty() {
            errors.push(format!("[{}] Contains unknown fields: {:?}", label, unknown));
        }
    }
    errors
}

/// Structural checks used when no schema document is available.
pub fn check_structure(obj: &Map<String, Json>, index: usize, vocab: &RuleVocabulary) -> Vec<String> {
    let label = rule_label(obj, index);
    let mut errors = Vec::new();

    for field in REQUIRED_RULE_FIELDS {
        if !obj.contains_key(*field) {
            errors.push(format!("[{}] Missing required field '{}'", label, field));
        }
    }
    for field in ["ID", "Name", "Scope", "Expression"] {
        if let Some(v) = obj.get(field) {
            if !v.is_string() {
                errors.push(format!("[{}] '{}' must be a string", label, field));
            }
        }
    }
    for field in ["Category", "Description", "FixExpression", "Source", "Remarks"] {
        if let Some(v) = obj.get(field) {
            if !v.is_string() && !v.is_null() {
                errors.push(format!("[{}] '{}' must be a string or null", label, field));
            }
        }
    }
    if let Some(v) = obj.get("CompatibilityLevel") {
        if !v.is_i64() && !v.is_null() {
            errors.push(format!("[{}] 'CompatibilityLevel' must be an integer", label));
        }
    }
    match obj.get("Severity") {
        Some(Json::Number(n)) => match n.as_i64() {
            Some(s) if VALID_SEVERITIES.contains(&s) => {}
            _ => errors.push(format!(
                "[{}] Invalid Severity {} (expected 1, 2 or 3)",
                label, n
            )),
        },
        Some(_) => errors.push(format!("[{}] 'Severity' must be an integer", label)),
        None => {}
    }
    errors.extend(check_scope(obj, index, vocab));
    errors
}

/// Scope tags against the vocabulary. Schemas only see a string here, so
/// this also runs after schema validation.
pub fn check_scope(obj: &Map<String, Json>, index: usize, vocab: &RuleVocabulary) -> Vec<String> {
    let Some(scope) = obj.get("Scope").and_then(Json::as_str) else {
        return Vec::new();
    };
    let label = rule_label(obj, index);
    let tags: Vec<&str> = scope.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if tags.is_empty() {
        return vec![format!("[{}] Scope is empty", label)];
    }
    tags.into_iter()
        .filter(|tag| !vocab.is_valid_scope(tag))
        .map(|tag| format!("[{}] Invalid scope '{}'", label, tag))
        .collect()
}

/// Best-practice heuristics. Returns errors; warnings go to `sink`.
pub fn validate_rule_extras(
    obj: &Map<String, Json>,
    index: usize,
    vocab: &RuleVocabulary,
    sink: &mut dyn WarningSink,
) -> Vec<String> {
    let label = rule_label(obj, index);
    let mut errors = Vec::new();

    if let Some(id) = obj.get("ID").and_then(Json::as_str) {
        if !vocab.has_known_prefix(id) {
            sink.warn(format!(
                "[{}] ID doesn't use standard prefix ({}, etc.)",
                label,
                vocab
                    .prefixes
                    .iter()
                    .take(4)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    if let Some(category) = obj.get("Category").and_then(Json::as_str) {
        if !vocab.is_standard_category(category) {
            sink.warn(format!("[{}] Non-standard category: {}", label, category));
        }
    }

    if let Some(fix) = obj.get("FixExpression").and_then(Json::as_str) {
        let severity = obj.get("Severity").and_then(Json::as_f64).unwrap_or(1.0);
        if fix.contains("Delete()") && severity < 3.0 {
            errors.push(format!(
                "[{}] FixExpression uses Delete() but Severity < 3 (destructive fix on low-severity rule)",
                label
            ));
        }
    }

    if let Some(expr) = obj.get("Expression").and_then(Json::as_str) {
        let compares_string = expr.contains("= \"") || expr.contains("=\"");
        let case_aware = ["StringComparison", "ToLower", "ToUpper"]
            .iter()
            .any(|m| expr.contains(m));
        if compares_string && !case_aware {
            sink.warn(format!("[{}] String comparison may be case-sensitive", label));
        }
    }

    errors
}
