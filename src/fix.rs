//! In-place repairs for rule files (`rules --fix`).
//!
//! Two passes: line endings are converted to CRLF, then fields the editor
//! rejects are dropped and the file is rewritten with 4-space indentation.

use crate::catalog::{RuleVocabulary, RUNTIME_RULE_FIELDS};
use crate::checks::rules::{check_line_endings, validate_rules, LineEndings, LF_ONLY_MESSAGE};
use crate::checks::{CheckOptions, Document, WarningSink};
use crate::error::Result;
use crate::models::ValidationReport;
use serde::Serialize;
use serde_json::Value as Json;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixReport {
    /// The file was converted from LF to CRLF line endings.
    pub converted_crlf: bool,
    /// Number of fields removed from rule records.
    pub removed_fields: usize,
}

impl FixReport {
    pub fn changed(&self) -> bool {
        self.converted_crlf || self.removed_fields > 0
    }
}

/// Normalize every line break to `\r\n`.
pub fn to_crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Rewrite `path` with CRLF line endings. Returns whether the file changed.
pub fn fix_line_endings(path: &Path) -> Result<bool> {
    let content = fs::read_to_string(path)?;
    let fixed = to_crlf(&content);
    if fixed == content {
        return Ok(false);
    }
    fs::write(path, fixed)?;
    Ok(true)
}

/// Drop `_comment`, runtime fields and null `FixExpression` values.
pub fn fix_te_compatibility(rules: &mut [Json]) -> usize {
    let mut removed = 0;
    for rule in rules.iter_mut() {
        let Some(obj) = rule.as_object_mut() else {
            continue;
        };
        let doomed: Vec<String> = obj
            .iter()
            .filter(|(k, v)| {
                k.as_str() == "_comment"
                    || RUNTIME_RULE_FIELDS.contains(&k.as_str())
                    || (k.as_str() == "FixExpression" && v.is_null())
            })
            .map(|(k, _)| k.clone())
            .collect();
        for key in doomed {
            obj.shift_remove(&key);
            removed += 1;
        }
    }
    removed
}

/// Serialize with 4-space indentation.
pub fn to_pretty_json(value: &Json) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Apply both repairs to the rule file at `path` and return the parsed
/// (possibly repaired) document.
pub fn fix_rules_file(path: &Path) -> Result<(Json, FixReport)> {
    let mut report = FixReport::default();
    let bytes = fs::read(path)?;
    if check_line_endings(&bytes) == LineEndings::LfOnly {
        report.converted_crlf = fix_line_endings(path)?;
    }

    let text = fs::read_to_string(path)?;
    let mut data: Json = serde_json::from_str(&text)?;
    if let Some(rules) = data.as_array_mut() {
        report.removed_fields = fix_te_compatibility(rules);
    }
    if report.removed_fields > 0 {
        let out = to_pretty_json(&data)?;
        fs::write(path, to_crlf(&out))?;
    }
    debug!(path = %path.display(), ?report, "fix pass complete");
    Ok((data, report))
}

/// A rules document ready for validation.
#[derive(Debug)]
pub struct PreparedRules {
    pub data: Json,
    /// Errors found before validation. An LF-only file lands here.
    pub pre_errors: Vec<String>,
    /// Repairs applied when `--fix` ran on a file.
    pub fixed: Option<FixReport>,
    /// `--fix` was requested but there is no file to rewrite.
    pub fix_skipped: bool,
}

/// Parse a rules document, repairing the file first when `fix` is set.
pub fn prepare_rules(doc: &Document, fix: bool) -> Result<PreparedRules> {
    if let (Some(path), true) = (&doc.path, fix) {
        let (data, report) = fix_rules_file(path)?;
        return Ok(PreparedRules {
            data,
            pre_errors: Vec::new(),
            fixed: Some(report),
            fix_skipped: false,
        });
    }
    let mut pre_errors = Vec::new();
    if doc.path.is_some() && check_line_endings(doc.text.as_bytes()) == LineEndings::LfOnly {
        pre_errors.push(format!(
            "{} Run with --fix to convert automatically.",
            LF_ONLY_MESSAGE
        ));
    }
    Ok(PreparedRules {
        data: doc.parse()?,
        pre_errors,
        fixed: None,
        fix_skipped: fix,
    })
}

impl PreparedRules {
    pub fn count(&self) -> usize {
        self.data.as_array().map_or(0, Vec::len)
    }

    /// Validate the data. Pre-validation errors come first in the report.
    pub fn validate(
        &self,
        subject: &str,
        schema: Option<&Json>,
        vocab: &RuleVocabulary,
        opts: CheckOptions,
        sink: &mut dyn WarningSink,
    ) -> ValidationReport {
        let mut report = validate_rules(subject, &self.data, schema, vocab, opts, sink);
        let mut errors = self.pre_errors.clone();
        errors.append(&mut report.errors);
        report.errors = errors;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_to_crlf_is_idempotent() {
        assert_eq!(to_crlf("a\nb\r\nc"), "a\r\nb\r\nc");
        assert_eq!(to_crlf(&to_crlf("a\nb")), "a\r\nb");
    }

    #[test]
    fn test_fix_te_compatibility() {
        let mut rules = vec![
            json!({"ID": "A", "_comment": "x", "FixExpression": null, "ObjectCount": 2}),
            json!({"ID": "B", "FixExpression": "Delete()"}),
            json!(3),
        ];
        assert_eq!(fix_te_compatibility(&mut rules), 3);
        assert_eq!(rules[0], json!({"ID": "A"}));
        assert_eq!(rules[1]["FixExpression"], "Delete()");
    }

    #[test]
    fn test_fix_rules_file_rewrites_with_crlf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("BPARules.json");
        fs::write(&path, "[\n  {\"ID\": \"A\", \"_comment\": \"c\"}\n]\n").unwrap();

        let (data, report) = fix_rules_file(&path).unwrap();
        assert!(report.converted_crlf);
        assert_eq!(report.removed_fields, 1);
        assert_eq!(data, json!([{"ID": "A"}]));

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[\r\n    {\r\n        \"ID\": \"A\"\r\n    }\r\n]");
        assert_eq!(check_line_endings(written.as_bytes()), LineEndings::Crlf);
    }

    #[test]
    fn test_clean_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("BPARules.json");
        fs::write(&path, "[\r\n{\"ID\": \"A\"}\r\n]").unwrap();
        let (_, report) = fix_rules_file(&path).unwrap();
        assert!(!report.changed());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[\r\n{\"ID\": \"A\"}\r\n]");
    }

    fn validate(prepared: &PreparedRules) -> ValidationReport {
        let mut warnings: Vec<String> = Vec::new();
        prepared.validate(
            "BPARules.json",
            None,
            &RuleVocabulary::default(),
            CheckOptions::default(),
            &mut warnings,
        )
    }

    const RULE: &str = r#"{"ID": "DAX_A", "Name": "n", "Severity": 2, "Scope": "Measure", "Expression": "true", "_comment": "c"}"#;

    #[test]
    fn test_lf_only_file_is_first_error_and_left_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("BPARules.json");
        let text = format!("[\n{}\n]", RULE);
        fs::write(&path, &text).unwrap();

        let doc = Document::from_path(&path).unwrap();
        let prepared = prepare_rules(&doc, false).unwrap();
        let report = validate(&prepared);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with(LF_ONLY_MESSAGE));
        assert!(report.errors[0].ends_with("Run with --fix to convert automatically."));
        assert!(report.errors[1].contains("_comment"));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn test_fix_on_file_clears_pre_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("BPARules.json");
        fs::write(&path, format!("[\n{}\n]", RULE)).unwrap();

        let doc = Document::from_path(&path).unwrap();
        let prepared = prepare_rules(&doc, true).unwrap();
        let fixed = prepared.fixed.clone().unwrap();
        assert!(fixed.converted_crlf);
        assert_eq!(fixed.removed_fields, 1);
        assert!(!prepared.fix_skipped);
        assert_eq!(prepared.count(), 1);
        assert_eq!(validate(&prepared).exit_code(), 0);
    }

    #[test]
    fn test_fix_with_stdin_is_skipped_and_validation_continues() {
        let doc = Document::from_reader(format!("[\n{}\n]", RULE).as_bytes()).unwrap();
        let prepared = prepare_rules(&doc, true).unwrap();
        assert!(prepared.fix_skipped);
        assert!(prepared.fixed.is_none());
        assert!(prepared.pre_errors.is_empty());
        let report = validate(&prepared);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("_comment"));
    }
}
