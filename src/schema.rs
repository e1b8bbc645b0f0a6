//! JSON Schema (Draft 7) loading and validation.

use crate::error::{Error, Result};
use jsonschema::Draft;
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load a schema document. A missing file is not an error: validators fall
/// back to their built-in structural checks.
pub fn load_schema(path: &Path) -> Result<Option<Json>> {
    if !path.exists() {
        debug!(path = %path.display(), "schema file not found");
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let schema = serde_json::from_str(&text).map_err(|e| Error::Schema {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(Some(schema))
}

/// Schema selected for a validation run.
#[derive(Debug)]
pub enum SchemaChoice {
    Loaded { path: PathBuf, schema: Json },
    /// The configured default does not exist on disk.
    Missing(PathBuf),
    Unconfigured,
}

impl SchemaChoice {
    pub fn schema(&self) -> Option<&Json> {
        match self {
            SchemaChoice::Loaded { schema, .. } => Some(schema),
            _ => None,
        }
    }
}

/// An explicit `--schema` must exist; a configured default may be missing.
pub fn resolve_schema(explicit: Option<&Path>, configured: Option<PathBuf>) -> Result<SchemaChoice> {
    if let Some(path) = explicit {
        return match load_schema(path)? {
            Some(schema) => Ok(SchemaChoice::Loaded {
                path: path.to_path_buf(),
                schema,
            }),
            None => Err(Error::NotFound {
                path: path.to_path_buf(),
            }),
        };
    }
    let Some(path) = configured else {
        return Ok(SchemaChoice::Unconfigured);
    };
    Ok(match load_schema(&path)? {
        Some(schema) => SchemaChoice::Loaded { path, schema },
        None => SchemaChoice::Missing(path),
    })
}

/// Validate `instance` against `schema`, one message per violation:
/// `Schema: [0 -> Severity] 5 is not one of [1,2,3]`.
pub fn validate_against(schema: &Json, instance: &Json) -> std::result::Result<Vec<String>, String> {
    let validator = jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(schema)
        .map_err(|e| format!("Invalid schema: {}", e))?;
    let errors = validator
        .iter_errors(instance)
        .map(|err| {
            let pointer = err.instance_path.to_string();
            format!("Schema: [{}] {}", display_path(&pointer), err)
        })
        .collect();
    Ok(errors)
}

/// Turn a JSON pointer into `a -> 0 -> b`, or `root` for the document itself.
fn display_path(pointer: &str) -> String {
    let parts: Vec<String> = pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();
    if parts.is_empty() {
        "root".to_string()
    } else {
        parts.join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(""), "root");
        assert_eq!(display_path("/0/Severity"), "0 -> Severity");
        assert_eq!(display_path("/a~1b"), "a/b");
    }

    #[test]
    fn test_validate_reports_each_violation() {
        let schema = json!({
            "type": "array",
            "items": {
                "type": "object",
                "required": ["ID"],
                "properties": {"Severity": {"enum": [1, 2, 3]}}
            }
        });
        let errs = validate_against(&schema, &json!([{"ID": "A", "Severity": 5}, {}])).unwrap();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().any(|e| e.starts_with("Schema: [0 -> Severity]")));
        assert!(errs.iter().any(|e| e.starts_with("Schema: [1]")));
        assert!(validate_against(&schema, &json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempdir().unwrap();
        assert!(load_schema(&dir.path().join("none.json")).unwrap().is_none());
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ nope").unwrap();
        assert!(matches!(load_schema(&bad), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_resolve_explicit_vs_configured() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = resolve_schema(Some(&missing), None).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.exit_code(), 1);

        let choice = resolve_schema(None, Some(missing.clone())).unwrap();
        assert!(matches!(choice, SchemaChoice::Missing(ref p) if p == &missing));
        assert!(choice.schema().is_none());
        assert!(matches!(
            resolve_schema(None, None).unwrap(),
            SchemaChoice::Unconfigured
        ));

        let present = dir.path().join("s.json");
        fs::write(&present, "{\"type\": \"array\"}").unwrap();
        let choice = resolve_schema(Some(&present), Some(missing)).unwrap();
        assert_eq!(choice.schema(), Some(&json!({"type": "array"})));
    }
}
