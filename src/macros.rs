//! Authoring `MacroActions.json` from C# script (`.csx`) files.

use crate::error::{Error, Result};
use crate::models::macro_action::{MacroAction, MacroFile};
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONTEXT: &str = "Model";
pub const DEFAULT_PATTERN: &str = "*.csx";

/// Only the head of a script is scanned for metadata comments.
const METADATA_LINES: usize = 20;

/// Metadata read from `// Name:`, `// Tooltip:`, `// Description:` and
/// `// Context:` comments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MacroMetadata {
    pub name: Option<String>,
    pub tooltip: Option<String>,
    pub context: Option<String>,
}

pub fn parse_macro_metadata(content: &str) -> MacroMetadata {
    let mut meta = MacroMetadata::default();
    for line in content.split('\n').take(METADATA_LINES) {
        let line = line.trim();
        if let Some(v) = line.strip_prefix("// Name:") {
            meta.name = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("// Tooltip:") {
            meta.tooltip = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("// Context:") {
            meta.context = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("// Description:") {
            meta.tooltip = Some(v.trim().to_string());
        }
    }
    meta
}

/// `format-dax_helper.csx` -> `Format Dax Helper`.
pub fn default_macro_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    title_case(&stem.replace(['-', '_'], " "))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn read_script(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::ScriptNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

/// Options for [`add_macro`]; `None` falls back to the file-derived default.
#[derive(Debug, Default, Clone)]
pub struct AddOptions {
    pub name: Option<String>,
    pub tooltip: Option<String>,
    pub context: Option<String>,
}

/// Append `script` as a new macro to `macros_path`, creating the file when
/// absent. Existing entries are kept as they are, including fields this
/// tool does not know about.
pub fn add_macro(script: &Path, macros_path: &Path, opts: &AddOptions) -> Result<MacroAction> {
    let content = read_script(script)?;

    let mut root: Json = if macros_path.exists() {
        serde_json::from_str(&fs::read_to_string(macros_path)?)?
    } else {
        Json::Object(Map::new())
    };
    let Some(root_obj) = root.as_object_mut() else {
        return Err(Error::Usage(format!(
            "{} must contain a JSON object with an 'Actions' array",
            macros_path.display()
        )));
    };
    let actions = root_obj
        .entry("Actions")
        .or_insert_with(|| Json::Array(Vec::new()));
    let Some(actions) = actions.as_array_mut() else {
        return Err(Error::Usage("'Actions' must be an array".to_string()));
    };

    let next_id = actions
        .iter()
        .map(|a| a.get("Id").and_then(Json::as_i64).unwrap_or(0))
        .max()
        .map_or(1, |m| m + 1);

    let action = MacroAction::new(
        next_id,
        opts.name.clone().unwrap_or_else(|| default_macro_name(script)),
        content,
        opts.tooltip.clone().unwrap_or_default(),
        opts.context.clone().unwrap_or_else(|| DEFAULT_CONTEXT.to_string()),
    );
    actions.push(serde_json::to_value(&action)?);

    fs::write(macros_path, serde_json::to_string_pretty(&root)?)?;
    debug!(id = action.id, path = %macros_path.display(), "macro added");
    Ok(action)
}

/// Build a macro from a script using its metadata comments.
pub fn script_to_macro(script: &Path, id: i64) -> Result<MacroAction> {
    let content = read_script(script)?;
    let meta = parse_macro_metadata(&content);
    Ok(MacroAction::new(
        id,
        meta.name.unwrap_or_else(|| default_macro_name(script)),
        content,
        meta.tooltip.unwrap_or_default(),
        meta.context.unwrap_or_else(|| DEFAULT_CONTEXT.to_string()),
    ))
}

/// Write a fresh macro file from `scripts`, numbering them 1..=N. Replaces
/// any existing file.
pub fn create_macros_json(output: &Path, scripts: &[PathBuf]) -> Result<MacroFile> {
    let mut file = MacroFile::default();
    for (i, script) in scripts.iter().enumerate() {
        file.actions.push(script_to_macro(script, i as i64 + 1)?);
    }
    fs::write(output, serde_json::to_string_pretty(&file)?)?;
    Ok(file)
}

/// Scripts in `dir` matching `pattern`, sorted by lower-cased file stem.
pub fn collect_scripts(dir: &Path, pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    let full = if recursive {
        dir.join("**").join(pattern)
    } else {
        dir.join(pattern)
    };
    let full = full.to_string_lossy().to_string();
    let entries = glob::glob(&full).map_err(|e| Error::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    let mut files: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
    files.sort_by_key(|p| {
        p.file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_default_name() {
        assert_eq!(default_macro_name(Path::new("format-dax_helper.csx")), "Format Dax Helper");
        assert_eq!(default_macro_name(Path::new("dir/SHOW_deps.csx")), "Show Deps");
    }

    #[test]
    fn test_metadata_only_in_first_lines() {
        let mut script = String::from("// Name: Fancy\n// Description: Does things\n// Context: Table, Measure\n");
        for _ in 0..25 {
            script.push_str("x();\n");
        }
        script.push_str("// Tooltip: too late\n");
        let meta = parse_macro_metadata(&script);
        assert_eq!(meta.name.as_deref(), Some("Fancy"));
        assert_eq!(meta.tooltip.as_deref(), Some("Does things"));
        assert_eq!(meta.context.as_deref(), Some("Table, Measure"));
    }

    #[test]
    fn test_create_numbers_scripts_one_to_n() {
        let dir = tempdir().unwrap();
        let scripts: Vec<PathBuf> = ["b-two.csx", "a_one.csx", "c.csx"]
            .iter()
            .map(|n| {
                let p = dir.path().join(n);
                fs::write(&p, "Info(\"hi\");").unwrap();
                p
            })
            .collect();
        let out = dir.path().join("MacroActions.json");
        let file = create_macros_json(&out, &scripts).unwrap();
        let ids: Vec<i64> = file.actions.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(file.actions[0].name, "B Two");

        let written: Json = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["Actions"][2]["Enabled"], json!("true"));
        assert_eq!(written["Actions"][2]["ValidContexts"], json!("Model"));
    }

    #[test]
    fn test_add_appends_max_plus_one_and_keeps_unknown_fields() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("MacroActions.json");
        fs::write(
            &out,
            json!({"Actions": [{"Id": 7, "Name": "Old", "Custom": 1}, {"Id": 3}]}).to_string(),
        )
        .unwrap();
        let script = dir.path().join("new_macro.csx");
        fs::write(&script, "x();").unwrap();

        let added = add_macro(
            &script,
            &out,
            &AddOptions {
                context: Some("Table".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(added.id, 8);
        assert_eq!(added.name, "New Macro");

        let written: Json = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["Actions"][0]["Custom"], json!(1));
        assert_eq!(written["Actions"][2]["ValidContexts"], json!("Table"));
    }

    #[test]
    fn test_add_creates_missing_file() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("a.csx");
        fs::write(&script, "x();").unwrap();
        let out = dir.path().join("MacroActions.json");
        let added = add_macro(&script, &out, &AddOptions::default()).unwrap();
        assert_eq!(added.id, 1);
        assert!(out.exists());
    }

    #[test]
    fn test_missing_script_is_typed_error() {
        let dir = tempdir().unwrap();
        let err = add_macro(
            &dir.path().join("nope.csx"),
            &dir.path().join("m.json"),
            &AddOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ScriptNotFound { .. }));
    }

    #[test]
    fn test_collect_scripts_sorted_and_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("Zeta.csx"), "").unwrap();
        fs::write(dir.path().join("alpha.csx"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("sub/beta.csx"), "").unwrap();

        let flat = collect_scripts(dir.path(), DEFAULT_PATTERN, false).unwrap();
        let names: Vec<_> = flat.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        assert_eq!(names, vec!["alpha.csx", "Zeta.csx"]);

        let deep = collect_scripts(dir.path(), DEFAULT_PATTERN, true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep[1].ends_with("sub/beta.csx"));

        assert!(matches!(
            collect_scripts(&dir.path().join("notes.txt"), DEFAULT_PATTERN, false),
            Err(Error::NotADirectory { .. })
        ));
    }
}
