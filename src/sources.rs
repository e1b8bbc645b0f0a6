//! Loaders for each rule source: built-in catalog, rule files on disk and
//! rules embedded in a model definition (`model.bim` or TMDL).
//!
//! Loaders never fail. Missing files and malformed JSON are recorded on the
//! returned source so the audit can report every source uniformly.

use crate::annotation::extract_annotation_value;
use crate::catalog::BUILTIN_RULES;
use crate::models::rule::{rules_from_json, BpaRule};
use crate::models::source::{BuiltInConfig, RuleSource};
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const APP_DIR: &str = "TabularEditor3";
pub const RULES_FILE: &str = "BPARules.json";
pub const PREFERENCES_FILE: &str = "Preferences.json";

pub const ANN_RULES: &str = "BestPracticeAnalyzer";
pub const ANN_EXTERNAL: &str = "BestPracticeAnalyzer_ExternalRuleFiles";
pub const ANN_IGNORE: &str = "BestPracticeAnalyzer_IgnoreRules";

/// Read built-in rule settings from `<LocalAppData>/TabularEditor3/Preferences.json`.
pub fn parse_builtin_config(local_appdata: Option<&Path>) -> BuiltInConfig {
    let mut config = BuiltInConfig::default();
    let Some(local) = local_appdata else {
        config.error = Some("Could not locate Windows LocalAppData directory".to_string());
        return config;
    };
    let prefs = local.join(APP_DIR).join(PREFERENCES_FILE);
    if !prefs.exists() {
        config.error = Some("Preferences.json not found".to_string());
        return config;
    }
    config.path = Some(prefs.clone());
    match read_json(&prefs) {
        Ok(data) => {
            config.status = data
                .get("BuiltInBpaRules")
                .and_then(Json::as_str)
                .unwrap_or("Enable")
                .to_string();
            config.disabled_ids = string_list(data.get("DisabledBuiltInRuleIds"));
            config.app_version = data
                .get("AppVersion")
                .and_then(Json::as_str)
                .map(str::to_string);
        }
        Err(e) => config.error = Some(e),
    }
    config
}

/// Materialise the built-in catalog with enabled flags from `config`.
pub fn builtin_rules(config: &BuiltInConfig) -> RuleSource {
    let mut source = RuleSource::new("Built-in (TE3)");
    source.path = config.path.clone();
    if config.status == "Disable" {
        source.error = Some("Built-in rules disabled in Preferences.json".to_string());
        return source;
    }
    if let Some(e) = config.error.as_ref() {
        source.error = Some(e.clone());
        return source;
    }
    source.rules = BUILTIN_RULES
        .iter()
        .map(|(id, _, _)| BpaRule::builtin(id, !config.disabled_ids.iter().any(|d| d == id)))
        .collect();
    source
}

/// Read `<root>/TabularEditor3/BPARules.json`.
pub fn parse_rules_file(root: &Path, location: &str) -> RuleSource {
    let mut source = RuleSource::new(location);
    let file = root.join(APP_DIR).join(RULES_FILE);
    if !file.exists() {
        source.error = Some(format!("File not found: {}", file.display()));
        return source;
    }
    source.path = Some(file.clone());
    match read_json(&file).and_then(|data| rules_from_json(&data)) {
        Ok(rules) => source.rules = rules,
        Err(e) => source.error = Some(e),
    }
    debug!(location, count = source.count(), "parsed rules file");
    source
}

/// Annotations relevant to the analyzer, read from a model definition.
#[derive(Debug, Clone, Default)]
pub struct ModelAnnotations {
    pub rules: RuleSource,
    pub external_urls: Vec<String>,
    pub ignored_ids: Vec<String>,
}

/// Parse analyzer annotations from a `.bim` file, a `.tmdl` file, or a TMDL
/// folder (`model.tmdl` or `definition/model.tmdl`).
pub fn parse_model_annotations(model_path: &Path) -> ModelAnnotations {
    let mut out = ModelAnnotations {
        rules: RuleSource::new("Model-embedded"),
        ..ModelAnnotations::default()
    };

    if model_path.is_file() {
        out.rules.path = Some(model_path.to_path_buf());
        match extension(model_path).as_deref() {
            Some("bim") => match read_json(model_path) {
                Ok(data) => parse_bim(&data, &mut out),
                Err(e) => out.rules.error = Some(e),
            },
            Some("tmdl") => match fs::read_to_string(model_path) {
                Ok(content) => parse_tmdl(&content, &mut out),
                Err(e) => out.rules.error = Some(e.to_string()),
            },
            _ => out.rules.error = Some("Unsupported model file (expected .bim or .tmdl)".into()),
        }
    } else if model_path.is_dir() {
        match tmdl_entry(model_path) {
            Some(tmdl) => {
                out.rules.path = Some(tmdl.clone());
                match fs::read_to_string(&tmdl) {
                    Ok(content) => parse_tmdl(&content, &mut out),
                    Err(e) => out.rules.error = Some(e.to_string()),
                }
            }
            None => out.rules.error = Some("model.tmdl not found in directory".to_string()),
        }
    } else {
        out.rules.error = Some(format!("Path does not exist: {}", model_path.display()));
    }
    out
}

/// Describe the model layout: `model.bim`, `TMDL`, `TMDL (definition/)` or `unknown`.
pub fn detect_model_format(model_path: &Path) -> String {
    if model_path.is_file() {
        match extension(model_path).as_deref() {
            Some("bim") => return "model.bim".to_string(),
            Some("tmdl") => return "TMDL".to_string(),
            _ => {}
        }
    } else if model_path.is_dir() {
        if model_path.join("model.tmdl").exists() {
            return "TMDL".to_string();
        }
        if model_path.join("definition").join("model.tmdl").exists() {
            return "TMDL (definition/)".to_string();
        }
    }
    "unknown".to_string()
}

fn tmdl_entry(dir: &Path) -> Option<PathBuf> {
    [dir.join("model.tmdl"), dir.join("definition").join("model.tmdl")]
        .into_iter()
        .find(|p| p.exists())
}

/// Malformed annotation JSON in a `.bim` fails the whole source and stops
/// the scan; TMDL only fails on the embedded rules.
fn parse_bim(data: &Json, out: &mut ModelAnnotations) {
    let annotations = data
        .get("model")
        .and_then(|m| m.get("annotations"))
        .and_then(Json::as_array)
        .cloned()
        .unwrap_or_default();
    for ann in &annotations {
        let name = ann.get("name").and_then(Json::as_str).unwrap_or("");
        let value = ann.get("value").and_then(Json::as_str).unwrap_or("");
        if value.is_empty() {
            continue;
        }
        let parsed = match name {
            ANN_RULES => {
                set_embedded_rules(value, out);
                Ok(())
            }
            ANN_EXTERNAL => parse_url_list(value).map(|urls| out.external_urls = urls),
            ANN_IGNORE => parse_ignore_list(value).map(|ids| out.ignored_ids = ids),
            _ => Ok(()),
        };
        if let Err(e) = parsed {
            out.rules.error = Some(format!("Error parsing {}: {}", name, e));
        }
        if out.rules.error.is_some() {
            return;
        }
    }
}

fn parse_tmdl(content: &str, out: &mut ModelAnnotations) {
    if let Some(v) = extract_annotation_value(content, ANN_RULES) {
        set_embedded_rules(&v, out);
    }
    if let Some(v) = extract_annotation_value(content, ANN_EXTERNAL) {
        out.external_urls = parse_url_list(&v).unwrap_or_default();
    }
    if let Some(v) = extract_annotation_value(content, ANN_IGNORE) {
        out.ignored_ids = parse_ignore_list(&v).unwrap_or_default();
    }
}

fn set_embedded_rules(value: &str, out: &mut ModelAnnotations) {
    match serde_json::from_str::<Json>(value) {
        Ok(data) => match rules_from_json(&data) {
            Ok(rules) => out.rules.rules = rules,
            Err(e) => out.rules.error = Some(format!("Error parsing {}: {}", ANN_RULES, e)),
        },
        Err(e) => out.rules.error = Some(format!("Error parsing {}: {}", ANN_RULES, e)),
    }
}

fn parse_url_list(value: &str) -> serde_json::Result<Vec<String>> {
    serde_json::from_str::<Json>(value).map(|v| string_list(Some(&v)))
}

fn parse_ignore_list(value: &str) -> serde_json::Result<Vec<String>> {
    serde_json::from_str::<Json>(value).map(|v| string_list(v.get("RuleIDs")))
}

fn string_list(value: Option<&Json>) -> Vec<String> {
    value
        .and_then(Json::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Json::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn read_json(path: &Path) -> Result<Json, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid JSON: {}", e))
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}
