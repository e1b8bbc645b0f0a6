//! Validation of editor configuration files: preferences, layouts, recent
//! file lists and per-model user options (`.tmuo`).

use super::{CheckOptions, WarningSink};
use crate::catalog::{
    CONFIG_FILE_NAMES, CONFIG_SCHEMAS, VALID_IMPERSONATION_MODES, VALID_SERVER_TYPES,
};
use crate::error::{self, Error};
use crate::models::ValidationReport;
use crate::schema;
use serde_json::{Map, Value as Json};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Preferences,
    UiPreferences,
    Layouts,
    RecentFiles,
    RecentServers,
    Tmuo,
}

impl ConfigKind {
    pub const ALL: [ConfigKind; 6] = [
        ConfigKind::Preferences,
        ConfigKind::UiPreferences,
        ConfigKind::Layouts,
        ConfigKind::RecentFiles,
        ConfigKind::RecentServers,
        ConfigKind::Tmuo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKind::Preferences => "preferences",
            ConfigKind::UiPreferences => "uipreferences",
            ConfigKind::Layouts => "layouts",
            ConfigKind::RecentFiles => "recentfiles",
            ConfigKind::RecentServers => "recentservers",
            ConfigKind::Tmuo => "tmuo",
        }
    }

    pub fn schema_file(self) -> &'static str {
        CONFIG_SCHEMAS
            .iter()
            .find(|(k, _)| *k == self.as_str())
            .map(|(_, f)| *f)
            .unwrap_or("")
    }

    /// Detect the kind from a file name, case-insensitively. The longest
    /// matching suffix wins (`uipreferences.json` over `preferences.json`).
    pub fn detect(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".tmuo") {
            return Some(ConfigKind::Tmuo);
        }
        CONFIG_FILE_NAMES
            .iter()
            .filter(|(suffix, _)| lower.ends_with(suffix))
            .max_by_key(|(suffix, _)| suffix.len())
            .and_then(|(_, kind)| kind.parse().ok())
    }

    /// Kind from `--type`, else from the file name. Reading stdin requires
    /// `--type`.
    pub fn resolve(explicit: Option<&str>, path: Option<&str>, stdin: bool) -> error::Result<Self> {
        if let Some(kind) = explicit {
            return kind.parse().map_err(Error::Usage);
        }
        if stdin {
            return Err(Error::Usage(
                "--type is required when using --stdin".to_string(),
            ));
        }
        let name = path
            .and_then(|p| Path::new(p).file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::detect(&name).ok_or_else(|| {
            Error::Usage(format!(
                "Could not detect config type from filename '{}'; use --type to specify: {}",
                name,
                Self::names()
            ))
        })
    }

    pub fn names() -> String {
        Self::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| format!("Unknown config type: {} (expected one of {})", s, Self::names()))
    }
}

pub fn validate_config(
    subject: &str,
    kind: ConfigKind,
    data: &Json,
    schema: Option<&Json>,
    opts: CheckOptions,
    sink: &mut dyn WarningSink,
) -> ValidationReport {
    let total = match data {
        Json::Object(m) => m.len(),
        Json::Array(a) => a.len(),
        _ => 0,
    };
    let mut report = ValidationReport::new(subject, total);

    if kind == ConfigKind::Tmuo && !data.is_object() {
        report.errors.push("File must be a JSON object".to_string());
        return report;
    }

    if let Some(schema) = schema {
        match schema::validate_against(schema, data) {
            Ok(errs) => report.errors.extend(errs),
            Err(e) => report.errors.push(e),
        }
        if opts.schema_only {
            return report;
        }
    }

    if let Some(obj) = data.as_object() {
        match kind {
            ConfigKind::Tmuo => report.errors.extend(validate_tmuo_extras(obj, sink)),
            ConfigKind::Preferences => report.errors.extend(validate_preferences_extras(obj, sink)),
            _ => {}
        }
    }
    report
}

fn truthy(v: Option<&Json>) -> bool {
    match v {
        None | Some(Json::Null) => false,
        Some(Json::Bool(b)) => *b,
        Some(Json::String(s)) => !s.is_empty(),
        Some(Json::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Json::Array(a)) => !a.is_empty(),
        Some(Json::Object(o)) => !o.is_empty(),
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn scan_credentials(obj: &Map<String, Json>, path: &str, sink: &mut dyn WarningSink) {
    for (key, value) in obj {
        let here = join_path(path, key);
        let lower = key.to_lowercase();
        match value {
            Json::String(s) if (lower == "password" || lower == "accountkey") && !s.is_empty() => {
                sink.warn(format!(
                    "[{}] Contains plain-text credential - consider using encrypted format",
                    here
                ));
            }
            Json::Object(inner) => scan_credentials(inner, &here, sink),
            _ => {}
        }
    }
}

fn scan_enums(obj: &Map<String, Json>, path: &str, errors: &mut Vec<String>) {
    for (key, value) in obj {
        let here = join_path(path, key);
        let allowed: Option<&[&str]> = match key.as_str() {
            "ImpersonationMode" => Some(VALID_IMPERSONATION_MODES),
            "ServerType" => Some(VALID_SERVER_TYPES),
            _ => None,
        };
        if let (Some(allowed), Some(s)) = (allowed, value.as_str()) {
            if !allowed.contains(&s) {
                errors.push(format!("[{}] Invalid {} '{}'", here, key, s));
            }
        }
        match value {
            Json::Object(inner) => scan_enums(inner, &here, errors),
            Json::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if let Some(inner) = item.as_object() {
                        scan_enums(inner, &format!("{}[{}]", here, i), errors);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn validate_tmuo_extras(obj: &Map<String, Json>, sink: &mut dyn WarningSink) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(ws) = obj.get("WorkspaceDatabase").and_then(Json::as_str) {
        if !ws.is_empty() && !ws.contains('_') && !ws.contains('-') {
            sink.warn(
                "WorkspaceDatabase name should include user identifier to avoid conflicts"
                    .to_string(),
            );
        }
    }

    scan_credentials(obj, "", sink);

    if let Some(deployment) = obj.get("Deployment").and_then(Json::as_object) {
        let to_service = deployment
            .get("TargetConnectionString")
            .and_then(Json::as_str)
            .is_some_and(|t| t.to_lowercase().contains("powerbi://"));
        if to_service {
            if truthy(deployment.get("DeployPartitions")) {
                sink.warn("DeployPartitions=true may cause issues with Power BI Service".to_string());
            }
            if truthy(deployment.get("DeployDataSources")) {
                sink.warn(
                    "DeployDataSources=true is typically not needed for Power BI Service"
                        .to_string(),
                );
            }
        }
    }

    if truthy(obj.get("UseWorkspace")) && !truthy(obj.get("WorkspaceConnection")) {
        errors.push("UseWorkspace is true but WorkspaceConnection is not set".to_string());
    }

    scan_enums(obj, "", &mut errors);
    errors
}

pub fn validate_preferences_extras(
    obj: &Map<String, Json>,
    sink: &mut dyn WarningSink,
) -> Vec<String> {
    let mut errors = Vec::new();
    let manual_proxy = obj.get("ProxyType").and_then(Json::as_str) == Some("Manual");
    if manual_proxy && !truthy(obj.get("ProxyAddress")) {
        errors.push("ProxyType is Manual but ProxyAddress is not set".to_string());
    }
    if truthy(obj.get("BackupOnSave")) && !truthy(obj.get("SaveBackupLocation")) {
        sink.warn("BackupOnSave is true but SaveBackupLocation is not set".to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(kind: ConfigKind, data: &Json) -> (ValidationReport, Vec<String>) {
        let mut warnings = Vec::new();
        let r = validate_config("cfg", kind, data, None, CheckOptions::default(), &mut warnings);
        (r, warnings)
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(ConfigKind::detect("Model.jdoe.tmuo"), Some(ConfigKind::Tmuo));
        assert_eq!(ConfigKind::detect("Preferences.json"), Some(ConfigKind::Preferences));
        assert_eq!(ConfigKind::detect("UiPreferences.json"), Some(ConfigKind::UiPreferences));
        assert_eq!(
            ConfigKind::detect("user.UiPreferences.json"),
            Some(ConfigKind::UiPreferences)
        );
        assert_eq!(ConfigKind::detect("RECENTSERVERS.JSON"), Some(ConfigKind::RecentServers));
        assert_eq!(ConfigKind::detect("other.json"), None);
        assert_eq!("Layouts".parse::<ConfigKind>(), Ok(ConfigKind::Layouts));
        assert!("nope".parse::<ConfigKind>().is_err());
        assert_eq!(ConfigKind::Tmuo.schema_file(), "tmuo-schema.json");
    }

    #[test]
    fn test_resolve_kind() {
        let err = ConfigKind::resolve(None, None, true).unwrap_err();
        assert_eq!(err.to_string(), "--type is required when using --stdin");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            ConfigKind::resolve(Some("layouts"), None, true).unwrap(),
            ConfigKind::Layouts
        );
        assert_eq!(
            ConfigKind::resolve(None, Some("cfg/UiPreferences.json"), false).unwrap(),
            ConfigKind::UiPreferences
        );
        assert!(matches!(
            ConfigKind::resolve(Some("bogus"), None, false),
            Err(Error::Usage(_))
        ));
        assert!(matches!(
            ConfigKind::resolve(None, Some("notes.txt"), false),
            Err(Error::Usage(m)) if m.contains("'notes.txt'")
        ));
    }

    #[test]
    fn test_ui_preferences_skip_preferences_extras() {
        let kind = ConfigKind::detect("UiPreferences.json").unwrap();
        let (report, warnings) = run(kind, &json!({"ProxyType": "Manual"}));
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_tmuo_extras() {
        let data = json!({
            "UseWorkspace": true,
            "WorkspaceDatabase": "SalesWorkspace",
            "DataSourceOverrides": {"Sql": {"Password": "hunter2", "ImpersonationMode": "Nope"}},
            "Deployment": {
                "TargetConnectionString": "powerbi://api.powerbi.com/v1.0/myorg/WS",
                "DeployPartitions": true,
                "DeployDataSources": true
            }
        });
        let (report, warnings) = run(ConfigKind::Tmuo, &data);
        assert_eq!(report.total, 4);
        assert_eq!(
            report.errors,
            vec![
                "UseWorkspace is true but WorkspaceConnection is not set".to_string(),
                "[DataSourceOverrides.Sql.ImpersonationMode] Invalid ImpersonationMode 'Nope'"
                    .to_string(),
            ]
        );
        assert_eq!(warnings.len(), 4);
        assert!(warnings[0].contains("WorkspaceDatabase"));
        assert!(warnings[1].starts_with("[DataSourceOverrides.Sql.Password]"));
        assert!(warnings[2].contains("DeployPartitions"));
        assert!(warnings[3].contains("DeployDataSources"));
    }

    #[test]
    fn test_tmuo_must_be_object() {
        let (report, _) = run(ConfigKind::Tmuo, &json!([1, 2]));
        assert_eq!(report.errors, vec!["File must be a JSON object"]);
    }

    #[test]
    fn test_preferences_extras() {
        let (report, warnings) = run(
            ConfigKind::Preferences,
            &json!({"ProxyType": "Manual", "BackupOnSave": true}),
        );
        assert_eq!(report.errors, vec!["ProxyType is Manual but ProxyAddress is not set"]);
        assert_eq!(warnings.len(), 1);

        let (report, warnings) = run(
            ConfigKind::Preferences,
            &json!({"ProxyType": "Manual", "ProxyAddress": "http://proxy:8080"}),
        );
        assert!(report.is_valid());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_schema_only_skips_extras() {
        let mut warnings = Vec::new();
        let report = validate_config(
            "cfg",
            ConfigKind::Preferences,
            &json!({"ProxyType": "Manual"}),
            Some(&json!({"type": "object"})),
            CheckOptions { schema_only: true },
            &mut warnings,
        );
        assert!(report.is_valid());
    }
}
