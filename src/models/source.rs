//! Rule sources and the aggregate audit result.
//!
//! Counts are always derived from the held rules, never stored.

use super::rule::BpaRule;
use crate::platform::Platform;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
/// One origin of analyzer rules (built-in, URL, model, user or machine).
pub struct RuleSource {
    pub location: String,
    pub path: Option<PathBuf>,
    pub rules: Vec<BpaRule>,
    pub error: Option<String>,
}

impl RuleSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn with_error(location: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn found(&self) -> bool {
        self.path.is_some() && self.error.is_none()
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }

    pub fn enabled_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_enabled).count()
    }

    pub fn ignored_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_ignored).count()
    }

    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_active()).count()
    }

    /// Mark every rule whose id is listed as ignored.
    pub fn apply_ignored(&mut self, ignored_ids: &[String]) {
        for rule in &mut self.rules {
            if ignored_ids.iter().any(|id| *id == rule.id) {
                rule.is_ignored = true;
            }
        }
    }
}

#[derive(Debug, Clone)]
/// Built-in rule settings read from the editor's `Preferences.json`.
pub struct BuiltInConfig {
    /// `Enable`, `Disable`, `EnableWithWarnings`, or `Unknown` when unreadable.
    pub status: String,
    pub disabled_ids: Vec<String>,
    pub app_version: Option<String>,
    pub path: Option<PathBuf>,
    pub error: Option<String>,
}

impl Default for BuiltInConfig {
    fn default() -> Self {
        Self {
            status: "Unknown".to_string(),
            disabled_ids: Vec::new(),
            app_version: None,
            path: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
/// Complete audit of every rule source for one model.
pub struct AuditResult {
    pub model_path: PathBuf,
    pub model_format: String,
    pub platform: Platform,
    pub builtin_config: BuiltInConfig,
    pub builtin_rules: RuleSource,
    pub url_rules: Vec<RuleSource>,
    pub model_rules: RuleSource,
    pub user_rules: RuleSource,
    pub machine_rules: RuleSource,
    pub ignored_rule_ids: Vec<String>,
}

impl AuditResult {
    /// Fixed (non-URL) sources in report order.
    pub fn fixed_sources(&self) -> [&RuleSource; 4] {
        [
            &self.builtin_rules,
            &self.model_rules,
            &self.user_rules,
            &self.machine_rules,
        ]
    }

    fn all_sources(&self) -> impl Iterator<Item = &RuleSource> {
        self.fixed_sources().into_iter().chain(self.url_rules.iter())
    }

    pub fn url_rules_count(&self) -> usize {
        self.url_rules.iter().map(RuleSource::count).sum()
    }

    pub fn url_rules_active_count(&self) -> usize {
        self.url_rules.iter().map(RuleSource::active_count).sum()
    }

    pub fn total_rules(&self) -> usize {
        self.all_sources().map(RuleSource::count).sum()
    }

    pub fn total_active_rules(&self) -> usize {
        self.all_sources().map(RuleSource::active_count).sum()
    }

    pub fn total_ignored(&self) -> usize {
        self.all_sources().map(RuleSource::ignored_count).sum()
    }

    /// Errors captured on any source, including the built-in configuration.
    pub fn source_errors(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        if let Some(e) = self.builtin_config.error.as_deref() {
            out.push(("Built-in configuration", e));
        }
        for s in self.all_sources() {
            if let Some(e) = s.error.as_deref() {
                out.push((s.location.as_str(), e));
            }
        }
        out
    }

    /// Process exit code: 1 on any source error, 2 when no rules exist, else 0.
    pub fn exit_code(&self) -> i32 {
        if !self.source_errors().is_empty() {
            1
        } else if self.total_rules() == 0 {
            2
        } else {
            0
        }
    }
}
