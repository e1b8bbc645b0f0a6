//! Rule audit across every source that applies to a model.
//!
//! Sources, in report order: built-in catalog, external URLs declared by the
//! model, rules embedded in the model, user-level and machine-level
//! `BPARules.json`. Rule IDs listed in the model's ignore annotation are
//! flagged on every source.

use crate::fetch::{fetch_rules_from_url, FetchOptions};
use crate::models::source::{AuditResult, RuleSource};
use crate::platform::{self, AppDataRoots, Platform};
use crate::sources;
use std::path::Path;
use tracing::info;

pub const USER_LOCATION: &str = "User-level (LocalAppData)";
pub const MACHINE_LOCATION: &str = "Machine-level (ProgramData)";

#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Fetch rules from URLs declared in the model.
    pub fetch_urls: bool,
    pub fetch: FetchOptions,
}

/// Audit `model_path` on the current platform.
pub fn audit_bpa_rules(model_path: &Path, opts: &AuditOptions) -> AuditResult {
    let plat = platform::detect_platform();
    let roots = platform::locate_appdata(plat);
    audit_with_roots(model_path, plat, &roots, opts)
}

/// Audit `model_path` against explicitly provided AppData roots.
pub fn audit_with_roots(
    model_path: &Path,
    plat: Platform,
    roots: &AppDataRoots,
    opts: &AuditOptions,
) -> AuditResult {
    let model_format = sources::detect_model_format(model_path);

    let builtin_config = sources::parse_builtin_config(roots.local_appdata.as_deref());
    let mut builtin_rules = sources::builtin_rules(&builtin_config);

    let ann = sources::parse_model_annotations(model_path);
    let mut model_rules = ann.rules;

    let mut url_rules: Vec<RuleSource> = Vec::new();
    if opts.fetch_urls {
        for url in &ann.external_urls {
            url_rules.push(fetch_rules_from_url(url, &opts.fetch));
        }
    }

    let mut user_rules = match roots.local_appdata.as_deref() {
        Some(p) => sources::parse_rules_file(p, USER_LOCATION),
        None => RuleSource::with_error(
            USER_LOCATION,
            "Could not locate Windows LocalAppData directory",
        ),
    };
    let mut machine_rules = match roots.program_data.as_deref() {
        Some(p) => sources::parse_rules_file(p, MACHINE_LOCATION),
        None => RuleSource::with_error(
            MACHINE_LOCATION,
            "Could not locate Windows ProgramData directory",
        ),
    };

    let ignored = &ann.ignored_ids;
    builtin_rules.apply_ignored(ignored);
    model_rules.apply_ignored(ignored);
    user_rules.apply_ignored(ignored);
    machine_rules.apply_ignored(ignored);
    for src in &mut url_rules {
        src.apply_ignored(ignored);
    }

    let result = AuditResult {
        model_path: model_path.to_path_buf(),
        model_format,
        platform: plat,
        builtin_config,
        builtin_rules,
        url_rules,
        model_rules,
        user_rules,
        machine_rules,
        ignored_rule_ids: ann.ignored_ids,
    };
    info!(
        total = result.total_rules(),
        active = result.total_active_rules(),
        ignored = result.total_ignored(),
        "audit complete"
    );
    result
}
