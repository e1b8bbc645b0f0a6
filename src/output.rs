//! Output rendering for audit and validation commands.
//!
//! Supports `human` (default) and `json` outputs. Rendering is split into
//! pure `render_*`/`compose_*` functions and thin `print_*` wrappers so the
//! exact text can be tested.

use crate::error::Result;
use crate::models::rule::BpaRule;
use crate::models::source::{AuditResult, RuleSource};
use crate::models::ValidationReport;
use crate::utils::{truncate, truncate_left};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Inner width of the boxed audit report.
const BOX_WIDTH: usize = 78;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn pretty(value: &JsonVal) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Rules as a fixed-width table. The status variant shows
/// `Active`/`Disabled`/`Ignored` and the category instead of severity/scope.
pub fn format_rules_table(rules: &[BpaRule], show_status: bool) -> String {
    if rules.is_empty() {
        return "    (no rules)".to_string();
    }
    let mut lines = Vec::with_capacity(rules.len() + 2);
    if show_status {
        lines.push(format!("    {:<40} {:<12} {:<15}", "ID", "Status", "Category"));
        lines.push(format!("    {} {} {}", "-".repeat(40), "-".repeat(12), "-".repeat(15)));
        for r in rules {
            lines.push(format!(
                "    {:<40} {:<12} {:<15}",
                truncate(&r.id, 40),
                r.status_label(),
                truncate(r.category.as_deref().unwrap_or(""), 15)
            ));
        }
    } else {
        lines.push(format!("    {:<30} {:<10} {:<20}", "ID", "Severity", "Scope"));
        lines.push(format!("    {} {} {}", "-".repeat(30), "-".repeat(10), "-".repeat(20)));
        for r in rules {
            lines.push(format!(
                "    {:<30} {:<10} {:<20}",
                truncate(&r.id, 30),
                r.severity_label(),
                truncate(&r.scope, 20)
            ));
        }
    }
    lines
        .into_iter()
        .map(|l| l.trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

struct Boxed {
    out: String,
}

impl Boxed {
    fn rule(&mut self, c: char) {
        let _ = writeln!(self.out, "+{}+", c.to_string().repeat(BOX_WIDTH));
    }

    fn row(&mut self, text: &str) {
        let inner = BOX_WIDTH - 2;
        let _ = writeln!(self.out, "| {:<w$} |", truncate(text, inner), w = inner);
    }

    fn centered(&mut self, text: &str) {
        let inner = BOX_WIDTH - 2;
        let _ = writeln!(self.out, "| {:^w$} |", truncate(text, inner), w = inner);
    }

    fn path(&mut self, label: &str, p: &Path) {
        let prefix = format!("  {}: ", label);
        let room = BOX_WIDTH - 2 - prefix.len();
        self.row(&format!("{}{}", prefix, truncate_left(&p.display().to_string(), room)));
    }
}

fn source_status(src: &RuleSource) -> String {
    match (&src.error, src.count()) {
        (Some(e), _) => format!("  Status: ERROR - {}", e),
        (None, 0) => "  Status: No rules found".to_string(),
        (None, n) => format!("  Status: {} rule(s) found", n),
    }
}

/// The boxed report followed by the detailed per-source tables.
pub fn render_audit_report(result: &AuditResult) -> String {
    let mut b = Boxed { out: String::new() };
    b.rule('=');
    b.centered("BPA RULES AUDIT REPORT");
    b.rule('=');
    b.row(&format!("Model Path: {}", result.model_path.display()));
    b.row(&format!("Format: {}", result.model_format));
    b.row(&format!("Platform: {}", result.platform));
    b.rule('-');

    let cfg = &result.builtin_config;
    b.row("BUILT-IN (TE3)");
    if let Some(p) = &cfg.path {
        b.path("Path", p);
    }
    if let Some(v) = &cfg.app_version {
        b.row(&format!("  TE3 Version: {}", v));
    }
    b.row(&format!("  Setting: {}", cfg.status));
    match &cfg.error {
        Some(e) => b.row(&format!("  Status: ERROR - {}", e)),
        None => {
            let total = result.builtin_rules.count();
            let enabled = result.builtin_rules.enabled_count();
            b.row(&format!(
                "  Status: {}/{} enabled, {} disabled",
                enabled,
                total,
                total - enabled
            ));
        }
    }
    b.rule('-');

    b.row("URL-BASED (External)");
    if result.url_rules.is_empty() {
        b.row("  Status: No external URLs configured");
    }
    for src in &result.url_rules {
        let url = src.location.trim_start_matches("URL: ");
        b.row(&format!("  URL: {}", truncate_left(url, BOX_WIDTH - 9)));
        match &src.error {
            Some(e) => b.row(&format!("    ERROR: {}", e)),
            None => b.row(&format!(
                "    Status: {} rules, {} active, {} ignored",
                src.count(),
                src.active_count(),
                src.ignored_count()
            )),
        }
    }
    b.rule('-');

    let named = named_sources(result);
    for (name, src) in &named {
        b.row(name);
        if let Some(p) = &src.path {
            b.path("Path", p);
        }
        b.row(&source_status(src));
        b.rule('-');
    }

    if !result.ignored_rule_ids.is_empty() {
        b.row("IGNORED RULES (from model annotation)");
        let ids = &result.ignored_rule_ids;
        let mut shown = ids.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
        if ids.len() > 5 {
            let _ = write!(shown, " (+{} more)", ids.len() - 5);
        }
        b.row(&format!("  {}", shown));
        b.rule('-');
    }

    b.centered("SUMMARY");
    b.row(&format!(
        "  Built-in (enabled): {} / {}",
        result.builtin_rules.enabled_count(),
        result.builtin_rules.count()
    ));
    b.row(&format!(
        "  URL-based: {} active / {} total",
        result.url_rules_active_count(),
        result.url_rules_count()
    ));
    for (label, src) in [
        ("Model-embedded", &result.model_rules),
        ("User-level", &result.user_rules),
        ("Machine-level", &result.machine_rules),
    ] {
        b.row(&format!(
            "  {}: {} active / {} total",
            label,
            src.active_count(),
            src.count()
        ));
    }
    b.rule('-');
    b.row(&format!("  Total rules defined: {}", result.total_rules()));
    b.row(&format!("  Total ignored: {}", result.total_ignored()));
    b.centered(&format!("TOTAL ACTIVE RULES: {}", result.total_active_rules()));
    b.rule('=');

    let mut out = b.out;
    let bar = "=".repeat(80);
    let _ = writeln!(out, "\n{}\nDETAILED RULES\n{}", bar, bar);
    let _ = writeln!(out, "\nBUILT-IN (TE3):");
    let _ = writeln!(out, "{}", format_rules_table(&result.builtin_rules.rules, true));
    for src in &result.url_rules {
        if !src.rules.is_empty() {
            let _ = writeln!(out, "\n{}:", src.location);
            let _ = writeln!(out, "{}", format_rules_table(&src.rules, true));
        }
    }
    for (name, src) in &named {
        if !src.rules.is_empty() {
            let _ = writeln!(out, "\n{}:", name);
            let _ = writeln!(out, "{}", format_rules_table(&src.rules, true));
        }
    }
    out
}

fn named_sources(result: &AuditResult) -> [(&'static str, &RuleSource); 3] {
    [
        ("MODEL-EMBEDDED", &result.model_rules),
        ("USER-LEVEL", &result.user_rules),
        ("MACHINE-LEVEL", &result.machine_rules),
    ]
}

/// Compact summary printed with `--quiet`.
pub fn render_quiet_summary(result: &AuditResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total active rules: {}", result.total_active_rules());
    let _ = writeln!(
        out,
        "  Built-in (enabled): {}/{}",
        result.builtin_rules.enabled_count(),
        result.builtin_rules.count()
    );
    let _ = writeln!(
        out,
        "  URL-based: {}/{}",
        result.url_rules_active_count(),
        result.url_rules_count()
    );
    for (label, src) in [
        ("Model", &result.model_rules),
        ("User", &result.user_rules),
        ("Machine", &result.machine_rules),
    ] {
        let _ = writeln!(out, "  {}: {}/{}", label, src.active_count(), src.count());
    }
    if result.total_ignored() > 0 {
        let _ = writeln!(out, "  Ignored: {}", result.total_ignored());
    }
    out
}

/// Print the audit in the requested format.
pub fn print_audit(result: &AuditResult, output: &str, quiet: bool) {
    match output {
        "json" => println!("{}", pretty(&compose_audit_json(result))),
        _ if quiet => print!("{}", render_quiet_summary(result)),
        _ => {
            let report = render_audit_report(result);
            if use_colors(output) {
                // Only the headline total is highlighted.
                let total = format!("TOTAL ACTIVE RULES: {}", result.total_active_rules());
                print!("{}", report.replacen(&total, &total.bold().to_string(), 1));
            } else {
                print!("{}", report);
            }
        }
    }
}

fn rule_json(r: &BpaRule, with_status: bool) -> JsonVal {
    let mut v = json!({
        "ID": r.id,
        "Name": r.name,
        "Category": r.category,
        "Severity": r.severity,
        "Scope": r.scope,
        "Expression": r.expression,
        "FixExpression": r.fix_expression,
        "CompatibilityLevel": r.compatibility_level,
        "IsIgnored": r.is_ignored,
    });
    if with_status {
        v["IsEnabled"] = json!(r.is_enabled);
        v["IsBuiltIn"] = json!(r.is_builtin);
    }
    v
}

fn source_json(src: &RuleSource, with_status: bool) -> JsonVal {
    json!({
        "location": src.location,
        "path": src.path.as_ref().map(|p| p.display().to_string()),
        "count": src.count(),
        "active_count": src.active_count(),
        "ignored_count": src.ignored_count(),
        "error": src.error,
        "rules": src.rules.iter().map(|r| rule_json(r, with_status)).collect::<Vec<_>>(),
    })
}

/// Compose the audit JSON object (pure) for export and testing.
pub fn compose_audit_json(result: &AuditResult) -> JsonVal {
    let cfg = &result.builtin_config;
    json!({
        "model_path": result.model_path.display().to_string(),
        "model_format": result.model_format,
        "platform": result.platform.as_str(),
        "total_rules": result.total_rules(),
        "total_active_rules": result.total_active_rules(),
        "total_ignored": result.total_ignored(),
        "ignored_rule_ids": result.ignored_rule_ids,
        "builtin_config": {
            "status": cfg.status,
            "app_version": cfg.app_version,
            "path": cfg.path.as_ref().map(|p| p.display().to_string()),
            "disabled_ids": cfg.disabled_ids,
            "error": cfg.error,
        },
        "sources": {
            "builtin": source_json(&result.builtin_rules, true),
            "url": result.url_rules.iter().map(|s| source_json(s, false)).collect::<Vec<_>>(),
            "model": source_json(&result.model_rules, false),
            "user": source_json(&result.user_rules, false),
            "machine": source_json(&result.machine_rules, false),
        }
    })
}

/// Write the audit JSON to `path` with 2-space indentation.
pub fn export_json(result: &AuditResult, path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(&compose_audit_json(result))?;
    fs::write(path, body)?;
    Ok(())
}

/// Compose the validation JSON object (pure).
pub fn compose_validation_json(report: &ValidationReport, warnings: &[String]) -> JsonVal {
    json!({
        "subject": report.subject,
        "total": report.total,
        "valid": report.is_valid(),
        "errors": report.errors,
        "warnings": warnings,
        "summary": {
            "errors": report.errors.len(),
            "warnings": warnings.len(),
        }
    })
}

/// Human-readable validation result. `noun` names the items counted
/// (`rules`, `macros`, `top-level items`).
pub fn render_validation(report: &ValidationReport, noun: &str, color: bool) -> String {
    let mut out = String::from("\n");
    if report.is_valid() {
        let line = format!("All {} {} are valid.", report.total, noun);
        let _ = writeln!(
            out,
            "{}",
            if color { line.green().to_string() } else { line }
        );
        return out;
    }
    let _ = writeln!(out, "Found {} error(s):", report.errors.len());
    for e in &report.errors {
        let tag = if color {
            "[ERROR]".red().bold().to_string()
        } else {
            "[ERROR]".to_string()
        };
        let _ = writeln!(out, "  {} {}", tag, e);
    }
    out
}

/// Print a validation result. Human mode has already streamed warnings.
pub fn print_validation(report: &ValidationReport, warnings: &[String], noun: &str, output: &str) {
    match output {
        "json" => println!("{}", pretty(&compose_validation_json(report, warnings))),
        _ => print!("{}", render_validation(report, noun, use_colors(output))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::source::BuiltInConfig;
    use crate::platform::Platform;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn rule(id: &str, severity: i64, scope: &str) -> BpaRule {
        BpaRule::from_json(&json!({"ID": id, "Severity": severity, "Scope": scope})).unwrap()
    }

    fn sample() -> AuditResult {
        let mut builtin = RuleSource::new("Built-in");
        builtin.rules = vec![BpaRule::builtin("TE3_BUILT_IN_DATE_TABLE_EXISTS", true)];
        let mut user = RuleSource::new("User-level (LocalAppData)");
        user.path = Some(PathBuf::from("/c/Users/me/AppData/Local/TabularEditor3/BPARules.json"));
        user.rules = vec![rule("DAX_A", 3, "Measure"), rule("DAX_B", 1, "Table")];
        user.apply_ignored(&["DAX_B".to_string()]);
        AuditResult {
            model_path: PathBuf::from("/models/model.bim"),
            model_format: "model.bim".into(),
            platform: Platform::Linux,
            builtin_config: BuiltInConfig {
                status: "Enable".into(),
                ..Default::default()
            },
            builtin_rules: builtin,
            url_rules: vec![RuleSource::with_error("URL: https://x/r.json", "HTTP 404: Not Found")],
            model_rules: RuleSource::new("Model-embedded"),
            user_rules: user,
            machine_rules: RuleSource::with_error("Machine-level (ProgramData)", "File not found"),
            ignored_rule_ids: vec!["DAX_B".into()],
        }
    }

    #[test]
    fn test_rules_table_plain_and_status() {
        assert_eq!(format_rules_table(&[], false), "    (no rules)");

        let long = "X".repeat(35);
        let table = format_rules_table(&[rule(&long, 2, "Measure")], false);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("    ID"));
        assert!(lines[2].starts_with(&format!("    {}..", "X".repeat(28))));
        assert!(lines[2].contains("Medium"));

        let mut r = rule("DAX_A", 1, "Table");
        r.is_ignored = true;
        let table = format_rules_table(&[r], true);
        assert!(table.contains("Status"));
        assert!(table.lines().nth(2).unwrap().contains("Ignored"));
    }

    #[test]
    fn test_audit_report_box_is_fixed_width() {
        let report = render_audit_report(&sample());
        let boxed: Vec<_> = report.lines().take_while(|l| !l.is_empty()).collect();
        assert!(boxed.iter().all(|l| l.chars().count() == BOX_WIDTH + 2), "{}", report);
        assert!(report.contains("ERROR: HTTP 404: Not Found"));
        assert!(report.contains("IGNORED RULES"));
        assert!(report.contains("TOTAL ACTIVE RULES: 2"));
        assert!(report.contains("DETAILED RULES"));
        assert!(report.contains("USER-LEVEL:"));
    }

    #[test]
    fn test_quiet_summary() {
        let s = render_quiet_summary(&sample());
        assert!(s.starts_with("Total active rules: 2\n"));
        assert!(s.contains("  User: 1/2"));
        assert!(s.contains("  Ignored: 1"));
    }

    #[test]
    fn test_compose_audit_json_shape() {
        let out = compose_audit_json(&sample());
        assert_eq!(out["platform"], "linux");
        assert_eq!(out["total_rules"], 3);
        assert_eq!(out["total_ignored"], 1);
        assert_eq!(out["builtin_config"]["status"], "Enable");
        assert_eq!(out["sources"]["builtin"]["rules"][0]["IsBuiltIn"], true);
        assert!(out["sources"]["user"]["rules"][0].get("IsBuiltIn").is_none());
        assert_eq!(out["sources"]["user"]["rules"][1]["IsIgnored"], true);
        assert_eq!(out["sources"]["url"][0]["error"], "HTTP 404: Not Found");
        assert!(out["sources"]["model"]["path"].is_null());
    }

    #[test]
    fn test_export_json_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.json");
        export_json(&sample(), &path).unwrap();
        let back: JsonVal = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["model_format"], "model.bim");
    }

    #[test]
    fn test_validation_rendering() {
        let mut report = ValidationReport::new("rules.json", 2);
        assert!(render_validation(&report, "rules", false).contains("All 2 rules are valid."));
        report.errors.push("[A] Duplicate rule ID".into());
        let text = render_validation(&report, "rules", false);
        assert!(text.contains("Found 1 error(s):"));
        assert!(text.contains("  [ERROR] [A] Duplicate rule ID"));

        let out = compose_validation_json(&report, &["w".to_string()]);
        assert_eq!(out["valid"], false);
        assert_eq!(out["summary"]["warnings"], 1);
    }
}
