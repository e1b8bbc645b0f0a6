//! Configuration discovery and effective settings resolution.
//!
//! telint reads `telint.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `schema_dir`: `schema` under the repository root, when it exists
//! - `audit.fetch`: true
//! - `audit.timeout_secs`: 15
//! - `audit.insecure_tls`: true (hosts with local trust-store gaps)
//! - `rules.prefixes|categories`: built-in catalog
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::catalog::RuleVocabulary;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_USER_AGENT: &str = concat!("telint/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default, Deserialize, Clone)]
/// Audit-related configuration section under `[audit]`.
pub struct AuditCfg {
    pub fetch: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub insecure_tls: Option<bool>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Rule vocabulary overrides under `[rules]`.
pub struct RulesCfg {
    pub prefixes: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `telint.toml|yaml`.
pub struct TelintConfig {
    pub output: Option<String>,
    pub schema_dir: Option<String>,
    #[serde(default)]
    pub audit: Option<AuditCfg>,
    #[serde(default)]
    pub rules: Option<RulesCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub output: String,
    pub schema_dir: Option<PathBuf>,
    pub fetch: bool,
    pub timeout_secs: u64,
    pub insecure_tls: bool,
    pub user_agent: String,
    pub vocabulary: RuleVocabulary,
}

impl Effective {
    /// Path of a named schema inside the schema directory, if configured.
    pub fn schema_file(&self, name: &str) -> Option<PathBuf> {
        self.schema_dir.as_ref().map(|d| d.join(name))
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `telint.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("telint.toml").exists()
            || cur.join("telint.yaml").exists()
            || cur.join("telint.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `TelintConfig` from `telint.toml` or `telint.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<TelintConfig> {
    let toml_path = root.join("telint.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: TelintConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["telint.yaml", "telint.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: TelintConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
/// `cli_schema_dir` comes from the global `--schema-dir` flag.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_schema_dir: Option<&str>,
    cli_fetch: Option<bool>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let schema_dir = match cli_schema_dir.map(|s| s.to_string()).or(cfg.schema_dir) {
        Some(d) => Some(repo_root.join(d)),
        None => Some(repo_root.join("schema")).filter(|p| p.is_dir()),
    };

    let audit = cfg.audit.unwrap_or_default();
    let fetch = cli_fetch.or(audit.fetch).unwrap_or(true);
    let timeout_secs = audit.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    let insecure_tls = audit.insecure_tls.unwrap_or(true);
    let user_agent = audit
        .user_agent
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    let mut vocabulary = RuleVocabulary::default();
    if let Some(rules) = cfg.rules {
        if let Some(p) = rules.prefixes {
            vocabulary.prefixes = p;
        }
        if let Some(c) = rules.categories {
            vocabulary.categories = c;
        }
        if let Some(s) = rules.scopes {
            vocabulary.scopes = s;
        }
    }

    let eff = Effective {
        repo_root,
        output,
        schema_dir,
        fetch,
        timeout_secs,
        insecure_tls,
        user_agent,
        vocabulary,
    };
    debug!(?eff, "effective configuration");
    eff
}
