//! Console prefixes, path display and logging setup shared by commands.

use owo_colors::OwoColorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Colors are disabled when `NO_COLOR` is set.
pub fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if colors_enabled() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

/// Render `path` relative to the working directory when it sits below it.
pub fn rel_to_wd(path: &Path) -> String {
    let Ok(cwd) = std::env::current_dir() else {
        return path.to_string_lossy().to_string();
    };
    match pathdiff::diff_paths(path, &cwd) {
        Some(rel) if !rel.starts_with("..") && !rel.as_os_str().is_empty() => {
            rel.to_string_lossy().to_string()
        }
        _ => path.to_string_lossy().to_string(),
    }
}

/// Shorten `s` to `width` characters, marking the cut with `..`.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let keep = width.saturating_sub(2);
        let mut out: String = s.chars().take(keep).collect();
        out.push_str("..");
        out
    } else {
        s.to_string()
    }
}

/// Keep the tail of a long path, marking the cut with `...`.
pub fn truncate_left(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len > width {
        let keep = width.saturating_sub(3);
        let tail: String = s.chars().skip(len - keep).collect();
        format!("...{}", tail)
    } else {
        s.to_string()
    }
}

/// Install the stderr tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "telint=debug" } else { "telint=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
