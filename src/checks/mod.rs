//! Validators for rule files, macro files and editor configuration files.
//!
//! Two severities exist. Errors are collected into the returned
//! [`ValidationReport`](crate::models::ValidationReport) and fail the run.
//! Warnings are handed to a [`WarningSink`] the moment they are found and
//! never affect the exit code.
//!
//! Order of errors: editor-compatibility errors, then schema errors, then
//! heuristic errors in record-scan order.

pub mod macros;
pub mod options;
pub mod rules;

use crate::error::{Error, Result};
use crate::utils;
use owo_colors::OwoColorize;
use serde_json::Value as Json;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Receives warnings as the scan proceeds.
pub trait WarningSink {
    fn warn(&mut self, message: String);
}

/// Collects warnings, used for JSON output and tests.
impl WarningSink for Vec<String> {
    fn warn(&mut self, message: String) {
        self.push(message);
    }
}

/// Prints each warning immediately as `  [WARN] ...`.
pub struct PrintSink {
    pub color: bool,
}

impl WarningSink for PrintSink {
    fn warn(&mut self, message: String) {
        let tag = if self.color {
            "[WARN]".yellow().bold().to_string()
        } else {
            "[WARN]".to_string()
        };
        println!("  {} {}", tag, message);
    }
}

/// Options shared by the file validators.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Stop after schema validation when a schema is available.
    pub schema_only: bool,
}

/// A document to validate, read from a file or stdin.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    /// `stdin`, or the path relative to the working directory.
    pub subject: String,
    pub path: Option<PathBuf>,
}

impl Document {
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self {
            text,
            subject: "stdin".to_string(),
            path: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            text: fs::read_to_string(path)?,
            subject: utils::rel_to_wd(path),
            path: Some(path.to_path_buf()),
        })
    }

    /// `--stdin` wins over a positional path. Having neither is a usage error.
    pub fn read(path: Option<&str>, stdin: bool) -> Result<Self> {
        if stdin {
            return Self::from_reader(std::io::stdin().lock());
        }
        match path {
            Some(p) => Self::from_path(Path::new(p)),
            None => Err(Error::Usage(
                "No input file specified (pass a path or --stdin)".to_string(),
            )),
        }
    }

    pub fn parse(&self) -> Result<Json> {
        Ok(serde_json::from_str(&self.text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_document_sources() {
        let doc = Document::from_reader("[1]".as_bytes()).unwrap();
        assert_eq!(doc.subject, "stdin");
        assert!(doc.path.is_none());
        assert_eq!(doc.parse().unwrap(), serde_json::json!([1]));

        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            Document::from_path(&missing),
            Err(Error::NotFound { .. })
        ));
        let file = dir.path().join("r.json");
        fs::write(&file, "{").unwrap();
        let doc = Document::from_path(&file).unwrap();
        assert_eq!(doc.path.as_deref(), Some(file.as_path()));
        assert!(matches!(doc.parse(), Err(Error::Json(_))));
    }

    #[test]
    fn test_no_input_is_usage_error() {
        let err = Document::read(None, false).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<String> = Vec::new();
        sink.warn("a".into());
        sink.warn("b".into());
        assert_eq!(sink, vec!["a", "b"]);
    }
}
