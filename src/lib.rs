//! telint core library.
//!
//! This crate exposes programmatic APIs for auditing Best Practice Analyzer
//! rule sources of a tabular model and for validating the editor's rule,
//! macro and configuration files.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `platform`: Execution environment and AppData root discovery.
//! - `annotation`: TMDL annotation value extraction.
//! - `sources`: Loaders for built-in, file and model-embedded rules.
//! - `fetch`: Remote rule files.
//! - `audit`: Multi-source rule audit.
//! - `checks`: Rule, macro and config validators.
//! - `fix`: In-place repairs for rule files.
//! - `macros`: Macro file authoring from scripts.
//! - `schema`: JSON Schema loading and validation.
//! - `catalog`: Constant vocabularies.
//! - `models`: Rule, macro, source and report structs.
//! - `output`: Human/JSON printers.
//! - `error`: Error type for fatal failures.
//! - `utils`: Supporting helpers.
pub mod annotation;
pub mod audit;
pub mod catalog;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fix;
pub mod macros;
pub mod models;
pub mod output;
pub mod platform;
pub mod schema;
pub mod sources;
pub mod utils;
