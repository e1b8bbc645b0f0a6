//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "telint",
    version,
    about = "Tabular Editor configuration linter",
    long_about = "telint — audit Best Practice Analyzer rule sources for a model and validate rule, macro and configuration files.\n\nConfiguration precedence: CLI > telint.toml > defaults.",
    after_help = "Examples:\n  telint audit ./Model.SemanticModel/definition\n  telint rules BPARules.json --fix\n  telint macros validate MacroActions.json --output json\n  telint macros create MacroActions.json --dir ./macros --recursive\n  telint config Model.jdoe.tmuo",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, global = true, help = "Repository root used to find telint.toml (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, global = true, help = "Directory holding JSON Schemas (default: <repo_root>/schema)")]
    pub schema_dir: Option<String>,
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Enable debug logging on stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for auditing and validating editor files.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current telint version.")]
    Version,
    /// Audit every rule source for a model
    #[command(
        about = "Audit BPA rule sources",
        long_about = "List built-in, URL, model-embedded, user-level and machine-level rules that apply to a model. Exits 1 when a source failed, 2 when no rules were found.",
        after_help = "Examples:\n  telint audit model.bim\n  telint audit ./definition --json audit.json\n  telint audit model.bim --quiet --no-fetch"
    )]
    Audit {
        #[arg(help = "Path to model.bim, a .tmdl file or a TMDL folder")]
        model_path: String,
        #[arg(long, help = "Export the audit to a JSON file")]
        json: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Only print the summary")]
        quiet: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Do not fetch external rule URLs")]
        no_fetch: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Validate a BPARules.json file
    #[command(
        about = "Validate BPA rule file",
        long_about = "Check a rule file for editor compatibility, schema conformance and best practices. --fix converts line endings to CRLF and removes fields the editor rejects.",
        after_help = "Examples:\n  telint rules BPARules.json\n  telint rules --stdin < BPARules.json\n  telint rules BPARules.json --fix"
    )]
    Rules {
        #[arg(help = "Rule file (omit with --stdin)")]
        path: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Read the document from stdin")]
        stdin: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Only run JSON Schema validation")]
        schema_only: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Fix line endings and compatibility issues in place")]
        fix: bool,
        #[arg(long, help = "Schema file (default: <schema_dir>/bparules-schema.json)")]
        schema: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Macro file validation and authoring
    Macros {
        #[command(subcommand)]
        cmd: MacrosCmd,
    },
    /// Validate an editor configuration file
    #[command(
        about = "Validate configuration file",
        long_about = "Validate Preferences.json, UiPreferences.json, Layouts.json, RecentFiles.json, RecentServers.json or a .tmuo user options file. The type is detected from the file name unless --type is given.",
        after_help = "Examples:\n  telint config Preferences.json\n  telint config --stdin --type layouts < Layouts.json"
    )]
    Config {
        #[arg(help = "Configuration file (omit with --stdin)")]
        path: Option<String>,
        #[arg(long = "type", help = "Config type: preferences|uipreferences|layouts|recentfiles|recentservers|tmuo")]
        kind: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Read the document from stdin (requires --type)")]
        stdin: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Only run JSON Schema validation")]
        schema_only: bool,
        #[arg(long, help = "Schema file (default: <schema_dir>/<type>-schema.json)")]
        schema: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
/// Subcommands for `telint macros`
pub enum MacrosCmd {
    /// Validate a MacroActions.json file
    #[command(
        about = "Validate macro file",
        long_about = "Check MacroActions.json structure, contexts and risky scripts."
    )]
    Validate {
        #[arg(help = "Macro file (omit with --stdin)")]
        path: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Read the document from stdin")]
        stdin: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Only run JSON Schema validation")]
        schema_only: bool,
        #[arg(long, help = "Schema file (default: <schema_dir>/macros-schema.json)")]
        schema: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Append a script to a macro file
    #[command(
        about = "Add script as macro",
        long_about = "Append a .csx script as a new macro with the next free Id. The macro file is created when missing.",
        after_help = "Examples:\n  telint macros add format-dax.csx MacroActions.json --name \"Format DAX\" --context Measure"
    )]
    Add {
        #[arg(help = "Path to the .csx script")]
        script: String,
        #[arg(help = "Path to MacroActions.json")]
        macros_json: String,
        #[arg(long, help = "Macro name (default: title-cased file name)")]
        name: Option<String>,
        #[arg(long, help = "Tooltip text (default: empty)")]
        tooltip: Option<String>,
        #[arg(long, help = "Valid contexts, comma-separated (default: Model)")]
        context: Option<String>,
    },
    /// Build a macro file from scripts
    #[command(
        about = "Create macro file",
        long_about = "Write a new MacroActions.json from .csx scripts, numbering them from 1. Name, tooltip and context are read from // Name:, // Tooltip: and // Context: comments.",
        after_help = "Examples:\n  telint macros create MacroActions.json a.csx b.csx\n  telint macros create MacroActions.json --dir ./macros --recursive -v"
    )]
    Create {
        #[arg(help = "Output path for MacroActions.json")]
        output: String,
        #[arg(help = ".csx scripts to include")]
        scripts: Vec<String>,
        #[arg(long, help = "Directory containing .csx scripts")]
        dir: Option<String>,
        #[arg(long, default_value = "*.csx", help = "Glob pattern used with --dir")]
        pattern: String,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Search --dir recursively")]
        recursive: bool,
        #[arg(short = 'v', long = "list", action = clap::ArgAction::SetTrue, help = "Print each macro as it is added")]
        list: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules_flags() {
        let cli = Cli::try_parse_from(["telint", "rules", "r.json", "--fix", "--verbose"]).unwrap();
        assert!(cli.verbose);
        match cli.cmd {
            Commands::Rules { path, fix, stdin, .. } => {
                assert_eq!(path.as_deref(), Some("r.json"));
                assert!(fix);
                assert!(!stdin);
            }
            _ => panic!("expected rules"),
        }
    }

    #[test]
    fn test_parse_macros_create() {
        let cli = Cli::try_parse_from([
            "telint", "macros", "create", "out.json", "--dir", "m", "--recursive", "-v",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Macros {
                cmd: MacrosCmd::Create { dir, pattern, recursive, list, scripts, .. },
            } => {
                assert_eq!(dir.as_deref(), Some("m"));
                assert_eq!(pattern, "*.csx");
                assert!(recursive && list);
                assert!(scripts.is_empty());
            }
            _ => panic!("expected macros create"),
        }
    }

    #[test]
    fn test_parse_config_type() {
        let cli = Cli::try_parse_from([
            "telint", "config", "--stdin", "--type", "layouts", "--schema-dir", "s",
        ])
        .unwrap();
        assert_eq!(cli.schema_dir.as_deref(), Some("s"));
        match cli.cmd {
            Commands::Config { kind, stdin, path, .. } => {
                assert_eq!(kind.as_deref(), Some("layouts"));
                assert!(stdin);
                assert!(path.is_none());
            }
            _ => panic!("expected config"),
        }
    }
}
