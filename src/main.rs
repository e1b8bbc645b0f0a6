//! telint CLI binary entry point.
//! Delegates to library modules and maps outcomes to exit codes.

use clap::Parser;
use std::path::{Path, PathBuf};
use telint::checks::options::ConfigKind;
use telint::checks::{self, CheckOptions, Document, PrintSink, WarningSink};
use telint::cli::{Cli, Commands, MacrosCmd};
use telint::config::{self, Effective};
use telint::error::{Error, Result};
use telint::fetch::FetchOptions;
use telint::schema::SchemaChoice;
use telint::{audit, catalog, fix, macros, output, schema, utils};

fn main() {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// Flags shared by every subcommand.
struct Globals<'a> {
    repo_root: Option<&'a str>,
    schema_dir: Option<&'a str>,
}

impl Globals<'_> {
    fn effective(&self, output: Option<&str>, fetch: Option<bool>) -> Effective {
        config::resolve_effective(self.repo_root, output, self.schema_dir, fetch)
    }
}

fn run(cli: Cli) -> Result<i32> {
    let globals = Globals {
        repo_root: cli.repo_root.as_deref(),
        schema_dir: cli.schema_dir.as_deref(),
    };
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Audit {
            model_path,
            json,
            quiet,
            no_fetch,
            output,
        } => {
            let eff = globals.effective(output.as_deref(), if no_fetch { Some(false) } else { None });
            let opts = audit::AuditOptions {
                fetch_urls: eff.fetch,
                fetch: FetchOptions {
                    timeout: std::time::Duration::from_secs(eff.timeout_secs),
                    insecure_tls: eff.insecure_tls,
                    user_agent: eff.user_agent.clone(),
                },
            };
            let path = PathBuf::from(&model_path);
            let path = std::fs::canonicalize(&path).unwrap_or(path);
            let result = audit::audit_bpa_rules(&path, &opts);
            output::print_audit(&result, &eff.output, quiet);
            if let Some(dest) = json {
                output::export_json(&result, Path::new(&dest))?;
                if eff.output == "json" {
                    eprintln!("Exported to: {}", dest);
                } else {
                    println!("\nExported to: {}", dest);
                }
            }
            Ok(result.exit_code())
        }
        Commands::Rules {
            path,
            stdin,
            schema_only,
            fix,
            schema,
            output,
        } => {
            let eff = globals.effective(output.as_deref(), None);
            let human = eff.output != "json";
            let doc = Document::read(path.as_deref(), stdin)?;
            let prepared = fix::prepare_rules(&doc, fix)?;
            if prepared.fix_skipped {
                eprintln!("{} --fix has no effect with --stdin", utils::note_prefix());
            }
            if let (Some(report), true) = (&prepared.fixed, human) {
                if report.converted_crlf {
                    println!("  [FIXED] Converted to Windows line endings (CRLF)");
                }
                if report.removed_fields > 0 {
                    println!(
                        "  [FIXED] Removed {} TE compatibility issues",
                        report.removed_fields
                    );
                }
            }

            let choice = pick_schema(&eff, schema.as_deref(), catalog::RULES_SCHEMA_FILE, human)?;
            if human {
                println!("Validating {} rules from {}...", prepared.count(), doc.subject);
                print_schema_used(&choice);
            }
            let mut warnings: Vec<String> = Vec::new();
            let mut printer = PrintSink {
                color: utils::colors_enabled(),
            };
            let sink: &mut dyn WarningSink = if human { &mut printer } else { &mut warnings };
            let report = prepared.validate(
                &doc.subject,
                choice.schema(),
                &eff.vocabulary,
                CheckOptions { schema_only },
                sink,
            );
            output::print_validation(&report, &warnings, "rules", &eff.output);
            Ok(report.exit_code())
        }
        Commands::Macros { cmd } => run_macros(cmd, &globals),
        Commands::Config {
            path,
            kind,
            stdin,
            schema_only,
            schema,
            output,
        } => {
            let eff = globals.effective(output.as_deref(), None);
            let human = eff.output != "json";
            let kind = ConfigKind::resolve(kind.as_deref(), path.as_deref(), stdin)?;
            let doc = Document::read(path.as_deref(), stdin)?;
            let data = doc.parse()?;
            let choice = pick_schema(&eff, schema.as_deref(), kind.schema_file(), human)?;
            if human {
                println!("Validating {} config: {}...", kind, doc.subject);
                print_schema_used(&choice);
            }
            let mut warnings: Vec<String> = Vec::new();
            let mut printer = PrintSink {
                color: utils::colors_enabled(),
            };
            let sink: &mut dyn WarningSink = if human { &mut printer } else { &mut warnings };
            let report = checks::options::validate_config(
                &doc.subject,
                kind,
                &data,
                choice.schema(),
                CheckOptions { schema_only },
                sink,
            );
            output::print_validation(&report, &warnings, "top-level items", &eff.output);
            Ok(report.exit_code())
        }
    }
}

fn run_macros(cmd: MacrosCmd, globals: &Globals) -> Result<i32> {
    match cmd {
        MacrosCmd::Validate {
            path,
            stdin,
            schema_only,
            schema,
            output,
        } => {
            let eff = globals.effective(output.as_deref(), None);
            let human = eff.output != "json";
            let doc = Document::read(path.as_deref(), stdin)?;
            let data = doc.parse()?;
            let choice = pick_schema(&eff, schema.as_deref(), catalog::MACROS_SCHEMA_FILE, human)?;
            if human {
                let n = data
                    .get("Actions")
                    .and_then(|a| a.as_array())
                    .map_or(0, Vec::len);
                println!("Validating {} macros from {}...", n, doc.subject);
                print_schema_used(&choice);
            }
            let mut warnings: Vec<String> = Vec::new();
            let mut printer = PrintSink {
                color: utils::colors_enabled(),
            };
            let sink: &mut dyn WarningSink = if human { &mut printer } else { &mut warnings };
            let report = checks::macros::validate_macros(
                &doc.subject,
                &data,
                choice.schema(),
                CheckOptions { schema_only },
                sink,
            );
            output::print_validation(&report, &warnings, "macros", &eff.output);
            Ok(report.exit_code())
        }
        MacrosCmd::Add {
            script,
            macros_json,
            name,
            tooltip,
            context,
        } => {
            let opts = macros::AddOptions {
                name,
                tooltip,
                context,
            };
            let target = Path::new(&macros_json);
            let added = macros::add_macro(Path::new(&script), target, &opts)?;
            println!("Added macro: {} (ID: {})", added.name, added.id);
            println!("Contexts: {}", added.valid_contexts);
            println!("Saved to: {}", utils::rel_to_wd(target));
            Ok(0)
        }
        MacrosCmd::Create {
            output,
            scripts,
            dir,
            pattern,
            recursive,
            list,
        } => {
            let files: Vec<PathBuf> = match dir {
                Some(d) => macros::collect_scripts(Path::new(&d), &pattern, recursive)?,
                None if !scripts.is_empty() => scripts.iter().map(PathBuf::from).collect(),
                None => return Err(Error::Usage("Provide .csx files or --dir".to_string())),
            };
            if files.is_empty() {
                return Err(Error::Usage("No .csx files found".to_string()));
            }
            let target = Path::new(&output);
            if list {
                println!("Creating {} with {} macros:", utils::rel_to_wd(target), files.len());
            }
            let created = macros::create_macros_json(target, &files)?;
            if list {
                for (m, f) in created.actions.iter().zip(&files) {
                    let file = f.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                    println!("  [{}] {} <- {}", m.id, m.name, file);
                }
            }
            println!(
                "Created {} with {} macros",
                utils::rel_to_wd(target),
                created.actions.len()
            );
            Ok(0)
        }
    }
}

/// Resolve the schema; a configured but missing one gets a note in human mode.
fn pick_schema(
    eff: &Effective,
    cli_schema: Option<&str>,
    default_name: &str,
    human: bool,
) -> Result<SchemaChoice> {
    let choice = schema::resolve_schema(cli_schema.map(Path::new), eff.schema_file(default_name))?;
    if let (SchemaChoice::Missing(path), true) = (&choice, human) {
        eprintln!(
            "{} Schema file not found: {}; using built-in structural checks",
            utils::note_prefix(),
            utils::rel_to_wd(path)
        );
    }
    Ok(choice)
}

fn print_schema_used(choice: &SchemaChoice) {
    if let SchemaChoice::Loaded { path, .. } = choice {
        println!("Using schema: {}", utils::rel_to_wd(path));
    }
}
