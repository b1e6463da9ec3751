//! Validate command: data-quality checks for name systems.

use anyhow::{Context, bail};
use bible_names_core::validation::tally;
use bible_names_core::{Config, Severity, ValidationIssue, ValidationMode};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use super::open_library;

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Name system to check (defaults to the configured system)
    #[arg(short, long, value_name = "NAME", conflicts_with = "all")]
    pub system: Option<String>,

    /// Check every available system
    #[arg(long)]
    pub all: bool,

    /// Run the strict checks too (overrides the configured mode)
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct SystemReport {
    system: String,
    errors: usize,
    warnings: usize,
    issues: Vec<ValidationIssue>,
}

#[derive(Serialize)]
struct ValidateReport {
    mode: ValidationMode,
    errors: usize,
    warnings: usize,
    systems: Vec<SystemReport>,
}

impl ValidateReport {
    fn new(mode: ValidationMode, results: Vec<(String, Vec<ValidationIssue>)>) -> Self {
        let systems: Vec<SystemReport> = results
            .into_iter()
            .map(|(system, issues)| {
                let (errors, warnings) = tally(&issues);
                SystemReport {
                    system,
                    errors,
                    warnings,
                    issues,
                }
            })
            .collect();
        Self {
            mode,
            errors: systems.iter().map(|s| s.errors).sum(),
            warnings: systems.iter().map(|s| s.warnings).sum(),
            systems,
        }
    }
}

/// Validate one or all systems. Fails if any error-severity issue is found.
#[instrument(name = "cmd_validate", skip_all, fields(all = args.all, strict = args.strict))]
pub fn cmd_validate(args: ValidateArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let mode = if args.strict {
        ValidationMode::Strict
    } else {
        config.validation
    };
    debug!(mode = %mode, "executing validate command");

    let library = open_library(config, mode)?;
    let results = if args.all {
        library.validate_all()
    } else {
        let system = args.system.as_deref().unwrap_or(&config.system);
        let store = library
            .load(system)
            .with_context(|| format!("failed to load names system {system}"))?;
        vec![(system.to_string(), store.validate(mode))]
    };
    let report = ValidateReport::new(mode, results);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for system in &report.systems {
            if system.issues.is_empty() {
                println!("{} {}", "PASS:".green(), system.system);
                continue;
            }
            let status = if system.errors > 0 {
                "FAIL:".red().to_string()
            } else {
                "WARN:".yellow().to_string()
            };
            println!(
                "{status} {} ({} errors, {} warnings)",
                system.system, system.errors, system.warnings
            );
            for issue in &system.issues {
                let severity = match issue.severity {
                    Severity::Error => "error".red().to_string(),
                    Severity::Warning => "warning".yellow().to_string(),
                };
                println!("  {severity}: {}: {}", issue.subject.cyan(), issue.message);
            }
        }
    }

    if report.errors > 0 {
        bail!(
            "validation found {} error(s) in {} mode",
            report.errors,
            report.mode
        );
    }
    Ok(())
}
