//! Resolve command: typed names to book codes or division keys.

use anyhow::bail;
use bible_names_core::{Config, NameSystemLibrary, NamesSystem};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use super::ScopeArgs;

/// Arguments for the `resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Names or abbreviations to resolve (e.g. "Gen", "1 Cor", "St John")
    #[arg(required = true, value_name = "TEXT")]
    pub texts: Vec<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Resolve division names instead of book names
    #[arg(short, long)]
    pub division: bool,

    /// Match the longest book name at the start of each input (e.g. "1 Kings 3:5")
    #[arg(long, conflicts_with = "division")]
    pub prefix: bool,
}

#[derive(Debug, Serialize)]
struct Resolution {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rest: Option<String>,
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    system: &'a str,
    expanded: bool,
    results: Vec<Resolution>,
}

fn resolve_one(names: &NamesSystem, input: &str, division: bool, prefix: bool) -> Resolution {
    let mut resolution = Resolution {
        input: input.to_string(),
        code: None,
        name: None,
        rest: None,
    };
    if division {
        if let Some(key) = names.resolve_division(input) {
            resolution.name = names.store().division(key).map(|d| d.default_name.clone());
            resolution.code = Some(key.to_string());
        }
    } else if prefix {
        if let Some((code, consumed)) = names.resolve_book_code_prefix(input) {
            resolution.code = Some(code.to_string());
            resolution.name = names.book_name(code).ok().map(str::to_string);
            resolution.rest = Some(input[consumed..].trim().to_string());
        }
    } else if let Some(code) = names.resolve_book_code(input) {
        resolution.code = Some(code.to_string());
        resolution.name = names.book_name(code).ok().map(str::to_string);
    }
    resolution
}

/// Resolve each input and print the result.
///
/// Text output fails if any input did not resolve; JSON output always
/// succeeds and leaves `code` out for misses.
#[instrument(name = "cmd_resolve", skip_all, fields(inputs = args.texts.len()))]
pub fn cmd_resolve(
    args: ResolveArgs,
    global_json: bool,
    config: &Config,
    library: &NameSystemLibrary,
) -> anyhow::Result<()> {
    debug!(division = args.division, prefix = args.prefix, "executing resolve command");

    let names = args.scope.open(config, library)?;
    let results: Vec<Resolution> = args
        .texts
        .iter()
        .map(|text| resolve_one(&names, text, args.division, args.prefix))
        .collect();

    if global_json {
        let report = ResolveReport {
            system: names.system_name(),
            expanded: names.is_expanded(),
            results,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut missing = 0usize;
    for r in &results {
        match r.code {
            Some(ref code) => {
                let mut line = format!("{} {} {}", r.input, "→".dimmed(), code.green().bold());
                if let Some(ref name) = r.name {
                    line.push_str(&format!(" ({name})"));
                }
                if let Some(ref rest) = r.rest
                    && !rest.is_empty()
                {
                    line.push_str(&format!(" {} {rest:?}", "+".dimmed()));
                }
                println!("{line}");
            }
            None => {
                missing += 1;
                println!("{} {} {}", r.input, "→".dimmed(), "not found".red());
            }
        }
    }

    if missing > 0 {
        bail!(
            "{missing} of {} input(s) did not resolve in {}",
            results.len(),
            names.system_name()
        );
    }
    Ok(())
}
