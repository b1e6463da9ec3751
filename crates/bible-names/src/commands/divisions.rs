//! Divisions command: list divisions or the books of one.

use anyhow::bail;
use bible_names_core::{Config, NameSystemLibrary, NamesSystem};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use super::ScopeArgs;

/// Arguments for the `divisions` subcommand.
#[derive(Args, Debug)]
pub struct DivisionsArgs {
    /// Division key or name (e.g. NT, "Pauline"); lists all divisions if omitted
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Serialize)]
struct DivisionSummary {
    key: String,
    name: String,
    abbreviation: String,
    books: usize,
}

#[derive(Serialize)]
struct BookLine {
    code: String,
    name: String,
}

#[derive(Serialize)]
struct DivisionBooks {
    key: String,
    name: String,
    books: Vec<BookLine>,
}

fn summaries(names: &NamesSystem) -> Vec<DivisionSummary> {
    names
        .store()
        .division_records()
        .iter()
        .map(|d| DivisionSummary {
            key: d.key.clone(),
            name: d.default_name.clone(),
            abbreviation: d.default_abbreviation.clone(),
            books: d.included_books.len(),
        })
        .collect()
}

fn division_books(names: &NamesSystem, text: &str) -> Option<DivisionBooks> {
    let store = names.store();
    let record = store
        .division(text)
        .or_else(|| names.resolve_division(text).and_then(|key| store.division(key)))?;
    let books = record
        .included_books
        .iter()
        .map(|&code| BookLine {
            code: code.to_string(),
            // Books outside the scope fall back to the registry's English name.
            name: names.book_name(code).map_or_else(
                |_| {
                    store
                        .registry()
                        .entry(code)
                        .map(|e| e.english_name.clone())
                        .unwrap_or_default()
                },
                str::to_string,
            ),
        })
        .collect();
    Some(DivisionBooks {
        key: record.key.clone(),
        name: record.default_name.clone(),
        books,
    })
}

/// List the divisions in scope, or the books of the named one.
#[instrument(name = "cmd_divisions", skip_all, fields(name = ?args.name))]
pub fn cmd_divisions(
    args: DivisionsArgs,
    global_json: bool,
    config: &Config,
    library: &NameSystemLibrary,
) -> anyhow::Result<()> {
    debug!("executing divisions command");
    let names = args.scope.open(config, library)?;

    let Some(ref text) = args.name else {
        let list = summaries(&names);
        if global_json {
            println!("{}", serde_json::to_string_pretty(&list)?);
        } else {
            for d in &list {
                println!(
                    "{}  {} ({})  {}",
                    d.key.green().bold(),
                    d.name,
                    d.abbreviation,
                    format!("{} books", d.books).dimmed()
                );
            }
        }
        return Ok(());
    };

    let Some(division) = division_books(&names, text) else {
        bail!("no division matches {text:?} in {}", names.system_name());
    };
    if global_json {
        println!("{}", serde_json::to_string_pretty(&division)?);
    } else {
        println!("{} {}", division.key.green().bold(), division.name.bold());
        for book in &division.books {
            println!("  {}  {}", book.code.cyan(), book.name);
        }
    }
    Ok(())
}
