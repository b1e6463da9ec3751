//! Expand command: dump the lookup tables for a system and book list.

use std::fmt::Display;

use bible_names_core::{Config, EntryOrigin, LookupEntry, LookupStats, LookupTable, NameSystemLibrary};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use super::ScopeArgs;

/// Arguments for the `expand` subcommand.
#[derive(Args, Debug)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Show the division table instead of the book table
    #[arg(long)]
    pub divisions: bool,

    /// Only show generated entries (hide curated inputs)
    #[arg(long)]
    pub generated: bool,

    /// Show at most N entries
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct ExpandReport<'a, V: Serialize> {
    system: &'a str,
    table: &'static str,
    stats: LookupStats,
    entries: Vec<&'a LookupEntry<V>>,
}

fn select<'a, V>(table: &'a LookupTable<V>, generated: bool, limit: Option<usize>) -> Vec<&'a LookupEntry<V>> {
    table
        .iter()
        .filter(|e| !generated || e.origin == EntryOrigin::Generated)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

fn print_entries<V: Display>(entries: &[&LookupEntry<V>]) {
    let width = entries.iter().map(|e| e.key.chars().count()).max().unwrap_or(0);
    for e in entries {
        let origin = match e.origin {
            EntryOrigin::Seed => "seed",
            EntryOrigin::Generated => "generated",
        };
        println!(
            "{:<width$}  {}  {}",
            e.key,
            e.value.to_string().green(),
            origin.dimmed()
        );
    }
}

/// Build the tables and print them, longest key first.
#[instrument(name = "cmd_expand", skip_all, fields(divisions = args.divisions))]
pub fn cmd_expand(
    args: ExpandArgs,
    global_json: bool,
    config: &Config,
    library: &NameSystemLibrary,
) -> anyhow::Result<()> {
    debug!(generated = args.generated, limit = ?args.limit, "executing expand command");

    let names = args.scope.open(config, library)?;
    let stats = names.lookup_stats();

    if args.divisions {
        let entries = select(names.division_lookup(), args.generated, args.limit);
        if global_json {
            let report = ExpandReport {
                system: names.system_name(),
                table: "divisions",
                stats,
                entries,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        print_entries(&entries);
    } else {
        let entries = select(names.book_lookup(), args.generated, args.limit);
        if global_json {
            let report = ExpandReport {
                system: names.system_name(),
                table: "books",
                stats,
                entries,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        print_entries(&entries);
    }

    println!();
    println!("{}", names.to_string().dimmed());
    if let Some(expansion) = stats.expansion {
        println!("{}", expansion.to_string().dimmed());
    }
    Ok(())
}
