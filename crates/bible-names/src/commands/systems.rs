//! Systems command: list available name systems.

use bible_names_core::{NameSystemLibrary, SystemSource};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

/// Arguments for the `systems` subcommand.
#[derive(Args, Debug, Default)]
pub struct SystemsArgs {
    /// Only systems for this ISO 639-3 language code (e.g. eng)
    #[arg(short, long, value_name = "CODE")]
    pub language: Option<String>,
}

#[derive(Serialize)]
struct SystemInfo {
    name: String,
    language: String,
    source: String,
}

#[derive(Serialize)]
struct SystemsReport {
    systems: Vec<SystemInfo>,
    languages: Vec<String>,
}

fn describe(library: &NameSystemLibrary, language: Option<&str>) -> SystemsReport {
    let systems = library
        .available_system_names(None)
        .into_iter()
        .filter_map(|name| {
            let lang = name.split('_').next().unwrap_or(&name).to_string();
            if language.is_some_and(|wanted| wanted != lang) {
                return None;
            }
            let source = match library.source(&name) {
                Some(SystemSource::File(path)) => path.to_string(),
                _ => "bundled".to_string(),
            };
            Some(SystemInfo {
                name,
                language: lang,
                source,
            })
        })
        .collect();
    SystemsReport {
        systems,
        languages: library.available_language_codes().into_iter().collect(),
    }
}

/// Print the available systems and where each comes from.
#[instrument(name = "cmd_systems", skip_all, fields(language = ?args.language))]
pub fn cmd_systems(
    args: SystemsArgs,
    global_json: bool,
    library: &NameSystemLibrary,
) -> anyhow::Result<()> {
    debug!("executing systems command");
    let report = describe(library, args.language.as_deref());

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.systems.is_empty() {
        println!("{}", "no matching names systems".yellow());
        return Ok(());
    }
    for system in &report.systems {
        println!(
            "{}  {}  {}",
            system.name.bold(),
            system.language.cyan(),
            system.source.dimmed()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_bundled_systems() {
        let report = describe(&NameSystemLibrary::bundled(), None);
        let names: Vec<&str> = report.systems.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"eng_traditional"));
        assert!(names.contains(&"deu_traditional"));
        assert!(report.systems.iter().all(|s| s.source == "bundled"));
        assert_eq!(report.languages, vec!["deu", "eng"]);
    }

    #[test]
    fn language_filter() {
        let report = describe(&NameSystemLibrary::bundled(), Some("deu"));
        assert_eq!(report.systems.len(), 1);
        assert_eq!(report.systems[0].language, "deu");
        assert!(describe(&NameSystemLibrary::bundled(), Some("fra")).systems.is_empty());
    }
}
