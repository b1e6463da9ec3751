//! Info command implementation

use bible_names_core::config::{Config, ConfigSources, SourceFile};
use bible_names_core::{BookCodeRegistry, BookScope};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {}

/// Where the default publication book list comes from.
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "from")]
enum Publication {
    /// `books` in a settings file.
    Books { codes: Vec<String>, count: Option<usize> },
    /// `scope` in a settings file or the environment.
    Scope { scope: BookScope, count: usize },
    /// Neither is set, so only curated names match.
    None,
}

impl Publication {
    fn from_config(config: &Config, registry: &BookCodeRegistry) -> Self {
        match (&config.books, config.scope) {
            (Some(codes), _) => Self::Books {
                codes: codes.clone(),
                count: config.publication_books(registry).ok().flatten().map(|b| b.len()),
            },
            (None, Some(scope)) => Self::Scope {
                scope,
                count: scope.books(registry).len(),
            },
            (None, None) => Self::None,
        }
    }
}

#[derive(Serialize, Debug)]
struct DataDir {
    path: String,
    exists: bool,
}

#[derive(Serialize, Debug)]
struct SettingsReport<'a> {
    name: &'static str,
    version: &'static str,
    sources: &'a [SourceFile],
    system: &'a str,
    publication: Publication,
    validation: &'static str,
    data_dirs: Vec<DataDir>,
    log_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<&'a str>,
}

impl<'a> SettingsReport<'a> {
    fn new(config: &'a Config, sources: &'a ConfigSources) -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            sources: &sources.files,
            system: &config.system,
            publication: Publication::from_config(config, BookCodeRegistry::standard()),
            validation: config.validation.as_str(),
            data_dirs: config
                .data_dirs
                .iter()
                .map(|dir| DataDir {
                    path: dir.to_string(),
                    exists: dir.is_dir(),
                })
                .collect(),
            log_level: config.log_level.as_str(),
            log_dir: config.log_dir.as_ref().map(|d| d.as_str()),
        }
    }

    fn print_text(&self) {
        println!("{} {}", self.name.bold(), self.version.green());

        println!();
        println!("{}", "Settings files".bold().underline());
        if self.sources.is_empty() {
            println!("  {}", "none loaded".yellow());
        }
        for file in self.sources {
            println!("  {:<9} {}", file.kind.as_str().dimmed(), file.path.cyan());
        }

        println!();
        println!("{}", "Names".bold().underline());
        println!("{}: {}", "System".dimmed(), self.system.cyan());
        let publication = match &self.publication {
            Publication::Books { codes, count: Some(count) } => {
                format!("{} ({count} books)", codes.join(","))
            }
            Publication::Books { codes, count: None } => {
                format!("{} {}", codes.join(","), "(invalid)".red())
            }
            Publication::Scope { scope, count } => format!("scope {scope} ({count} books)"),
            Publication::None => "exact names only".dimmed().to_string(),
        };
        println!("{}: {publication}", "Publication".dimmed());
        println!("{}: {}", "Validation".dimmed(), self.validation);
        if self.data_dirs.is_empty() {
            println!("{}: {}", "Data directories".dimmed(), "(bundled only)".dimmed());
        }
        for dir in &self.data_dirs {
            let marker = if dir.exists { "" } else { " (missing)" };
            println!("{}: {}{}", "Data directory".dimmed(), dir.path, marker.yellow());
        }

        println!();
        println!("{}: {}", "Log level".dimmed(), self.log_level);
        if let Some(dir) = self.log_dir {
            println!("{}: {dir}", "Log directory".dimmed());
        }
    }
}

/// Report the merged names settings and the files they came from.
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, files = sources.files.len(), "executing info command");
    let report = SettingsReport::new(config, sources);
    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_text();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bible_names_core::config::SourceKind;

    fn registry() -> &'static BookCodeRegistry {
        BookCodeRegistry::standard()
    }

    #[test]
    fn test_cmd_info_text_and_json_succeed() {
        let config = Config::default();
        let sources = ConfigSources::default();
        assert!(cmd_info(InfoArgs::default(), false, &config, &sources).is_ok());
        assert!(cmd_info(InfoArgs::default(), true, &config, &sources).is_ok());
    }

    #[test]
    fn publication_reports_books_before_scope() {
        assert_eq!(Publication::from_config(&Config::default(), registry()), Publication::None);

        let mut config = Config {
            scope: Some(BookScope::Nt),
            ..Config::default()
        };
        assert_eq!(
            Publication::from_config(&config, registry()),
            Publication::Scope { scope: BookScope::Nt, count: 27 }
        );

        config.books = Some(vec!["GEN".into(), "EXO".into()]);
        assert_eq!(
            Publication::from_config(&config, registry()),
            Publication::Books {
                codes: vec!["GEN".into(), "EXO".into()],
                count: Some(2)
            }
        );

        config.books = Some(vec!["NOPE".into()]);
        assert!(matches!(
            Publication::from_config(&config, registry()),
            Publication::Books { count: None, .. }
        ));
    }

    #[test]
    fn report_json_lists_sources_and_data_dirs() {
        let config = Config {
            data_dirs: vec!["/nonexistent/names".into()],
            ..Config::default()
        };
        let sources = ConfigSources {
            files: vec![SourceFile {
                kind: SourceKind::Project,
                path: "/work/.bible-names.toml".into(),
            }],
        };
        let json = serde_json::to_value(SettingsReport::new(&config, &sources)).unwrap();
        assert_eq!(json["system"], "eng_traditional");
        assert_eq!(json["publication"]["from"], "none");
        assert_eq!(json["sources"][0]["kind"], "project");
        assert_eq!(json["data_dirs"][0]["exists"], false);
        assert!(json.get("log_dir").is_none());
    }
}
