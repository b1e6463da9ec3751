//! bible-names CLI
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use bible_names::{Cli, Commands, commands};
use bible_names_core::config::{Config, ConfigLoader, ConfigSources};
use camino::Utf8PathBuf;
use clap::Parser;

mod observability;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    if cli.version_only {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    // arg_required_else_help guarantees a subcommand otherwise
    let Some(command) = cli.command else {
        return Ok(());
    };

    if let Some(dir) = &cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }
    let (config, sources) = load_settings(cli.config.as_ref())?;

    let log_location = observability::ObservabilityConfig::from_env_with_overrides(
        config.log_dir.as_ref().map(|dir| dir.as_std_path().to_path_buf()),
    );
    let filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let _guard = observability::init_observability(&log_location, filter)
        .context("failed to initialize logging/tracing")?;
    tracing::debug!(
        system = %config.system,
        validation = config.validation.as_str(),
        settings_files = sources.files.len(),
        json = cli.json,
        "CLI initialized"
    );

    let result = run(command, cli.json, &config, &sources);
    if let Err(err) = &result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}

/// Merge settings for the working directory plus an optional `--config` file.
fn load_settings(explicit: Option<&PathBuf>) -> anyhow::Result<(Config, ConfigSources)> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let mut loader = ConfigLoader::new().with_project_search(utf8(cwd, "current directory")?);
    if let Some(path) = explicit {
        loader = loader.with_file(utf8(path.clone(), "config path")?);
    }
    loader.load().context("failed to load configuration")
}

fn utf8(path: PathBuf, what: &str) -> anyhow::Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path)
        .map_err(|e| anyhow!("{what} is not valid UTF-8: {}", e.into_path_buf().display()))
}

fn run(
    command: Commands,
    json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    let library = || commands::open_library(config, config.validation);
    match command {
        Commands::Resolve(args) => commands::resolve::cmd_resolve(args, json, config, &library()?),
        Commands::Expand(args) => commands::expand::cmd_expand(args, json, config, &library()?),
        Commands::Divisions(args) => {
            commands::divisions::cmd_divisions(args, json, config, &library()?)
        }
        Commands::Systems(args) => commands::systems::cmd_systems(args, json, &library()?),
        Commands::Validate(args) => commands::validate::cmd_validate(args, json, config),
        Commands::Info(args) => commands::info::cmd_info(args, json, config, sources),
    }
}
