//! Build helpers for the bible-names workspace.
//!
//! Run with `cargo run -p xtask -- <task>`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace maintenance tasks")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate shell completion scripts
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out_dir: PathBuf,

        /// Only this shell (defaults to all supported shells)
        #[arg(long, value_enum)]
        shell: Option<Shell>,
    },
    /// Generate the man page
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out_dir: PathBuf,
    },
}

fn completions(out_dir: &Path, shell: Option<Shell>) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let shells = shell.map_or_else(|| Shell::value_variants().to_vec(), |s| vec![s]);
    let mut cmd = bible_names::command();
    for shell in shells {
        let path = clap_complete::generate_to(shell, &mut cmd, "bible-names", out_dir)
            .with_context(|| format!("failed to write {shell} completions"))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn man(out_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join("bible-names.1");
    let mut buffer = Vec::new();
    clap_mangen::Man::new(bible_names::command())
        .render(&mut buffer)
        .context("failed to render man page")?;
    fs::write(&path, buffer).with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    match Xtask::parse().task {
        Task::Completions { out_dir, shell } => completions(&out_dir, shell),
        Task::Man { out_dir } => man(&out_dir),
    }
}
