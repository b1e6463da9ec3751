//! Settings integration tests.
//!
//! Each test builds a user home, a project directory and optional
//! `--config` files, then checks through the compiled binary which system,
//! book list, data directories and validation mode actually take effect.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch user home plus a project directory inside it.
struct Workspace {
    _tmp: TempDir,
    home: PathBuf,
    project: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("home");
        let project = tmp.path().join("project");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&project).unwrap();
        Self {
            _tmp: tmp,
            home,
            project,
        }
    }

    /// The user config directory as `directories` resolves it on Linux.
    fn user_config_dir(&self) -> PathBuf {
        self.home.join("config").join("bible-names")
    }

    /// Runs the binary from the project directory with an isolated home.
    fn cmd(&self) -> Command {
        self.cmd_in(&self.project)
    }

    /// Runs the binary from `dir` with an isolated home.
    #[allow(deprecated)]
    fn cmd_in(&self, dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
        cmd.env_remove("RUST_LOG")
            .env_remove("BIBLE_NAMES_LOG_PATH")
            .env_remove("BIBLE_NAMES_SYSTEM")
            .env_remove("BIBLE_NAMES_SCOPE")
            .env_remove("BIBLE_NAMES_VALIDATION")
            .env_remove("BIBLE_NAMES_LOG_LEVEL")
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.home.join("config"))
            .env("XDG_DATA_HOME", self.home.join("data"))
            .env("BIBLE_NAMES_LOG_DIR", self.home.join("logs"))
            .arg("-C")
            .arg(dir);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("failed to run command");
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("invalid JSON output")
    }
}

/// Writes a two-book name system called `name` into `dir`.
fn write_system(dir: &Path, name: &str, language: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join(format!("{name}.toml")),
        format!(
            r#"
[header]
title = "{name} sample"
language = "{language}"

[[divisions]]
standard_abbreviation = "OT"
default_name = "Old Testament"
default_abbreviation = "OT"
included_books = ["GEN", "EXO"]

[[books]]
code = "GEN"
default_name = "Genesis"
default_abbreviation = "Gen"

[[books]]
code = "EXO"
default_name = "Exodus"
default_abbreviation = "Exod"
"#
        ),
    )
    .unwrap();
}

fn system_names(json: &Value) -> Vec<String> {
    json["systems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn no_settings_files_means_exact_names_only() {
    let ws = Workspace::new();
    let info = ws.json(&["info"]);
    assert_eq!(info["system"], "eng_traditional");
    assert_eq!(info["publication"]["from"], "none");
    assert!(info["sources"].as_array().unwrap().is_empty());

    let resolved = ws.json(&["resolve", "Gene"]);
    assert_eq!(resolved["expanded"], false);
    assert!(resolved["results"][0]["code"].is_null());
}

// =============================================================================
// Book list precedence
// =============================================================================

#[test]
fn configured_books_drive_expansion() {
    let ws = Workspace::new();
    fs::write(ws.project.join(".bible-names.toml"), "books = [\"GEN\", \"EXO\"]\n").unwrap();

    let info = ws.json(&["info"]);
    assert_eq!(info["publication"]["from"], "books");
    assert_eq!(info["publication"]["count"], 2);

    let json = ws.json(&["resolve", "G", "Ex"]);
    assert_eq!(json["expanded"], true);
    assert_eq!(json["results"][0]["code"], "GEN");
    assert_eq!(json["results"][1]["code"], "EXO");
}

#[test]
fn books_flag_overrides_configured_books() {
    let ws = Workspace::new();
    fs::write(ws.project.join(".bible-names.toml"), "books = [\"GEN\", \"EXO\"]\n").unwrap();

    let json = ws.json(&["resolve", "--books", "MAT,MRK", "G", "Ma"]);
    assert!(json["results"][0]["code"].is_null());
    assert!(json["results"][1]["code"].is_null());

    let json = ws.json(&["resolve", "--books", "MAT,MRK", "Mat", "Mar"]);
    assert_eq!(json["results"][0]["code"], "MAT");
    assert_eq!(json["results"][1]["code"], "MRK");

    let json = ws.json(&["resolve", "--exact", "G"]);
    assert_eq!(json["expanded"], false);
    assert!(json["results"][0]["code"].is_null());
}

#[test]
fn configured_scope_applies_when_books_are_unset() {
    let ws = Workspace::new();
    fs::write(ws.project.join("bible-names.yaml"), "scope: nt\n").unwrap();

    let info = ws.json(&["info"]);
    assert_eq!(info["publication"]["from"], "scope");
    assert_eq!(info["publication"]["count"], 27);

    let json = ws.json(&["resolve", "Matt", "Gen"]);
    assert_eq!(json["results"][0]["code"], "MAT");
    assert!(json["results"][1]["code"].is_null());
}

#[test]
fn configured_books_beat_configured_scope() {
    let ws = Workspace::new();
    fs::write(
        ws.project.join(".bible-names.toml"),
        "scope = \"nt\"\nbooks = [\"GEN\"]\n",
    )
    .unwrap();

    let json = ws.json(&["resolve", "G", "Matt"]);
    assert_eq!(json["results"][0]["code"], "GEN");
    assert!(json["results"][1]["code"].is_null());
}

#[test]
fn invalid_configured_books_fail_lookups() {
    let ws = Workspace::new();
    fs::write(ws.project.join(".bible-names.toml"), "books = [\"NOPE\"]\n").unwrap();

    ws.cmd()
        .args(["resolve", "Gen"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid books in configuration"))
        .stderr(predicate::str::contains("NOPE"));
}

// =============================================================================
// System selection
// =============================================================================

#[test]
fn explicit_file_and_environment_pick_the_system() {
    let ws = Workspace::new();
    fs::write(
        ws.project.join(".bible-names.toml"),
        "system = \"eng_traditional\"\nscope = \"bible\"\n",
    )
    .unwrap();
    let explicit = ws.project.join("german.toml");
    fs::write(&explicit, "system = \"deu_traditional\"\n").unwrap();

    let json = ws.json(&["--config", explicit.to_str().unwrap(), "resolve", "1. Mose"]);
    assert_eq!(json["system"], "deu_traditional");
    assert_eq!(json["results"][0]["code"], "GEN");

    let output = ws
        .cmd()
        .env("BIBLE_NAMES_SYSTEM", "deu_traditional")
        .env("BIBLE_NAMES_SCOPE", "nt")
        .args(["--json", "resolve", "Offb", "1. Mose"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["system"], "deu_traditional");
    assert_eq!(json["results"][0]["code"], "REV");
    assert!(json["results"][1]["code"].is_null());
}

#[test]
fn system_flag_beats_configured_system() {
    let ws = Workspace::new();
    fs::write(ws.project.join(".bible-names.toml"), "system = \"deu_traditional\"\n").unwrap();

    let json = ws.json(&["resolve", "-s", "eng_traditional", "--exact", "Genesis"]);
    assert_eq!(json["system"], "eng_traditional");
    assert_eq!(json["results"][0]["code"], "GEN");
}

// =============================================================================
// Data directories
// =============================================================================

#[test]
fn data_dirs_merge_across_user_project_and_explicit_files() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.user_config_dir()).unwrap();
    fs::write(ws.user_config_dir().join("config.toml"), "data_dirs = [\"user-names\"]\n").unwrap();
    write_system(&ws.user_config_dir().join("user-names"), "eng_user", "eng");

    fs::write(ws.project.join(".bible-names.toml"), "data_dirs = [\"names\"]\n").unwrap();
    write_system(&ws.project.join("names"), "eng_project", "eng");

    let extra = ws.project.join("extra");
    fs::create_dir_all(&extra).unwrap();
    fs::write(extra.join("settings.json"), r#"{"data_dirs": ["more-names"]}"#).unwrap();
    write_system(&extra.join("more-names"), "fra_extra", "fra");
    let explicit = extra.join("settings.json");

    let info = ws.json(&["--config", explicit.to_str().unwrap(), "info"]);
    let kinds: Vec<&str> = info["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["user", "project", "explicit"]);
    let dirs = info["data_dirs"].as_array().unwrap();
    assert_eq!(dirs.len(), 3);
    assert!(dirs.iter().all(|d| d["exists"] == true));

    let systems = system_names(&ws.json(&["--config", explicit.to_str().unwrap(), "systems"]));
    for name in ["eng_user", "eng_project", "fra_extra", "eng_traditional"] {
        assert!(systems.iter().any(|s| s == name), "{name} missing from {systems:?}");
    }

    let systems = system_names(&ws.json(&["systems"]));
    assert!(systems.iter().any(|s| s == "eng_project"));
    assert!(!systems.iter().any(|s| s == "fra_extra"));
}

#[test]
fn relative_data_dirs_resolve_against_the_settings_file() {
    let ws = Workspace::new();
    fs::write(ws.project.join("bible-names.toml"), "data_dirs = [\"names\"]\n").unwrap();
    write_system(&ws.project.join("names"), "eng_sample", "eng");
    let nested = ws.project.join("chapter").join("one");
    fs::create_dir_all(&nested).unwrap();

    let output = ws
        .cmd_in(&nested)
        .args(["--json", "resolve", "-s", "eng_sample", "--exact", "Exodus"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["system"], "eng_sample");
    assert_eq!(json["results"][0]["code"], "EXO");
}

// =============================================================================
// Validation mode
// =============================================================================

#[test]
fn strict_validation_setting_takes_effect() {
    let ws = Workspace::new();
    fs::write(ws.project.join(".bible-names.toml"), "data_dirs = [\"names\"]\n").unwrap();
    write_system(&ws.project.join("names"), "eng_sample", "eng");

    let lenient = ws.json(&["validate", "-s", "eng_sample"]);
    assert_eq!(lenient["mode"], "lenient");
    assert_eq!(lenient["warnings"], 0);

    fs::write(
        ws.project.join(".bible-names.toml"),
        "data_dirs = [\"names\"]\nvalidation = \"strict\"\n",
    )
    .unwrap();
    assert_eq!(ws.json(&["info"])["validation"], "strict");
    let strict = ws.json(&["validate", "-s", "eng_sample"]);
    assert_eq!(strict["mode"], "strict");
    assert_eq!(strict["errors"], 0);
    assert!(strict["warnings"].as_u64().unwrap() > 0);
}

#[test]
fn environment_validation_overrides_files() {
    let ws = Workspace::new();
    fs::write(ws.project.join(".bible-names.toml"), "validation = \"strict\"\n").unwrap();

    let output = ws
        .cmd()
        .env("BIBLE_NAMES_VALIDATION", "lenient")
        .args(["--json", "info"])
        .output()
        .unwrap();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["validation"], "lenient");
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn invalid_setting_value_fails_with_context() {
    let ws = Workspace::new();
    fs::write(ws.project.join(".bible-names.toml"), "validation = \"paranoid\"\n").unwrap();

    ws.cmd()
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn missing_explicit_file_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["--config", "does-not-exist.toml", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}
