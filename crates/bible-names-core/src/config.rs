//! Layered names settings.
//!
//! Settings are merged from these layers, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the user file, `<config dir>/bible-names/config.<ext>`
//! 3. project files: `.bible-names.<ext>` and `bible-names.<ext>` in the
//!    closest directory at or above the search root that has any, without
//!    walking past a directory containing `.git`
//! 4. files passed explicitly (`--config`), in order
//! 5. `BIBLE_NAMES_SYSTEM`, `BIBLE_NAMES_SCOPE`, `BIBLE_NAMES_VALIDATION`,
//!    `BIBLE_NAMES_LOG_LEVEL` and `BIBLE_NAMES_LOG_DIR`
//!
//! `<ext>` is one of `toml`, `yaml`, `yml` or `json`.
//!
//! Scalar settings are replaced by later layers. `data_dirs` accumulate: each
//! file's entries are resolved against that file's directory and appended, so
//! a project adds name systems to the user's instead of hiding them.
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use bible_names_core::config::ConfigLoader;
//!
//! let cwd = Utf8PathBuf::try_from(std::env::current_dir().unwrap()).unwrap();
//! let (config, sources) = ConfigLoader::new().with_project_search(&cwd).load().unwrap();
//! println!("{} from {:?}", config.system, sources.primary_file());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::codes::{BookCode, BookCodeRegistry, BookScope};
use crate::error::{ConfigError, ConfigResult, NamesResult};
use crate::expander::parse_book_list;
use crate::validation::ValidationMode;

/// Name system used when none is configured.
pub const DEFAULT_SYSTEM: &str = "eng_traditional";

const APP_NAME: &str = "bible-names";
const EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];
const ENV_PREFIX: &str = "BIBLE_NAMES_";
const ENV_KEYS: [&str; 5] = ["system", "scope", "validation", "log_level", "log_dir"];

/// Merged names settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Name system used when a command doesn't name one.
    pub system: String,
    /// Publication book list as three-character codes.
    pub books: Option<Vec<String>>,
    /// Predefined publication book list, used when `books` is unset.
    pub scope: Option<BookScope>,
    /// Directories holding extra name-system files, highest precedence last.
    ///
    /// A file here replaces a bundled system of the same name.
    pub data_dirs: Vec<Utf8PathBuf>,
    /// How thoroughly name systems are checked when loaded.
    pub validation: ValidationMode,
    /// Log level for the application.
    pub log_level: LogLevel,
    /// Directory for JSONL log files.
    pub log_dir: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM.to_string(),
            books: None,
            scope: None,
            data_dirs: Vec::new(),
            validation: ValidationMode::default(),
            log_level: LogLevel::default(),
            log_dir: None,
        }
    }
}

impl Config {
    /// The configured publication book list: `books`, else `scope`.
    ///
    /// `None` means lookups match exact curated names only.
    pub fn publication_books(
        &self,
        registry: &BookCodeRegistry,
    ) -> NamesResult<Option<Vec<BookCode>>> {
        if let Some(codes) = &self.books {
            return parse_book_list(registry, codes).map(Some);
        }
        Ok(self.scope.map(|scope| scope.books(registry)))
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging.
    Debug,
    /// Standard operational information.
    #[default]
    Info,
    /// Potential problems only.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Which layer a settings file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The per-user file.
    User,
    /// Discovered at or above the working directory.
    Project,
    /// Passed with `--config`.
    Explicit,
}

impl SourceKind {
    /// Returns the kind as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Explicit => "explicit",
        }
    }
}

/// One settings file that took part in a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// The layer the file was merged in.
    pub kind: SourceKind,
    /// Where the file lives.
    pub path: Utf8PathBuf,
}

/// The settings files a load merged, lowest precedence first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Files in merge order.
    pub files: Vec<SourceFile>,
}

impl ConfigSources {
    /// The highest-precedence file that was loaded.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.files.last().map(|f| f.path.as_path())
    }
}

/// The part of a settings file that accumulates across layers.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DataDirsLayer {
    data_dirs: Vec<Utf8PathBuf>,
}

/// Builder for loading settings from every layer.
#[derive(Debug)]
pub struct ConfigLoader {
    search_root: Option<Utf8PathBuf>,
    user_config: bool,
    env: bool,
    explicit: Vec<Utf8PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader that reads the user file and the environment.
    pub fn new() -> Self {
        Self {
            search_root: None,
            user_config: true,
            env: true,
            explicit: Vec::new(),
        }
    }

    /// Look for project files at and above `path`.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Whether to read the user file.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.user_config = include;
        self
    }

    /// Whether `BIBLE_NAMES_*` variables override the files.
    pub const fn with_env(mut self, include: bool) -> Self {
        self.env = include;
        self
    }

    /// Merge an explicit file above the project files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge every layer.
    ///
    /// A missing explicit file or a value of the wrong shape is an error.
    #[tracing::instrument(skip(self), fields(search_root = ?self.search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        let mut sources = ConfigSources::default();
        if self.user_config
            && let Some(path) = user_config_file()
        {
            sources.files.push(SourceFile { kind: SourceKind::User, path });
        }
        if let Some(root) = &self.search_root {
            sources.files.extend(
                project_files(root)
                    .into_iter()
                    .map(|path| SourceFile { kind: SourceKind::Project, path }),
            );
        }
        sources.files.extend(
            self.explicit
                .into_iter()
                .map(|path| SourceFile { kind: SourceKind::Explicit, path }),
        );

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let mut data_dirs: Vec<Utf8PathBuf> = Vec::new();
        for file in &sources.files {
            let layer = file_figment(&file.path);
            let DataDirsLayer { data_dirs: dirs } = layer.extract().map_err(deserialize)?;
            let base = file.path.parent().unwrap_or(Utf8Path::new(""));
            for dir in dirs {
                let dir = if dir.is_relative() { base.join(dir) } else { dir };
                if !data_dirs.contains(&dir) {
                    data_dirs.push(dir);
                }
            }
            tracing::debug!(kind = file.kind.as_str(), path = %file.path, "merging settings file");
            figment = figment.merge(layer);
        }
        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).only(&ENV_KEYS));
        }

        let mut config: Config = figment.extract().map_err(deserialize)?;
        config.data_dirs = data_dirs;
        tracing::info!(
            system = %config.system,
            books = config.books.as_ref().map(Vec::len),
            scope = config.scope.map(|s| s.as_str()),
            validation = config.validation.as_str(),
            data_dirs = config.data_dirs.len(),
            files = sources.files.len(),
            "settings loaded"
        );
        Ok((config, sources))
    }
}

fn deserialize(e: figment::Error) -> ConfigError {
    ConfigError::Deserialize(Box::new(e))
}

/// A figment over one file, with the format picked from the extension.
pub(crate) fn file_figment(path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => Figment::from(Yaml::file_exact(path.as_str())),
        Some("json") => Figment::from(Json::file_exact(path.as_str())),
        _ => Figment::from(Toml::file_exact(path.as_str())),
    }
}

/// Project files of the closest directory that has any, dotfiles first.
fn project_files(root: &Utf8Path) -> Vec<Utf8PathBuf> {
    let stems = [format!(".{APP_NAME}"), APP_NAME.to_string()];
    for dir in root.ancestors() {
        let found: Vec<Utf8PathBuf> = stems
            .iter()
            .flat_map(|stem| EXTENSIONS.iter().map(move |ext| dir.join(format!("{stem}.{ext}"))))
            .filter(|path| path.is_file())
            .collect();
        if !found.is_empty() {
            return found;
        }
        if dir.join(".git").exists() {
            break;
        }
    }
    Vec::new()
}

fn user_config_file() -> Option<Utf8PathBuf> {
    let dir = user_config_dir()?;
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// The user config directory, e.g. `~/.config/bible-names/` on Linux.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.config_dir().to_path_buf()).ok()
}

/// The user data directory.
///
/// Name-system files placed in `<data dir>/names/` are picked up by the CLI.
pub fn user_data_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.data_dir().to_path_buf()).ok()
}

/// The machine-local data directory, used as the default log directory.
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.data_local_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap()
    }

    fn isolated() -> ConfigLoader {
        ConfigLoader::new().with_user_config(false).with_env(false)
    }

    #[test]
    fn defaults_match_curated_names_only() {
        let (config, sources) = isolated().load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.system, "eng_traditional");
        assert_eq!(config.validation, ValidationMode::Lenient);
        assert!(sources.files.is_empty());
        assert!(
            config
                .publication_books(BookCodeRegistry::standard())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn explicit_file_overrides_project_system_and_books() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        fs::write(
            root.join(".bible-names.toml"),
            "system = \"eng_traditional\"\nbooks = [\"GEN\", \"EXO\"]\n",
        )
        .unwrap();
        let explicit = root.join("override.yaml");
        fs::write(&explicit, "system: deu_traditional\nbooks: [MAT]\n").unwrap();

        let (config, sources) = isolated()
            .with_project_search(&root)
            .with_file(&explicit)
            .load()
            .unwrap();
        assert_eq!(config.system, "deu_traditional");
        assert_eq!(config.books, Some(vec!["MAT".to_string()]));
        assert_eq!(sources.primary_file(), Some(explicit.as_path()));
        let kinds: Vec<SourceKind> = sources.files.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, [SourceKind::Project, SourceKind::Explicit]);
    }

    #[test]
    fn data_dirs_accumulate_relative_to_each_file() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        let nested = root.join("publication");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.join("bible-names.toml"), "data_dirs = [\"names\"]\n").unwrap();
        let explicit = nested.join("extra.toml");
        fs::write(
            &explicit,
            "data_dirs = [\"local-names\", \"/srv/names\"]\n",
        )
        .unwrap();

        let (config, _) = isolated()
            .with_project_search(&root)
            .with_file(&explicit)
            .load()
            .unwrap();
        assert_eq!(
            config.data_dirs,
            vec![
                root.join("names"),
                nested.join("local-names"),
                Utf8PathBuf::from("/srv/names"),
            ]
        );
    }

    #[test]
    fn the_same_data_dir_is_listed_once() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        fs::write(root.join(".bible-names.toml"), "data_dirs = [\"names\"]\n").unwrap();
        fs::write(root.join(".bible-names.json"), r#"{"data_dirs": ["names"]}"#).unwrap();

        let (config, sources) = isolated().with_project_search(&root).load().unwrap();
        assert_eq!(sources.files.len(), 2);
        assert_eq!(config.data_dirs, vec![root.join("names")]);
    }

    #[test]
    fn books_take_precedence_over_scope() {
        let registry = BookCodeRegistry::standard();
        let mut config = Config {
            scope: Some(BookScope::Nt),
            ..Config::default()
        };
        let books = config.publication_books(registry).unwrap().unwrap();
        assert_eq!(books.len(), 27);

        config.books = Some(vec!["GEN".into(), "EXO".into()]);
        let books = config.publication_books(registry).unwrap().unwrap();
        assert_eq!(books.len(), 2);

        config.books = Some(vec!["GEN".into(), "NOPE".into()]);
        let err = config.publication_books(registry).unwrap_err();
        assert!(err.to_string().contains("NOPE"));
    }

    #[test]
    fn scope_and_strict_validation_load_from_a_project_file() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        fs::write(root.join(".bible-names.yaml"), "scope: dc\nvalidation: strict\n").unwrap();

        let (config, _) = isolated().with_project_search(&root).load().unwrap();
        assert_eq!(config.scope, Some(BookScope::Dc));
        assert_eq!(config.validation, ValidationMode::Strict);
    }

    #[test]
    fn unknown_scope_is_a_deserialize_error() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        fs::write(root.join(".bible-names.toml"), "scope = \"apocrypha\"\n").unwrap();

        let err = isolated().with_project_search(&root).load().unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = utf8(&tmp).join("absent.toml");
        assert!(isolated().with_file(&missing).load().is_err());
    }

    #[test]
    fn closest_settings_directory_wins_within_the_repository() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        let repo = root.join("repo");
        let book = repo.join("books").join("genesis");
        fs::create_dir_all(&book).unwrap();
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::write(root.join(".bible-names.toml"), "system = \"deu_traditional\"\n").unwrap();
        fs::write(repo.join("books").join("bible-names.toml"), "scope = \"ot\"\n").unwrap();

        let (config, sources) = isolated().with_project_search(&book).load().unwrap();
        assert_eq!(config.scope, Some(BookScope::Ot));
        assert_eq!(config.system, DEFAULT_SYSTEM);
        assert_eq!(sources.files.len(), 1);

        fs::remove_file(repo.join("books").join("bible-names.toml")).unwrap();
        let (config, sources) = isolated().with_project_search(&book).load().unwrap();
        assert_eq!(config.system, DEFAULT_SYSTEM);
        assert!(sources.files.is_empty());
    }
}
