//! Command implementations.

use anyhow::Context;
use bible_names_core::config::user_data_dir;
use bible_names_core::{
    BookCode, BookCodeRegistry, BookScope, Config, NameSystemLibrary, NamesSystem,
    ValidationMode, parse_book_list,
};
use clap::Args;

pub mod divisions;
pub mod expand;
pub mod info;
pub mod resolve;
pub mod systems;
pub mod validate;

/// Which name system and which books a command works with.
#[derive(Args, Debug, Default, Clone)]
pub struct ScopeArgs {
    /// Name system to use (defaults to the configured system)
    #[arg(short, long, value_name = "NAME")]
    pub system: Option<String>,

    /// Books in the publication, as comma-separated codes (e.g. GEN,EXO,MAT)
    #[arg(long, value_delimiter = ',', value_name = "CODES")]
    pub books: Vec<String>,

    /// Use a predefined book list instead of --books
    #[arg(long, value_enum, conflicts_with = "books")]
    pub scope: Option<BookScope>,

    /// Ignore any configured book list and match curated names only
    #[arg(long, conflicts_with_all = ["books", "scope"])]
    pub exact: bool,
}

impl ScopeArgs {
    /// The system to load: `--system`, else the configured default.
    pub fn system_name<'a>(&'a self, config: &'a Config) -> &'a str {
        self.system.as_deref().unwrap_or(&config.system)
    }

    /// The publication book list: `--books`, `--scope`, then the configured
    /// `books` or `scope`.
    ///
    /// `None` means no expansion (exact names only).
    pub fn book_list(
        &self,
        config: &Config,
        registry: &BookCodeRegistry,
    ) -> anyhow::Result<Option<Vec<BookCode>>> {
        if self.exact {
            return Ok(None);
        }
        if !self.books.is_empty() {
            return parse_book_list(registry, &self.books)
                .map(Some)
                .context("invalid --books");
        }
        if let Some(scope) = self.scope {
            return Ok(Some(scope.books(registry)));
        }
        config
            .publication_books(registry)
            .context("invalid books in configuration")
    }

    /// Load the names system these arguments describe.
    pub fn open(&self, config: &Config, library: &NameSystemLibrary) -> anyhow::Result<NamesSystem> {
        let system = self.system_name(config);
        let books = self.book_list(config, library.registry())?;
        NamesSystem::for_system(library, system, books.as_deref())
            .with_context(|| format!("failed to load names system {system}"))
    }
}

/// Build the system library from the configured data directories.
///
/// `<user data dir>/names` is searched too when it exists.
pub fn open_library(config: &Config, mode: ValidationMode) -> anyhow::Result<NameSystemLibrary> {
    let mut dirs = config.data_dirs.clone();
    if let Some(dir) = user_data_dir().map(|d| d.join("names"))
        && dir.is_dir()
        && !dirs.contains(&dir)
    {
        dirs.push(dir);
    }
    NameSystemLibrary::new(mode, &dirs).context("failed to scan names data directories")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> &'static BookCodeRegistry {
        BookCodeRegistry::standard()
    }

    fn len(list: anyhow::Result<Option<Vec<BookCode>>>) -> Option<usize> {
        list.unwrap().map(|b| b.len())
    }

    #[test]
    fn flags_override_configured_books_and_scope() {
        let config = Config {
            books: Some(vec!["GEN".into()]),
            scope: Some(BookScope::Ot),
            ..Config::default()
        };
        assert_eq!(len(ScopeArgs::default().book_list(&config, registry())), Some(1));

        let args = ScopeArgs {
            scope: Some(BookScope::Nt),
            ..ScopeArgs::default()
        };
        assert_eq!(len(args.book_list(&config, registry())), Some(27));

        let args = ScopeArgs {
            books: vec!["EXO".into(), "LEV".into()],
            ..ScopeArgs::default()
        };
        assert_eq!(len(args.book_list(&config, registry())), Some(2));

        let args = ScopeArgs {
            exact: true,
            ..ScopeArgs::default()
        };
        assert_eq!(len(args.book_list(&config, registry())), None);
    }

    #[test]
    fn configured_scope_applies_without_configured_books() {
        let config = Config {
            scope: Some(BookScope::Nt),
            ..Config::default()
        };
        assert_eq!(len(ScopeArgs::default().book_list(&config, registry())), Some(27));
        assert_eq!(len(ScopeArgs::default().book_list(&Config::default(), registry())), None);
    }

    #[test]
    fn bad_codes_are_reported() {
        let args = ScopeArgs {
            books: vec!["GEN".into(), "XYZ".into()],
            ..ScopeArgs::default()
        };
        let err = args.book_list(&Config::default(), registry()).unwrap_err();
        assert!(format!("{err:#}").contains("XYZ"));

        let config = Config {
            books: Some(vec!["NOPE".into()]),
            ..Config::default()
        };
        let err = ScopeArgs::default().book_list(&config, registry()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid books in configuration"));
    }

    #[test]
    fn system_name_falls_back_to_config() {
        let config = Config::default();
        assert_eq!(ScopeArgs::default().system_name(&config), "eng_traditional");
        let args = ScopeArgs {
            system: Some("deu_traditional".into()),
            ..ScopeArgs::default()
        };
        assert_eq!(args.system_name(&config), "deu_traditional");
    }
}
