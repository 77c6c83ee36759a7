//! Command-line surface and runtime configuration.
//!
//! # Responsibility
//! - Declare flags, subcommands and environment fallbacks.
//! - Resolve the store location and optional logging setup.

use clap::{Args, Parser, Subcommand, ValueEnum};
use eternalflow_core::db::open_db;
use eternalflow_core::{
    default_log_level, EventRepository, FilterMode, FlatEventRepository, LogConfig, RepoResult,
    SortMode, SqliteEventRepository,
};
use std::path::{Path, PathBuf};

const DEFAULT_SQLITE_FILE: &str = "eternalflow.sqlite3";
const DEFAULT_FLAT_FILE: &str = "eternalflow.json";

#[derive(Parser, Debug)]
#[command(
    name = "eternalflow",
    version,
    about = "Countdowns to the events that matter",
    long_about = None
)]
pub struct Cli {
    /// Store location (defaults to a file in the system temp directory).
    #[arg(long, global = true, env = "ETERNALFLOW_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Storage backend.
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::Sqlite)]
    pub store: StoreKind,

    /// Log level: trace|debug|info|warn|error.
    #[arg(long, global = true, env = "ETERNALFLOW_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rolling log files. Logging is off without it.
    #[arg(long, global = true, env = "ETERNALFLOW_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Indexed SQLite database.
    Sqlite,
    /// Single JSON key-value file.
    Flat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add an event.
    #[command(after_help = "EXAMPLES:\n    eternalflow add \"Новый год\" 2031-01-01\n    eternalflow add \"Созвон\" \"2030-05-01T18:30\"")]
    Add(AddArgs),
    /// Change the title and/or date of an event.
    Edit(EditArgs),
    /// Delete one event.
    Rm(RemoveArgs),
    /// Delete every event.
    Clear(ClearArgs),
    /// Show events with their countdowns.
    List(ListArgs),
    /// Import events from a JSON export or array.
    Import(ImportArgs),
    /// Write all events to a dated JSON file.
    Export(ExportArgs),
    /// Keep countdowns ticking until interrupted.
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Event title, up to 50 characters.
    pub title: String,
    /// Target date: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` (UTC) or RFC 3339.
    pub date: String,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm removal of every event.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// all|upcoming|past (remembered for next time).
    #[arg(long)]
    pub filter: Option<FilterMode>,
    /// date-asc|date-desc|title-asc|title-desc|added-asc|added-desc (remembered).
    #[arg(long)]
    pub sort: Option<SortMode>,
    /// Case-insensitive title substring.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Target directory.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub list: ListArgs,
    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    pub seconds: Option<u64>,
}

impl Cli {
    /// Explicit `--db`, else a per-backend file in the temp directory.
    pub fn db_path(&self) -> PathBuf {
        match &self.db {
            Some(path) => path.clone(),
            None => std::env::temp_dir().join(match self.store {
                StoreKind::Sqlite => DEFAULT_SQLITE_FILE,
                StoreKind::Flat => DEFAULT_FLAT_FILE,
            }),
        }
    }

    /// Logging setup, or `None` when no log directory is configured.
    pub fn log_config(&self, cwd: &Path) -> Option<LogConfig> {
        let dir = self.log_dir.as_ref()?;
        let dir = if dir.is_absolute() {
            dir.clone()
        } else {
            cwd.join(dir)
        };
        let level = self
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        Some(LogConfig {
            level,
            log_dir: dir,
            echo_warnings: true,
        })
    }

    pub fn open_repository(&self) -> RepoResult<Box<dyn EventRepository>> {
        let path = self.db_path();
        let repo: Box<dyn EventRepository> = match self.store {
            StoreKind::Sqlite => Box::new(SqliteEventRepository::try_new(open_db(&path)?)?),
            StoreKind::Flat => Box::new(FlatEventRepository::open(&path)?),
        };
        Ok(repo)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, StoreKind};
    use clap::Parser;
    use eternalflow_core::{FilterMode, SortMode};
    use std::path::{Path, PathBuf};

    #[test]
    fn list_flags_parse_into_core_modes() {
        let cli = Cli::parse_from([
            "eternalflow",
            "--db",
            "/tmp/x.sqlite3",
            "list",
            "--filter",
            "Upcoming",
            "--sort",
            "title-desc",
        ]);
        assert_eq!(cli.db_path(), PathBuf::from("/tmp/x.sqlite3"));
        let Command::List(args) = &cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.filter, Some(FilterMode::Upcoming));
        assert_eq!(args.sort, Some(SortMode::TitleDesc));
    }

    #[test]
    fn unknown_sort_is_rejected() {
        let result = Cli::try_parse_from(["eternalflow", "list", "--sort", "shuffle"]);
        assert!(result.is_err());
    }

    #[test]
    fn default_db_path_depends_on_store() {
        let mut cli = Cli::parse_from(["eternalflow", "--store", "flat", "list"]);
        cli.db = None;
        assert_eq!(cli.store, StoreKind::Flat);
        assert!(cli.db_path().ends_with("eternalflow.json"));
    }

    #[test]
    fn log_config_resolves_relative_dir_against_cwd() {
        let mut cli = Cli::parse_from(["eternalflow", "list"]);
        cli.log_dir = None;
        assert!(cli.log_config(Path::new("/work")).is_none());

        cli.log_dir = Some(PathBuf::from("logs"));
        cli.log_level = Some("warn".to_string());
        let config = cli.log_config(Path::new("/work")).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/work/logs"));
        assert_eq!(config.level, "warn");
        assert!(config.echo_warnings);
    }
}
