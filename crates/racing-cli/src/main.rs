//! # racing
//!
//! Command-line entry point: loads settings, installs logging, opens the
//! document store and runs one maintenance or traversal command.

#![deny(unsafe_code)]

mod commands;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use racing_settings::{RacingSettings, get_settings, init_settings, settings_dir, settings_path};

/// Local mirror of racing data.
#[derive(Parser, Debug)]
#[command(name = "racing", about = "Local mirror of racing data", version)]
struct Cli {
    /// Path to the `SQLite` database (overrides settings).
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Log level when `RUST_LOG` is unset (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the secondary indexes.
    Init,
    /// Traverse a date range over synthetic data and report visit counts.
    Demo {
        /// First date, inclusive.
        #[arg(long)]
        from: NaiveDate,
        /// Last date, inclusive. Defaults to `--from`.
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Worker threads (overrides settings).
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Delete meets scraped before a date, with their races and runners.
    Purge {
        /// Cutoff date; meets scraped before its midnight UTC are removed.
        #[arg(long)]
        before: NaiveDate,
    },
    /// Print form statistics from the cached performances of a horse.
    Stats {
        /// Source URL of the horse.
        #[arg(long)]
        horse_url: String,
    },
}

impl Cli {
    fn apply(&self, settings: &mut RacingSettings) {
        if let Some(path) = &self.db_path {
            settings.store.db_path = path.to_string_lossy().into_owned();
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let path = settings_path();
    let mut settings = racing_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings: {}", path.display()))?;
    args.apply(&mut settings);

    racing_logging::init_subscriber(&settings.logging.level);
    if init_settings(settings).is_err() {
        tracing::warn!("settings were already initialized");
    }
    let settings = get_settings();

    let output = match args.command {
        Command::Init => {
            let store = store::open_store(&settings.store, &settings_dir())?;
            commands::init(&store::offline(&store))?
        }
        Command::Demo { from, to, threads } => {
            let threads = threads.unwrap_or(settings.processor.threads);
            commands::demo(
                from,
                to.unwrap_or(from),
                threads,
                &settings.processor.message_prefix,
            )?
            .to_string()
        }
        Command::Purge { before } => {
            let store = store::open_store(&settings.store, &settings_dir())?;
            commands::purge(&store::offline(&store), before)?
        }
        Command::Stats { horse_url } => {
            let store = store::open_store(&settings.store, &settings_dir())?;
            commands::stats(&store::offline(&store), &horse_url)?.to_string()
        }
    };
    println!("{output}");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_to_defaults_to_none() {
        let cli = Cli::parse_from(["racing", "demo", "--from", "2016-02-01"]);
        match cli.command {
            Command::Demo { from, to, threads } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2016, 2, 1).unwrap());
                assert!(to.is_none());
                assert!(threads.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn invalid_date_is_rejected() {
        assert!(Cli::try_parse_from(["racing", "purge", "--before", "yesterday"]).is_err());
    }

    #[test]
    fn global_overrides_apply_to_settings() {
        let cli = Cli::parse_from([
            "racing",
            "stats",
            "--horse-url",
            "/horses/ace",
            "--db-path",
            "/srv/racing.db",
            "--log-level",
            "debug",
        ]);
        let mut settings = RacingSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.store.db_path, "/srv/racing.db");
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.processor, RacingSettings::default().processor);
    }

    #[test]
    fn no_overrides_keep_settings() {
        let cli = Cli::parse_from(["racing", "init"]);
        let mut settings = RacingSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, RacingSettings::default());
    }
}
