//! Didactic CLI - catalog checks, routing probes, and reply replay.
//!
//! Every subcommand is a thin shell around [`didactic_engine`]: it loads
//! `~/.didactic/config.toml` (or `--config`), builds what it needs, and prints
//! plain text. Logs go to `~/.didactic/logs/didactic.log`, never to stdout.

mod report;

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use didactic_engine::{
    DidacticConfig, Locale, Session, default_file_name, export_snapshot, parse_reply,
    persist_locale_at,
};

#[derive(Parser)]
#[command(name = "didactic")]
#[command(about = "Inspect rule catalogs and replay tutoring sessions")]
struct Cli {
    /// Config file to use instead of ~/.didactic/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a catalog and print its integrity report (exit 1 if unsound)
    Check {
        #[arg(long)]
        locale: Option<Locale>,
    },
    /// Show which tier and model an input would be routed to
    Route {
        /// Learner input
        text: String,
        /// Messages already exchanged in the conversation
        #[arg(long, default_value_t = 0)]
        depth: usize,
    },
    /// Fold newline-delimited service replies into a fresh session
    Replay {
        /// File with one raw service reply per line
        file: PathBuf,
        #[arg(long)]
        locale: Option<Locale>,
        /// Write the final snapshot; without a value, to the configured export dir
        #[arg(long, num_args = 0..=1)]
        export: Option<Option<PathBuf>>,
    },
    /// List directives, optionally filtered by a search term
    Directives {
        query: Option<String>,
        #[arg(long)]
        locale: Option<Locale>,
    },
    /// Persist the default locale to the config file
    Locale { locale: Locale },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let config_file = match cli.config {
        Some(path) => Some(path),
        None => DidacticConfig::path(),
    };
    let config = match &config_file {
        Some(path) => DidacticConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?
            .unwrap_or_default(),
        None => DidacticConfig::default(),
    };

    match cli.command {
        Commands::Check { locale } => check(&config, locale.unwrap_or_else(|| config.locale())),
        Commands::Route { text, depth } => {
            print!("{}", report::plan(&config.routing_policy().plan(&text, depth)));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Replay {
            file,
            locale,
            export,
        } => replay(
            &config,
            &file,
            locale.unwrap_or_else(|| config.locale()),
            export,
        ),
        Commands::Directives { query, locale } => {
            let locale = locale.unwrap_or_else(|| config.locale());
            let catalog = config.catalog_cache().get(locale);
            let found = catalog.search_directives(query.as_deref().unwrap_or_default());
            print!("{}", report::directives(&found));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Locale { locale } => {
            let path = config_file.context("could not determine config path")?;
            persist_locale_at(&path, locale)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("default locale set to {locale} ({})", locale.display_name());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(config: &DidacticConfig, locale: Locale) -> Result<ExitCode> {
    let mut cache = config.catalog_cache();
    let catalog = cache.get(locale);
    let integrity = catalog.integrity();
    print!(
        "{}",
        report::integrity(
            locale,
            &integrity,
            cache.warnings(locale),
            cache.last_error(locale)
        )
    );
    if cache.last_error(locale).is_some() || !integrity.is_sound() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn replay(
    config: &DidacticConfig,
    file: &Path,
    locale: Locale,
    export: Option<Option<PathBuf>>,
) -> Result<ExitCode> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut cache = config.catalog_cache();
    let mut session = Session::from_cache(&mut cache, locale, config.routing_policy());

    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let reply = parse_reply(line);
        let outcome = session.apply(&reply.analysis, None);
        print!("{}", report::turn(&session, &reply, &outcome));
    }

    if let Some(target) = export {
        let path = match target {
            Some(path) if path.is_dir() => path.join(default_file_name(chrono::Utc::now())),
            Some(path) => path,
            None => config.export_dir().join(default_file_name(chrono::Utc::now())),
        };
        export_snapshot(&path, &session.snapshot())
            .with_context(|| format!("exporting to {}", path.display()))?;
        println!("snapshot written to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No writable log file: warnings and errors still reach stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::new("warn"))
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.didactic/logs/didactic.log
    if let Some(config_path) = DidacticConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("didactic.log"));
    }

    // Fallback: ./.didactic/logs/didactic.log
    candidates.push(PathBuf::from(".didactic").join("logs").join("didactic.log"));

    candidates
}
