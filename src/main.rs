use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use opening_stats::classify::{Side, TimeClass, UnknownOpening};
use opening_stats::config::AppConfig;
use opening_stats::error::AnalysisError;
use opening_stats::export::{export_report, render_table};
use opening_stats::game_cache::write_games_csv;
use opening_stats::http_client::http_client;
use opening_stats::openings::OpeningTable;
use opening_stats::session::{AnalysisRequest, Analyzer};

#[derive(Parser)]
#[command(name = "opening_stats")]
#[command(about = "Per-opening win/draw/loss statistics from a player's online game history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the per-user game tables
    #[arg(long, env = "OPENING_STATS_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Opening code -> name JSON table (defaults to the bundled one)
    #[arg(long, env = "OPENINGS_PATH", global = true)]
    openings: Option<PathBuf>,

    /// Fetch monthly archives in parallel
    #[arg(long, global = true)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print opening statistics for one side
    Analyze {
        username: String,
        #[arg(long, value_enum)]
        side: Side,
        #[arg(long, value_enum, default_value = "all")]
        time_class: TimeClass,
        /// Ignore the cached game table and fetch again
        #[arg(long)]
        refresh: bool,
        /// Neither read nor write the cache
        #[arg(long)]
        no_cache: bool,
        /// Drop games whose opening code is not in the table instead of failing
        #[arg(long)]
        skip_unknown_openings: bool,
        #[arg(long)]
        json: bool,
        /// Also write the table to a .csv or .xlsx file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Fetch the full game history and store it
    Fetch {
        username: String,
        /// Write the game table here instead of the cache directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", user_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }
    if let Some(path) = cli.openings {
        config.openings_path = Some(path);
    }
    config.fetch_parallel |= cli.parallel;

    let openings = OpeningTable::load_or_bundled(config.openings_path.as_deref())?;
    let client = http_client(&config)?.clone();
    let analyzer = Analyzer::new(config, client, openings);

    match cli.command {
        Commands::Analyze {
            username,
            side,
            time_class,
            refresh,
            no_cache,
            skip_unknown_openings,
            json,
            export,
        } => {
            let request = AnalysisRequest {
                username,
                side,
                time_class,
                force_refresh: refresh,
                use_cache: !no_cache,
                unknown_opening: if skip_unknown_openings {
                    UnknownOpening::Skip
                } else {
                    UnknownOpening::Fail
                },
            };
            let report = analyzer.run(&request)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} as {} ({:?}): {} of {} games{}",
                    report.username,
                    report.side,
                    report.time_class,
                    report.games_analyzed,
                    report.games_fetched,
                    if report.from_cache { " [cached]" } else { "" }
                );
                println!("{}", render_table(&report.rows));
            }
            if let Some(path) = export {
                let rows = export_report(&path, &report)?;
                eprintln!("exported {rows} rows to {}", path.display());
            }
        }
        Commands::Fetch { username, out } => {
            let summary = analyzer.fetch_records(&username)?;
            let path = match out {
                Some(path) => {
                    write_games_csv(&path, &summary.records)
                        .with_context(|| format!("write {}", path.display()))?;
                    path
                }
                None => analyzer.cache().store(&username, &summary.records)?,
            };
            println!(
                "{} games from {}/{} archives saved to {}",
                summary.records.len(),
                summary.archives_ok,
                summary.archives_total,
                path.display()
            );
            for err in summary.errors.iter().take(6) {
                eprintln!("  skipped: {err}");
            }
        }
    }
    Ok(())
}

fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::UserNotFound { username }) if username.is_empty() => {
            "Please enter a username.".to_string()
        }
        Some(AnalysisError::UserNotFound { username }) => {
            format!("Could not find a player called '{username}'.")
        }
        Some(AnalysisError::NoGamesFound { username }) => {
            format!("No matching games found for '{username}'.")
        }
        Some(err @ AnalysisError::LookupFailure { .. }) => format!(
            "{err}. Update the opening table or pass --skip-unknown-openings."
        ),
        _ => format!("An error occurred: {err:#}"),
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
