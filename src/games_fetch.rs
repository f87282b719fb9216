use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, anyhow};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AnalysisError, Result};
use crate::http_client::{Fetched, HttpGet};

/// One played game, flattened from the monthly archive payload.
///
/// Column names mirror the dotted paths of the API object so the cache file
/// reads like the raw data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pgn: String,
    #[serde(default)]
    pub time_control: String,
    #[serde(default)]
    pub end_time: Option<i64>,
    pub rated: bool,
    pub rules: String,
    pub time_class: String,
    #[serde(rename = "white.username")]
    pub white_username: String,
    #[serde(rename = "white.rating")]
    pub white_rating: u32,
    #[serde(rename = "white.result")]
    pub white_result: String,
    #[serde(rename = "black.username")]
    pub black_username: String,
    #[serde(rename = "black.rating")]
    pub black_rating: u32,
    #[serde(rename = "black.result")]
    pub black_result: String,
}

#[derive(Debug, Deserialize)]
struct ApiGame {
    #[serde(default)]
    url: String,
    #[serde(default)]
    pgn: String,
    #[serde(default)]
    time_control: String,
    #[serde(default)]
    end_time: Option<i64>,
    #[serde(default)]
    rated: bool,
    #[serde(default)]
    rules: String,
    #[serde(default)]
    time_class: String,
    white: ApiPlayer,
    black: ApiPlayer,
}

#[derive(Debug, Deserialize)]
struct ApiPlayer {
    username: String,
    rating: u32,
    #[serde(default)]
    result: String,
}

impl From<ApiGame> for GameRecord {
    fn from(g: ApiGame) -> Self {
        Self {
            url: g.url,
            pgn: g.pgn,
            time_control: g.time_control,
            end_time: g.end_time,
            rated: g.rated,
            rules: g.rules,
            time_class: g.time_class,
            white_username: g.white.username,
            white_rating: g.white.rating,
            white_result: g.white.result,
            black_username: g.black.username,
            black_rating: g.black.rating,
            black_result: g.black.result,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FetchOptions<'a> {
    pub parallel: bool,
    pub cancel: Option<&'a AtomicBool>,
}

#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub records: Vec<GameRecord>,
    pub archives_total: usize,
    pub archives_ok: usize,
    pub duplicates_dropped: usize,
    pub errors: Vec<String>,
}

enum ArchiveOutcome {
    Games(Vec<GameRecord>),
    Skipped(String),
    Failed(anyhow::Error),
    Cancelled,
}

/// Fetches every archive and concatenates the games in archive order.
///
/// An archive that answers with a non-success status or an unreadable body
/// contributes nothing. The result is an error only when no archive
/// contributed a game.
pub fn fetch_games(
    http: &dyn HttpGet,
    archives: &[String],
    username: &str,
    opts: FetchOptions<'_>,
) -> Result<FetchSummary> {
    let outcomes: Vec<ArchiveOutcome> = if opts.parallel {
        archives
            .par_iter()
            .map(|url| fetch_one(http, url, opts.cancel))
            .collect()
    } else {
        let mut out = Vec::with_capacity(archives.len());
        for url in archives {
            let outcome = fetch_one(http, url, opts.cancel);
            let stop = matches!(outcome, ArchiveOutcome::Cancelled);
            out.push(outcome);
            if stop {
                break;
            }
        }
        out
    };

    let mut records = Vec::new();
    let mut seen_urls = HashSet::new();
    let mut archives_ok = 0usize;
    let mut duplicates_dropped = 0usize;
    let mut errors = Vec::new();
    let mut last_transport = None;

    for outcome in outcomes {
        match outcome {
            ArchiveOutcome::Games(games) => {
                archives_ok += 1;
                for game in games {
                    if !game.url.is_empty() && !seen_urls.insert(game.url.clone()) {
                        duplicates_dropped += 1;
                        continue;
                    }
                    records.push(game);
                }
            }
            ArchiveOutcome::Skipped(reason) => errors.push(reason),
            ArchiveOutcome::Failed(err) => {
                errors.push(format!("{err:#}"));
                last_transport = Some(err);
            }
            ArchiveOutcome::Cancelled => {
                return Err(AnalysisError::Transport(anyhow!("fetch cancelled")));
            }
        }
    }

    tracing::info!(
        username,
        archives = archives.len(),
        archives_ok,
        games = records.len(),
        duplicates_dropped,
        "archive fetch complete"
    );

    if records.is_empty() {
        if archives_ok == 0
            && let Some(err) = last_transport
        {
            return Err(AnalysisError::Transport(err));
        }
        return Err(AnalysisError::NoGamesFound {
            username: username.to_string(),
        });
    }

    Ok(FetchSummary {
        records,
        archives_total: archives.len(),
        archives_ok,
        duplicates_dropped,
        errors,
    })
}

fn fetch_one(http: &dyn HttpGet, url: &str, cancel: Option<&AtomicBool>) -> ArchiveOutcome {
    if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
        return ArchiveOutcome::Cancelled;
    }
    match http.get(url) {
        Ok(Fetched::Body(body)) => match parse_monthly_archive_json(&body) {
            Ok(games) => {
                tracing::info!(%url, games = games.len(), "archive fetched");
                ArchiveOutcome::Games(games)
            }
            Err(err) => {
                tracing::warn!(%url, "skipping unreadable archive: {err:#}");
                ArchiveOutcome::Skipped(format!("{url}: {err:#}"))
            }
        },
        Ok(Fetched::Status(status)) => {
            tracing::warn!(%url, status, "skipping archive");
            ArchiveOutcome::Skipped(format!("{url}: http {status}"))
        }
        Err(err) => {
            tracing::warn!(%url, "archive request failed: {err:#}");
            ArchiveOutcome::Failed(err)
        }
    }
}

/// Parses one monthly archive body. Malformed game entries are dropped.
pub fn parse_monthly_archive_json(raw: &str) -> anyhow::Result<Vec<GameRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid archive json")?;
    let Some(games) = root.get("games").and_then(|g| g.as_array()) else {
        return Err(anyhow!("archive has no games field"));
    };

    let mut out = Vec::with_capacity(games.len());
    for item in games {
        match ApiGame::deserialize(item) {
            Ok(game) => out.push(GameRecord::from(game)),
            Err(err) => tracing::debug!("dropping malformed game entry: {err}"),
        }
    }
    Ok(out)
}
