use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use serde::Serialize;

use crate::aggregate::{OpeningStatRow, aggregate_by_opening};
use crate::archives::{fetch_archive_list, normalize_username};
use crate::classify::{Side, TimeClass, UnknownOpening, normalize_games};
use crate::config::AppConfig;
use crate::error::{AnalysisError, Result};
use crate::game_cache::{CachedGames, GameCache};
use crate::games_fetch::{FetchOptions, FetchSummary, fetch_games};
use crate::http_client::HttpGet;
use crate::openings::OpeningTable;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub username: String,
    pub side: Side,
    pub time_class: TimeClass,
    /// Skip the cache read and overwrite the stored copy.
    pub force_refresh: bool,
    /// When false the cache is neither read nor written.
    pub use_cache: bool,
    pub unknown_opening: UnknownOpening,
}

impl AnalysisRequest {
    pub fn new(username: impl Into<String>, side: Side) -> Self {
        Self {
            username: username.into(),
            side,
            time_class: TimeClass::All,
            force_refresh: false,
            use_cache: true,
            unknown_opening: UnknownOpening::Fail,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub username: String,
    pub side: Side,
    pub time_class: TimeClass,
    pub games_fetched: usize,
    pub games_analyzed: usize,
    pub from_cache: bool,
    pub rows: Vec<OpeningStatRow>,
}

/// Runs enumerate, fetch, classify and aggregate for one request at a time.
pub struct Analyzer<H: HttpGet> {
    config: AppConfig,
    http: H,
    cache: GameCache,
    openings: OpeningTable,
    cancel: Option<Arc<AtomicBool>>,
}

impl<H: HttpGet> Analyzer<H> {
    pub fn new(config: AppConfig, http: H, openings: OpeningTable) -> Self {
        let cache = GameCache::new(config.cache_dir.clone());
        Self {
            config,
            http,
            cache,
            openings,
            cancel: None,
        }
    }

    /// Checked between archive fetches; setting it aborts the fetch.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn cache(&self) -> &GameCache {
        &self.cache
    }

    pub fn fetch_records(&self, username: &str) -> Result<FetchSummary> {
        let username = require_username(username)?;
        let archives = fetch_archive_list(&self.http, &self.config, &username)?;
        tracing::info!(%username, archives = archives.len(), "archives listed");
        fetch_games(
            &self.http,
            &archives,
            &username,
            FetchOptions {
                parallel: self.config.fetch_parallel,
                cancel: self.cancel.as_deref(),
            },
        )
    }

    pub fn load_records(
        &self,
        username: &str,
        force_refresh: bool,
        use_cache: bool,
    ) -> Result<CachedGames> {
        let username = require_username(username)?;
        if !use_cache {
            let summary = self.fetch_records(&username)?;
            return Ok(CachedGames {
                records: summary.records,
                from_cache: false,
            });
        }
        self.cache.load_or_fetch(&username, force_refresh, || {
            self.fetch_records(&username).map(|s| s.records)
        })
    }

    pub fn run(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let username = require_username(&request.username)?;
        let loaded = self.load_records(&username, request.force_refresh, request.use_cache)?;

        let games = normalize_games(
            &loaded.records,
            &username,
            request.side,
            request.time_class,
            &self.openings,
            request.unknown_opening,
        )?;
        if games.is_empty() {
            tracing::info!(
                %username,
                side = %request.side,
                time_class = ?request.time_class,
                "no games left after filtering"
            );
            return Err(AnalysisError::NoGamesFound { username });
        }
        let rows = aggregate_by_opening(&games);

        Ok(AnalysisReport {
            username,
            side: request.side,
            time_class: request.time_class,
            games_fetched: loaded.records.len(),
            games_analyzed: games.len(),
            from_cache: loaded.from_cache,
            rows,
        })
    }
}

fn require_username(raw: &str) -> Result<String> {
    normalize_username(raw).ok_or_else(|| AnalysisError::UserNotFound {
        username: String::new(),
    })
}
