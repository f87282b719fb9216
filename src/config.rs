use std::env;
use std::path::PathBuf;

const DEFAULT_API_BASE: &str = "https://api.chess.com/pub";
const DEFAULT_USER_AGENT: &str = "opening-stats";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const CACHE_DIR: &str = "opening_stats";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub cache_dir: PathBuf,
    /// Opening table override; the bundled table is used when unset.
    pub openings_path: Option<PathBuf>,
    pub fetch_parallel: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_dir: default_cache_dir(),
            openings_path: None,
            fetch_parallel: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let http_timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a whole number"))?
                .max(1),
            _ => defaults.http_timeout_secs,
        };

        Ok(Self {
            api_base: non_empty_var("CHESS_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            user_agent: non_empty_var("CHESS_USER_AGENT").unwrap_or(defaults.user_agent),
            http_timeout_secs,
            cache_dir: non_empty_var("OPENING_STATS_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            openings_path: non_empty_var("OPENINGS_PATH").map(PathBuf::from),
            fetch_parallel: non_empty_var("FETCH_PARALLEL")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.fetch_parallel),
        })
    }

    pub fn archives_url(&self, username: &str) -> String {
        format!("{}/player/{username}/games/archives", self.api_base)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn default_cache_dir() -> PathBuf {
    // Prefer XDG cache.
    if let Some(base) = non_empty_var("XDG_CACHE_HOME") {
        return PathBuf::from(base).join(CACHE_DIR);
    }
    if let Some(home) = non_empty_var("HOME") {
        return PathBuf::from(home).join(".cache").join(CACHE_DIR);
    }
    PathBuf::from("cache")
}
