use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;

use crate::games_fetch::GameRecord;

const CACHE_EXT: &str = "csv";

static KEY_LOCKS: Lazy<Mutex<HashMap<String, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Flat per-username game table on disk. No expiry.
#[derive(Debug, Clone)]
pub struct GameCache {
    dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CachedGames {
    pub records: Vec<GameRecord>,
    pub from_cache: bool,
}

impl GameCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, username: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{CACHE_EXT}", cache_key(username)))
    }

    /// `None` when the file is absent or cannot be read back.
    pub fn load(&self, username: &str) -> Option<Vec<GameRecord>> {
        let key = cache_key(username);
        let lock = key_lock(&key);
        let _guard = lock_ignore_poison(&*lock);

        let path = self.path_for(username);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "cache miss");
            return None;
        }
        match read_games_csv(&path) {
            Ok(records) => {
                tracing::info!(path = %path.display(), games = records.len(), "cache hit");
                Some(records)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable cache: {err:#}");
                None
            }
        }
    }

    pub fn store(&self, username: &str, records: &[GameRecord]) -> Result<PathBuf> {
        let key = cache_key(username);
        let lock = key_lock(&key);
        let _guard = lock_ignore_poison(&*lock);

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create cache dir {}", self.dir.display()))?;
        let path = self.path_for(username);
        let tmp = path.with_extension("csv.tmp");
        write_games_csv(&tmp, records)?;
        fs::rename(&tmp, &path).context("swap cache file")?;
        tracing::info!(path = %path.display(), games = records.len(), "cache stored");
        Ok(path)
    }

    /// Reads the cache unless `force_refresh`, falling back to `fetch` on a
    /// miss. Fresh results are written back; a failed write is only logged.
    pub fn load_or_fetch<F>(
        &self,
        username: &str,
        force_refresh: bool,
        fetch: F,
    ) -> crate::error::Result<CachedGames>
    where
        F: FnOnce() -> crate::error::Result<Vec<GameRecord>>,
    {
        if !force_refresh && let Some(records) = self.load(username) {
            return Ok(CachedGames {
                records,
                from_cache: true,
            });
        }
        let records = fetch()?;
        if let Err(err) = self.store(username, &records) {
            tracing::warn!(username, "failed to store cache: {err:#}");
        }
        Ok(CachedGames {
            records,
            from_cache: false,
        })
    }
}

pub fn write_games_csv(path: &Path, records: &[GameRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    for record in records {
        writer.serialize(record).context("write game row")?;
    }
    writer.flush().context("flush game table")?;
    Ok(())
}

pub fn read_games_csv(path: &Path) -> Result<Vec<GameRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    for row in reader.deserialize::<GameRecord>() {
        out.push(row.context("read game row")?);
    }
    Ok(out)
}

fn cache_key(username: &str) -> String {
    username
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn key_lock(key: &str) -> Arc<Mutex<()>> {
    let mut locks = lock_ignore_poison(&*KEY_LOCKS);
    locks.entry(key.to_string()).or_default().clone()
}

fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_case_insensitive_and_path_safe() {
        assert_eq!(cache_key(" Alice "), "alice");
        assert_eq!(cache_key("../evil"), "___evil");
    }
}
