use anyhow::Context;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::{AnalysisError, Result};
use crate::http_client::{Fetched, HttpGet};

#[derive(Debug, Deserialize)]
struct ArchiveIndex {
    #[serde(default)]
    archives: Option<Vec<String>>,
}

/// Trims and lowercases a username for use in URLs and cache keys.
pub fn normalize_username(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Lists the monthly archive URLs for `username`, oldest first as served.
pub fn fetch_archive_list(
    http: &dyn HttpGet,
    config: &AppConfig,
    username: &str,
) -> Result<Vec<String>> {
    let url = config.archives_url(username);
    tracing::debug!(%url, "fetching archive index");
    match http.get(&url)? {
        Fetched::Body(body) => parse_archive_index_json(&body, username),
        Fetched::Status(status) => {
            tracing::warn!(status, username, "archive index request rejected");
            Err(AnalysisError::UserNotFound {
                username: username.to_string(),
            })
        }
    }
}

pub fn parse_archive_index_json(raw: &str, username: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(AnalysisError::UserNotFound {
            username: username.to_string(),
        });
    }
    let index: ArchiveIndex =
        serde_json::from_str(trimmed).context("invalid archive index json")?;
    // A body without `archives` is how the API answers for unknown users.
    index.archives.ok_or_else(|| AnalysisError::UserNotFound {
        username: username.to_string(),
    })
}
