use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};

use crate::config::AppConfig;

static CLIENT: OnceCell<ApiClient> = OnceCell::new();

/// Outcome of a GET that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Body(String),
    Status(u16),
}

/// Black-box JSON GET used by the enumerator and fetcher.
///
/// `Err` is reserved for transport failures; a non-success HTTP status is
/// reported as `Fetched::Status` so callers can decide what it means.
pub trait HttpGet: Sync {
    fn get(&self, url: &str) -> Result<Fetched>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    user_agent: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

impl HttpGet for ApiClient {
    fn get(&self, url: &str) -> Result<Fetched> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Ok(Fetched::Status(status.as_u16()));
        }
        let body = resp.text().context("failed reading body")?;
        Ok(Fetched::Body(body))
    }
}

pub fn http_client(config: &AppConfig) -> Result<&'static ApiClient> {
    CLIENT.get_or_try_init(|| ApiClient::new(config))
}
