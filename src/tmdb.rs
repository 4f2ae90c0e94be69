use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;

const MAX_ERROR_BODY_CHARS: usize = 200;

/// One GET against the upstream provider. Failures are logged and reported as
/// `None`; callers only see "got a payload" or "did not".
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Option<Value>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    config: Config,
}

impl TmdbClient {
    pub fn new(config: Config) -> Result<Self> {
        let user_agent = format!("subjectshim/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `<base><path>?api_key=..&language=..` followed by `params` in order.
    pub fn request_url(&self, path: &str, params: &[(&str, String)]) -> String {
        build_url(&self.config, path, &self.config.api_key, params)
    }

    /// Same URL with the key masked, for logs.
    fn redacted_url(&self, path: &str, params: &[(&str, String)]) -> String {
        build_url(&self.config, path, "***", params)
    }

    pub async fn try_fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.request_url(path, params);
        let shown = self.redacted_url(path, params);
        debug!("GET {}", shown);

        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("request to {shown} failed"))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| e.without_url())
            .context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!(
                "{} -> status {}: {}",
                shown,
                status,
                snippet(&text)
            ));
        }
        let parsed: Value = serde_json::from_str(&text)
            .with_context(|| format!("JSON parse failed for {shown}"))?;
        Ok(parsed)
    }
}

#[async_trait]
impl UpstreamApi for TmdbClient {
    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Option<Value> {
        match self.try_fetch(path, params).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("TMDB request failed: {:#}", e);
                None
            }
        }
    }
}

fn build_url(config: &Config, path: &str, api_key: &str, params: &[(&str, String)]) -> String {
    let path = path.trim_start_matches('/');
    let mut url = format!(
        "{}/{}?api_key={}&language={}",
        config.base_url,
        path,
        urlencoding::encode(api_key),
        urlencoding::encode(&config.language)
    );
    for (key, value) in params {
        url.push('&');
        url.push_str(&urlencoding::encode(key));
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

fn snippet(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{cut}...")
}
