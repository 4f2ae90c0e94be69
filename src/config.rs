use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "zh-CN";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/500x750?text=No+Poster";
const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3147));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for the upstream client and the HTTP server.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub image_base: String,
    pub placeholder_image: String,
    pub timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Defaults for everything except the API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_TMDB_BASE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_addr: DEFAULT_BIND_ADDR,
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("TMDB_API_KEY must be set"))?;
        let mut config = Self::new(api_key);

        if let Some(base) = non_empty_var("TMDB_BASE_URL") {
            config.base_url = base.trim_end_matches('/').to_string();
        }
        if let Some(language) = non_empty_var("TMDB_LANGUAGE") {
            config.language = language;
        }
        if let Some(image_base) = non_empty_var("TMDB_IMAGE_BASE") {
            config.image_base = image_base.trim_end_matches('/').to_string();
        }
        if let Some(placeholder) = non_empty_var("PLACEHOLDER_IMAGE") {
            config.placeholder_image = placeholder;
        }
        if let Some(secs) = non_empty_var("HTTP_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .with_context(|| format!("HTTP_TIMEOUT_SECS is not a number: {secs}"))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(bind) = non_empty_var("BIND_ADDR") {
            config.bind_addr = bind
                .parse::<SocketAddr>()
                .with_context(|| format!("BIND_ADDR is not a socket address: {bind}"))?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("image_base", &self.image_base)
            .field("placeholder_image", &self.placeholder_image)
            .field("timeout", &self.timeout)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
