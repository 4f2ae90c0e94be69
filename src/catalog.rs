//! Category listings and search, expressed as legacy subjects.
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::subject::{normalize, normalize_as, MediaKind, Subject, UpstreamItem};
use crate::tmdb::UpstreamApi;

const SEARCH_PATH: &str = "search/multi";

/// Upstream listing a category tag resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Popular,
    Latest,
    TopRated,
}

impl Category {
    /// Unrecognized tags fall back to `Popular`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "hot" | "popular" | "热门" => Category::Popular,
            "latest" | "new" | "最新" => Category::Latest,
            "top250" | "top_rated" | "高分" | "豆瓣高分" => Category::TopRated,
            other => {
                debug!("Unknown category tag '{}', using popular", other);
                Category::Popular
            }
        }
    }

    pub fn path(&self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (Category::Popular, MediaKind::Movie) => "movie/popular",
            (Category::Popular, MediaKind::Tv) => "tv/popular",
            (Category::Latest, MediaKind::Movie) => "movie/now_playing",
            (Category::Latest, MediaKind::Tv) => "tv/on_the_air",
            (Category::TopRated, MediaKind::Movie) => "movie/top_rated",
            (Category::TopRated, MediaKind::Tv) => "tv/top_rated",
        }
    }
}

#[derive(Clone)]
pub struct Catalog {
    upstream: Arc<dyn UpstreamApi>,
    config: Config,
}

impl Catalog {
    pub fn new(upstream: Arc<dyn UpstreamApi>, config: Config) -> Self {
        Self { upstream, config }
    }

    /// Subjects for a category listing. `_limit` is accepted for call-site
    /// compatibility; TMDB pages are fixed size.
    pub async fn list_subjects(
        &self,
        kind: MediaKind,
        tag: &str,
        page: u32,
        _limit: u32,
    ) -> Vec<Subject> {
        let path = Category::from_tag(tag).path(kind);
        let params = [("page", page.max(1).to_string())];
        let payload = self.upstream.fetch(path, &params).await;
        let subjects: Vec<Subject> = result_items(payload, path)
            .into_iter()
            .map(|item| normalize_as(item, kind, &self.config))
            .collect();
        info!(
            "Listed {} {} subjects for tag '{}' (page {})",
            subjects.len(),
            kind,
            tag,
            page
        );
        subjects
    }

    /// Movie and TV hits for `query`; people and other result types are dropped.
    pub async fn search_subjects(&self, query: &str, page: u32) -> Vec<Subject> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let params = [
            ("query", query.to_string()),
            ("page", page.max(1).to_string()),
        ];
        let payload = self.upstream.fetch(SEARCH_PATH, &params).await;
        let subjects: Vec<Subject> = result_items(payload, SEARCH_PATH)
            .into_iter()
            .filter(|item| {
                item.media_type
                    .as_deref()
                    .and_then(MediaKind::from_media_type)
                    .is_some()
            })
            .map(|item| normalize(item, &self.config))
            .collect();
        info!("Search '{}' returned {} subjects", query, subjects.len());
        subjects
    }
}

/// Pull the `results` array out of a payload. Anything else is "no results".
fn result_items(payload: Option<Value>, path: &str) -> Vec<UpstreamItem> {
    let Some(mut payload) = payload else {
        return Vec::new();
    };
    let Some(Value::Array(raw)) = payload.get_mut("results").map(Value::take) else {
        warn!("Unexpected response shape from {}: no results array", path);
        return Vec::new();
    };
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<UpstreamItem>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Skipping malformed item from {}: {}", path, e);
                None
            }
        })
        .collect()
}
