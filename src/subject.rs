//! Legacy "subject" records and the mapping from TMDB result items onto them.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    /// Path segment TMDB uses for this kind.
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    /// Kind carried by a `/search/multi` result, if it is one we serve.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "movies" | "film" => Ok(MediaKind::Movie),
            "tv" | "series" | "show" | "电视剧" => Ok(MediaKind::Tv),
            _ => Err(anyhow::anyhow!("media kind must be 'movie' or 'tv'")),
        }
    }
}

/// TMDB ids are numbers, but some proxies hand them back as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UpstreamId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for UpstreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamId::Number(n) => write!(f, "{n}"),
            UpstreamId::Text(s) => f.write_str(s),
        }
    }
}

/// One entry of a TMDB `results` array. Movies and series use different key
/// names, so every field is optional and defaulting happens in [`normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamItem {
    pub id: Option<UpstreamId>,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub original_name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub overview: Option<String>,
}

impl UpstreamItem {
    pub fn is_series(&self) -> bool {
        present(&self.first_air_date).is_some()
    }

    /// `media_type` when upstream sends one, otherwise the air-date heuristic.
    pub fn kind(&self) -> MediaKind {
        if let Some(kind) = self.media_type.as_deref().and_then(MediaKind::from_media_type) {
            return kind;
        }
        if self.is_series() {
            MediaKind::Tv
        } else {
            MediaKind::Movie
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Images {
    pub large: String,
    pub medium: String,
    pub small: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub year: String,
    pub subtype: String,
    pub images: Images,
    pub rating: Rating,
    pub genres: Vec<String>,
    pub casts: Vec<Credit>,
    pub directors: Vec<Credit>,
    pub summary: String,
}

/// Map a TMDB item onto the legacy subject shape. Never fails.
pub fn normalize(item: UpstreamItem, config: &Config) -> Subject {
    let kind = item.kind();
    normalize_as(item, kind, config)
}

/// Like [`normalize`], for callers that already know the kind (listings).
pub fn normalize_as(item: UpstreamItem, kind: MediaKind, config: &Config) -> Subject {
    let title = first_present(&item.title, &item.name);
    let original_title = first_present(&item.original_title, &item.original_name);
    let date = first_present(&item.release_date, &item.first_air_date);
    let poster = poster_url(item.poster_path.as_deref(), config);

    Subject {
        id: item.id.map(|id| id.to_string()).unwrap_or_default(),
        title,
        original_title,
        year: extract_year(&date),
        subtype: kind.to_string(),
        images: Images {
            large: poster.clone(),
            medium: poster.clone(),
            small: poster,
        },
        rating: Rating {
            average: item.vote_average.filter(|v| v.is_finite()).unwrap_or(0.0),
        },
        genres: Vec::new(),
        casts: Vec::new(),
        directors: Vec::new(),
        summary: item.overview.unwrap_or_default(),
    }
}

pub fn extract_year(date: &str) -> String {
    date.split('-').next().unwrap_or_default().to_string()
}

fn poster_url(path: Option<&str>, config: &Config) -> String {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if p.starts_with('/') => format!("{}{p}", config.image_base),
        Some(p) => format!("{}/{p}", config.image_base),
        None => config.placeholder_image.clone(),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn first_present(movie_key: &Option<String>, series_key: &Option<String>) -> String {
    present(movie_key)
        .or_else(|| present(series_key))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Config {
        Config::new("test-key")
    }

    fn item(value: serde_json::Value) -> UpstreamItem {
        serde_json::from_value(value).expect("valid upstream item")
    }

    #[test]
    fn normalizes_movie_item() {
        let subject = normalize(
            item(json!({
                "id": 603,
                "title": "黑客帝国",
                "original_title": "The Matrix",
                "release_date": "1999-03-30",
                "poster_path": "/matrix.jpg",
                "vote_average": 8.2,
                "overview": "A hacker learns the truth."
            })),
            &config(),
        );
        assert_eq!(subject.id, "603");
        assert_eq!(subject.title, "黑客帝国");
        assert_eq!(subject.original_title, "The Matrix");
        assert_eq!(subject.year, "1999");
        assert_eq!(subject.subtype, "movie");
        assert_eq!(
            subject.images.large,
            "https://image.tmdb.org/t/p/w500/matrix.jpg"
        );
        assert_eq!(subject.images.medium, subject.images.large);
        assert_eq!(subject.images.small, subject.images.large);
        assert_eq!(subject.rating.average, 8.2);
        assert_eq!(subject.summary, "A hacker learns the truth.");
    }

    #[test]
    fn normalizes_series_item_with_series_keys() {
        let subject = normalize(
            item(json!({
                "id": 1399,
                "name": "权力的游戏",
                "original_name": "Game of Thrones",
                "first_air_date": "2011-04-17",
                "vote_average": 8.4
            })),
            &config(),
        );
        assert_eq!(subject.title, "权力的游戏");
        assert_eq!(subject.original_title, "Game of Thrones");
        assert_eq!(subject.year, "2011");
        assert_eq!(subject.subtype, "tv");
    }

    #[test]
    fn movie_keys_win_over_series_keys() {
        let raw = item(json!({
            "id": 1,
            "title": "Movie Title",
            "name": "Series Name",
            "release_date": "2020-01-01",
            "first_air_date": "2019-01-01"
        }));
        assert!(raw.is_series());
        let subject = normalize(raw, &config());
        assert_eq!(subject.title, "Movie Title");
        assert_eq!(subject.year, "2020");
    }

    #[test]
    fn empty_movie_key_falls_back_to_series_key() {
        let subject = normalize(
            item(json!({ "id": 2, "title": "", "name": "Fallback" })),
            &config(),
        );
        assert_eq!(subject.title, "Fallback");
    }

    #[test]
    fn item_without_series_date_is_movie() {
        let raw = item(json!({ "id": 3, "name": "Only a name" }));
        assert!(!raw.is_series());
        assert_eq!(raw.kind(), MediaKind::Movie);
        let empty_date = item(json!({ "id": 4, "first_air_date": "" }));
        assert_eq!(empty_date.kind(), MediaKind::Movie);
    }

    #[test]
    fn media_type_beats_air_date_for_subtype() {
        let upcoming = item(json!({ "id": 5, "media_type": "tv", "name": "Not aired yet" }));
        assert_eq!(upcoming.kind(), MediaKind::Tv);
        assert_eq!(normalize(upcoming, &config()).subtype, "tv");

        let odd = item(json!({ "id": 6, "media_type": "movie", "first_air_date": "2020-01-01" }));
        assert_eq!(odd.kind(), MediaKind::Movie);
    }

    #[test]
    fn known_kind_sets_subtype() {
        let raw = item(json!({ "id": 8, "name": "Upcoming Show" }));
        let subject = normalize_as(raw, MediaKind::Tv, &config());
        assert_eq!(subject.subtype, "tv");
        assert_eq!(subject.title, "Upcoming Show");
        assert_eq!(subject.year, "");
    }

    #[test]
    fn id_only_item_gets_defaults() {
        let subject = normalize(item(json!({ "id": 42 })), &config());
        assert_eq!(subject.id, "42");
        assert_eq!(subject.title, "");
        assert_eq!(subject.original_title, "");
        assert_eq!(subject.year, "");
        assert_eq!(subject.summary, "");
        assert_eq!(subject.rating.average, 0.0);
        assert_eq!(subject.images.large, config().placeholder_image);
        assert_eq!(subject.images.small, config().placeholder_image);
        assert!(subject.genres.is_empty());
        assert!(subject.casts.is_empty());
        assert!(subject.directors.is_empty());
    }

    #[test]
    fn string_ids_pass_through() {
        let subject = normalize(item(json!({ "id": "tt0133093" })), &config());
        assert_eq!(subject.id, "tt0133093");
    }

    #[test]
    fn year_is_date_prefix() {
        assert_eq!(extract_year("2023-05-01"), "2023");
        assert_eq!(extract_year("2023"), "2023");
        assert_eq!(extract_year(""), "");
    }

    #[test]
    fn parses_media_kind_aliases() {
        assert_eq!("movie".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!("TV".parse::<MediaKind>().unwrap(), MediaKind::Tv);
        assert_eq!("series".parse::<MediaKind>().unwrap(), MediaKind::Tv);
        assert!("person".parse::<MediaKind>().is_err());
        assert_eq!(MediaKind::from_media_type("person"), None);
    }

    #[test]
    fn serializes_legacy_field_names() {
        let value = serde_json::to_value(normalize(item(json!({ "id": 7 })), &config())).unwrap();
        for key in [
            "id",
            "title",
            "original_title",
            "year",
            "images",
            "rating",
            "genres",
            "casts",
            "directors",
            "summary",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert!(value["rating"].get("average").is_some());
    }
}
