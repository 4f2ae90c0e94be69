use crate::catalog::Catalog;
use crate::config::Config;
use crate::subject::{MediaKind, Subject};
use crate::tmdb::{TmdbClient, UpstreamApi};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

const DEFAULT_TAG: &str = "hot";
const DEFAULT_PAGE_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
}

impl AppState {
    pub fn new(upstream: Arc<dyn UpstreamApi>, config: Config) -> Self {
        Self {
            catalog: Catalog::new(upstream, config),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<Subject>,
}

/// Query string of the legacy `j/search_subjects` endpoint.
#[derive(Debug, Deserialize)]
struct LegacyListQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    tag: Option<String>,
    page_start: Option<u32>,
    page_limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    tag: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
    page: Option<u32>,
}

pub async fn run_server(config: Config) -> Result<()> {
    let addr = config.bind_addr;
    let tmdb: Arc<dyn UpstreamApi> = Arc::new(TmdbClient::new(config.clone())?);
    info!(
        "Using upstream {} with language {}",
        config.base_url, config.language
    );
    let app = build_router(AppState::new(tmdb, config));

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/j/search_subjects", get(legacy_list))
        .route("/j/subject_suggest", get(search))
        .route("/api/subjects/:kind", get(list))
        .route("/api/search", get(search))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn legacy_list(
    State(state): State<AppState>,
    Query(query): Query<LegacyListQuery>,
) -> Response {
    let kind = match parse_kind(query.kind.as_deref().unwrap_or("movie")) {
        Ok(kind) => kind,
        Err(res) => return res,
    };
    let limit = query
        .page_limit
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_PAGE_LIMIT);
    let page = page_from_offset(query.page_start.unwrap_or(0), limit);
    let tag = query.tag.as_deref().unwrap_or(DEFAULT_TAG);
    debug!(
        kind = %kind,
        tag = %tag,
        page_start = ?query.page_start,
        page,
        "Legacy list request"
    );

    let subjects = state.catalog.list_subjects(kind, tag, page, limit).await;
    Json(SubjectsResponse { subjects }).into_response()
}

async fn list(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(res) => return res,
    };
    let tag = query.tag.as_deref().unwrap_or(DEFAULT_TAG);
    let subjects = state
        .catalog
        .list_subjects(
            kind,
            tag,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        )
        .await;
    Json(SubjectsResponse { subjects }).into_response()
}

async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let q = query.q.unwrap_or_default();
    let subjects = state
        .catalog
        .search_subjects(&q, query.page.unwrap_or(1))
        .await;
    Json(SubjectsResponse { subjects }).into_response()
}

fn parse_kind(raw: &str) -> std::result::Result<MediaKind, Response> {
    raw.parse::<MediaKind>().map_err(|e| {
        warn!("Rejecting request: unsupported media kind '{}'", raw);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response()
    })
}

/// Legacy clients page by item offset; TMDB pages are 1-based.
pub fn page_from_offset(page_start: u32, page_limit: u32) -> u32 {
    (page_start / page_limit.max(1)).saturating_add(1)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_map_to_pages() {
        assert_eq!(page_from_offset(0, 20), 1);
        assert_eq!(page_from_offset(19, 20), 1);
        assert_eq!(page_from_offset(20, 20), 2);
        assert_eq!(page_from_offset(60, 20), 4);
        assert_eq!(page_from_offset(5, 0), 6);
        assert_eq!(page_from_offset(u32::MAX, 1), u32::MAX);
        assert_eq!(page_from_offset(u32::MAX, 0), u32::MAX);
    }
}
