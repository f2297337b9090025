//! HTTP surface: format listing, the SSE progress feed, and the static
//! front-end assets.
//!
//! Pre-flight failures (missing input, format lookup errors) are JSON
//! `{"error": ...}` bodies with a non-2xx status; anything that goes wrong
//! after the download process has been spawned is reported as an
//! error-typed event inside the stream instead.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::core::config::Config;
use crate::core::error::AppError;
use crate::core::utils::safe_path;
use crate::download::formats::{fetch_formats, is_probably_playlist};
use crate::download::stream::{stream_download, DownloadRequest};

/// Shared state for the web server.
#[derive(Clone)]
struct AppState {
    config: Config,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr;
    let app = router(config);

    log::info!("Starting web server on http://{}", addr);
    log::info!("  /get_formats - Format listing (GET query or POST JSON)");
    log::info!("  /progress    - Download progress (SSE)");
    log::info!("  /            - Front-end page");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router. Split out so tests can drive it directly.
pub fn router(config: Config) -> Router {
    let state = AppState { config };

    Router::new()
        .route("/get_formats", get(get_formats_handler).post(get_formats_handler))
        .route("/progress", get(progress_handler))
        .route("/", get(index_handler))
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct UrlQuery {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlBody {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressQuery {
    url: Option<String>,
    quality: Option<String>,
    download_path: Option<String>,
    is_playlist: Option<String>,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// GET|POST /get_formats — list selectable formats for a URL.
///
/// The URL may arrive as a query parameter or in a JSON body; no external
/// tool is invoked until the input validates.
async fn get_formats_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
    body: Option<Json<UrlBody>>,
) -> Response {
    let url = query
        .url
        .or_else(|| body.and_then(|Json(b)| b.url))
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let Some(url) = url else {
        return error_body(StatusCode::BAD_REQUEST, "Missing url");
    };

    match fetch_formats(&state.config, &url).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            log::warn!("Format query failed for {}: {}", url, e);
            error_body(StatusCode::NOT_FOUND, e.to_string())
        }
    }
}

/// GET /progress — persistent event stream for one download.
async fn progress_handler(State(state): State<AppState>, Query(query): Query<ProgressQuery>) -> Response {
    let url = query
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    let Some(url) = url else {
        return error_body(StatusCode::BAD_REQUEST, "Missing url");
    };

    let force_playlist = query
        .is_playlist
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let playlist_mode = force_playlist || is_probably_playlist(&url);

    let quality = query
        .quality
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());
    if !playlist_mode && quality.is_none() {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Missing quality (vfmt or vfmt+afmt) for single video",
        );
    }

    let requested_path = query
        .download_path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| state.config.download_folder.clone());

    let download_path = match safe_path(&requested_path) {
        Ok(path) => path,
        Err(e) => {
            return error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                AppError::Io(e).to_string(),
            );
        }
    };

    let request = DownloadRequest {
        url,
        quality,
        download_path,
        is_playlist: playlist_mode,
    };

    let events = stream_download(state.config, request).map(|ev| {
        let payload = serde_json::to_string(&ev).unwrap_or_else(|_| r#"{"status":"error"}"#.to_string());
        Ok::<Event, Infallible>(Event::default().data(payload))
    });

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

/// GET / — the front-end page, when one is deployed next to the binary.
async fn index_handler() -> Response {
    match tokio::fs::read_to_string("index.html").await {
        Ok(html) => Html(html).into_response(),
        Err(_) => "Place index.html next to the ytbridge binary or host the frontend separately."
            .into_response(),
    }
}
