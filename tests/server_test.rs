//! Router-level tests for the request validation paths. Every request here
//! is answered before any external tool would be spawned, so the tests run
//! without yt-dlp installed.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use ytbridge::core::config::Config;
use ytbridge::server::router;

fn test_config() -> Config {
    Config {
        ytdlp_bin: "yt-dlp".to_string(),
        ffmpeg_bin: "ffmpeg".to_string(),
        download_folder: std::env::temp_dir().to_string_lossy().into_owned(),
        log_file: "ytbridge.log".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    }
}

async fn json_body(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn get_formats_without_url_is_rejected() {
    let app = router(test_config());
    let response = app
        .oneshot(Request::get("/get_formats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing url");
}

#[tokio::test]
async fn get_formats_accepts_url_in_json_body() {
    // A playlist URL short-circuits before yt-dlp is invoked.
    let app = router(test_config());
    let request = Request::post("/get_formats")
        .header("content-type", "application/json")
        .body(Body::from(
            r#"{"url": "https://www.youtube.com/playlist?list=PLx"}"#,
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["is_playlist"], true);
    assert_eq!(body["video_formats"], Value::Array(vec![]));
    assert_eq!(body["audio_formats"], Value::Array(vec![]));
}

#[tokio::test]
async fn get_formats_playlist_url_in_query() {
    let app = router(test_config());
    let response = app
        .oneshot(
            Request::get("/get_formats?url=https%3A%2F%2Fyoutube.com%2Fwatch%3Fv%3Dabc%26list%3DPLx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["is_playlist"], true);
    assert_eq!(body["title"], "Playlist");
}

#[tokio::test]
async fn progress_without_url_is_rejected() {
    let app = router(test_config());
    let response = app
        .oneshot(Request::get("/progress").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing url");
}

#[tokio::test]
async fn progress_single_video_requires_quality() {
    let app = router(test_config());
    let response = app
        .oneshot(
            Request::get("/progress?url=https%3A%2F%2Fyoutube.com%2Fwatch%3Fv%3Dabc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(
        body["error"],
        "Missing quality (vfmt or vfmt+afmt) for single video"
    );
}

#[tokio::test]
async fn progress_treats_blank_quality_as_missing() {
    let app = router(test_config());
    let response = app
        .oneshot(
            Request::get("/progress?url=https%3A%2F%2Fyoutube.com%2Fwatch%3Fv%3Dabc&quality=%20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn index_responds_without_frontend_assets() {
    let app = router(test_config());
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
