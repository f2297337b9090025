//! Format listing and classification.
//!
//! Queries yt-dlp's JSON description of a resource (`-J`) and partitions the
//! reported formats into video-only and audio-only lists with a
//! deterministic sort order. Playlist URLs short-circuit the listing
//! entirely: per-item format enumeration is out of scope, so they come back
//! with a playlist flag and empty lists.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::config::{self, Config};
use crate::core::error::{AppError, AppResult};
use crate::core::process;
use crate::core::utils::human_bytes;

/// One selectable format as reported by yt-dlp, reduced to the fields the
/// caller needs to pick a quality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaFormat {
    pub format_id: String,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub ext: Option<String>,
    pub abr: Option<f64>,
    pub filesize: Option<u64>,
    pub filesize_hr: Option<String>,
}

/// Result of a format query for a single URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatQueryResult {
    pub title: String,
    pub is_playlist: bool,
    pub video_formats: Vec<MediaFormat>,
    pub audio_formats: Vec<MediaFormat>,
}

impl FormatQueryResult {
    fn playlist(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_playlist: true,
            video_formats: Vec::new(),
            audio_formats: Vec::new(),
        }
    }
}

/// Raw yt-dlp `-J` payload, only the fields we read.
#[derive(Debug, Deserialize)]
struct RawProbe {
    title: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
    #[serde(default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    fps: Option<f64>,
    ext: Option<String>,
    abr: Option<f64>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
}

/// One entry of a flattened playlist listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    pub url: Option<String>,
    pub title: Option<String>,
}

/// Heuristic playlist detection on the URL alone.
pub fn is_probably_playlist(url: &str) -> bool {
    let u = url.to_lowercase();
    u.contains("list=") || u.contains("/playlist")
}

/// Resolves a caller-supplied quality selector for a single item.
///
/// A selector already containing a combinator is used verbatim; otherwise it
/// is treated as video-only and merged with best audio.
pub fn resolve_selector(quality: &str) -> String {
    if quality.contains('+') {
        quality.to_string()
    } else {
        format!("{}+ba", quality)
    }
}

/// Fetch and classify the available formats for a URL.
///
/// Playlist URLs (or anything yt-dlp reports as an entry list) skip format
/// enumeration. Ambiguous URLs are probed twice, mirroring yt-dlp's own
/// behavior: first with `--no-playlist`, then without it.
pub async fn fetch_formats(config: &Config, url: &str) -> AppResult<FormatQueryResult> {
    if is_probably_playlist(url) {
        return Ok(FormatQueryResult::playlist("Playlist"));
    }

    let first = probe(config, url, &["--no-playlist"]).await;

    let probe_data = match first {
        Ok(data) if !data.formats.is_empty() => data,
        first_outcome => {
            // Fallback without --no-playlist for ambiguous URLs
            match probe(config, url, &[]).await {
                Ok(data) if !data.formats.is_empty() => data,
                Ok(data) if !data.entries.is_empty() => {
                    let title = data.title.unwrap_or_else(|| "Playlist".to_string());
                    return Ok(FormatQueryResult::playlist(title));
                }
                // The fallback ran last; its error is the one reported
                Ok(_) => return Err(first_outcome.err().unwrap_or(AppError::NoFormatsFound)),
                Err(e) => return Err(e),
            }
        }
    };

    let (video_formats, audio_formats) = classify_formats(&probe_data.formats);

    Ok(FormatQueryResult {
        title: probe_data.title.unwrap_or_else(|| "video".to_string()),
        is_playlist: false,
        video_formats,
        audio_formats,
    })
}

/// Fetch the flattened entry list of a playlist (interactive flow).
pub async fn fetch_playlist_entries(config: &Config, url: &str) -> AppResult<Vec<RawEntry>> {
    let data = probe(config, url, &["--flat-playlist"]).await?;
    if data.entries.is_empty() {
        return Err(AppError::NoFormatsFound);
    }
    Ok(data.entries)
}

/// Run one `-J` query and parse the JSON payload.
async fn probe(config: &Config, url: &str, extra_args: &[&str]) -> AppResult<RawProbe> {
    let mut args = vec!["-J"];
    args.extend_from_slice(extra_args);
    args.push(url);

    let out = process::run_once_with_timeout(&config.ytdlp_bin, &args, config::probe::timeout()).await;
    parse_probe_output(&config.ytdlp_bin, out)
}

/// Interpret one probe result. Exit 124 (timeout) and -1 (spawn fault) are
/// synthetic results whose stderr is an explanation rather than tool
/// output, so it must never reach the JSON parser.
fn parse_probe_output(bin: &str, out: process::CommandOutput) -> AppResult<RawProbe> {
    if out.not_found() {
        return Err(AppError::ExecutableNotFound(bin.to_string()));
    }
    if out.code == 124 || out.code == -1 {
        log::warn!("yt-dlp probe aborted: {}", out.stderr.trim());
        return Err(AppError::NoOutput(format!("{} ({})", bin, out.stderr.trim())));
    }

    // yt-dlp occasionally writes the JSON to stderr when exiting non-zero
    let raw = if out.stdout.trim().is_empty() {
        out.stderr.trim().to_string()
    } else {
        out.stdout.trim().to_string()
    };

    if raw.is_empty() {
        log::warn!("yt-dlp produced no output (exit {})", out.code);
        return Err(AppError::NoOutput(format!("{} (exit {})", bin, out.code)));
    }

    serde_json::from_str(&raw).map_err(|e| AppError::MalformedOutput(format!("yt-dlp JSON: {}", e)))
}

/// Partition formats into (video-only, audio-only), each sorted descending.
///
/// A format is video-only iff it reports a video codec and no audio codec,
/// audio-only iff the reverse; muxed and codec-less entries land in neither
/// list. Video sorts by (height, fps), audio by bitrate, missing values
/// treated as zero.
fn classify_formats(formats: &[RawFormat]) -> (Vec<MediaFormat>, Vec<MediaFormat>) {
    let mut video = Vec::new();
    let mut audio = Vec::new();

    for f in formats {
        let has_video = f.vcodec.as_deref().is_some_and(|v| v != "none");
        let has_audio = f.acodec.as_deref().is_some_and(|a| a != "none");

        let item = to_media_format(f);
        match (has_video, has_audio) {
            (true, false) => video.push(item),
            (false, true) => audio.push(item),
            _ => {}
        }
    }

    video.sort_by(|a, b| {
        let key = |m: &MediaFormat| (m.height.unwrap_or(0), m.fps.unwrap_or(0.0));
        let (ha, fa) = key(a);
        let (hb, fb) = key(b);
        hb.cmp(&ha).then_with(|| fb.partial_cmp(&fa).unwrap_or(Ordering::Equal))
    });

    audio.sort_by(|a, b| {
        b.abr
            .unwrap_or(0.0)
            .partial_cmp(&a.abr.unwrap_or(0.0))
            .unwrap_or(Ordering::Equal)
    });

    (video, audio)
}

fn to_media_format(f: &RawFormat) -> MediaFormat {
    let size = f.filesize.or(f.filesize_approx).map(|s| s as u64);
    MediaFormat {
        format_id: f.format_id.clone().unwrap_or_default(),
        height: f.height,
        fps: f.fps,
        ext: f.ext.clone(),
        abr: f.abr,
        filesize: size,
        filesize_hr: size.map(human_bytes),
    }
}
