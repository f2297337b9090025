//! Direct ffmpeg muxing for the two-step interactive flow.
//!
//! The HTTP path lets yt-dlp drive ffmpeg itself (`--ffmpeg-location`); the
//! interactive flow downloads video and audio separately and stitches them
//! here with a stream copy, no transcoding.

use std::path::Path;

use crate::core::config::Config;
use crate::core::error::{AppError, AppResult};
use crate::core::process;

/// Mux a video file and an audio file into one output container.
pub async fn merge_av(config: &Config, video: &Path, audio: &Path, output: &Path) -> AppResult<()> {
    let video = video.to_string_lossy();
    let audio = audio.to_string_lossy();
    let output = output.to_string_lossy();

    let args = [
        "-y",
        "-i",
        video.as_ref(),
        "-i",
        audio.as_ref(),
        "-c",
        "copy",
        output.as_ref(),
    ];

    log::info!("Merging {} + {} -> {}", video, audio, output);
    let out = process::run_once(&config.ffmpeg_bin, &args).await;

    if out.not_found() {
        return Err(AppError::ExecutableNotFound(config.ffmpeg_bin.clone()));
    }
    if !out.success() {
        log::error!("ffmpeg failed (exit {}): {}", out.code, out.stderr.trim());
        return Err(AppError::ProcessFailed(out.code));
    }

    Ok(())
}
