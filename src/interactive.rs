//! Interactive terminal flow: prompt for a URL, pick a video format from a
//! numbered menu, download the video and best-audio tracks separately and
//! merge them with ffmpeg. Playlists are downloaded entry by entry with a
//! fixed quality cap instead.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::core::config::{playlist, Config};
use crate::core::error::{AppError, AppResult};
use crate::core::process::run_once;
use crate::core::utils::{human_bytes, safe_filename};
use crate::download::formats::{fetch_formats, fetch_playlist_entries, MediaFormat};
use crate::download::merge::merge_av;

const VIDEO_TEMP: &str = "video_temp.mp4";
const AUDIO_TEMP: &str = "audio_temp.m4a";

/// Removes intermediate download files when the flow exits, on success and
/// on every error path alike.
struct TempCleanup {
    files: Vec<PathBuf>,
}

impl Drop for TempCleanup {
    fn drop(&mut self) {
        for file in &self.files {
            if file.exists() {
                if let Err(e) = fs::remove_file(file) {
                    log::warn!("Failed to remove temp file {}: {}", file.display(), e);
                }
            }
        }
    }
}

/// Entry point for the interactive mode.
pub async fn run(config: &Config) -> AppResult<()> {
    let url = prompt("Enter the video or playlist URL: ")?;
    if url.is_empty() {
        return Err(AppError::InvalidRequest("No URL given".into()));
    }

    let answer = prompt("Is this a playlist? [y/N]: ")?;
    if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
        download_playlist(config, &url).await
    } else {
        download_single(config, &url).await
    }
}

async fn download_single(config: &Config, url: &str) -> AppResult<()> {
    println!("Fetching available formats...");
    let info = fetch_formats(config, url).await?;
    if info.video_formats.is_empty() || info.audio_formats.is_empty() {
        return Err(AppError::NoFormatsFound);
    }

    println!("\n{}\n", info.title);
    print_format_menu(&info.video_formats);
    let video = pick_format(&info.video_formats)?;
    // Lists are sorted best-first, so the top audio entry wins.
    let audio = &info.audio_formats[0];

    let _cleanup = TempCleanup {
        files: vec![PathBuf::from(VIDEO_TEMP), PathBuf::from(AUDIO_TEMP)],
    };

    println!("Downloading video track ({})...", video.format_id);
    download_track(config, url, &video.format_id, VIDEO_TEMP).await?;
    println!("Downloading audio track ({})...", audio.format_id);
    download_track(config, url, &audio.format_id, AUDIO_TEMP).await?;

    let output = format!("{}.mp4", safe_filename(&info.title));
    println!("Merging into {}...", output);
    merge_av(
        config,
        Path::new(VIDEO_TEMP),
        Path::new(AUDIO_TEMP),
        Path::new(&output),
    )
    .await?;

    println!("Done: {}", output);
    Ok(())
}

async fn download_playlist(config: &Config, url: &str) -> AppResult<()> {
    println!("Fetching playlist entries...");
    let entries = fetch_playlist_entries(config, url).await?;
    println!("Found {} entries.", entries.len());

    let mut failed = 0usize;
    for (index, entry) in entries.iter().enumerate() {
        let title = entry.title.as_deref().unwrap_or("untitled");
        println!("[{}/{}] {}", index + 1, entries.len(), title);

        let Some(entry_url) = entry.url.as_deref() else {
            log::warn!("Skipping playlist entry without a URL: {}", title);
            failed += 1;
            continue;
        };

        let template = format!("{}.%(ext)s", safe_filename(title));
        let result = run_checked(
            &config.ytdlp_bin,
            &[
                "-f",
                playlist::DEFAULT_FORMAT,
                "--no-playlist",
                "--ffmpeg-location",
                config.ffmpeg_bin.as_str(),
                "-o",
                template.as_str(),
                entry_url,
            ],
        )
        .await;

        if let Err(e) = result {
            // One broken entry must not sink the rest of the playlist.
            log::error!("Playlist entry failed ({}): {}", entry_url, e);
            failed += 1;
        }
    }

    if failed > 0 {
        println!("Finished with {} failed entries.", failed);
    } else {
        println!("Playlist downloaded.");
    }
    Ok(())
}

async fn download_track(config: &Config, url: &str, format_id: &str, output: &str) -> AppResult<()> {
    run_checked(
        &config.ytdlp_bin,
        &["-f", format_id, "--no-playlist", "-o", output, url],
    )
    .await
}

async fn run_checked(bin: &str, args: &[&str]) -> AppResult<()> {
    let output = run_once(bin, args).await;
    if output.not_found() {
        return Err(AppError::ExecutableNotFound(bin.to_string()));
    }
    if !output.success() {
        log::error!("{} failed: {}", bin, output.stderr.trim());
        return Err(AppError::ProcessFailed(output.code));
    }
    Ok(())
}

fn print_format_menu(formats: &[MediaFormat]) {
    for (index, f) in formats.iter().enumerate() {
        let height = f
            .height
            .map(|h| format!("{}p", h))
            .unwrap_or_else(|| "?".to_string());
        let size = f
            .filesize
            .map(human_bytes)
            .unwrap_or_else(|| "unknown size".to_string());
        println!(
            "  {:>2}. {:<8} {:>6} {:<5} {}",
            index + 1,
            f.format_id,
            height,
            f.ext.as_deref().unwrap_or("?"),
            size
        );
    }
}

fn pick_format(formats: &[MediaFormat]) -> AppResult<&MediaFormat> {
    loop {
        let choice = prompt("\nPick a video format by number: ")?;
        match choice.parse::<usize>() {
            Ok(n) if n >= 1 && n <= formats.len() => return Ok(&formats[n - 1]),
            _ => println!("Enter a number between 1 and {}.", formats.len()),
        }
    }
}

fn prompt(message: &str) -> AppResult<String> {
    print!("{}", message);
    io::stdout().flush()?;
    read_prompt_line(&mut io::stdin().lock())
}

/// Reads one answer. A zero-byte read means stdin is closed; retry loops
/// must fail then, not spin on empty answers.
fn read_prompt_line<R: BufRead>(reader: &mut R) -> AppResult<String> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Err(AppError::InvalidRequest("end of input".into()));
    }
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_prompt_line_trims_answer() {
        let mut input = Cursor::new("  3  \n");
        assert_eq!(read_prompt_line(&mut input).unwrap(), "3");
    }

    #[test]
    fn test_closed_stdin_is_an_error_not_an_empty_answer() {
        // A retry loop fed by this must terminate instead of spinning.
        let mut input = Cursor::new("");
        let err = read_prompt_line(&mut input).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        let mut exhausted = Cursor::new("bogus\n");
        assert_eq!(read_prompt_line(&mut exhausted).unwrap(), "bogus");
        assert!(read_prompt_line(&mut exhausted).is_err());
    }
}
