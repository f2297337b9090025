//! The progress-streaming bridge.
//!
//! Spawns one yt-dlp process per request and exposes its lifecycle as a
//! finite, non-restartable sequence of [`ProgressEvent`]s: a `starting`
//! event before launch, zero or more content events while it runs, and
//! exactly one terminal event (`finished` on exit 0, `error` otherwise, or
//! `error` immediately if the process could not be launched).
//!
//! The consumer drives the stream; if it goes away the driver task kills the
//! child so an abandoned request cannot leave a long-running download
//! orphaned.

use std::io::ErrorKind;
use std::path::Path;

use futures_util::stream::{self, Stream};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::core::config::{self, Config};
use crate::download::formats::resolve_selector;
use crate::download::progress::{parse_line, ProgressEvent};

/// One download request. Input only; never persisted beyond the stream.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Quality selector; required for single items, ignored for playlists.
    pub quality: Option<String>,
    /// Resolved destination directory (already created by the caller).
    pub download_path: std::path::PathBuf,
    pub is_playlist: bool,
}

/// Start a download and return its event stream.
///
/// The returned stream is finite and not restartable; a new request starts a
/// new stream. Dropping it terminates the underlying process.
pub fn stream_download(config: Config, request: DownloadRequest) -> impl Stream<Item = ProgressEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let args = build_download_args(&config, &request);
        run_streaming(&config.ytdlp_bin, args, tx).await;
    });

    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|ev| (ev, rx)) })
}

/// Build the yt-dlp argument list for a request.
///
/// Single items get the resolved selector (`+ba` appended when the caller
/// picked video only) and a flat title template; playlists get the fixed
/// capped-resolution policy and a per-playlist directory level.
fn build_download_args(config: &Config, request: &DownloadRequest) -> Vec<String> {
    let mut args = vec!["--newline".to_string()];

    let out_tmpl = if request.is_playlist {
        args.push("-f".to_string());
        args.push(config::playlist::DEFAULT_FORMAT.to_string());
        args.push("--yes-playlist".to_string());
        join_template(&request.download_path, "%(playlist_title,channel)s/%(title)s.%(ext)s")
    } else {
        let selector = resolve_selector(request.quality.as_deref().unwrap_or_default());
        args.push("-f".to_string());
        args.push(selector);
        args.push("--no-playlist".to_string());
        join_template(&request.download_path, "%(title)s.%(ext)s")
    };

    args.push("--ffmpeg-location".to_string());
    args.push(config.ffmpeg_bin.clone());
    args.push("-o".to_string());
    args.push(out_tmpl);
    args.push(request.url.clone());
    args
}

fn join_template(dir: &Path, tmpl: &str) -> String {
    dir.join(tmpl).to_string_lossy().into_owned()
}

/// Drive one external process, translating its combined output into events.
///
/// Emits `starting` first, then parsed content events, then exactly one
/// terminal event. Send failures and `tx.closed()` both mean the consumer is
/// gone; the child is killed and the task ends without a terminal event
/// (nobody is listening).
async fn run_streaming(bin: &str, args: Vec<String>, tx: UnboundedSender<ProgressEvent>) {
    if tx.send(ProgressEvent::Starting).is_err() {
        return;
    }

    log::info!("Spawning {} {}", bin, args.join(" "));

    let mut child = match crate::core::process::spawn_piped(bin, &args) {
        Ok(child) => child,
        Err(e) => {
            let message = if e.kind() == ErrorKind::NotFound {
                format!("Command not found: {}", bin)
            } else {
                format!("Failed to start {}: {}", bin, e)
            };
            log::error!("{}", message);
            let _ = tx.send(ProgressEvent::error(message));
            return;
        }
    };

    // Merge stdout and stderr into one line channel; yt-dlp splits its
    // chatter across both. Lines from each pipe keep their order, but
    // interleaving across the two pipes is not guaranteed; no recognized
    // pattern spans both.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, line_tx.clone()));
    }
    drop(line_tx);

    loop {
        tokio::select! {
            _ = tx.closed() => {
                log::info!("Consumer disconnected, terminating {}", bin);
                let _ = child.kill().await;
                return;
            }
            maybe_line = line_rx.recv() => match maybe_line {
                Some(line) => {
                    if let Some(event) = parse_line(&line) {
                        if tx.send(event).is_err() {
                            let _ = child.kill().await;
                            return;
                        }
                    }
                }
                None => break,
            }
        }
    }

    let terminal = match child.wait().await {
        Ok(status) if status.success() => ProgressEvent::Finished,
        Ok(status) => {
            let code = status.code().unwrap_or(-1);
            ProgressEvent::error(format!("yt-dlp exited with code {}", code))
        }
        Err(e) => ProgressEvent::error(format!("Failed to wait for {}: {}", bin, e)),
    };
    let _ = tx.send(terminal);
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, tx: UnboundedSender<String>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    /// Collect every event of a finished stream fed by a shell one-liner
    /// standing in for the external tool.
    async fn collect(script: &str) -> Vec<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        run_streaming("sh", vec!["-c".to_string(), script.to_string()], tx).await;
        let stream = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|ev| (ev, rx)) });
        stream.collect().await
    }

    #[tokio::test]
    async fn test_success_ends_with_single_finished() {
        let events = collect(
            "printf '[download]  42.5%% of 10.00MiB at 1.00MiB/s ETA 00:05\\nsome noise\\n'; exit 0",
        )
        .await;

        assert_eq!(events.first(), Some(&ProgressEvent::Starting));
        assert_eq!(events.last(), Some(&ProgressEvent::Finished));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgressEvent::Downloading { percent: Some(p), .. } if *p == 42.5)));
    }

    #[tokio::test]
    async fn test_failure_reports_exit_code_once() {
        let events = collect("exit 7").await;

        assert_eq!(events.first(), Some(&ProgressEvent::Starting));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        match events.last() {
            Some(ProgressEvent::Error { message }) => assert!(message.contains("code 7")),
            other => panic!("expected error terminal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_yields_error_event() {
        let (tx, rx) = mpsc::unbounded_channel();
        run_streaming("definitely-not-a-real-tool-xyz", vec![], tx).await;
        let events: Vec<_> =
            stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|ev| (ev, rx)) })
                .collect()
                .await;

        assert_eq!(events.first(), Some(&ProgressEvent::Starting));
        assert_eq!(events.len(), 2);
        match &events[1] {
            ProgressEvent::Error { message } => assert!(message.contains("not found")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stderr_lines_are_parsed_too() {
        let events = collect("printf 'ERROR: Video unavailable\\n' >&2; exit 1").await;
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgressEvent::Error { message } if message.contains("unavailable"))));
    }

    #[test]
    fn test_single_item_args_resolve_selector() {
        let config = test_config();
        let request = DownloadRequest {
            url: "https://example.com/v".to_string(),
            quality: Some("137".to_string()),
            download_path: "/tmp/dl".into(),
            is_playlist: false,
        };
        let args = build_download_args(&config, &request);
        let joined = args.join(" ");
        assert!(joined.contains("-f 137+ba"));
        assert!(joined.contains("--no-playlist"));
        assert!(joined.contains("--ffmpeg-location /usr/bin/ffmpeg"));
        assert!(joined.contains("/tmp/dl/%(title)s.%(ext)s"));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v"));
    }

    #[test]
    fn test_playlist_args_use_fixed_policy() {
        let config = test_config();
        let request = DownloadRequest {
            url: "https://example.com/playlist".to_string(),
            quality: Some("137".to_string()),
            download_path: "/tmp/dl".into(),
            is_playlist: true,
        };
        let args = build_download_args(&config, &request);
        let joined = args.join(" ");
        assert!(joined.contains(config::playlist::DEFAULT_FORMAT));
        assert!(joined.contains("--yes-playlist"));
        assert!(joined.contains("%(playlist_title,channel)s/%(title)s.%(ext)s"));
        // the caller's selector is ignored for playlists
        assert!(!joined.contains("137"));
    }

    fn test_config() -> Config {
        Config {
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "/usr/bin/ffmpeg".to_string(),
            download_folder: "/tmp/dl".to_string(),
            log_file: "test.log".to_string(),
            bind_addr: ([127, 0, 0, 1], 0).into(),
        }
    }
}
