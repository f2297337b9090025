//! yt-dlp output line parsing.
//!
//! yt-dlp's `--newline` output is human-oriented text, so every pattern here
//! is a best-effort heuristic. Recognized lines map to exactly one event;
//! anything unrecognized is dropped to keep the event stream low-noise.
//! An unmatched or half-matched line must never abort the stream.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Example: "[download]  42.5% of 10.00MiB at 1.00MiB/s ETA 00:05"
static PROGRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[download\]\s+(?P<pct>\d{1,3}(?:\.\d+)?)%\s+of\s+(?P<size>\S+)\s+at\s+(?P<speed>\S+)\s+ETA\s+(?P<eta>\S+)")
        .expect("progress regex is valid")
});

/// Lifecycle event of one download, emitted in real time and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    Starting,
    Downloading {
        percent: Option<f64>,
        size: String,
        speed: String,
        eta: String,
    },
    Destination {
        message: String,
    },
    Already {
        message: String,
    },
    Merging {
        message: String,
    },
    Postprocess {
        message: String,
    },
    Info {
        message: String,
    },
    Error {
        message: String,
    },
    Finished,
}

impl ProgressEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error { message: message.into() }
    }

    /// True for the events that end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Finished | ProgressEvent::Error { .. })
    }
}

/// Maps one line of yt-dlp output to an event, first match wins.
///
/// Returns `None` for lines that match no known pattern; those are dropped
/// by the caller, not surfaced.
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    let line = line.trim_end();

    if let Some(caps) = PROGRESS_RE.captures(line) {
        // A percent that fails to parse degrades to null, not a dropped event
        let percent = caps.name("pct").and_then(|m| m.as_str().parse::<f64>().ok());
        return Some(ProgressEvent::Downloading {
            percent,
            size: caps["size"].to_string(),
            speed: caps["speed"].to_string(),
            eta: caps["eta"].to_string(),
        });
    }

    if let Some(rest) = line.strip_prefix("[download] Destination:") {
        return Some(ProgressEvent::Destination {
            message: rest.trim().to_string(),
        });
    }

    if line.contains("has already been downloaded") {
        return Some(ProgressEvent::Already {
            message: line.trim().to_string(),
        });
    }

    if line.starts_with("[Merger]") {
        return Some(ProgressEvent::Merging {
            message: line.trim().to_string(),
        });
    }

    if line.starts_with("[ExtractAudio]") {
        return Some(ProgressEvent::Postprocess {
            message: line.trim().to_string(),
        });
    }

    if line.starts_with("[youtube]") || line.starts_with("[info]") {
        return Some(ProgressEvent::Info {
            message: line.trim().to_string(),
        });
    }

    if line.starts_with("ERROR:") {
        return Some(ProgressEvent::Error {
            message: line.trim().to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_progress_line() {
        let ev = parse_line("[download]  42.5% of 10.00MiB at 1.00MiB/s ETA 00:05").unwrap();
        assert_eq!(
            ev,
            ProgressEvent::Downloading {
                percent: Some(42.5),
                size: "10.00MiB".to_string(),
                speed: "1.00MiB/s".to_string(),
                eta: "00:05".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_progress_integer_percent() {
        let ev = parse_line("[download] 100% of 3.50MiB at 2.10MiB/s ETA 00:00").unwrap();
        match ev {
            ProgressEvent::Downloading { percent, .. } => assert_eq!(percent, Some(100.0)),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_destination() {
        let ev = parse_line("[download] Destination: /tmp/My Video.mp4").unwrap();
        assert_eq!(
            ev,
            ProgressEvent::Destination {
                message: "/tmp/My Video.mp4".to_string()
            }
        );
    }

    #[test]
    fn test_parse_already_downloaded() {
        let ev = parse_line("[download] /tmp/My Video.mp4 has already been downloaded").unwrap();
        assert!(matches!(ev, ProgressEvent::Already { .. }));
    }

    #[test]
    fn test_parse_merger_and_postprocess() {
        assert!(matches!(
            parse_line("[Merger] Merging formats into \"out.mp4\"").unwrap(),
            ProgressEvent::Merging { .. }
        ));
        assert!(matches!(
            parse_line("[ExtractAudio] Destination: out.mp3").unwrap(),
            ProgressEvent::Postprocess { .. }
        ));
    }

    #[test]
    fn test_parse_info_markers() {
        assert!(matches!(
            parse_line("[youtube] abc123: Downloading webpage").unwrap(),
            ProgressEvent::Info { .. }
        ));
        assert!(matches!(
            parse_line("[info] Downloading 1 format(s): 137+140").unwrap(),
            ProgressEvent::Info { .. }
        ));
    }

    #[test]
    fn test_parse_error_line() {
        let ev = parse_line("ERROR: Video unavailable").unwrap();
        assert_eq!(
            ev,
            ProgressEvent::Error {
                message: "ERROR: Video unavailable".to_string()
            }
        );
    }

    #[test]
    fn test_unmatched_lines_are_dropped() {
        assert_eq!(parse_line("Deleting original file video.f137.mp4"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("[download] Resuming download at byte 12345"), None);
    }

    #[test]
    fn test_progress_wins_over_other_markers() {
        // A progress line also starts with "[download]"; the percent pattern
        // must take precedence over the destination prefix check.
        let ev = parse_line("[download]  12.3% of 12.34MiB at 1.23MiB/s ETA 00:11").unwrap();
        assert!(matches!(ev, ProgressEvent::Downloading { .. }));
    }

    #[test]
    fn test_serde_tags_match_wire_format() {
        let ev = ProgressEvent::Downloading {
            percent: Some(42.5),
            size: "10.00MiB".to_string(),
            speed: "1.00MiB/s".to_string(),
            eta: "00:05".to_string(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["status"], "downloading");
        assert_eq!(json["percent"], 42.5);

        assert_eq!(
            serde_json::to_value(ProgressEvent::Starting).unwrap()["status"],
            "starting"
        );
        assert_eq!(
            serde_json::to_value(ProgressEvent::Finished).unwrap()["status"],
            "finished"
        );
        assert_eq!(
            serde_json::to_value(ProgressEvent::error("x")).unwrap()["status"],
            "error"
        );
        assert_eq!(
            serde_json::to_value(ProgressEvent::Postprocess { message: "m".into() }).unwrap()["status"],
            "postprocess"
        );
    }
}
