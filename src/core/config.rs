use std::env;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration, resolved once at startup and threaded through
/// explicitly instead of being read from ambient globals.
///
/// Binary paths honour the `YTDL_BIN` / `FFMPEG_BIN` environment variables,
/// then fall back to a PATH probe, then to the bare tool name (letting the
/// OS resolve it at spawn time).
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the yt-dlp executable
    pub ytdlp_bin: String,
    /// Path to the ffmpeg executable
    pub ffmpeg_bin: String,
    /// Default destination directory for downloads
    /// Supports tilde (~) expansion for home directory
    pub download_folder: String,
    /// Log file path
    pub log_file: String,
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Build the configuration from environment variables, applying defaults
    /// for anything unset. Call after loading `.env`.
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));

        Self {
            ytdlp_bin: resolve_binary("YTDL_BIN", "yt-dlp"),
            ffmpeg_bin: resolve_binary("FFMPEG_BIN", "ffmpeg"),
            download_folder: env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "~/downloads".to_string()),
            log_file: env::var("LOG_FILE_PATH").unwrap_or_else(|_| "ytbridge.log".to_string()),
            bind_addr,
        }
    }
}

/// Resolve a tool binary: env override first, then a PATH probe, then the
/// bare name as a last resort.
fn resolve_binary(env_key: &str, name: &str) -> String {
    if let Ok(explicit) = env::var(env_key) {
        if !explicit.trim().is_empty() {
            return explicit;
        }
    }

    if let Some(found) = find_in_path(name) {
        return found;
    }

    name.to_string()
}

/// Scan the PATH entries for an executable with the given name.
fn find_in_path(name: &str) -> Option<String> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate.to_string_lossy().into_owned());
        }
    }
    None
}

/// Metadata probe configuration
pub mod probe {
    use super::Duration;

    /// Timeout for `-J` metadata queries (seconds). Downloads themselves are
    /// unbounded; only the format listing gets a ceiling.
    pub const TIMEOUT_SECS: u64 = 120;

    /// Probe timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

/// Playlist download policy
pub mod playlist {
    /// Format selector applied uniformly to every playlist entry:
    /// <=720p video + best audio if available, else best muxed <=720p.
    pub const DEFAULT_FORMAT: &str = "bv*[height<=720]+ba/b[height<=720]";
}

/// Returns true when the configured binary looks resolvable: either an
/// existing file path or a bare name (which the OS will search for).
pub fn binary_looks_present(bin: &str) -> bool {
    let p = Path::new(bin);
    if p.components().count() > 1 {
        return p.is_file();
    }
    find_in_path(bin).is_some()
}
