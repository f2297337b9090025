//! Download-facing functionality: format listing and classification,
//! yt-dlp output parsing, the progress event stream, and ffmpeg merging.

pub mod formats;
pub mod merge;
pub mod progress;
pub mod stream;

pub use formats::{fetch_formats, resolve_selector, FormatQueryResult, MediaFormat};
pub use progress::ProgressEvent;
pub use stream::{stream_download, DownloadRequest};
