//! ytbridge - progress-streaming web API and interactive CLI around yt-dlp and ffmpeg
//!
//! This library wraps two external tools (yt-dlp for extraction/downloading,
//! ffmpeg for muxing) behind a small HTTP API and an interactive prompt flow.
//! The actual media work is delegated entirely to the tools; the crate's job
//! is spawning them, translating their text output into structured progress
//! events, and relaying those events to the caller.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, process execution, path/naming utilities
//! - `download`: format listing/classification, progress parsing, the event stream, merging
//! - `server`: the axum HTTP surface (format listing + SSE progress feed)
//! - `interactive`: the prompt-driven command-line flow

pub mod cli;
pub mod core;
pub mod download;
pub mod interactive;
pub mod server;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::error::{AppError, AppResult};
