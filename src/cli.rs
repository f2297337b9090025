use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ytbridge")]
#[command(author, version, about = "Web API and interactive CLI around yt-dlp and ffmpeg", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (format listing + SSE download progress)
    Serve {
        /// Bind address, e.g. 0.0.0.0:5000 (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Download a single video or a playlist interactively
    Interactive,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
