use anyhow::Result;
use dotenvy::dotenv;

use ytbridge::cli::{Cli, Commands};
use ytbridge::core::config::{binary_looks_present, Config};
use ytbridge::core::logging::init_logger;
use ytbridge::{interactive, server};

/// Parses CLI arguments and dispatches to the web server or the
/// interactive downloader.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let mut config = Config::from_env();
    init_logger(&config.log_file)?;

    for (tool, bin) in [("yt-dlp", &config.ytdlp_bin), ("ffmpeg", &config.ffmpeg_bin)] {
        if !binary_looks_present(bin) {
            log::warn!("{} not found at '{}'; downloads will fail until it is installed", tool, bin);
        }
    }

    match cli.command {
        Some(Commands::Serve { bind }) => {
            if let Some(bind) = bind {
                config.bind_addr = bind.parse()?;
            }
            log::info!("Using yt-dlp: {}", config.ytdlp_bin);
            log::info!("Using ffmpeg: {}", config.ffmpeg_bin);
            server::serve(config).await
        }
        Some(Commands::Interactive) | None => {
            interactive::run(&config).await?;
            Ok(())
        }
    }
}
