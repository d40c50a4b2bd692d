use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use reclip::cli::{Cli, Commands};
use reclip::core::config::Settings;
use reclip::core::logging::init_logger;
use reclip::download::{clean_download_dir, ytdlp, VideoFetcher, YtDlpFetcher};
use reclip::links;
use reclip::telegram::{create_bot, schema, HandlerDeps, TelegramTransport};

/// Main entry point for the bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging, bot
/// creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // A panic inside a handler must be logged, not silently swallowed by
    // the dispatcher task.
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    let settings = Settings::from_env()?;
    init_logger(&settings.log_file, settings.log_level)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot(settings).await,
        Some(Commands::Download { url, output }) => run_cli_download(settings, url, output).await,
        Some(Commands::Ytdlp) => {
            let version = ytdlp::version(&settings.ytdl_bin).await?;
            println!("yt-dlp version: {}", version);
            Ok(())
        }
    }
}

/// Run the bot with long polling until interrupted.
async fn run_bot(settings: Settings) -> Result<()> {
    if settings.bot_token.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }

    prepare_download_dir(&settings);
    log_ytdlp_version(&settings.ytdl_bin).await;

    let bot = create_bot(&settings.bot_token);
    let settings = Arc::new(settings);
    let transport = Arc::new(TelegramTransport::new(bot.clone(), settings.policy.upload_timeout));
    let fetcher: Arc<dyn VideoFetcher> = Arc::new(YtDlpFetcher::new(settings.ytdl_bin.clone())?);

    let deps = HandlerDeps {
        transport,
        fetcher,
        settings: Arc::clone(&settings),
    };

    log::info!(
        "Starting reclip (quality <= {}p, size cap {} MB, delete policy {:?})",
        settings.policy.target_quality,
        settings.policy.max_file_size_bytes / (1024 * 1024),
        settings.delete_policy
    );

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Bot shutting down");
    prepare_download_dir(&settings);

    Ok(())
}

/// One-shot download without Telegram, for trying links from a shell.
async fn run_cli_download(settings: Settings, url: String, output: Option<String>) -> Result<()> {
    let references = links::find_references(&url);
    let reference = references
        .first()
        .ok_or_else(|| anyhow::anyhow!("'{}' is not a supported short-video link", url))?;

    let mut policy = settings.policy.clone();
    if let Some(dir) = output {
        policy.download_dir = PathBuf::from(shellexpand::tilde(&dir).into_owned());
    }

    println!("Downloading {} video {}...", reference.platform, reference.video_id);

    let fetcher = YtDlpFetcher::new(settings.ytdl_bin.clone())?;
    match fetcher.fetch(reference, &policy).await {
        Ok(file) => {
            println!("Saved {} ({} bytes)", file.path.display(), file.size_bytes);
            Ok(())
        }
        Err(failure) => Err(anyhow::anyhow!("download failed: {}", failure)),
    }
}

/// Create the download directory and drop temp files left over from a
/// previous run.
fn prepare_download_dir(settings: &Settings) {
    let dir = &settings.policy.download_dir;
    if let Err(e) = std::fs::create_dir_all(dir) {
        log::error!("Failed to create download directory {}: {}", dir.display(), e);
        return;
    }
    match clean_download_dir(dir) {
        Ok(0) => {}
        Ok(n) => log::info!("Removed {} stale temp file(s) from {}", n, dir.display()),
        Err(e) => log::warn!("Failed to clean download directory {}: {}", dir.display(), e),
    }
}

async fn log_ytdlp_version(bin: &str) {
    match ytdlp::version(bin).await {
        Ok(version) => log::info!("yt-dlp version: {}", version),
        Err(e) => log::warn!("Could not determine yt-dlp version: {}. Downloads may fail.", e),
    }
}
