use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reclip")]
#[command(author, version, about = "Telegram bot that replaces short-video links with the video itself", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Download a single short-video URL to disk, without Telegram
    Download {
        /// YouTube Shorts / TikTok / Instagram Reels URL
        url: String,

        /// Directory to write the file into (defaults to DOWNLOAD_DIR)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the detected yt-dlp version and exit
    Ytdlp,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
