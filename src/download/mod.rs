//! Download management
//!
//! The [`VideoFetcher`] trait is the seam between the replacement flow and
//! the actual downloading machinery; [`YtDlpFetcher`] is the production
//! implementation (yt-dlp subprocess, with a direct HTTP extractor for
//! Instagram).

pub mod error;
pub mod fetcher;
pub mod instagram;
pub mod ytdlp;

// Re-exports for convenience
pub use error::{DownloadFailure, FailureReason};
pub use fetcher::{clean_download_dir, DownloadedFile, VideoFetcher, YtDlpFetcher};
