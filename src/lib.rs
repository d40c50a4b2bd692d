//! Reclip - Telegram bot that swaps short-video links for the videos themselves
//!
//! The bot watches chat messages for links to short-video platforms
//! (YouTube Shorts, TikTok, Instagram Reels), downloads the referenced
//! video, re-uploads it into the same chat and deletes the original
//! message so the chat ends up with the video instead of the link.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors and logging
//! - `links`: Link recognition (message text -> video references)
//! - `download`: Download adapter around yt-dlp plus the Instagram
//!   direct extractor
//! - `telegram`: Transport wrapper, handler tree and the per-message
//!   replacement flow

pub mod cli;
pub mod core;
pub mod download;
pub mod links;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::config::{DeletePolicy, DownloadPolicy, Settings};
pub use crate::core::error::{AppError, AppResult};
pub use crate::download::{DownloadFailure, DownloadedFile, FailureReason, VideoFetcher, YtDlpFetcher};
pub use crate::links::{find_references, Platform, VideoReference};
pub use crate::telegram::{replace_message_links, ChatTransport, HandlerDeps};
