//! Structured download failures
//!
//! The downloader surfaces every external failure as a [`DownloadFailure`]
//! with a classified [`FailureReason`], so callers can pick a user-facing
//! message from the reason alone without ever inspecting raw yt-dlp output.

use std::fmt;

/// Why a download could not produce a usable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Connectivity problems or timeouts while talking to the platform.
    NetworkError,
    /// The platform refuses to serve the video in this region.
    GeoRestricted,
    /// The video is gone: private, deleted, or behind a login.
    Unavailable,
    /// The file came down fine but exceeds the configured size cap.
    TooLarge,
    /// The extractor no longer understands the page; usually means the
    /// platform changed its markup and yt-dlp needs an update.
    PlatformChanged,
    /// Anything we could not classify.
    Unknown,
}

impl FailureReason {
    /// Stable identifier for log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NetworkError => "network",
            FailureReason::GeoRestricted => "geo_restricted",
            FailureReason::Unavailable => "unavailable",
            FailureReason::TooLarge => "too_large",
            FailureReason::PlatformChanged => "platform_changed",
            FailureReason::Unknown => "unknown",
        }
    }
}

/// A failed download attempt: classified reason plus the underlying detail
/// for logs.
#[derive(Debug, Clone)]
pub struct DownloadFailure {
    pub reason: FailureReason,
    pub detail: String,
}

impl DownloadFailure {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    /// Text posted into the chat when this failure is user-visible.
    /// Written for people who neither know nor care what yt-dlp is.
    pub fn user_message(&self) -> String {
        match self.reason {
            FailureReason::NetworkError => {
                "❌ Network problem while downloading this video. Please try again later.".to_string()
            }
            FailureReason::GeoRestricted => {
                "❌ This video is region-restricted and can't be downloaded.".to_string()
            }
            FailureReason::Unavailable => {
                "❌ This video is unavailable. It may be private or deleted.".to_string()
            }
            FailureReason::TooLarge => format!("❌ This video is too large to re-upload: {}.", self.detail),
            FailureReason::PlatformChanged => {
                "❌ Couldn't read this video's page. The platform may have changed; try again in a few days."
                    .to_string()
            }
            FailureReason::Unknown => {
                "❌ Failed to download this video. Check that the link is correct.".to_string()
            }
        }
    }
}

// Display carries reason + detail so `{}` in a log line shows everything.
impl fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason.as_str(), self.detail)
    }
}

impl std::error::Error for DownloadFailure {}

/// Maps yt-dlp stderr onto a [`FailureReason`].
///
/// Pattern lists follow the messages yt-dlp actually emits; order matters
/// because several messages contain more than one trigger word.
pub fn classify_ytdlp_stderr(stderr: &str) -> FailureReason {
    let stderr = stderr.to_lowercase();

    if stderr.contains("not available in your country")
        || stderr.contains("geo restriction")
        || stderr.contains("geo-restricted")
        || stderr.contains("blocked it in your country")
    {
        return FailureReason::GeoRestricted;
    }

    if stderr.contains("video unavailable")
        || stderr.contains("private video")
        || stderr.contains("has been removed")
        || stderr.contains("does not exist")
        || stderr.contains("account has been terminated")
        || stderr.contains("sign in to confirm your age")
        || stderr.contains("login required")
        || stderr.contains("requires authentication")
    {
        return FailureReason::Unavailable;
    }

    if stderr.contains("unable to extract")
        || stderr.contains("unsupported url")
        || stderr.contains("signature extraction failed")
        || stderr.contains("no video formats found")
    {
        return FailureReason::PlatformChanged;
    }

    if stderr.contains("timed out")
        || stderr.contains("timeout")
        || stderr.contains("connection")
        || stderr.contains("network")
        || stderr.contains("unable to download webpage")
        || stderr.contains("temporary failure in name resolution")
    {
        return FailureReason::NetworkError;
    }

    FailureReason::Unknown
}
