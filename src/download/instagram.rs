//! Instagram direct extraction
//!
//! Cookie-less fast path for reels: fetch the public reel page, pull the
//! `video_url` field out of the embedded JSON and stream the mp4 straight
//! to disk. Instagram is the platform yt-dlp stumbles on most often
//! without authentication, so this is tried first; any failure here makes
//! the fetcher fall back to yt-dlp.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::download::error::{DownloadFailure, FailureReason};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

static VIDEO_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""video_url":"((?:[^"\\]|\\.)+)""#).unwrap());

pub struct InstagramExtractor {
    client: reqwest::Client,
}

impl InstagramExtractor {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    /// Downloads the reel behind `reel_url` into `dest`, returning the
    /// number of bytes written. Removes the partial file on any failure so
    /// the yt-dlp fallback starts from a clean slate.
    pub async fn download_to(&self, reel_url: &Url, dest: &Path) -> Result<u64, DownloadFailure> {
        let video_url = self.extract_video_url(reel_url).await?;

        log::debug!("Instagram direct video URL for {}: {}", reel_url, video_url);

        match self.stream_to_file(&video_url, dest).await {
            Ok(written) => Ok(written),
            Err(failure) => {
                let _ = std::fs::remove_file(dest);
                Err(failure)
            }
        }
    }

    /// Scrapes the direct mp4 URL out of the reel page.
    async fn extract_video_url(&self, reel_url: &Url) -> Result<Url, DownloadFailure> {
        let resp = self
            .client
            .get(reel_url.clone())
            .send()
            .await
            .map_err(request_failure)?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DownloadFailure::new(
                FailureReason::Unavailable,
                format!("instagram returned 404 for {}", reel_url),
            ));
        }
        if !resp.status().is_success() {
            return Err(DownloadFailure::new(
                FailureReason::Unknown,
                format!("instagram returned HTTP {} for {}", resp.status(), reel_url),
            ));
        }

        let html = resp.text().await.map_err(request_failure)?;
        let raw = find_video_url_in_html(&html).ok_or_else(|| {
            // Private reels and markup changes look the same from here;
            // either way the yt-dlp fallback gets its chance.
            DownloadFailure::new(FailureReason::PlatformChanged, "no video_url field in reel page")
        })?;

        Url::parse(&raw)
            .map_err(|e| DownloadFailure::new(FailureReason::PlatformChanged, format!("unparseable video_url: {}", e)))
    }

    async fn stream_to_file(&self, video_url: &Url, dest: &Path) -> Result<u64, DownloadFailure> {
        let mut resp = self
            .client
            .get(video_url.clone())
            .send()
            .await
            .map_err(request_failure)?;

        if !resp.status().is_success() {
            return Err(DownloadFailure::new(
                FailureReason::Unknown,
                format!("video fetch returned HTTP {}", resp.status()),
            ));
        }

        let mut file = File::create(dest).await.map_err(io_failure)?;
        let mut written: u64 = 0;
        while let Some(chunk) = resp.chunk().await.map_err(request_failure)? {
            file.write_all(&chunk).await.map_err(io_failure)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_failure)?;

        Ok(written)
    }
}

fn find_video_url_in_html(html: &str) -> Option<String> {
    VIDEO_URL_RE.captures(html).map(|cap| unescape_json_url(&cap[1]))
}

/// Instagram embeds the URL JSON-escaped; only these two escapes occur in
/// practice.
fn unescape_json_url(raw: &str) -> String {
    raw.replace("\\u0026", "&").replace("\\/", "/")
}

fn request_failure(e: reqwest::Error) -> DownloadFailure {
    let reason = if e.is_timeout() || e.is_connect() {
        FailureReason::NetworkError
    } else {
        FailureReason::Unknown
    };
    DownloadFailure::new(reason, format!("instagram request failed: {}", e))
}

fn io_failure(e: std::io::Error) -> DownloadFailure {
    DownloadFailure::new(FailureReason::Unknown, format!("failed to write video file: {}", e))
}
