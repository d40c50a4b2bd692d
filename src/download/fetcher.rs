//! The download adapter
//!
//! [`YtDlpFetcher`] takes a recognized reference and the process-wide
//! policy and produces either a verified local file or a classified
//! failure. Every invocation writes to a uniquely named path so
//! concurrently handled messages never collide on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::config::DownloadPolicy;
use crate::core::error::AppResult;
use crate::download::error::{DownloadFailure, FailureReason};
use crate::download::instagram::InstagramExtractor;
use crate::download::ytdlp;
use crate::links::{Platform, VideoReference};

/// A finished, size-checked download. The caller owns the file and must
/// delete it once the upload attempt is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Seam between the replacement flow and the downloading machinery.
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    async fn fetch(
        &self,
        reference: &VideoReference,
        policy: &DownloadPolicy,
    ) -> Result<DownloadedFile, DownloadFailure>;
}

/// Production fetcher: yt-dlp subprocess, with the direct HTTP extractor
/// tried first for Instagram.
pub struct YtDlpFetcher {
    ytdl_bin: String,
    instagram: InstagramExtractor,
}

impl YtDlpFetcher {
    pub fn new(ytdl_bin: String) -> AppResult<Self> {
        Ok(Self {
            instagram: InstagramExtractor::new()?,
            ytdl_bin,
        })
    }
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        reference: &VideoReference,
        policy: &DownloadPolicy,
    ) -> Result<DownloadedFile, DownloadFailure> {
        if let Err(e) = std::fs::create_dir_all(&policy.download_dir) {
            return Err(DownloadFailure::new(
                FailureReason::Unknown,
                format!("cannot create download dir {}: {}", policy.download_dir.display(), e),
            ));
        }
        let path = unique_output_path(&policy.download_dir, reference);

        if reference.platform == Platform::InstagramReels {
            let direct = tokio::time::timeout(
                policy.download_timeout,
                self.instagram.download_to(&reference.canonical_url, &path),
            )
            .await;
            match direct {
                Ok(Ok(bytes)) => {
                    log::info!(
                        "Instagram direct extraction fetched {} bytes for reel {}",
                        bytes,
                        reference.video_id
                    );
                    return verify_downloaded(&path, policy);
                }
                Ok(Err(failure)) => {
                    log::info!("Instagram direct extraction failed ({}), falling back to yt-dlp", failure);
                }
                Err(_) => {
                    log::info!("Instagram direct extraction timed out, falling back to yt-dlp");
                    let _ = std::fs::remove_file(&path);
                }
            }
        }

        let format_arg = ytdlp::format_for(reference.platform, &policy.target_quality);
        ytdlp::run_download(
            &self.ytdl_bin,
            &reference.canonical_url,
            &path,
            &format_arg,
            policy.download_timeout,
        )
        .await?;

        verify_downloaded(&path, policy)
    }
}

/// One path per invocation: the uuid suffix keeps two concurrent downloads
/// of the same video from clobbering each other.
fn unique_output_path(dir: &Path, reference: &VideoReference) -> PathBuf {
    dir.join(format!(
        "{}_{}_{}.mp4",
        reference.platform.slug(),
        reference.video_id,
        Uuid::new_v4().simple()
    ))
}

/// Confirms the downloader actually produced a file and that it respects
/// the size cap. Oversized files are deleted right here so the upload
/// stage never sees them.
pub(crate) fn verify_downloaded(path: &Path, policy: &DownloadPolicy) -> Result<DownloadedFile, DownloadFailure> {
    let meta = std::fs::metadata(path).map_err(|e| {
        DownloadFailure::new(
            FailureReason::Unknown,
            format!("downloader reported success but left no file at {}: {}", path.display(), e),
        )
    })?;

    let size_bytes = meta.len();
    if size_bytes > policy.max_file_size_bytes {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Failed to remove oversized file {}: {}", path.display(), e);
        }
        let size_mb = size_bytes as f64 / (1024.0 * 1024.0);
        let limit_mb = policy.max_file_size_bytes / (1024 * 1024);
        return Err(DownloadFailure::new(
            FailureReason::TooLarge,
            format!("{:.1} MB exceeds the {} MB limit", size_mb, limit_mb),
        ));
    }

    Ok(DownloadedFile {
        path: path.to_path_buf(),
        size_bytes,
    })
}

/// Startup/shutdown hygiene: removes leftover temp videos from the
/// download directory. Only touches the file types this bot creates.
pub fn clean_download_dir(dir: &Path) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(".mp4") || name.ends_with(".part") || name.ends_with(".ytdl") {
            std::fs::remove_file(&path)?;
            log::debug!("Removed stale temp file {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
