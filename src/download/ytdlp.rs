//! yt-dlp subprocess plumbing
//!
//! Builds the format selector, runs the downloader with a hard timeout and
//! turns non-zero exits into classified failures.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::core::error::AppError;
use crate::download::error::{classify_ytdlp_stderr, DownloadFailure, FailureReason};
use crate::links::Platform;

/// Format selector for a platform, capped at the policy's target height.
///
/// The fallback chain asks for the exact mp4 first, then any container at
/// or below the target, then whatever the platform has. TikTok and
/// Instagram serve single-file mp4s where height filters are unreliable,
/// so they just take the best mp4.
pub fn format_for(platform: Platform, target_quality: &str) -> String {
    match platform {
        Platform::YoutubeShorts => format!(
            "best[ext=mp4][height<={q}]/bestvideo[ext=mp4][height<={q}]+bestaudio[ext=m4a]/best[height<={q}]/best",
            q = target_quality
        ),
        Platform::TikTok | Platform::InstagramReels => "best[ext=mp4]/best".to_string(),
    }
}

/// Runs one yt-dlp download into `output`, bounded by `limit`.
///
/// A timeout kills the child (`kill_on_drop`) and classifies as a network
/// failure per the orchestration contract. Partial files are removed on
/// every failure path; verifying and size-checking the finished file is
/// the caller's job.
pub async fn run_download(
    bin: &str,
    url: &url::Url,
    output: &Path,
    format_arg: &str,
    limit: Duration,
) -> Result<(), DownloadFailure> {
    let output_arg = output.to_string_lossy().into_owned();
    let args = [
        "-o",
        output_arg.as_str(),
        "--no-playlist",
        "--format",
        format_arg,
        "--merge-output-format",
        "mp4",
        "--socket-timeout",
        "30",
        url.as_str(),
    ];

    log::debug!("yt-dlp command: {} {}", bin, args.join(" "));

    let run = timeout(
        limit,
        Command::new(bin).args(args).kill_on_drop(true).output(),
    )
    .await;

    match run {
        Err(_) => {
            cleanup_partial(output);
            Err(DownloadFailure::new(
                FailureReason::NetworkError,
                format!("download timed out after {}s", limit.as_secs()),
            ))
        }
        Ok(Err(e)) => Err(DownloadFailure::new(
            FailureReason::Unknown,
            format!("failed to run {}: {}", bin, e),
        )),
        Ok(Ok(out)) => {
            if out.status.success() {
                Ok(())
            } else {
                let stderr = String::from_utf8_lossy(&out.stderr);
                cleanup_partial(output);
                Err(DownloadFailure::new(
                    classify_ytdlp_stderr(&stderr),
                    stderr_tail(&stderr, 3),
                ))
            }
        }
    }
}

/// Removes a partial download plus the helper files yt-dlp leaves behind.
pub fn cleanup_partial(output: &Path) {
    for path in partial_paths(output) {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Failed to remove partial file {}: {}", path.display(), e);
            }
        }
    }
}

fn partial_paths(output: &Path) -> Vec<PathBuf> {
    let mut paths = vec![output.to_path_buf()];
    let name = output.to_string_lossy();
    paths.push(PathBuf::from(format!("{}.part", name)));
    paths.push(PathBuf::from(format!("{}.ytdl", name)));
    paths
}

/// Last few non-empty stderr lines, joined for a single log/detail line.
fn stderr_tail(stderr: &str, lines: usize) -> String {
    let tail: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = tail.len().saturating_sub(lines);
    if tail.is_empty() {
        "yt-dlp exited with an error and no output".to_string()
    } else {
        tail[start..].join(" | ")
    }
}

/// Returns the yt-dlp version string, for startup logging and `reclip ytdlp`.
pub async fn version(bin: &str) -> Result<String, AppError> {
    let out = timeout(
        Duration::from_secs(10),
        Command::new(bin).arg("--version").output(),
    )
    .await
    .map_err(|_| AppError::Download("yt-dlp --version timed out".to_string()))?
    .map_err(|e| AppError::Download(format!("failed to run {} --version: {}", bin, e)))?;

    let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if version.is_empty() {
        return Err(AppError::Download(
            "yt-dlp is not installed or --version produced no output".to_string(),
        ));
    }
    Ok(version)
}
