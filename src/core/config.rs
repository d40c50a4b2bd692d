//! Runtime configuration
//!
//! All settings come from the environment (plus `.env` via dotenvy) and are
//! parsed exactly once at startup into an immutable [`Settings`] value that
//! is passed by reference to everything that needs it. No module reads the
//! environment after startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;

use crate::core::error::AppError;

/// Constraints applied to every download, read-only after startup.
#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    /// Hard cap on the downloaded file size. Oversized files are discarded
    /// before the upload stage (Telegram would reject them anyway).
    pub max_file_size_bytes: u64,
    /// Requested video height ("720", "1080", ...). yt-dlp falls back to
    /// the nearest available quality at or below this.
    pub target_quality: String,
    /// Directory for temporary video files.
    pub download_dir: PathBuf,
    /// Upper bound on a single yt-dlp invocation.
    pub download_timeout: Duration,
    /// Upper bound on a single Telegram upload.
    pub upload_timeout: Duration,
}

/// When a message carries several recognized links, controls whether the
/// original message is deleted after a partial success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Delete the original once at least one video was re-uploaded.
    AnySuccess,
    /// Delete the original only if every recognized link was re-uploaded.
    AllSuccess,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any-success" | "any" => Ok(DeletePolicy::AnySuccess),
            "all-success" | "all" => Ok(DeletePolicy::AllSuccess),
            other => Err(format!(
                "unknown delete policy '{}', expected 'any-success' or 'all-success'",
                other
            )),
        }
    }
}

/// Process-wide settings, constructed once in `main`.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram bot token (`BOT_TOKEN`, falls back to `TELOXIDE_TOKEN`).
    pub bot_token: String,
    /// yt-dlp binary (`YTDL_BIN`, default `yt-dlp`).
    pub ytdl_bin: String,
    /// Log threshold for console and file output (`LOG_LEVEL`).
    pub log_level: LevelFilter,
    /// Log file path (`LOG_FILE`).
    pub log_file: String,
    /// Multi-link delete behavior (`DELETE_POLICY`).
    pub delete_policy: DeletePolicy,
    pub policy: DownloadPolicy,
}

impl Settings {
    /// Reads and validates all settings from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        let bot_token = env::var("BOT_TOKEN")
            .or_else(|_| env::var("TELOXIDE_TOKEN"))
            .unwrap_or_default();
        let ytdl_bin = env_or("YTDL_BIN", "yt-dlp");

        let log_level = LevelFilter::from_str(&env_or("LOG_LEVEL", "info"))
            .map_err(|_| AppError::Config("LOG_LEVEL must be one of off/error/warn/info/debug/trace".into()))?;
        let log_file = env_or("LOG_FILE", "reclip.log");

        let max_file_size_mb: u64 = parse_var("MAX_FILE_SIZE", &env_or("MAX_FILE_SIZE", "50"))?;
        let download_dir = PathBuf::from(shellexpand::tilde(&env_or("DOWNLOAD_DIR", "downloads")).into_owned());
        let target_quality = normalize_quality(&env_or("TARGET_QUALITY", "720"))?;

        let download_timeout_secs: u64 = parse_var("DOWNLOAD_TIMEOUT", &env_or("DOWNLOAD_TIMEOUT", "180"))?;
        let upload_timeout_secs: u64 = parse_var("UPLOAD_TIMEOUT", &env_or("UPLOAD_TIMEOUT", "300"))?;

        let delete_policy = DeletePolicy::from_str(&env_or("DELETE_POLICY", "any-success"))
            .map_err(AppError::Config)?;

        Ok(Settings {
            bot_token,
            ytdl_bin,
            log_level,
            log_file,
            delete_policy,
            policy: DownloadPolicy {
                max_file_size_bytes: max_file_size_mb * 1024 * 1024,
                target_quality,
                download_dir,
                download_timeout: Duration::from_secs(download_timeout_secs),
                upload_timeout: Duration::from_secs(upload_timeout_secs),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} has invalid value '{}'", key, raw)))
}

/// Accepts "720" as well as the common "720p" spelling; stores plain digits.
fn normalize_quality(raw: &str) -> Result<String, AppError> {
    let digits = raw.trim().trim_end_matches(['p', 'P']);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Config(format!(
            "TARGET_QUALITY has invalid value '{}', expected a height like 720 or 1080p",
            raw
        )));
    }
    Ok(digits.to_string())
}
