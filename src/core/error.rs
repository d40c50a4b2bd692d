use thiserror::Error;

/// Centralized error types for the application
///
/// Collaborator errors are converted into this enum at the boundary so the
/// rest of the code can propagate them with `?`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP errors (Instagram direct extraction)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid or missing configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Download/yt-dlp errors that carry no structured failure reason
    #[error("Download error: {0}")]
    Download(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
