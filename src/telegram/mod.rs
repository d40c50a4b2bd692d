//! Telegram bot integration and handlers

pub mod handlers;
pub mod replace;
pub mod transport;

// Re-exports for convenience
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use replace::{replace_message_links, FlowReport, FlowState};
pub use transport::{ChatTransport, TelegramTransport, TransportError};

/// Bot type used throughout the crate.
pub type Bot = teloxide::Bot;

/// Creates the bot from a raw token.
pub fn create_bot(token: &str) -> Bot {
    Bot::new(token)
}
