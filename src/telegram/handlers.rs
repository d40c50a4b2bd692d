//! Telegram bot handler tree
//!
//! The dispatcher schema is built from a [`HandlerDeps`] value so
//! integration tests can assemble the same tree around stub collaborators.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use crate::core::config::Settings;
use crate::download::VideoFetcher;
use crate::links;
use crate::telegram::replace::{self, FlowState};
use crate::telegram::transport::ChatTransport;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub transport: Arc<dyn ChatTransport>,
    pub fetcher: Arc<dyn VideoFetcher>,
    pub settings: Arc<Settings>,
}

/// Creates the dispatcher schema for the bot.
///
/// A single branch: messages whose text carries at least one recognizable
/// short-video link go through the replacement flow; everything else is
/// left untouched.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry().branch(replace_handler(deps))
}

fn replace_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(links::contains_reference).unwrap_or(false))
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default().to_string();
                let sender = sender_name(&msg);

                let report = replace::replace_message_links(
                    deps.transport.as_ref(),
                    deps.fetcher.as_ref(),
                    &deps.settings.policy,
                    deps.settings.delete_policy,
                    msg.chat.id,
                    msg.id,
                    &text,
                    sender.as_deref(),
                )
                .await;

                match report.state {
                    FlowState::Done => log::info!(
                        "Message {} in chat {}: {} delivered, {} failed, original deleted: {}",
                        msg.id.0,
                        msg.chat.id.0,
                        report.delivered,
                        report.failed,
                        report.original_deleted
                    ),
                    FlowState::Failed => log::error!(
                        "Message {} in chat {}: all {} references failed",
                        msg.id.0,
                        msg.chat.id.0,
                        report.failed
                    ),
                    FlowState::NoMatch => {}
                }
                Ok(())
            }
        })
}

/// Attribution for the re-uploaded video, shaped the way the sender shows
/// up in the chat: @username first, then full name, then a bare id.
fn sender_name(msg: &Message) -> Option<String> {
    if let Some(user) = &msg.from {
        if let Some(username) = &user.username {
            return Some(format!("@{}", username));
        }
        let name = match &user.last_name {
            Some(last) => format!("{} {}", user.first_name, last),
            None => user.first_name.clone(),
        };
        if !name.trim().is_empty() {
            return Some(name);
        }
        return Some(format!("User ID: {}", user.id));
    }
    if let Some(chat) = &msg.sender_chat {
        return chat.title().map(str::to_string);
    }
    None
}
