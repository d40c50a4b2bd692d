//! Per-message replacement flow
//!
//! Drives one message through match -> download -> upload -> cleanup ->
//! delete-original. Each recognized link is handled strictly in sequence
//! and a failure on one never aborts the rest. The original message is
//! kept whenever nothing could be delivered, so a broken link stays
//! visible for the user to inspect.

use teloxide::types::{ChatId, MessageId};

use crate::core::config::{DeletePolicy, DownloadPolicy};
use crate::download::VideoFetcher;
use crate::links::{self, VideoReference};
use crate::telegram::transport::ChatTransport;

/// Notice posted when the download worked but Telegram rejected the upload.
pub const UPLOAD_FAILED_NOTICE: &str =
    "❌ Downloaded the video but failed to send it here. Please try again later.";

/// Terminal state of one message's flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// The text carried no recognizable link; the message was left alone.
    NoMatch,
    /// At least one video was re-uploaded.
    Done,
    /// Every recognized link failed; error notices were posted.
    Failed,
}

/// What happened to one message, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    pub state: FlowState,
    pub delivered: usize,
    pub failed: usize,
    pub original_deleted: bool,
}

impl FlowReport {
    fn no_match() -> Self {
        FlowReport {
            state: FlowState::NoMatch,
            delivered: 0,
            failed: 0,
            original_deleted: false,
        }
    }
}

/// Replaces every recognized short-video link in `text` with the video
/// itself, then deletes the original message according to `delete_policy`.
#[allow(clippy::too_many_arguments)]
pub async fn replace_message_links(
    transport: &dyn ChatTransport,
    fetcher: &dyn VideoFetcher,
    policy: &DownloadPolicy,
    delete_policy: DeletePolicy,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
    sender_name: Option<&str>,
) -> FlowReport {
    let references = links::find_references(text);
    if references.is_empty() {
        return FlowReport::no_match();
    }

    let caption = sender_name.map(|name| format!("Shared by: {}", name));
    let mut delivered = 0usize;
    let mut failed = 0usize;

    for reference in &references {
        match handle_reference(transport, fetcher, policy, chat_id, reference, caption.as_deref()).await {
            ReferenceOutcome::Delivered => delivered += 1,
            ReferenceOutcome::Failed => failed += 1,
        }
    }

    let should_delete = match delete_policy {
        DeletePolicy::AnySuccess => delivered > 0,
        DeletePolicy::AllSuccess => delivered > 0 && failed == 0,
    };

    let mut original_deleted = false;
    if should_delete {
        match transport.delete_message(chat_id, message_id).await {
            Ok(()) => {
                original_deleted = true;
                log::info!("Deleted original message {} in chat {}", message_id.0, chat_id.0);
            }
            Err(e) => {
                // The video is already posted; a missing delete permission
                // must not fail the whole flow.
                log::warn!(
                    "Failed to delete original message {} in chat {}: {}",
                    message_id.0,
                    chat_id.0,
                    e
                );
            }
        }
    }

    let state = if delivered > 0 { FlowState::Done } else { FlowState::Failed };
    FlowReport {
        state,
        delivered,
        failed,
        original_deleted,
    }
}

enum ReferenceOutcome {
    Delivered,
    Failed,
}

async fn handle_reference(
    transport: &dyn ChatTransport,
    fetcher: &dyn VideoFetcher,
    policy: &DownloadPolicy,
    chat_id: ChatId,
    reference: &VideoReference,
    caption: Option<&str>,
) -> ReferenceOutcome {
    log::info!(
        "Downloading {} video {} from {}",
        reference.platform,
        reference.video_id,
        reference.canonical_url
    );

    let file = match fetcher.fetch(reference, policy).await {
        Ok(file) => file,
        Err(failure) => {
            log::error!(
                "Download failed for {} video {} ({}): {}",
                reference.platform,
                reference.video_id,
                reference.canonical_url,
                failure
            );
            notify(transport, chat_id, &failure.user_message()).await;
            return ReferenceOutcome::Failed;
        }
    };

    log::info!(
        "Uploading {} ({} bytes) to chat {}",
        file.path.display(),
        file.size_bytes,
        chat_id.0
    );
    let upload = transport.send_video(chat_id, &file.path, caption).await;

    // The temp file dies with the upload attempt, success or not.
    if let Err(e) = std::fs::remove_file(&file.path) {
        log::warn!("Failed to remove temp file {}: {}", file.path.display(), e);
    }

    match upload {
        Ok(()) => ReferenceOutcome::Delivered,
        Err(e) => {
            log::error!(
                "Upload failed for {} video {}: {}",
                reference.platform,
                reference.video_id,
                e
            );
            notify(transport, chat_id, UPLOAD_FAILED_NOTICE).await;
            ReferenceOutcome::Failed
        }
    }
}

async fn notify(transport: &dyn ChatTransport, chat_id: ChatId, text: &str) {
    if let Err(e) = transport.send_text(chat_id, text).await {
        log::warn!("Failed to send error notice to chat {}: {}", chat_id.0, e);
    }
}
