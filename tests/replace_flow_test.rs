//! Integration tests for the per-message replacement flow
//!
//! The flow is driven end-to-end against stub collaborators: a scripted
//! fetcher that writes real files into a temp directory and a recording
//! transport that captures every chat operation.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};
use tempfile::TempDir;

use reclip::core::config::{DeletePolicy, DownloadPolicy};
use reclip::download::{DownloadFailure, DownloadedFile, FailureReason, VideoFetcher};
use reclip::telegram::{replace_message_links, ChatTransport, FlowState, TransportError};

const CHAT: ChatId = ChatId(-1001234567890);
const MESSAGE: MessageId = MessageId(42);

fn test_policy(dir: &Path) -> DownloadPolicy {
    DownloadPolicy {
        max_file_size_bytes: 50 * 1024 * 1024,
        target_quality: "720".to_string(),
        download_dir: dir.to_path_buf(),
        download_timeout: std::time::Duration::from_secs(180),
        upload_timeout: std::time::Duration::from_secs(300),
    }
}

// ==================== Stub collaborators ====================

/// Records every transport call; can be told to fail uploads or deletes.
#[derive(Default)]
struct RecordingTransport {
    videos: Mutex<Vec<(ChatId, PathBuf, Option<String>)>>,
    texts: Mutex<Vec<(ChatId, String)>>,
    deletes: Mutex<Vec<(ChatId, MessageId)>>,
    fail_uploads: bool,
    fail_deletes: bool,
}

impl RecordingTransport {
    fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    fn videos(&self) -> Vec<(ChatId, PathBuf, Option<String>)> {
        self.videos.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<(ChatId, String)> {
        self.texts.lock().unwrap().clone()
    }

    fn deletes(&self) -> Vec<(ChatId, MessageId)> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_video(
        &self,
        chat_id: ChatId,
        file: &Path,
        caption: Option<&str>,
    ) -> Result<(), TransportError> {
        self.videos
            .lock()
            .unwrap()
            .push((chat_id, file.to_path_buf(), caption.map(str::to_string)));
        if self.fail_uploads {
            return Err(TransportError::Other("stubbed upload rejection".to_string()));
        }
        Ok(())
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        self.texts.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        self.deletes.lock().unwrap().push((chat_id, message_id));
        if self.fail_deletes {
            return Err(TransportError::Other("stubbed: not enough rights".to_string()));
        }
        Ok(())
    }
}

/// One scripted outcome per expected fetch, in order.
enum StubDownload {
    /// Write a real file of this many bytes and return it.
    File(u64),
    /// Fail with this classified reason.
    Fail(FailureReason),
}

struct StubFetcher {
    dir: PathBuf,
    script: Mutex<VecDeque<StubDownload>>,
    fetched_urls: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn new(dir: &Path, script: Vec<StubDownload>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            script: Mutex::new(script.into()),
            fetched_urls: Mutex::new(Vec::new()),
        }
    }

    fn fetched_urls(&self) -> Vec<String> {
        self.fetched_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoFetcher for StubFetcher {
    async fn fetch(
        &self,
        reference: &reclip::links::VideoReference,
        _policy: &DownloadPolicy,
    ) -> Result<DownloadedFile, DownloadFailure> {
        let call_index = {
            let mut urls = self.fetched_urls.lock().unwrap();
            urls.push(reference.canonical_url.to_string());
            urls.len()
        };

        match self.script.lock().unwrap().pop_front().expect("unexpected fetch call") {
            StubDownload::File(size) => {
                let path = self
                    .dir
                    .join(format!("{}_{}_{}.mp4", reference.platform.slug(), reference.video_id, call_index));
                std::fs::write(&path, vec![0u8; size as usize]).unwrap();
                Ok(DownloadedFile {
                    path,
                    size_bytes: size,
                })
            }
            StubDownload::Fail(reason) => Err(DownloadFailure::new(reason, "stubbed failure")),
        }
    }
}

// ==================== Tests ====================

#[tokio::test]
async fn test_success_path_deletes_original_and_temp_file() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::default();
    let fetcher = StubFetcher::new(dir.path(), vec![StubDownload::File(2048)]);

    let report = replace_message_links(
        &transport,
        &fetcher,
        &test_policy(dir.path()),
        DeletePolicy::AnySuccess,
        CHAT,
        MESSAGE,
        "look at youtube.com/shorts/dQw4w9WgXcQ",
        Some("@tester"),
    )
    .await;

    assert_eq!(report.state, FlowState::Done);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 0);
    assert!(report.original_deleted);

    let videos = transport.videos();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].0, CHAT);
    assert_eq!(videos[0].2.as_deref(), Some("Shared by: @tester"));
    assert!(!videos[0].1.exists(), "temp file must be removed after upload");

    assert_eq!(transport.deletes(), vec![(CHAT, MESSAGE)]);
    assert!(transport.texts().is_empty(), "no error notice on success");
}

#[tokio::test]
async fn test_download_failure_keeps_original_and_posts_notice() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::default();
    let fetcher = StubFetcher::new(dir.path(), vec![StubDownload::Fail(FailureReason::TooLarge)]);

    let report = replace_message_links(
        &transport,
        &fetcher,
        &test_policy(dir.path()),
        DeletePolicy::AnySuccess,
        CHAT,
        MESSAGE,
        "youtube.com/shorts/dQw4w9WgXcQ",
        None,
    )
    .await;

    assert_eq!(report.state, FlowState::Failed);
    assert!(!report.original_deleted);

    let texts = transport.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].1.contains("too large"), "notice must come from the failure reason");

    assert!(transport.videos().is_empty());
    assert!(transport.deletes().is_empty(), "original must survive a failed download");
}

#[tokio::test]
async fn test_upload_failure_preserves_original_but_removes_temp() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::failing_uploads();
    let fetcher = StubFetcher::new(dir.path(), vec![StubDownload::File(1024)]);

    let report = replace_message_links(
        &transport,
        &fetcher,
        &test_policy(dir.path()),
        DeletePolicy::AnySuccess,
        CHAT,
        MESSAGE,
        "youtube.com/shorts/dQw4w9WgXcQ",
        None,
    )
    .await;

    assert_eq!(report.state, FlowState::Failed);
    assert!(!report.original_deleted);
    assert!(transport.deletes().is_empty());

    // The upload was attempted once and the temp file is gone regardless.
    let videos = transport.videos();
    assert_eq!(videos.len(), 1);
    assert!(!videos[0].1.exists());

    let texts = transport.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].1.contains("failed to send"));
}

#[tokio::test]
async fn test_delete_failure_still_reaches_done() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::failing_deletes();
    let fetcher = StubFetcher::new(dir.path(), vec![StubDownload::File(1024)]);

    let report = replace_message_links(
        &transport,
        &fetcher,
        &test_policy(dir.path()),
        DeletePolicy::AnySuccess,
        CHAT,
        MESSAGE,
        "youtube.com/shorts/dQw4w9WgXcQ",
        None,
    )
    .await;

    // The video went out; a delete permission problem must not fail the flow.
    assert_eq!(report.state, FlowState::Done);
    assert_eq!(report.delivered, 1);
    assert!(!report.original_deleted);
    assert_eq!(transport.deletes().len(), 1, "delete must have been attempted");
    assert!(transport.texts().is_empty(), "delete failures are never user-visible");
}

#[tokio::test]
async fn test_multi_link_partial_success_any_policy_deletes() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::default();
    let fetcher = StubFetcher::new(
        dir.path(),
        vec![
            StubDownload::Fail(FailureReason::Unavailable),
            StubDownload::File(1024),
        ],
    );

    let text = "youtube.com/shorts/aaaaaaaaaaa and youtube.com/shorts/bbbbbbbbbbb";
    let report = replace_message_links(
        &transport,
        &fetcher,
        &test_policy(dir.path()),
        DeletePolicy::AnySuccess,
        CHAT,
        MESSAGE,
        text,
        None,
    )
    .await;

    assert_eq!(report.state, FlowState::Done);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 1);
    assert!(report.original_deleted);

    // Both references were attempted in order despite the first failing.
    assert_eq!(fetcher.fetched_urls().len(), 2);
    assert_eq!(transport.videos().len(), 1);
    assert_eq!(transport.texts().len(), 1);
}

#[tokio::test]
async fn test_multi_link_partial_success_all_policy_keeps_original() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::default();
    let fetcher = StubFetcher::new(
        dir.path(),
        vec![
            StubDownload::Fail(FailureReason::NetworkError),
            StubDownload::File(1024),
        ],
    );

    let text = "youtube.com/shorts/aaaaaaaaaaa and youtube.com/shorts/bbbbbbbbbbb";
    let report = replace_message_links(
        &transport,
        &fetcher,
        &test_policy(dir.path()),
        DeletePolicy::AllSuccess,
        CHAT,
        MESSAGE,
        text,
        None,
    )
    .await;

    // Something was delivered, but under all-success the original stays.
    assert_eq!(report.state, FlowState::Done);
    assert!(!report.original_deleted);
    assert!(transport.deletes().is_empty());
}

#[tokio::test]
async fn test_no_match_leaves_everything_alone() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::default();
    let fetcher = StubFetcher::new(dir.path(), vec![]);

    let report = replace_message_links(
        &transport,
        &fetcher,
        &test_policy(dir.path()),
        DeletePolicy::AnySuccess,
        CHAT,
        MESSAGE,
        "just words, and a watch link youtube.com/watch?v=dQw4w9WgXcQ",
        None,
    )
    .await;

    assert_eq!(report.state, FlowState::NoMatch);
    assert!(fetcher.fetched_urls().is_empty());
    assert!(transport.videos().is_empty());
    assert!(transport.texts().is_empty());
    assert!(transport.deletes().is_empty());
}

/// The full scenario from the requirements: one TikTok link in the middle
/// of a sentence, a 2 MB download under a 50 MB cap, one upload, one
/// delete, flow ends in Done.
#[tokio::test]
async fn test_tiktok_end_to_end_scenario() {
    let dir = TempDir::new().unwrap();
    let transport = RecordingTransport::default();
    let fetcher = StubFetcher::new(dir.path(), vec![StubDownload::File(2 * 1024 * 1024)]);

    let report = replace_message_links(
        &transport,
        &fetcher,
        &test_policy(dir.path()),
        DeletePolicy::AnySuccess,
        CHAT,
        MESSAGE,
        "check this https://www.tiktok.com/@user/video/1234567890123456789 out",
        Some("@user"),
    )
    .await;

    assert_eq!(report.state, FlowState::Done);
    assert_eq!(
        fetcher.fetched_urls(),
        vec!["https://www.tiktok.com/@user/video/1234567890123456789".to_string()]
    );

    let videos = transport.videos();
    assert_eq!(videos.len(), 1, "upload must be called exactly once");
    assert_eq!(transport.deletes(), vec![(CHAT, MESSAGE)]);
}
