//! Link recognition
//!
//! Turns free-form message text into video references for the supported
//! short-video platforms. Matching is pure text work: one compiled pattern
//! per platform, each capturing the stable video identifier in addition to
//! confirming the domain and path shape. Regular YouTube watch links and
//! Instagram photo posts are deliberately not recognized.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Supported short-video platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YoutubeShorts,
    TikTok,
    InstagramReels,
}

impl Platform {
    /// Short identifier used in log lines and temp file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Platform::YoutubeShorts => "youtube",
            Platform::TikTok => "tiktok",
            Platform::InstagramReels => "instagram",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// A recognized link: platform plus a canonical URL rebuilt from the
/// captured identifier. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    pub platform: Platform,
    pub canonical_url: Url,
    pub video_id: String,
}

// The id is always exactly 11 characters; the trailing group stops the
// pattern from matching a longer id-like tail.
static YOUTUBE_SHORTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.|m\.)?youtube\.com/shorts/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)")
        .unwrap()
});

static TIKTOK_VIDEO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:https?://)?(?:www\.)?tiktok\.com/@([\w.]+)/video/(\d+)").unwrap());

// vm./vt. shortlinks carry an opaque code instead of the numeric id; the
// code still identifies the video uniquely for yt-dlp.
static TIKTOK_SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:https?://)?((?:vm|vt)\.tiktok\.com)/([A-Za-z0-9]+)").unwrap());

static INSTAGRAM_REELS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:https?://)?(?:www\.)?instagram\.com/reels?/([A-Za-z0-9_-]+)").unwrap());

/// Cheap pre-filter for the handler tree: does the text contain at least
/// one recognizable short-video link?
pub fn contains_reference(text: &str) -> bool {
    YOUTUBE_SHORTS_RE.is_match(text)
        || TIKTOK_VIDEO_RE.is_match(text)
        || TIKTOK_SHORT_RE.is_match(text)
        || INSTAGRAM_REELS_RE.is_match(text)
}

/// Extracts every recognized short-video link from the text.
///
/// Pure and deterministic: the same text always yields the same sequence.
/// Unrecognized links (including regular YouTube watch URLs) are ignored.
/// References are grouped per platform, in text order within each group.
pub fn find_references(text: &str) -> Vec<VideoReference> {
    let mut refs = Vec::new();

    for cap in YOUTUBE_SHORTS_RE.captures_iter(text) {
        let id = &cap[1];
        if let Some(reference) = build_reference(
            Platform::YoutubeShorts,
            &format!("https://www.youtube.com/shorts/{}", id),
            id,
        ) {
            refs.push(reference);
        }
    }

    for cap in TIKTOK_VIDEO_RE.captures_iter(text) {
        let (user, id) = (&cap[1], &cap[2]);
        if let Some(reference) = build_reference(
            Platform::TikTok,
            &format!("https://www.tiktok.com/@{}/video/{}", user, id),
            id,
        ) {
            refs.push(reference);
        }
    }

    for cap in TIKTOK_SHORT_RE.captures_iter(text) {
        let (host, code) = (cap[1].to_lowercase(), &cap[2]);
        if let Some(reference) =
            build_reference(Platform::TikTok, &format!("https://{}/{}/", host, code), code)
        {
            refs.push(reference);
        }
    }

    for cap in INSTAGRAM_REELS_RE.captures_iter(text) {
        let code = &cap[1];
        if let Some(reference) = build_reference(
            Platform::InstagramReels,
            &format!("https://www.instagram.com/reel/{}/", code),
            code,
        ) {
            refs.push(reference);
        }
    }

    refs
}

fn build_reference(platform: Platform, canonical: &str, video_id: &str) -> Option<VideoReference> {
    // Canonical URLs are assembled from fixed templates plus captured
    // [\w-] identifiers, so parsing cannot realistically fail; the Option
    // keeps the matcher total anyway.
    match Url::parse(canonical) {
        Ok(canonical_url) => Some(VideoReference {
            platform,
            canonical_url,
            video_id: video_id.to_string(),
        }),
        Err(e) => {
            log::warn!("Discarding unparseable canonical URL {}: {}", canonical, e);
            None
        }
    }
}
