//! Watch-page URL → embed URL.

use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::error::{InvalidUrlReason, ResolutionError};

pub const DEFAULT_EMBED_BASE: &str = "https://www.youtube.com/embed";

/// Query parameter that carries the media id on watch-page URLs.
const VIDEO_ID_PARAM: &str = "v";

/// A URL the playback sink can consume.
///
/// `video_id` is `None` for the sentinel: the bare embed base, which the sink
/// loads as "nothing playable".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlayableUrl {
    url: String,
    video_id: Option<String>,
}

impl PlayableUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn is_sentinel(&self) -> bool {
        self.video_id.is_none()
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl std::fmt::Display for PlayableUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Pure resolver; the same reference always yields the same result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUrlResolver {
    embed_base: String,
}

impl Default for VideoUrlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_BASE)
    }
}

impl VideoUrlResolver {
    pub fn new(embed_base: impl Into<String>) -> Self {
        let embed_base = embed_base.into().trim_end_matches('/').to_string();
        Self { embed_base }
    }

    pub fn embed_base(&self) -> &str {
        &self.embed_base
    }

    /// `<embed-base>/` with no id.
    pub fn sentinel(&self) -> PlayableUrl {
        PlayableUrl {
            url: format!("{}/", self.embed_base),
            video_id: None,
        }
    }

    pub fn resolve(&self, video_ref: Option<&str>) -> Result<PlayableUrl, ResolutionError> {
        let id = extract_video_id(video_ref).map_err(|reason| ResolutionError::InvalidUrl {
            reference: video_ref.map(str::to_string),
            reason,
        })?;
        Ok(PlayableUrl {
            url: format!("{}/{}", self.embed_base, id),
            video_id: Some(id),
        })
    }

    /// Like `resolve`, but degrades to the sentinel instead of failing.
    pub fn resolve_or_sentinel(&self, video_ref: Option<&str>) -> PlayableUrl {
        match self.resolve(video_ref) {
            Ok(url) => url,
            Err(e) => {
                warn!("resolver: {}; using sentinel embed URL", e);
                self.sentinel()
            }
        }
    }
}

/// Pull the `v` query parameter out of a watch-page URL.
pub fn extract_video_id(video_ref: Option<&str>) -> Result<String, InvalidUrlReason> {
    let raw = match video_ref.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Err(InvalidUrlReason::Absent),
    };
    let parsed = Url::parse(raw).map_err(|e| InvalidUrlReason::Malformed(e.to_string()))?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == VIDEO_ID_PARAM)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .ok_or(InvalidUrlReason::MissingVideoId)
}
