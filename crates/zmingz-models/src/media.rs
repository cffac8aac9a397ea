//! Media kind definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Extensions recognised as still images.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff", "heic",
];

/// Extensions recognised as videos.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "mkv", "webm", "avi", "3gp", "ts", "mpg", "mpeg",
];

/// Kind of media handed to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Single still image
    Image,
    /// Video clip
    Video,
}

impl MediaKind {
    pub const ALL: &'static [MediaKind] = &[MediaKind::Image, MediaKind::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// MIME wildcard used when handing the media to other applications.
    pub fn mime_wildcard(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/*",
            MediaKind::Video => "video/*",
        }
    }

    /// Classify a MIME type such as `image/png` or `video/mp4`.
    ///
    /// Only the top-level type is inspected; anything other than `image/`
    /// or `video/` yields `None`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image") {
            Some(MediaKind::Image)
        } else if mime.starts_with("video") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Guess the kind from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = MediaKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(MediaKindParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown media kind: {0}")]
pub struct MediaKindParseError(String);
