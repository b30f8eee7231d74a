//! Media references attached to questions and answer options
//!
//! Questions never embed media bytes. They point at assets that an
//! out-of-band generation step has already produced (narration audio,
//! answer audio, option images, question videos). This module defines
//! those references; actually playing them is the job of
//! [`crate::playback`].

use std::fmt::Display;

use garde::Validate;
use serde::{Deserialize, Serialize};

/// A path or URL of a pre-generated asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(transparent)]
#[garde(transparent)]
pub struct MediaSource(
    #[garde(length(min = 1, max = crate::constants::media::MAX_SOURCE_LENGTH))] String,
);

impl MediaSource {
    /// Creates a reference to the asset at `location`
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Returns the path or URL of the asset
    pub fn location(&self) -> &str {
        &self.0
    }
}

impl Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Visual media shown alongside a question
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Validate)]
pub enum Media {
    /// A still image
    Image(#[garde(dive)] Image),
    /// A video clip, played by the media runtime
    Video(#[garde(dive)] Video),
}

impl Media {
    /// Returns the video reference if this media is a video
    pub fn video(&self) -> Option<&Video> {
        match self {
            Self::Video(video) => Some(video),
            Self::Image(_) => None,
        }
    }
}

/// An image reference with alternative text
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Validate)]
pub struct Image {
    /// Where the image lives
    #[garde(dive)]
    pub source: MediaSource,
    /// Alternative text for accessibility and display fallbacks
    #[garde(length(max = crate::constants::media::MAX_ALT_LENGTH))]
    #[serde(default)]
    pub alt: String,
}

/// A video reference
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Validate)]
pub struct Video {
    /// Where the video lives
    #[garde(dive)]
    pub source: MediaSource,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_media_source_validation() {
        assert!(MediaSource::new("audio/q1.mp3").validate().is_ok());
        assert!(MediaSource::new("").validate().is_err());
        assert!(
            MediaSource::new("a".repeat(crate::constants::media::MAX_SOURCE_LENGTH + 1))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_media_source_is_transparent() {
        let source: MediaSource = serde_json::from_str("\"videos/clip.mp4\"").unwrap();
        assert_eq!(source.location(), "videos/clip.mp4");
        assert_eq!(serde_json::to_string(&source).unwrap(), "\"videos/clip.mp4\"");
    }

    #[test]
    fn test_image_alt_too_long() {
        let image = Image {
            source: "images/cat.jpg".into(),
            alt: "a".repeat(crate::constants::media::MAX_ALT_LENGTH + 1),
        };
        assert!(image.validate().is_err());
        assert!(Media::Image(image).validate().is_err());
    }

    #[test]
    fn test_media_video_accessor() {
        let video = Media::Video(Video {
            source: "videos/clip.mp4".into(),
        });
        assert!(video.video().is_some());

        let image = Media::Image(Image {
            source: "images/cat.jpg".into(),
            alt: String::new(),
        });
        assert!(image.video().is_none());
    }
}
