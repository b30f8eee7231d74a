//! Question records and their answer options
//!
//! A [`Question`] is immutable for the duration of a session. Its
//! [`QuestionMode`] decides how the player sequences it: a standard multiple
//! choice, a binary (would-you-rather) choice, a reveal that only the
//! countdown resolves, or a video that pauses at a fixed point for
//! answering.

use std::{fmt::Display, time::Duration};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use super::{
    super::constants::question::{
        BINARY_OPTION_COUNT, MAX_OPTION_COUNT, MAX_PAUSE_POINT, MAX_PROMPT_LENGTH,
        MAX_TIME_LIMIT, MIN_STANDARD_OPTION_COUNT, MIN_TIME_LIMIT,
    },
    common::validate_duration,
    media::{Image, Media, MediaSource, Video},
};

/// Identifier of a question, unique within a bank
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct QuestionId(u32);

/// Stable identifier of an answer option, unique within its question
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display, derive_more::From,
)]
#[serde(transparent)]
pub struct OptionKey(String);

impl OptionKey {
    /// Creates a key from any string-like value
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the ordinal letter key for the option at `index` (`A`, `B`, ...)
    ///
    /// Indices past `Z` continue with two letters (`AA`, `AB`, ...), which is
    /// well beyond the option limit but keeps the function total.
    pub fn ordinal(index: usize) -> Self {
        const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

        let mut remaining = index;
        let mut letters = Vec::new();
        loop {
            letters.push(char::from(LETTERS[remaining % LETTERS.len()]));
            if remaining < LETTERS.len() {
                break;
            }
            remaining = remaining / LETTERS.len() - 1;
        }
        Self(letters.into_iter().rev().collect())
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OptionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How the player sequences a question
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionMode {
    /// Several options, answered by the user or by the countdown
    #[default]
    StandardMC,
    /// Exactly two options
    BinaryChoice,
    /// No manual answers; the countdown reveals the answer
    RevealOnTimeout,
    /// The question video plays until `pause_at`, pauses for answering and
    /// resumes once feedback starts
    VideoPausePoint {
        /// Offset into the question video where answering opens
        #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
        pause_at: Duration,
    },
}

impl Display for QuestionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StandardMC => f.write_str("standard multiple choice"),
            Self::BinaryChoice => f.write_str("binary choice"),
            Self::RevealOnTimeout => f.write_str("reveal on timeout"),
            Self::VideoPausePoint { .. } => f.write_str("video pause point"),
        }
    }
}

/// A selectable answer
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AnswerOption {
    /// Identifier the presentation layer sends back on selection
    #[garde(skip)]
    pub key: OptionKey,
    /// Display label
    #[garde(length(chars, max = crate::constants::option::MAX_TEXT_LENGTH))]
    pub text: String,
    /// Optional picture shown with the label
    #[garde(dive)]
    #[serde(default)]
    pub media: Option<Image>,
}

fn default_time_limit() -> Duration {
    Duration::from_secs(crate::constants::player::DEFAULT_TIME_LIMIT)
}

/// A trivia question as played by the [`crate::player::QuizPlayer`]
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Identifier, unique within the bank
    #[garde(skip)]
    pub id: QuestionId,
    /// Display text, absent for emoji or video-only questions
    #[garde(length(chars, max = MAX_PROMPT_LENGTH))]
    #[serde(default)]
    pub prompt: Option<String>,
    /// Audio read out before answering opens
    #[garde(dive)]
    #[serde(default)]
    pub narration: Option<MediaSource>,
    /// Selectable answers, in display order
    #[garde(length(max = MAX_OPTION_COUNT), dive)]
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// The correct option key, or an external value for reveal questions
    #[garde(skip)]
    pub correct_key: OptionKey,
    /// Audio narrating the answer, played after a correct answer
    #[garde(dive)]
    #[serde(default)]
    pub feedback: Option<MediaSource>,
    /// Image or video shown alongside the question
    #[garde(dive)]
    #[serde(default)]
    pub media: Option<Media>,
    /// How long answering stays open
    #[garde(custom(validate_duration::<MIN_TIME_LIMIT, MAX_TIME_LIMIT>))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_time_limit")]
    pub time_limit: Duration,
    /// Sequencing mode
    #[garde(skip)]
    #[serde(default)]
    pub mode: QuestionMode,
}

/// Structural problems a question can have beyond field-level validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two options share a key
    #[error("option key {0} is used more than once")]
    DuplicateKey(OptionKey),
    /// An option key is empty or too long
    #[error("option key {0:?} must be between 1 and {max} characters", max = crate::constants::option::MAX_KEY_LENGTH)]
    InvalidKey(OptionKey),
    /// The correct key does not name any option
    #[error("correct key {0} does not match any option")]
    UnknownCorrectKey(OptionKey),
    /// The option count does not fit the mode
    #[error("{mode} questions need {expected} options, found {found}")]
    OptionCount {
        /// The question's mode
        mode: QuestionMode,
        /// Human readable requirement
        expected: &'static str,
        /// Number of options present
        found: usize,
    },
    /// A video pause point question has no video to pause
    #[error("video pause point questions need video media")]
    MissingVideo,
    /// The pause point lies beyond the supported range
    #[error("pause point is beyond {max} seconds", max = MAX_PAUSE_POINT)]
    PausePointOutOfRange,
}

impl Question {
    /// Looks up an option by key
    pub fn option(&self, key: &OptionKey) -> Option<&AnswerOption> {
        self.options.iter().find(|option| &option.key == key)
    }

    /// Whether `key` is the correct answer
    pub fn is_correct(&self, key: &OptionKey) -> bool {
        key == &self.correct_key
    }

    /// Whether the user may answer, as opposed to only the countdown
    pub fn accepts_manual_answers(&self) -> bool {
        !self.options.is_empty() && !matches!(self.mode, QuestionMode::RevealOnTimeout)
    }

    /// The video to play after narration, with its pause point
    ///
    /// Only video pause point questions have one.
    pub fn pausing_video(&self) -> Option<(&Video, Duration)> {
        match self.mode {
            QuestionMode::VideoPausePoint { pause_at } => self
                .media
                .as_ref()
                .and_then(Media::video)
                .map(|video| (video, pause_at)),
            _ => None,
        }
    }

    /// Checks the invariants that span several fields
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: duplicate or malformed keys,
    /// a correct key that matches no option, an option count that does not
    /// fit the mode, or a video pause point question without a usable video.
    pub fn check_invariants(&self) -> Result<(), Error> {
        if let Some(key) = self
            .options
            .iter()
            .map(|option| &option.key)
            .find(|key| {
                key.0.is_empty() || key.0.chars().count() > crate::constants::option::MAX_KEY_LENGTH
            })
        {
            return Err(Error::InvalidKey(key.clone()));
        }

        if let Some(key) = self.options.iter().map(|option| &option.key).duplicates().next() {
            return Err(Error::DuplicateKey(key.clone()));
        }

        let found = self.options.len();
        match self.mode {
            QuestionMode::StandardMC if found < MIN_STANDARD_OPTION_COUNT => {
                return Err(Error::OptionCount {
                    mode: self.mode,
                    expected: "at least 2",
                    found,
                });
            }
            QuestionMode::BinaryChoice if found != BINARY_OPTION_COUNT => {
                return Err(Error::OptionCount {
                    mode: self.mode,
                    expected: "exactly 2",
                    found,
                });
            }
            QuestionMode::VideoPausePoint { pause_at } => {
                if self.media.as_ref().and_then(Media::video).is_none() {
                    return Err(Error::MissingVideo);
                }
                if pause_at.as_secs() > MAX_PAUSE_POINT {
                    return Err(Error::PausePointOutOfRange);
                }
                if found == 0 {
                    return Err(Error::OptionCount {
                        mode: self.mode,
                        expected: "at least 1",
                        found,
                    });
                }
            }
            _ => {}
        }

        // reveal questions may name an answer that is not an option
        if !matches!(self.mode, QuestionMode::RevealOnTimeout)
            && self.option(&self.correct_key).is_none()
        {
            return Err(Error::UnknownCorrectKey(self.correct_key.clone()));
        }

        Ok(())
    }
}
