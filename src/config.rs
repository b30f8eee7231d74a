//! Player configuration
//!
//! Tunables that are not part of any question: the pause between two
//! questions and the correctness cue sounds. Limits live in
//! [`crate::constants::player`].

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::{
    constants::player::{
        DEFAULT_HISTORY_LIMIT, DEFAULT_SETTLE_DELAY_MS, MAX_HISTORY_LIMIT, MAX_SETTLE_DELAY_MS,
    },
    trivia::{common::validate_millis, media::MediaSource},
};

/// Errors raised while loading a configuration
#[derive(Error, Debug)]
pub enum Error {
    /// A field is out of bounds
    #[error("player configuration is invalid: {0}")]
    Invalid(String),
    /// The configuration is not valid JSON
    #[error("player configuration could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Short sounds played right after an answer is chosen
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Cues {
    /// Played for correct answers and for every auto-select
    #[garde(dive)]
    #[serde(default)]
    pub correct: Option<MediaSource>,
    /// Played for wrong manual answers
    #[garde(dive)]
    #[serde(default)]
    pub incorrect: Option<MediaSource>,
}

impl Cues {
    /// Picks the cue for an answer
    pub fn for_answer(&self, correct: bool) -> Option<&MediaSource> {
        if correct {
            self.correct.as_ref()
        } else {
            self.incorrect.as_ref()
        }
    }
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(DEFAULT_SETTLE_DELAY_MS)
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Configuration of a [`crate::player::QuizPlayer`]
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PlayerConfig {
    /// Pause between the end of feedback and the next narration
    #[garde(custom(validate_millis::<MAX_SETTLE_DELAY_MS>))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_settle_delay")]
    pub settle_delay: Duration,
    /// Correctness cue sounds
    #[garde(dive)]
    #[serde(default)]
    pub cues: Cues,
    /// Number of most recent answers kept in the session history
    ///
    /// Cyclic banks never end a session, so older records are dropped.
    #[garde(range(min = 1, max = MAX_HISTORY_LIMIT))]
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
            cues: Cues::default(),
            history_limit: default_history_limit(),
        }
    }
}

impl PlayerConfig {
    /// Parses and validates a configuration from JSON
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed JSON and [`Error::Invalid`]
    /// when a value is out of bounds.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config
            .validate()
            .map_err(|report| Error::Invalid(report.to_string()))?;
        Ok(config)
    }

    /// Sets the correctness cue sounds
    #[must_use]
    pub fn with_cues(mut self, correct: MediaSource, incorrect: MediaSource) -> Self {
        self.cues = Cues {
            correct: Some(correct),
            incorrect: Some(incorrect),
        };
        self
    }

    /// Sets how many answers the session history keeps
    #[must_use]
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Sets the pause between questions
    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert!(config.cues.correct.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_defaults() {
        let config = PlayerConfig::from_json("{}").unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_from_json_full() {
        let config = PlayerConfig::from_json(
            r#"{
                "settle_delay": 250,
                "cues": {"correct": "audio/correct-short.mp3", "incorrect": "audio/incorrect.mp3"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        assert_eq!(
            config.cues.for_answer(true).map(MediaSource::location),
            Some("audio/correct-short.mp3")
        );
        assert_eq!(
            config.cues.for_answer(false).map(MediaSource::location),
            Some("audio/incorrect.mp3")
        );
    }

    #[test]
    fn test_from_json_rejects_long_settle_delay() {
        let result = PlayerConfig::from_json(r#"{"settle_delay": 60000}"#);
        assert!(matches!(result, Err(Error::Invalid(_))));
    }

    #[test]
    fn test_from_json_history_limit() {
        let config = PlayerConfig::from_json(r#"{"history_limit": 20}"#).unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(PlayerConfig::default().history_limit, 1000);

        assert!(matches!(
            PlayerConfig::from_json(r#"{"history_limit": 0}"#),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_empty_cue() {
        let result = PlayerConfig::from_json(r#"{"cues": {"correct": ""}}"#);
        assert!(matches!(result, Err(Error::Invalid(_))));
    }

    #[test]
    fn test_from_json_parse_error() {
        assert!(matches!(
            PlayerConfig::from_json("settle_delay = 3"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = PlayerConfig::default()
            .with_settle_delay(Duration::ZERO)
            .with_cues("ok.mp3".into(), "no.mp3".into());
        assert_eq!(config.settle_delay, Duration::ZERO);
        assert!(config.cues.correct.is_some());
        assert!(config.cues.incorrect.is_some());
    }
}
