//! Configuration constants for the trivia player
//!
//! This module contains the limits used to validate question banks and
//! player configuration before a session starts.

/// Question bank limits
pub mod bank {
    /// Maximum number of questions in a single bank
    pub const MAX_QUESTION_COUNT: usize = 500;
}

/// Question limits
pub mod question {
    /// Maximum length of a question prompt in characters
    pub const MAX_PROMPT_LENGTH: usize = 300;
    /// Minimum time in seconds players get to answer
    pub const MIN_TIME_LIMIT: u64 = 1;
    /// Maximum time in seconds players get to answer
    pub const MAX_TIME_LIMIT: u64 = 240;
    /// Maximum number of answer options for a question
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Minimum number of answer options for a standard multiple choice question
    pub const MIN_STANDARD_OPTION_COUNT: usize = 2;
    /// Number of options a binary choice question must have
    pub const BINARY_OPTION_COUNT: usize = 2;
    /// Maximum offset in seconds of a video pause point
    pub const MAX_PAUSE_POINT: u64 = 600;
}

/// Answer option limits
pub mod option {
    /// Maximum length of an option key
    pub const MAX_KEY_LENGTH: usize = 8;
    /// Maximum length of an option label in characters
    pub const MAX_TEXT_LENGTH: usize = 200;
}

/// Media reference limits
pub mod media {
    /// Maximum length of an asset path or URL
    pub const MAX_SOURCE_LENGTH: usize = 512;
    /// Maximum length of alt text for accessibility
    pub const MAX_ALT_LENGTH: usize = 200;
}

/// Player timing limits
pub mod player {
    /// Default answer window in seconds when a question sets none
    pub const DEFAULT_TIME_LIMIT: u64 = 5;
    /// Default pause in milliseconds between two questions
    pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
    /// Maximum pause in milliseconds between two questions
    pub const MAX_SETTLE_DELAY_MS: u64 = 10_000;
    /// Default number of answer records a session keeps
    pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
    /// Maximum number of answer records a session may keep
    pub const MAX_HISTORY_LIMIT: usize = 100_000;
}
