//! # Trivia Player Library
//!
//! This library plays a bank of narrated multiple choice questions, one at
//! a time: the question is read out, a countdown runs while the user picks
//! an answer, a correctness cue and the answer narration play, and the next
//! question follows. When the countdown runs out, the correct answer is
//! revealed as if it had been picked.
//!
//! The player is synchronous and owns no clock and no media runtime. Delays
//! are requested from the host as [`AlarmMessage`]s, and clips are loaded
//! through the [`playback::MediaDeck`] trait.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
use serde::{Deserialize, Serialize};

pub mod config;
pub mod constants;
pub mod playback;
pub mod player;
pub mod session;
pub mod timer;
pub mod trivia;

pub use config::PlayerConfig;
pub use player::{Phase, PhaseUpdate, QuizPlayer};
pub use trivia::{bank::QuestionBank, question::Question};

/// Delayed events the player asks its host to deliver
///
/// The host calls the `schedule_message` closure passed to the player with
/// one of these and a duration, and hands it back to
/// [`QuizPlayer::receive_alarm`] once the duration has passed. Alarms that
/// arrive after the state they were scheduled for has moved on are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The answer countdown of a question ran out
    CountdownExpired(timer::TimerToken),
    /// The pause after a question's feedback is over
    SettleElapsed {
        /// Generation of the question that finished
        generation: u64,
    },
}

impl AlarmMessage {
    /// Converts the alarm to a JSON string, for hosts that persist alarms
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_message_round_trips_through_json() {
        let alarm = AlarmMessage::SettleElapsed { generation: 7 };
        let json = alarm.to_message();

        assert!(json.contains("SettleElapsed"));
        let parsed: AlarmMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, alarm);
    }

    #[test]
    fn test_countdown_alarm_carries_token() {
        let token = timer::TimerToken {
            generation: 3,
            serial: 1,
        };
        let json = AlarmMessage::CountdownExpired(token).to_message();

        assert!(json.contains("CountdownExpired"));
        assert!(json.contains("\"generation\":3"));
    }
}
