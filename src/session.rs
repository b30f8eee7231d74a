//! Session identity, answer history and presentation callbacks
//!
//! This module defines what the player reports to the presentation layer.
//! Callbacks registered through [`Listeners`] receive a
//! [`crate::player::PhaseUpdate`] on every transition and a
//! [`SessionSummary`] when a finite bank runs out.

use std::{fmt::Debug, fmt::Display, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

use crate::{
    player::PhaseUpdate,
    trivia::question::{OptionKey, QuestionId},
};

/// A unique identifier for a quiz session
///
/// Every call to [`crate::player::QuizPlayer::start`] opens a new session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    /// Parses a session ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// How one question was resolved
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// The question that was answered
    pub question: QuestionId,
    /// The key that resolved it
    pub selected: OptionKey,
    /// Whether it counts as correct
    pub correct: bool,
    /// Whether the countdown picked the answer
    pub auto_selected: bool,
    /// Time from answering opening to the answer
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub taken: Duration,
}

/// Results of a session, reported when a finite bank is exhausted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// The session being summarized
    pub session: SessionId,
    /// One record per resolved question, in play order
    pub records: Vec<AnswerRecord>,
    /// Number of records that count as correct
    pub correct_count: usize,
}

impl SessionSummary {
    /// Builds a summary from the answer history
    pub fn new(session: SessionId, records: Vec<AnswerRecord>) -> Self {
        let correct_count = records.iter().filter(|record| record.correct).count();
        Self {
            session,
            records,
            correct_count,
        }
    }

    /// Number of questions the user answered themselves
    pub fn manual_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| !record.auto_selected)
            .count()
    }
}

type PhaseCallback = Box<dyn FnMut(&PhaseUpdate)>;
type EndCallback = Box<dyn FnMut(&SessionSummary)>;

/// Callbacks registered by the presentation layer
#[derive(Default)]
pub struct Listeners {
    phase: Vec<PhaseCallback>,
    end: Vec<EndCallback>,
}

impl Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("phase", &self.phase.len())
            .field("end", &self.end.len())
            .finish()
    }
}

impl Listeners {
    /// Registers a phase change callback
    pub fn on_phase_change(&mut self, callback: impl FnMut(&PhaseUpdate) + 'static) {
        self.phase.push(Box::new(callback));
    }

    /// Registers a session end callback
    pub fn on_session_end(&mut self, callback: impl FnMut(&SessionSummary) + 'static) {
        self.end.push(Box::new(callback));
    }

    /// Delivers a phase change to every callback
    pub fn phase_changed(&mut self, update: &PhaseUpdate) {
        for callback in &mut self.phase {
            callback(update);
        }
    }

    /// Delivers the end of a session to every callback
    pub fn session_ended(&mut self, summary: &SessionSummary) {
        for callback in &mut self.end {
            callback(summary);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    fn record(id: u32, correct: bool, auto_selected: bool) -> AnswerRecord {
        AnswerRecord {
            question: id.into(),
            selected: "A".into(),
            correct,
            auto_selected,
            taken: Duration::from_millis(1200),
        }
    }

    #[test]
    fn test_session_id_round_trip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_summary_counts() {
        let summary = SessionSummary::new(
            SessionId::new(),
            vec![record(1, true, false), record(2, false, false), record(3, true, true)],
        );
        assert_eq!(summary.correct_count, 2);
        assert_eq!(summary.manual_count(), 2);
    }

    #[test]
    fn test_record_serializes_milliseconds() {
        let json = serde_json::to_value(record(1, true, false)).unwrap();
        assert_eq!(json["taken"], 1200);
        assert_eq!(json["selected"], "A");
    }

    #[test]
    fn test_listeners_dispatch_to_all() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        for tag in ["first", "second"] {
            let seen = seen.clone();
            listeners.on_session_end(move |summary| {
                seen.borrow_mut().push((tag, summary.correct_count));
            });
        }

        listeners.session_ended(&SessionSummary::new(SessionId::new(), vec![record(1, true, false)]));
        assert_eq!(*seen.borrow(), vec![("first", 1), ("second", 1)]);
    }
}
