//! Ordered question banks
//!
//! A [`QuestionBank`] is loaded once before a session starts and is
//! read-only afterwards. The only mutation is [`QuestionBank::advance`],
//! which moves forward one question and wraps back to the start.

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::question::{self, Question, QuestionId};

/// Errors raised while building, loading or starting a bank
#[derive(Error, Debug)]
pub enum Error {
    /// A session cannot start with zero questions
    #[error("question bank is empty")]
    Empty,
    /// Field-level validation failed
    #[error("question bank is invalid: {0}")]
    Invalid(String),
    /// A question breaks one of its structural invariants
    #[error("question {id} is invalid: {source}")]
    Question {
        /// The offending question
        id: QuestionId,
        /// What is wrong with it
        source: question::Error,
    },
    /// Two questions share an identifier
    #[error("question id {0} is used more than once")]
    DuplicateId(QuestionId),
    /// The bank definition is not valid JSON
    #[error("question bank could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An ordered, cyclic sequence of questions
///
/// Every way of obtaining a bank, deserialization included, runs
/// [`QuestionBank::check`], so a bank is never empty.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(try_from = "Definition")]
pub struct QuestionBank {
    /// The questions in play order
    #[garde(length(max = crate::constants::bank::MAX_QUESTION_COUNT), dive)]
    questions: Vec<Question>,
    /// Whether play wraps back to the first question after the last one
    #[garde(skip)]
    cyclic: bool,
    /// Position of the current question
    #[garde(skip)]
    #[serde(skip)]
    index: usize,
}

fn default_cyclic() -> bool {
    true
}

/// A bank as written in JSON, before it is checked
#[derive(Deserialize)]
struct Definition {
    questions: Vec<Question>,
    #[serde(default = "default_cyclic")]
    cyclic: bool,
}

impl TryFrom<Definition> for QuestionBank {
    type Error = Error;

    fn try_from(Definition { questions, cyclic }: Definition) -> Result<Self, Self::Error> {
        let bank = Self {
            questions,
            cyclic,
            index: 0,
        };
        bank.check()?;
        Ok(bank)
    }
}

impl QuestionBank {
    /// Builds a cyclic bank from questions, validating every one of them
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] for an empty list, [`Error::Invalid`] when a
    /// field is out of bounds, [`Error::Question`] when a question breaks
    /// one of its invariants and [`Error::DuplicateId`] for repeated ids.
    pub fn new(questions: Vec<Question>) -> Result<Self, Error> {
        Self::try_from(Definition {
            questions,
            cyclic: true,
        })
    }

    /// Parses and validates a bank from its JSON definition
    ///
    /// The definition is either an object with `questions` (and optionally
    /// `cyclic`) or a bare array of questions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed JSON and the same errors as
    /// [`QuestionBank::new`] otherwise.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let definition = if json.trim_start().starts_with('[') {
            Definition {
                questions: serde_json::from_str(json)?,
                cyclic: true,
            }
        } else {
            serde_json::from_str(json)?
        };

        Self::try_from(definition)
    }

    /// Sets whether the bank wraps around after its last question
    #[must_use]
    pub fn with_cycle(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    /// Runs field validation and the cross-field invariants
    ///
    /// # Errors
    ///
    /// See [`QuestionBank::new`].
    pub fn check(&self) -> Result<(), Error> {
        if self.questions.is_empty() {
            return Err(Error::Empty);
        }

        self.validate()
            .map_err(|report| Error::Invalid(report.to_string()))?;

        for question in &self.questions {
            question
                .check_invariants()
                .map_err(|source| Error::Question {
                    id: question.id,
                    source,
                })?;
        }

        if let Some(id) = self.questions.iter().map(|q| q.id).duplicates().next() {
            return Err(Error::DuplicateId(id));
        }

        Ok(())
    }

    /// Returns the current question
    ///
    /// # Panics
    ///
    /// Panics if the bank is empty, which [`QuestionBank::check`] rules out
    /// for any bank a session was started with.
    pub fn current(&self) -> &Question {
        &self.questions[self.index]
    }

    /// Moves to the next question, wrapping to the first after the last
    ///
    /// Returns the new current question.
    pub fn advance(&mut self) -> &Question {
        self.index = (self.index + 1) % self.questions.len();
        self.current()
    }

    /// Position of the current question (0-based)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of questions
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank holds no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Whether play wraps around after the last question
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// Whether the current question is the last one
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.questions.len()
    }

    /// Moves back to the first question
    pub fn rewind(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::trivia::question::tests::create_test_question;

    fn create_test_bank(count: u32) -> QuestionBank {
        QuestionBank::new((1..=count).map(|id| create_test_question(id, "A")).collect()).unwrap()
    }

    #[test]
    fn test_empty_bank_rejected() {
        assert!(matches!(QuestionBank::new(vec![]), Err(Error::Empty)));
    }

    #[test]
    fn test_advance_wraps() {
        let mut bank = create_test_bank(3);
        assert_eq!(bank.index(), 0);

        let visited: Vec<_> = (0..7).map(|_| bank.advance().id).collect();
        let expected: Vec<QuestionId> = [2_u32, 3, 1, 2, 3, 1, 2].into_iter().map(Into::into).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_advance_wrap_law() {
        for len in 1..=5 {
            let mut bank = create_test_bank(len);
            let len = usize::try_from(len).unwrap();
            for step in 1..=(len * 3) {
                bank.advance();
                assert_eq!(bank.index(), step % len);
            }
        }
    }

    #[test]
    fn test_single_question_bank_stays_put() {
        let mut bank = create_test_bank(1);
        assert!(bank.is_last());
        assert_eq!(bank.advance().id, QuestionId::from(1_u32));
        assert_eq!(bank.index(), 0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = QuestionBank::new(vec![
            create_test_question(1, "A"),
            create_test_question(1, "B"),
        ]);
        assert!(matches!(result, Err(Error::DuplicateId(id)) if id == QuestionId::from(1_u32)));
    }

    #[test]
    fn test_invalid_question_rejected() {
        let result = QuestionBank::new(vec![create_test_question(1, "Z")]);
        assert!(matches!(
            result,
            Err(Error::Question {
                source: question::Error::UnknownCorrectKey(_),
                ..
            })
        ));
    }

    #[test]
    fn test_field_validation_rejected() {
        let mut question = create_test_question(1, "A");
        question.prompt = Some("a".repeat(crate::constants::question::MAX_PROMPT_LENGTH + 1));
        assert!(matches!(
            QuestionBank::new(vec![question]),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_from_json_list() {
        let bank = QuestionBank::from_json(
            r#"[
                {"id": 1, "options": [{"key": "A", "text": "Yes"}, {"key": "B", "text": "No"}], "correct_key": "A"},
                {"id": 2, "options": [{"key": "A", "text": "Yes"}, {"key": "B", "text": "No"}], "correct_key": "B"}
            ]"#,
        )
        .unwrap();
        assert_eq!(bank.len(), 2);
        assert!(bank.is_cyclic());
        assert_eq!(bank.current().id, QuestionId::from(1_u32));
    }

    #[test]
    fn test_from_json_finite_bank() {
        let bank = QuestionBank::from_json(
            r#"{
                "cyclic": false,
                "questions": [
                    {"id": 1, "correct_key": "Paris", "mode": "RevealOnTimeout"}
                ]
            }"#,
        )
        .unwrap();
        assert!(!bank.is_cyclic());
        assert!(bank.is_last());
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            QuestionBank::from_json("not json"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(QuestionBank::from_json("[]"), Err(Error::Empty)));
    }

    #[test]
    fn test_from_json_keeps_field_errors() {
        let error = QuestionBank::from_json(r#"{"questions": [{"id": "one"}]}"#).unwrap_err();
        assert!(matches!(error, Error::Parse(_)));

        let message = error.to_string();
        assert!(message.contains("line 1"), "{message}");
        assert!(!message.contains("untagged"), "{message}");
    }

    #[test]
    fn test_deserialize_checks_bank() {
        assert!(serde_json::from_str::<QuestionBank>(r#"{"questions": []}"#).is_err());
        assert!(
            serde_json::from_str::<QuestionBank>(
                r#"{"questions": [{"id": 1, "options": [{"key": "A", "text": "Yes"}], "correct_key": "A"}]}"#
            )
            .is_err()
        );

        let bank: QuestionBank = serde_json::from_str(
            r#"{"cyclic": false, "questions": [{"id": 1, "correct_key": "Paris", "mode": "RevealOnTimeout"}]}"#,
        )
        .unwrap();
        assert_eq!(bank.len(), 1);
        assert!(!bank.is_cyclic());
    }

    #[test]
    fn test_rewind_and_cycle_flag() {
        let mut bank = create_test_bank(2).with_cycle(false);
        bank.advance();
        assert!(bank.is_last());
        assert!(!bank.is_cyclic());
        bank.rewind();
        assert_eq!(bank.index(), 0);
    }
}
