//! Trivia content: questions, answer options, media references and banks
//!
//! This module contains the immutable data a quiz session plays through.
//! Everything here is loaded once, validated, and then only read by the
//! [`crate::player::QuizPlayer`].

pub mod bank;
pub mod common;
pub mod media;
pub mod question;
