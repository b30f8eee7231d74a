//! The quiz playback state machine
//!
//! [`QuizPlayer`] drives one question at a time through
//! `Narrating → AwaitingAnswer → Feedback → Advancing` and back to
//! `Narrating` for the next question. It is a plain synchronous value:
//! deferred work is requested through a `schedule_message` closure and
//! comes back through [`QuizPlayer::receive_alarm`], while the media
//! runtime reports clip completion through
//! [`QuizPlayer::receive_media_event`].
//!
//! Every question entry bumps a generation counter. Alarms and clip tokens
//! carry the generation they were issued for, and anything that arrives for
//! an older generation is dropped before it can touch state.

use std::{collections::VecDeque, time::Duration};

use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{Span, debug, info, info_span, warn};
use web_time::SystemTime;

use crate::{
    AlarmMessage,
    config::PlayerConfig,
    playback::{ActiveClips, ClipSlot, MediaDeck, MediaEvent, MediaEventKind},
    session::{AnswerRecord, Listeners, SessionId, SessionSummary},
    timer::CountdownTimer,
    trivia::{
        bank::{self, QuestionBank},
        media::MediaSource,
        question::{OptionKey, Question, QuestionId},
    },
};

/// Clips that must be finished before feedback is over
const FEEDBACK_SLOTS: [ClipSlot; 3] = [ClipSlot::Cue, ClipSlot::Answer, ClipSlot::QuestionVideo];

/// The lifecycle phase of the current question
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No session is running
    #[default]
    Idle,
    /// The question is being read out (and its video played up to the pause point)
    Narrating,
    /// The countdown is running and answers are accepted
    AwaitingAnswer,
    /// The correctness cue and answer narration are playing
    Feedback,
    /// Waiting out the settle delay before the next question
    Advancing,
    /// A finite bank ran out of questions
    Finished,
}

/// How the current question was answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// The answer that resolved the question
    pub key: OptionKey,
    /// Whether it counts as correct
    pub correct: bool,
    /// Whether the countdown picked it
    pub auto_selected: bool,
}

/// What the presentation layer needs to render the current phase
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseUpdate {
    /// The running session
    pub session: Option<SessionId>,
    /// The phase just entered
    pub phase: Phase,
    /// Position of the question in the bank (0-based)
    pub index: usize,
    /// Number of questions in the bank
    pub count: usize,
    /// The question on screen
    pub question: Option<Question>,
    /// The answer chosen so far
    pub selected_key: Option<OptionKey>,
    /// How the question was resolved, once it was
    pub verdict: Option<Verdict>,
    /// Time left to answer, while answering is open
    #[serde_as(as = "Option<serde_with::DurationMilliSeconds<u64>>")]
    pub countdown: Option<Duration>,
}

/// Reasons an answer is ignored
///
/// These never reach the caller of [`QuizPlayer::select_answer`]; they are
/// logged and the call returns `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The question is not open for answers
    #[error("answers are not accepted while {0:?}")]
    NotAcceptingAnswers(Phase),
    /// The question only resolves on timeout
    #[error("question {0} does not take manual answers")]
    ManualAnswersDisabled(QuestionId),
    /// The key names no option of the question
    #[error("{key} is not an option of question {question}")]
    InvalidAnswer {
        /// The question on screen
        question: QuestionId,
        /// The rejected key
        key: OptionKey,
    },
}

/// Plays a question bank, one question at a time
#[derive_where(Debug)]
pub struct QuizPlayer<D: MediaDeck> {
    /// Tunables
    config: PlayerConfig,
    /// Loads clips
    #[derive_where(skip)]
    deck: D,
    /// Clips alive for the current question
    #[derive_where(skip)]
    clips: ActiveClips<D::Clip>,
    /// Answer countdown
    timer: CountdownTimer,
    /// Presentation callbacks
    listeners: Listeners,
    /// Questions of the running session
    bank: Option<QuestionBank>,
    /// The running session
    session: Option<SessionId>,
    /// Current phase
    phase: Phase,
    /// Bumped on every question entry and teardown
    generation: u64,
    /// Answer chosen for the current question
    selected_key: Option<OptionKey>,
    /// Resolution of the current question
    verdict: Option<Verdict>,
    /// Answer narration waiting for the cue to end
    pending_answer: Option<MediaSource>,
    /// When answering opened for the current question
    answers_opened_at: Option<SystemTime>,
    /// Resolved questions of the running session
    history: VecDeque<AnswerRecord>,
    /// Tracing span of the running session
    span: Span,
}

impl<D: MediaDeck> QuizPlayer<D> {
    /// Creates an idle player
    ///
    /// # Arguments
    ///
    /// * `config` - Settle delay and cue sounds
    /// * `deck` - The media runtime clips are loaded from
    pub fn new(config: PlayerConfig, deck: D) -> Self {
        Self {
            config,
            deck,
            clips: ActiveClips::default(),
            timer: CountdownTimer::default(),
            listeners: Listeners::default(),
            bank: None,
            session: None,
            phase: Phase::Idle,
            generation: 0,
            selected_key: None,
            verdict: None,
            pending_answer: None,
            answers_opened_at: None,
            history: VecDeque::new(),
            span: Span::none(),
        }
    }

    /// Registers a callback for every phase change
    pub fn on_phase_change(&mut self, callback: impl FnMut(&PhaseUpdate) + 'static) {
        self.listeners.on_phase_change(callback);
    }

    /// Registers a callback for the end of a finite session
    pub fn on_session_end(&mut self, callback: impl FnMut(&SessionSummary) + 'static) {
        self.listeners.on_session_end(callback);
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The running session, if any
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// The question on screen, if a session is running
    pub fn current_question(&self) -> Option<&Question> {
        self.bank.as_ref().map(QuestionBank::current)
    }

    /// The answer chosen for the current question
    pub fn selected_key(&self) -> Option<&OptionKey> {
        self.selected_key.as_ref()
    }

    /// Resolved questions of the running session, in play order
    ///
    /// Only the most recent [`PlayerConfig::history_limit`] records are kept.
    pub fn history(&self) -> &VecDeque<AnswerRecord> {
        &self.history
    }

    /// Summary of the running session, built from [`QuizPlayer::history`]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.session
            .map(|session| SessionSummary::new(session, self.history.iter().cloned().collect()))
    }

    /// The media runtime
    pub fn deck(&self) -> &D {
        &self.deck
    }

    /// The media runtime, mutably
    pub fn deck_mut(&mut self) -> &mut D {
        &mut self.deck
    }

    /// Describes the current state for a presentation layer
    ///
    /// This is what phase change callbacks receive, and what a presentation
    /// layer attaching mid-question should render.
    pub fn snapshot(&self) -> PhaseUpdate {
        PhaseUpdate {
            session: self.session,
            phase: self.phase,
            index: self.bank.as_ref().map_or(0, QuestionBank::index),
            count: self.bank.as_ref().map_or(0, QuestionBank::len),
            question: self.current_question().cloned(),
            selected_key: self.selected_key.clone(),
            verdict: self.verdict.clone(),
            countdown: match self.phase {
                Phase::AwaitingAnswer => self.timer.remaining(),
                _ => None,
            },
        }
    }

    /// Starts a new session at the bank's current question
    ///
    /// A session that is already running is torn down first.
    ///
    /// # Arguments
    ///
    /// * `bank` - The questions to play
    /// * `schedule_message` - Function to schedule delayed alarms
    ///
    /// # Errors
    ///
    /// Returns [`bank::Error::Empty`] for a bank without questions, or the
    /// bank's validation error if it is otherwise malformed. The player stays
    /// untouched in that case.
    pub fn start<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        bank: QuestionBank,
        mut schedule_message: S,
    ) -> Result<SessionId, bank::Error> {
        bank.check()?;

        self.teardown();

        let session = SessionId::new();
        self.span = info_span!("quiz_session", %session);
        let _entered = self.span.clone().entered();
        info!(questions = bank.len(), cyclic = bank.is_cyclic(), "quiz session started");

        self.session = Some(session);
        self.bank = Some(bank);
        self.history.clear();

        self.begin_question(&mut schedule_message);

        Ok(session)
    }

    /// Ends the session, stopping every clip and the countdown
    ///
    /// Alarms and media events still in flight are ignored afterwards.
    pub fn stop(&mut self) {
        if self.phase == Phase::Idle {
            return;
        }

        let _entered = self.span.clone().entered();
        info!("quiz session stopped");

        self.teardown();
        self.bank = None;
        self.session = None;
        self.enter(Phase::Idle);
        self.span = Span::none();
    }

    /// Answers the current question
    ///
    /// Only the first answer while [`Phase::AwaitingAnswer`] takes effect.
    /// Answers in any other phase, answers to questions without a manual
    /// path, and keys that name no option are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the answer resolved the question, `false` if it was ignored
    pub fn select_answer<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        key: impl Into<OptionKey>,
        mut schedule_message: S,
    ) -> bool {
        let _entered = self.span.clone().entered();
        let key = key.into();

        if let Err(rejection) = self.check_answer(&key) {
            debug!(%rejection, "answer ignored");
            return false;
        }

        self.timer.cancel();
        self.resolve(key, false, &mut schedule_message);

        true
    }

    /// Handles a scheduled alarm
    ///
    /// # Returns
    ///
    /// `true` if the alarm moved the state machine, `false` if it was stale
    pub fn receive_alarm<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        alarm: &AlarmMessage,
        mut schedule_message: S,
    ) -> bool {
        let _entered = self.span.clone().entered();

        match *alarm {
            AlarmMessage::CountdownExpired(token) => {
                if token.generation != self.generation
                    || self.phase != Phase::AwaitingAnswer
                    || !self.timer.fire(token)
                {
                    debug!(?token, "stale countdown ignored");
                    return false;
                }

                let Some(key) = self.current_question().map(|q| q.correct_key.clone()) else {
                    return false;
                };
                self.resolve(key, true, &mut schedule_message);

                true
            }
            AlarmMessage::SettleElapsed { generation } => {
                if generation != self.generation || self.phase != Phase::Advancing {
                    debug!(generation, "stale settle ignored");
                    return false;
                }

                self.next_question(&mut schedule_message);

                true
            }
        }
    }

    /// Handles a notification from the media runtime
    ///
    /// # Returns
    ///
    /// `true` if the event belonged to a live clip, `false` if it was stale
    pub fn receive_media_event<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        event: MediaEvent,
        mut schedule_message: S,
    ) -> bool {
        let _entered = self.span.clone().entered();

        let slot = if event.token.generation == self.generation {
            self.clips.slot_of(event.token)
        } else {
            None
        };
        let Some(slot) = slot else {
            debug!(token = ?event.token, "stale media event ignored");
            return false;
        };

        let schedule_message = &mut schedule_message;
        match (slot, event.kind) {
            (ClipSlot::Narration, MediaEventKind::Ended) => {
                self.clips.release(slot);
                if self.phase == Phase::Narrating {
                    self.narration_finished(schedule_message);
                }
            }
            (ClipSlot::QuestionVideo, MediaEventKind::CuePoint) => {
                if self.phase == Phase::Narrating {
                    self.clips.pause(slot);
                    self.open_answers(schedule_message);
                }
            }
            (ClipSlot::QuestionVideo, MediaEventKind::Ended) => {
                self.clips.release(slot);
                match self.phase {
                    // shorter than its pause point
                    Phase::Narrating => self.open_answers(schedule_message),
                    Phase::Feedback => self.finish_feedback(schedule_message),
                    _ => {}
                }
            }
            (ClipSlot::Cue, MediaEventKind::Ended) => {
                self.clips.release(slot);
                if self.phase == Phase::Feedback {
                    self.cue_finished(schedule_message);
                }
            }
            (ClipSlot::Answer, MediaEventKind::Ended) => {
                self.clips.release(slot);
                self.finish_feedback(schedule_message);
            }
            (_, MediaEventKind::CuePoint) => return false,
        }

        true
    }

    /// Moves to `phase` and notifies the presentation layer
    fn enter(&mut self, phase: Phase) {
        self.phase = phase;

        info!(
            question = ?self.current_question().map(|q| q.id),
            ?phase,
            "phase changed"
        );

        let update = self.snapshot();
        self.listeners.phase_changed(&update);
    }

    /// Moves from `before` to `after`, or does nothing if not in `before`
    fn change_phase(&mut self, before: Phase, after: Phase) -> bool {
        if self.phase == before {
            self.enter(after);

            true
        } else {
            false
        }
    }

    /// Stops everything owned by the current question
    fn teardown(&mut self) {
        self.timer.cancel();
        self.clips.stop_all();
        self.generation += 1;
        self.selected_key = None;
        self.verdict = None;
        self.pending_answer = None;
        self.answers_opened_at = None;
    }

    /// Loads and plays a clip, logging failures
    ///
    /// Returns `false` when the clip could not start, in which case the
    /// caller continues as if it had already ended.
    fn play(&mut self, slot: ClipSlot, source: &MediaSource, cue: Option<Duration>) -> bool {
        match self
            .clips
            .start(&mut self.deck, slot, source, cue, self.generation)
        {
            Ok(_) => true,
            Err(e) => {
                warn!(?slot, error = %e, "clip failed, continuing");
                false
            }
        }
    }

    /// Enters the current question
    fn begin_question<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        self.teardown();

        let Some(question) = self.current_question() else {
            return;
        };
        let narration = question.narration.clone();
        let has_video = question.pausing_video().is_some();

        if narration.is_none() && !has_video {
            self.open_answers(schedule_message);
            return;
        }

        self.enter(Phase::Narrating);

        if let Some(narration) = narration {
            if self.play(ClipSlot::Narration, &narration, None) {
                return;
            }
        }

        self.narration_finished(schedule_message);
    }

    /// Continues after the narration, with the pausing video if there is one
    fn narration_finished<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        let video = self
            .current_question()
            .and_then(Question::pausing_video)
            .map(|(video, pause_at)| (video.source.clone(), pause_at));

        if let Some((source, pause_at)) = video {
            if self.play(ClipSlot::QuestionVideo, &source, Some(pause_at)) {
                return;
            }
        }

        self.open_answers(schedule_message);
    }

    /// Arms the countdown and starts accepting answers
    fn open_answers<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        let Some(time_limit) = self.current_question().map(|q| q.time_limit) else {
            return;
        };

        self.timer
            .start(time_limit, self.generation, &mut *schedule_message);
        self.answers_opened_at = Some(SystemTime::now());

        self.enter(Phase::AwaitingAnswer);
    }

    /// Checks whether `key` may answer the current question
    fn check_answer(&self, key: &OptionKey) -> Result<(), Rejection> {
        if self.phase != Phase::AwaitingAnswer {
            return Err(Rejection::NotAcceptingAnswers(self.phase));
        }

        let Some(question) = self.current_question() else {
            return Err(Rejection::NotAcceptingAnswers(self.phase));
        };

        if !question.accepts_manual_answers() {
            return Err(Rejection::ManualAnswersDisabled(question.id));
        }

        if question.option(key).is_none() {
            return Err(Rejection::InvalidAnswer {
                question: question.id,
                key: key.clone(),
            });
        }

        Ok(())
    }

    /// Records the answer and starts feedback
    ///
    /// Auto-selected answers always count as correct and get the correct
    /// cue; they reveal the answer rather than penalize.
    fn resolve<S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        key: OptionKey,
        auto_selected: bool,
        schedule_message: &mut S,
    ) {
        if self.phase != Phase::AwaitingAnswer {
            return;
        }
        let Some(question) = self.current_question() else {
            return;
        };

        let correct = auto_selected || question.is_correct(&key);
        let question_id = question.id;
        let answer = if correct {
            question.feedback.clone()
        } else {
            None
        };

        let taken = self
            .answers_opened_at
            .and_then(|opened| opened.elapsed().ok())
            .unwrap_or_default();
        self.history.push_back(AnswerRecord {
            question: question_id,
            selected: key.clone(),
            correct,
            auto_selected,
            taken,
        });
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }

        self.selected_key = Some(key.clone());
        self.verdict = Some(Verdict {
            key,
            correct,
            auto_selected,
        });
        self.pending_answer = answer;

        if !self.change_phase(Phase::AwaitingAnswer, Phase::Feedback) {
            return;
        }

        if self.clips.is_active(ClipSlot::QuestionVideo) {
            if let Err(e) = self.clips.resume(ClipSlot::QuestionVideo) {
                warn!(error = %e, "video failed to resume, continuing");
            }
        }

        let cue = self.config.cues.for_answer(correct).cloned();
        if let Some(cue) = cue {
            if self.play(ClipSlot::Cue, &cue, None) {
                return;
            }
        }

        self.cue_finished(schedule_message);
    }

    /// Plays the answer narration once the cue is over
    fn cue_finished<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        if let Some(answer) = self.pending_answer.take() {
            if self.play(ClipSlot::Answer, &answer, None) {
                return;
            }
        }

        self.finish_feedback(schedule_message);
    }

    /// Moves on once no feedback clip is left playing
    fn finish_feedback<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        if self.phase != Phase::Feedback
            || self.pending_answer.is_some()
            || !self.clips.all_idle(&FEEDBACK_SLOTS)
        {
            return;
        }

        self.enter(Phase::Advancing);

        if self.config.settle_delay.is_zero() {
            self.next_question(schedule_message);
        } else {
            schedule_message(
                AlarmMessage::SettleElapsed {
                    generation: self.generation,
                },
                self.config.settle_delay,
            );
        }
    }

    /// Advances the bank and narrates the next question
    fn next_question<S: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: &mut S) {
        let Some(bank) = &mut self.bank else {
            return;
        };

        if !bank.is_cyclic() && bank.is_last() {
            self.finish();
            return;
        }

        bank.advance();
        self.begin_question(schedule_message);
    }

    /// Ends a finite session and reports its summary
    fn finish(&mut self) {
        self.teardown();
        self.enter(Phase::Finished);

        if let Some(summary) = self.summary() {
            info!(
                correct = summary.correct_count,
                answered = summary.records.len(),
                "quiz session finished"
            );
            self.listeners.session_ended(&summary);
        }
    }
}
