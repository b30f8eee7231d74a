//! Media playback seam
//!
//! The player never talks to a concrete audio or video runtime. It loads
//! clips through a [`MediaDeck`] and drives them through [`MediaClip`].
//! Completion comes back as a [`MediaEvent`] that the host hands to
//! [`crate::player::QuizPlayer::receive_media_event`].
//!
//! Every load is issued a fresh [`ClipToken`]. The deck must tag the events
//! of that clip with that token and nothing else, so each clip has exactly
//! one subscriber and events from clips that were stopped or replaced can
//! be told apart from live ones.

use std::time::Duration;

use enum_map::{Enum, EnumMap};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trivia::media::MediaSource;

/// A clip could not be fetched, decoded or started
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not play {asset}: {reason}")]
pub struct AssetLoadError {
    /// The asset that failed
    pub asset: MediaSource,
    /// What the runtime reported
    pub reason: String,
}

impl AssetLoadError {
    /// Creates a load error for `asset`
    pub fn new(asset: MediaSource, reason: impl Into<String>) -> Self {
        Self {
            asset,
            reason: reason.into(),
        }
    }
}

/// Identifies one loaded clip within one question of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipToken {
    /// Generation of the question the clip was loaded for
    pub generation: u64,
    /// Load counter, unique per player
    pub serial: u64,
}

/// What happened to a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaEventKind {
    /// Playback reached the end
    Ended,
    /// Playback reached the cue point the clip was loaded with
    CuePoint,
}

/// A notification from the media runtime about a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEvent {
    /// The clip the event belongs to
    pub token: ClipToken,
    /// What happened
    pub kind: MediaEventKind,
}

impl MediaEvent {
    /// Playback of `token` ended
    pub fn ended(token: ClipToken) -> Self {
        Self {
            token,
            kind: MediaEventKind::Ended,
        }
    }

    /// Playback of `token` reached its cue point
    pub fn cue_point(token: ClipToken) -> Self {
        Self {
            token,
            kind: MediaEventKind::CuePoint,
        }
    }
}

/// A single playable asset
pub trait MediaClip {
    /// Starts or resumes playback
    ///
    /// Returns once playback has *started*; the end is reported separately
    /// as a [`MediaEvent`]. Callers never call this on a clip that is
    /// already playing.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetLoadError`] if playback cannot start.
    fn play(&mut self) -> Result<(), AssetLoadError>;

    /// Pauses playback, keeping the position
    fn pause(&mut self);

    /// Halts playback; calling it again has no effect
    fn stop(&mut self);
}

/// Loads clips for the player
pub trait MediaDeck {
    /// The clip type this deck produces
    type Clip: MediaClip;

    /// Loads `source`, tagging all of its events with `token`
    ///
    /// When `cue` is set, the deck also reports a
    /// [`MediaEventKind::CuePoint`] once playback reaches that offset.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetLoadError`] if the asset cannot be fetched or
    /// decoded.
    fn load(
        &mut self,
        source: &MediaSource,
        cue: Option<Duration>,
        token: ClipToken,
    ) -> Result<Self::Clip, AssetLoadError>;
}

/// The roles a clip can play while a question is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum ClipSlot {
    /// The question being read out
    Narration,
    /// The question video of a video pause point question
    QuestionVideo,
    /// The short correct/incorrect sound
    Cue,
    /// The answer being read out
    Answer,
}

/// A clip that is loaded and owned by the player
#[derive(Debug)]
struct ActiveClip<C> {
    token: ClipToken,
    clip: C,
}

/// The set of clips alive for the current question, at most one per slot
#[derive(Debug)]
pub struct ActiveClips<C> {
    slots: EnumMap<ClipSlot, Option<ActiveClip<C>>>,
    next_serial: u64,
}

impl<C> Default for ActiveClips<C> {
    fn default() -> Self {
        Self {
            slots: EnumMap::from_fn(|_| None),
            next_serial: 0,
        }
    }
}

impl<C: MediaClip> ActiveClips<C> {
    /// Loads and starts `source` in `slot`, stopping whatever was there
    ///
    /// # Errors
    ///
    /// Returns the deck's or the clip's [`AssetLoadError`]; the slot is
    /// left empty in that case.
    pub fn start<D: MediaDeck<Clip = C>>(
        &mut self,
        deck: &mut D,
        slot: ClipSlot,
        source: &MediaSource,
        cue: Option<Duration>,
        generation: u64,
    ) -> Result<ClipToken, AssetLoadError> {
        self.stop(slot);

        let token = ClipToken {
            generation,
            serial: self.next_serial,
        };
        self.next_serial += 1;

        let mut clip = deck.load(source, cue, token)?;
        if let Err(e) = clip.play() {
            clip.stop();
            return Err(e);
        }
        self.slots[slot] = Some(ActiveClip { token, clip });

        Ok(token)
    }

    /// Finds the slot a live clip occupies
    pub fn slot_of(&self, token: ClipToken) -> Option<ClipSlot> {
        self.slots
            .iter()
            .find(|(_, active)| active.as_ref().is_some_and(|a| a.token == token))
            .map(|(slot, _)| slot)
    }

    /// Whether `slot` holds a clip
    pub fn is_active(&self, slot: ClipSlot) -> bool {
        self.slots[slot].is_some()
    }

    /// Whether none of `slots` hold a clip
    pub fn all_idle(&self, slots: &[ClipSlot]) -> bool {
        slots.iter().all(|slot| !self.is_active(*slot))
    }

    /// Forgets the clip in `slot` after it finished on its own
    pub fn release(&mut self, slot: ClipSlot) {
        self.slots[slot] = None;
    }

    /// Pauses the clip in `slot`, if any
    pub fn pause(&mut self, slot: ClipSlot) {
        if let Some(active) = &mut self.slots[slot] {
            active.clip.pause();
        }
    }

    /// Resumes the clip in `slot`, if any
    ///
    /// # Errors
    ///
    /// Returns the clip's [`AssetLoadError`]; the slot is emptied in that
    /// case.
    pub fn resume(&mut self, slot: ClipSlot) -> Result<(), AssetLoadError> {
        if let Some(active) = &mut self.slots[slot] {
            if let Err(e) = active.clip.play() {
                self.stop(slot);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Stops and drops the clip in `slot`
    pub fn stop(&mut self, slot: ClipSlot) {
        if let Some(mut active) = self.slots[slot].take() {
            active.clip.stop();
        }
    }

    /// Stops and drops every clip
    pub fn stop_all(&mut self) {
        for active in self.slots.values_mut() {
            if let Some(mut active) = active.take() {
                active.clip.stop();
            }
        }
    }
}
