//! Track model and track list
//!
//! A track holds the user's raw intents (gain, mute, solo) plus the decoded
//! buffer once the host decoder has delivered it. Solo never rewrites the
//! stored mute flag: whether a track is heard is always derived as
//! `muted || (any_soloed && !soloed)`.

use serde::{Deserialize, Serialize};

use crate::audio::DecodedAudio;
use crate::error::{CoreError, CoreResult};
use crate::gain::clamp_track_gain;

/// Unique track identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl TrackId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decode lifecycle of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Waiting on the host decoder
    #[default]
    Pending,
    /// Decoded buffer available
    Ready,
    /// Host decoder gave up on this source
    Failed,
}

#[derive(Debug, Clone)]
enum TrackState {
    Pending,
    Ready(DecodedAudio),
    Failed(String),
}

/// A named audio source with its mix parameters
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique identifier
    pub id: TrackId,
    /// Display name
    pub name: String,
    /// Mute intent
    pub muted: bool,
    /// Solo intent
    pub soloed: bool,
    gain: f64,
    state: TrackState,
}

impl Track {
    /// Create a track that is still waiting for decoded audio
    pub fn new(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            muted: false,
            soloed: false,
            gain: 1.0,
            state: TrackState::Pending,
        }
    }

    /// Create a track that is already decoded
    pub fn with_audio(id: TrackId, name: impl Into<String>, audio: DecodedAudio) -> Self {
        let mut track = Self::new(id, name);
        track.state = TrackState::Ready(audio);
        track
    }

    /// Builder-style gain setter (clamped to `[0, 1]`)
    pub fn gain_of(mut self, gain: f64) -> Self {
        self.set_gain(gain);
        self
    }

    #[inline]
    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f64) {
        self.gain = clamp_track_gain(gain);
    }

    pub fn status(&self) -> TrackStatus {
        match self.state {
            TrackState::Pending => TrackStatus::Pending,
            TrackState::Ready(_) => TrackStatus::Ready,
            TrackState::Failed(_) => TrackStatus::Failed,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TrackState::Ready(_))
    }

    /// Decoded audio, if the track is ready
    pub fn audio(&self) -> Option<&DecodedAudio> {
        match &self.state {
            TrackState::Ready(audio) => Some(audio),
            _ => None,
        }
    }

    /// Decoded audio or `DecodeUnavailable`
    pub fn require_audio(&self) -> CoreResult<&DecodedAudio> {
        self.audio().ok_or(CoreError::DecodeUnavailable(self.id))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            TrackState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Duration in seconds (0 until decoded)
    pub fn duration_secs(&self) -> f64 {
        self.audio().map_or(0.0, DecodedAudio::duration_secs)
    }

    /// Install the decoded buffer; the track becomes `Ready`
    pub fn mark_ready(&mut self, audio: DecodedAudio) {
        self.state = TrackState::Ready(audio);
    }

    /// Record a decode failure; any previous buffer is dropped
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.state = TrackState::Failed(reason.into());
    }

    /// Muted by the user, or silenced because another track is soloed
    #[inline]
    pub fn effectively_muted(&self, any_soloed: bool) -> bool {
        self.muted || (any_soloed && !self.soloed)
    }

    /// Ready and audible
    #[inline]
    pub fn is_active(&self, any_soloed: bool) -> bool {
        self.is_ready() && !self.effectively_muted(any_soloed)
    }

    /// Gain after mute/solo
    pub fn effective_gain(&self, any_soloed: bool) -> f64 {
        if self.effectively_muted(any_soloed) {
            0.0
        } else {
            self.gain
        }
    }
}

/// Check if any track in the slice is soloed
pub fn any_soloed(tracks: &[Track]) -> bool {
    tracks.iter().any(|t| t.soloed)
}

/// Longest decoded duration in the slice, regardless of mute/solo
pub fn max_duration_secs(tracks: &[Track]) -> f64 {
    tracks
        .iter()
        .map(Track::duration_secs)
        .fold(0.0, f64::max)
}

/// Ordered track set owned by the session
#[derive(Debug, Clone)]
pub struct TrackList {
    tracks: Vec<Track>,
    next_id: u64,
    total_duration: f64,
}

impl Default for TrackList {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackList {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            total_duration: 0.0,
        }
    }

    /// Add a pending track, returning its assigned ID
    pub fn add(&mut self, name: impl Into<String>) -> TrackId {
        self.add_track(Track::new(TrackId::default(), name))
    }

    /// Add a track; its ID is reassigned to keep IDs unique
    pub fn add_track(&mut self, mut track: Track) -> TrackId {
        let id = TrackId::new(self.next_id);
        self.next_id += 1;
        track.id = id;
        self.tracks.push(track);
        self.recompute_duration();
        id
    }

    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        let pos = self.tracks.iter().position(|t| t.id == id)?;
        let track = self.tracks.remove(pos);
        self.recompute_duration();
        Some(track)
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn all(&self) -> &[Track] {
        &self.tracks
    }

    pub fn count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn set_gain(&mut self, id: TrackId, gain: f64) -> CoreResult<()> {
        self.update(id, |t| t.set_gain(gain))
    }

    pub fn set_muted(&mut self, id: TrackId, muted: bool) -> CoreResult<()> {
        self.update(id, |t| t.muted = muted)
    }

    pub fn set_soloed(&mut self, id: TrackId, soloed: bool) -> CoreResult<()> {
        self.update(id, |t| t.soloed = soloed)
    }

    /// Flip the solo intent and return the new value
    pub fn toggle_solo(&mut self, id: TrackId) -> CoreResult<bool> {
        let mut now = false;
        self.update(id, |t| {
            t.soloed = !t.soloed;
            now = t.soloed;
        })?;
        Ok(now)
    }

    pub fn mark_ready(&mut self, id: TrackId, audio: DecodedAudio) -> CoreResult<()> {
        self.update(id, |t| t.mark_ready(audio))
    }

    pub fn mark_failed(&mut self, id: TrackId, reason: impl Into<String>) -> CoreResult<()> {
        let reason = reason.into();
        log::warn!("Track {} failed to decode: {}", id, reason);
        self.update(id, |t| t.mark_failed(reason))
    }

    pub fn any_soloed(&self) -> bool {
        any_soloed(&self.tracks)
    }

    /// Derived mute for one track
    pub fn effective_mute(&self, id: TrackId) -> CoreResult<bool> {
        let any = self.any_soloed();
        self.get(id)
            .map(|t| t.effectively_muted(any))
            .ok_or(CoreError::TrackNotFound(id))
    }

    /// Tracks that are ready and audible
    pub fn active_tracks(&self) -> Vec<&Track> {
        let any = self.any_soloed();
        self.tracks.iter().filter(|t| t.is_active(any)).collect()
    }

    /// Longest ready track, recomputed on every mutation
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    fn update<F: FnOnce(&mut Track)>(&mut self, id: TrackId, f: F) -> CoreResult<()> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(CoreError::TrackNotFound(id))?;
        f(track);
        self.recompute_duration();
        Ok(())
    }

    fn recompute_duration(&mut self) {
        self.total_duration = max_duration_secs(&self.tracks);
    }
}
