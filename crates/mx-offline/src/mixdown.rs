//! Offline Mixdown Engine
//!
//! Sums the active tracks sample-accurately into one planar buffer per
//! output channel:
//!
//! ```text
//! out[ch][n] = master * Σ track.gain * track[src(ch)][n]    (n < track length)
//! ```
//!
//! Shorter tracks simply end; nothing is looped, stretched, clipped or
//! normalized. Values past ±1.0 are left for the codec layer to deal with.

use mx_core::{
    DecodedAudio, MasterParams, Sample, Track, TrackStatus, any_soloed, linear_to_db,
};

use crate::error::{ExportError, ExportResult};

// ═══════════════════════════════════════════════════════════════════════════════
// RENDERED MIX
// ═══════════════════════════════════════════════════════════════════════════════

/// Planar output of one mixdown
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMix {
    sample_rate: u32,
    channels: Vec<Vec<Sample>>,
}

impl RenderedMix {
    /// Wrap planar buffers (at least one channel, all equal length)
    pub fn from_channels(sample_rate: u32, channels: Vec<Vec<Sample>>) -> ExportResult<Self> {
        // Same layout rules as decoded input
        let audio = DecodedAudio::new(sample_rate, channels)?;
        Ok(Self {
            sample_rate,
            channels: audio.into_channels(),
        })
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    #[inline]
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[Sample]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<Sample>] {
        &self.channels
    }

    /// Largest absolute sample value (may exceed 1.0)
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    pub fn peak_db(&self) -> f64 {
        linear_to_db(self.peak() as f64)
    }

    /// Samples outside `[-1, 1]` that a fixed-point codec will clamp
    pub fn clipped_samples(&self) -> usize {
        self.channels
            .iter()
            .flatten()
            .filter(|s| s.abs() > 1.0)
            .count()
    }

    pub fn into_channels(self) -> Vec<Vec<Sample>> {
        self.channels
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MIXDOWN
// ═══════════════════════════════════════════════════════════════════════════════

/// Tracks that take part in a render
///
/// Effective mute is derived from the mute and solo intents. An audible track
/// still waiting on its decoder fails the render; a failed decode is skipped.
pub fn active_tracks(tracks: &[Track]) -> ExportResult<Vec<(&Track, &DecodedAudio)>> {
    let soloing = any_soloed(tracks);
    let mut active = Vec::with_capacity(tracks.len());

    for track in tracks.iter().filter(|t| !t.effectively_muted(soloing)) {
        match track.status() {
            TrackStatus::Ready => active.push((track, track.require_audio()?)),
            TrackStatus::Pending => {
                return Err(ExportError::DecodeUnavailable { track: track.id });
            }
            TrackStatus::Failed => {
                log::warn!(
                    "Skipping track {} '{}': {}",
                    track.id,
                    track.name,
                    track.failure_reason().unwrap_or("decode failed")
                );
            }
        }
    }

    Ok(active)
}

/// Render the active tracks into one buffer per output channel
pub fn mixdown(tracks: &[Track], master: &MasterParams) -> ExportResult<RenderedMix> {
    if master.sample_rate == 0 {
        return Err(ExportError::InvalidConfig("Output sample rate must be > 0".to_string()));
    }
    if master.channels == 0 {
        return Err(ExportError::InvalidConfig("Output channel count must be > 0".to_string()));
    }

    let active = active_tracks(tracks)?;
    if active.is_empty() {
        return Err(ExportError::NoActiveTracks);
    }

    let frames = active
        .iter()
        .map(|(_, audio)| audio.frames_at_rate(master.sample_rate))
        .max()
        .unwrap_or(0);
    if frames == 0 {
        log::warn!("All {} active tracks are empty, nothing to render", active.len());
        return Err(ExportError::NoActiveTracks);
    }

    let mut output = vec![vec![0.0 as Sample; frames]; master.channels];

    for (track, audio) in &active {
        if audio.sample_rate() != master.sample_rate {
            log::warn!(
                "Track {} is {} Hz, mixing into {} Hz without resampling",
                track.id,
                audio.sample_rate(),
                master.sample_rate
            );
        }

        let gain = track.gain() as Sample;
        for (ch, out) in output.iter_mut().enumerate() {
            let src = audio.source_channel_for(ch);
            for (o, &s) in out.iter_mut().zip(src) {
                *o += s * gain;
            }
        }
    }

    let master_gain = master.master_gain() as Sample;
    if master_gain != 1.0 {
        for s in output.iter_mut().flatten() {
            *s *= master_gain;
        }
    }

    let mix = RenderedMix {
        sample_rate: master.sample_rate,
        channels: output,
    };

    log::info!(
        "Mixdown: {} active tracks, {} frames @ {} Hz, peak {:.1} dB",
        active.len(),
        mix.frames(),
        mix.sample_rate(),
        mix.peak_db()
    );
    if mix.clipped_samples() > 0 {
        log::warn!("Mixdown exceeds full scale on {} samples", mix.clipped_samples());
    }

    Ok(mix)
}
