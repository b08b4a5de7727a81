//! mx-core: Sample buffer model for Mixbounce
//!
//! Foundation types shared by the meter, the waveform summarizer and the
//! offline mixdown/export pipeline:
//!
//! - [`DecodedAudio`]: owned per-channel `f32` buffers produced by the host decoder
//! - [`Track`] / [`TrackList`]: named sources with gain, mute, solo and lifecycle
//! - [`MasterParams`]: session-wide master gain and output layout
//! - [`Decibels`]: linear gain <-> dB conversion

mod audio;
mod error;
mod gain;
mod params;
mod track;

pub use audio::*;
pub use error::*;
pub use gain::*;
pub use params::*;
pub use track::*;
