//! mx-dsp: Metering and waveform summaries
//!
//! Numeric analysis for the transport and timeline views. Nothing in here
//! draws; the host renders the returned values.
//!
//! - [`LevelMeter`]: per-channel RMS with a linearly falling peak-hold cap,
//!   fed from the live playback tap once per animation tick
//! - [`summarize`] / [`WaveformSummarizer`]: one peak value per display
//!   pixel across the whole track set, recomputed behind a short debounce

mod meter;
mod waveform;

pub use meter::*;
pub use waveform::*;
