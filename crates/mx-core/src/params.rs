//! Session-wide mix parameters

use serde::{Deserialize, Deserializer, Serialize};

use crate::gain::clamp_master_gain;

/// Default output sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Output channel count (stereo)
pub const DEFAULT_CHANNELS: usize = 2;

/// Master bus parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterParams {
    /// Linear master gain in `[0, 2]`
    #[serde(deserialize_with = "deserialize_master_gain")]
    master_gain: f64,
    /// Output sample rate
    pub sample_rate: u32,
    /// Output channel count
    pub channels: usize,
}

impl Default for MasterParams {
    fn default() -> Self {
        Self {
            master_gain: 1.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
        }
    }
}

impl MasterParams {
    pub fn new(master_gain: f64) -> Self {
        Self::default().with_gain(master_gain)
    }

    /// Set master gain (clamped to `[0, 2]`)
    pub fn with_gain(mut self, gain: f64) -> Self {
        self.master_gain = clamp_master_gain(gain);
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    #[inline]
    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }

    pub fn set_master_gain(&mut self, gain: f64) {
        self.master_gain = clamp_master_gain(gain);
    }
}

fn deserialize_master_gain<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_master_gain)
}
