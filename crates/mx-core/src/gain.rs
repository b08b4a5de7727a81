//! Gain and decibel conversion

use serde::{Deserialize, Serialize};

/// Anything at or below this level is treated as silence when converting back to linear.
pub const SILENCE_FLOOR_DB: f64 = -144.0;

/// Maximum per-track linear gain (unity)
pub const MAX_TRACK_GAIN: f64 = 1.0;

/// Maximum master linear gain (+6 dB headroom)
pub const MAX_MASTER_GAIN: f64 = 2.0;

/// Decibel value wrapper
///
/// Silence is represented by `f64::NEG_INFINITY` rather than a finite floor,
/// so a gain of exactly zero survives a round trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f64::NEG_INFINITY);

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= SILENCE_FLOOR_DB {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }

    #[inline]
    pub fn is_silent(self) -> bool {
        self.0 <= SILENCE_FLOOR_DB
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Display for Decibels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_infinite() && self.0 < 0.0 {
            write!(f, "-inf dB")
        } else {
            write!(f, "{:.1} dB", self.0)
        }
    }
}

/// Convert linear gain to dB (`0.0` maps to negative infinity)
#[inline]
pub fn linear_to_db(gain: f64) -> f64 {
    Decibels::from_gain(gain).0
}

/// Convert dB to linear gain (negative infinity maps to exactly `0.0`)
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    Decibels(db).to_gain()
}

/// Clamp a per-track gain into `[0, 1]`; NaN collapses to silence.
#[inline]
pub fn clamp_track_gain(gain: f64) -> f64 {
    if gain.is_nan() {
        0.0
    } else {
        gain.clamp(0.0, MAX_TRACK_GAIN)
    }
}

/// Clamp a master gain into `[0, 2]`; NaN collapses to silence.
#[inline]
pub fn clamp_master_gain(gain: f64) -> f64 {
    if gain.is_nan() {
        0.0
    } else {
        gain.clamp(0.0, MAX_MASTER_GAIN)
    }
}
