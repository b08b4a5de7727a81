//! Level Meter
//!
//! Instant RMS bar plus a slowly falling peak-hold cap:
//!
//! ```text
//! level = min(rms * 4, 1)
//! peak  = level            if level >= peak
//!       = max(peak - 0.005, 0) otherwise
//! ```
//!
//! The analysis tap runs quieter than what the listener perceives, so the
//! fixed x4 gain is applied before clamping to unit range. Constants are part
//! of the visual contract and must not drift.

use mx_core::{Sample, linear_to_db};
use serde::Serialize;

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Gain applied to RMS before display
pub const METER_HEADROOM_GAIN: f64 = 4.0;

/// Amount the peak-hold falls per tick
pub const PEAK_DECAY_PER_TICK: f64 = 0.005;

// ═══════════════════════════════════════════════════════════════════════════════
// SAMPLE TAP
// ═══════════════════════════════════════════════════════════════════════════════

/// One channel's rolling time-domain window from the playback tap
#[derive(Debug, Clone, Copy)]
pub enum SampleTap<'a> {
    /// Unsigned 8-bit samples centred on 128
    Bytes(&'a [u8]),
    /// Float samples in `[-1, 1]`
    Float(&'a [Sample]),
}

impl SampleTap<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(b) => b.len(),
            Self::Float(f) => f.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root-mean-square over the window (0 for an empty window)
    pub fn rms(&self) -> f64 {
        let (sum_sq, n) = match self {
            Self::Bytes(bytes) => (
                bytes
                    .iter()
                    .map(|&b| {
                        let s = normalize_byte(b);
                        s * s
                    })
                    .sum::<f64>(),
                bytes.len(),
            ),
            Self::Float(samples) => (
                samples
                    .iter()
                    .filter(|s| s.is_finite())
                    .map(|&s| (s as f64) * (s as f64))
                    .sum::<f64>(),
                samples.len(),
            ),
        };

        if n == 0 { 0.0 } else { (sum_sq / n as f64).sqrt() }
    }
}

/// Map an unsigned byte sample to `[-1, 1)`
#[inline]
pub fn normalize_byte(byte: u8) -> f64 {
    (byte as f64 - 128.0) / 128.0
}

// ═══════════════════════════════════════════════════════════════════════════════
// METER
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-channel meter reading for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MeterSample {
    /// Raw RMS over the tap window
    pub rms: f64,
    /// Display level: `min(rms * 4, 1)`
    pub level: f64,
    /// Peak-hold cap
    pub peak: f64,
}

impl MeterSample {
    pub fn rms_db(&self) -> f64 {
        linear_to_db(self.rms)
    }

    pub fn peak_db(&self) -> f64 {
        linear_to_db(self.peak)
    }
}

/// Multi-channel RMS meter with peak hold
#[derive(Debug, Clone)]
pub struct LevelMeter {
    readings: Vec<MeterSample>,
}

impl LevelMeter {
    pub fn new(channels: usize) -> Self {
        Self {
            readings: vec![MeterSample::default(); channels],
        }
    }

    pub fn stereo() -> Self {
        Self::new(2)
    }

    pub fn channels(&self) -> usize {
        self.readings.len()
    }

    /// Advance one tick. Channels without a tap window are read as silence.
    pub fn tick(&mut self, taps: &[SampleTap<'_>]) -> &[MeterSample] {
        for (ch, reading) in self.readings.iter_mut().enumerate() {
            let rms = taps.get(ch).map_or(0.0, SampleTap::rms);
            let level = (rms * METER_HEADROOM_GAIN).min(1.0);

            let peak = if level >= reading.peak {
                level
            } else {
                (reading.peak - PEAK_DECAY_PER_TICK).max(0.0)
            };

            *reading = MeterSample { rms, level, peak };
        }

        &self.readings
    }

    /// Latest readings without advancing
    pub fn readings(&self) -> &[MeterSample] {
        &self.readings
    }

    pub fn peak(&self, channel: usize) -> f64 {
        self.readings.get(channel).map_or(0.0, |r| r.peak)
    }

    pub fn reset(&mut self) {
        self.readings.fill(MeterSample::default());
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::stereo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_byte_normalization() {
        assert_eq!(normalize_byte(128), 0.0);
        assert_eq!(normalize_byte(0), -1.0);
        assert_relative_eq!(normalize_byte(255), 127.0 / 128.0);
    }

    #[test]
    fn test_rms_of_silence_and_full_scale() {
        assert_eq!(SampleTap::Bytes(&[128; 64]).rms(), 0.0);
        assert_eq!(SampleTap::Float(&[]).rms(), 0.0);
        assert_relative_eq!(SampleTap::Float(&[1.0, -1.0, 1.0, -1.0]).rms(), 1.0);
        assert_relative_eq!(SampleTap::Bytes(&[0, 0]).rms(), 1.0);
    }

    #[test]
    fn test_level_applies_headroom_gain() {
        let mut meter = LevelMeter::new(1);
        let window = [0.1f32; 32];
        let r = meter.tick(&[SampleTap::Float(&window)])[0];
        assert_relative_eq!(r.rms, 0.1, epsilon = 1e-6);
        assert_relative_eq!(r.level, 0.4, epsilon = 1e-6);
        assert_relative_eq!(r.peak, 0.4, epsilon = 1e-6);

        let loud = [0.5f32; 32];
        let r = meter.tick(&[SampleTap::Float(&loud)])[0];
        assert_eq!(r.level, 1.0);
    }

    #[test]
    fn test_peak_hold_decays_linearly() {
        let mut meter = LevelMeter::new(2);
        let loud = [0.5f32; 128];
        meter.tick(&[SampleTap::Float(&loud), SampleTap::Float(&loud)]);
        assert_eq!(meter.peak(0), 1.0);

        let silence = [128u8; 128];
        for tick in 1..=210 {
            let before = meter.peak(0);
            meter.tick(&[SampleTap::Bytes(&silence), SampleTap::Bytes(&silence)]);
            let expected = (1.0 - PEAK_DECAY_PER_TICK * tick as f64).max(0.0);
            assert_relative_eq!(meter.peak(0), expected, epsilon = 1e-9);
            assert!(meter.peak(0) <= before);
        }
        assert_eq!(meter.peak(0), 0.0);

        // Floored, never negative
        meter.tick(&[]);
        assert_eq!(meter.peak(1), 0.0);
    }

    #[test]
    fn test_peak_rises_only_when_level_exceeds_hold() {
        let mut meter = LevelMeter::new(1);
        let loud = [0.2f32; 16];
        let quiet = [0.1f32; 16];

        meter.tick(&[SampleTap::Float(&loud)]);
        let held = meter.peak(0);
        assert_relative_eq!(held, 0.8, epsilon = 1e-6);

        let r = meter.tick(&[SampleTap::Float(&quiet)])[0];
        assert_relative_eq!(r.peak, held - PEAK_DECAY_PER_TICK, epsilon = 1e-9);
        assert!(r.level < r.peak);

        let r = meter.tick(&[SampleTap::Float(&loud)])[0];
        assert_relative_eq!(r.peak, 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_reset() {
        let mut meter = LevelMeter::stereo();
        let loud = [0.9f32; 8];
        meter.tick(&[SampleTap::Float(&loud)]);
        meter.reset();
        assert!(meter.readings().iter().all(|r| *r == MeterSample::default()));
        assert!(meter.readings()[0].peak_db().is_infinite());
    }
}
