//! Decoded audio buffers

use crate::error::{CoreError, CoreResult};

/// Type alias for decoded audio samples
pub type Sample = f32;

/// Decoded, planar audio as delivered by the host decoder
///
/// One `Vec` per channel, all of equal length. Samples are nominally in
/// `[-1.0, 1.0]`, but nothing here enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    sample_rate: u32,
    channels: Vec<Vec<Sample>>,
}

impl DecodedAudio {
    /// Wrap planar channel buffers, validating their layout
    pub fn new(sample_rate: u32, channels: Vec<Vec<Sample>>) -> CoreResult<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidSampleRate(sample_rate));
        }
        if channels.is_empty() {
            return Err(CoreError::EmptyBuffer);
        }

        let frames = channels[0].len();
        if let Some((index, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(CoreError::InvalidBuffer(format!(
                "channel {} has {} frames, expected {}",
                index,
                ch.len(),
                frames
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Single-channel buffer
    pub fn mono(sample_rate: u32, samples: Vec<Sample>) -> CoreResult<Self> {
        Self::new(sample_rate, vec![samples])
    }

    /// Two-channel buffer
    pub fn stereo(sample_rate: u32, left: Vec<Sample>, right: Vec<Sample>) -> CoreResult<Self> {
        Self::new(sample_rate, vec![left, right])
    }

    /// Split interleaved samples (L,R,L,R,...) into planar channels
    pub fn from_interleaved(
        sample_rate: u32,
        num_channels: usize,
        samples: &[Sample],
    ) -> CoreResult<Self> {
        if num_channels == 0 {
            return Err(CoreError::EmptyBuffer);
        }
        if samples.len() % num_channels != 0 {
            return Err(CoreError::InvalidBuffer(format!(
                "{} interleaved samples do not divide into {} channels",
                samples.len(),
                num_channels
            )));
        }

        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames (per-channel length)
    #[inline]
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds, derived from length and sample rate
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Frame count this buffer spans when laid on a timeline at `rate`,
    /// i.e. `ceil(duration * rate)` computed without float rounding.
    pub fn frames_at_rate(&self, rate: u32) -> usize {
        let frames = self.frames() as u64 * rate as u64;
        frames.div_ceil(self.sample_rate as u64) as usize
    }

    #[inline]
    pub fn channel(&self, index: usize) -> Option<&[Sample]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    #[inline]
    pub fn channels(&self) -> &[Vec<Sample>] {
        &self.channels
    }

    /// Channel feeding output channel `out_channel`: mono sources feed every
    /// output, multichannel sources feed the matching (or last) channel.
    #[inline]
    pub fn source_channel_for(&self, out_channel: usize) -> &[Sample] {
        let index = out_channel.min(self.channels.len() - 1);
        &self.channels[index]
    }

    /// Largest absolute sample value across channels at `frame`
    #[inline]
    pub fn abs_peak_at(&self, frame: usize) -> Sample {
        self.channels
            .iter()
            .filter_map(|c| c.get(frame))
            .fold(0.0, |acc, s| acc.max(s.abs()))
    }

    pub fn into_channels(self) -> Vec<Vec<Sample>> {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_layouts() {
        assert_eq!(
            DecodedAudio::new(0, vec![vec![0.0]]),
            Err(CoreError::InvalidSampleRate(0))
        );
        assert_eq!(DecodedAudio::new(44100, vec![]), Err(CoreError::EmptyBuffer));
        assert!(matches!(
            DecodedAudio::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]),
            Err(CoreError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn test_duration_is_derived() {
        let audio = DecodedAudio::mono(44100, vec![0.0; 441000]).unwrap();
        assert_eq!(audio.frames(), 441000);
        assert!((audio.duration_secs() - 10.0).abs() < 1e-12);
        assert_eq!(audio.frames_at_rate(44100), 441000);
        assert_eq!(audio.frames_at_rate(88200), 882000);
    }

    #[test]
    fn test_frames_at_rate_rounds_up() {
        let audio = DecodedAudio::mono(48000, vec![0.0; 3]).unwrap();
        // 3 / 48000 * 44100 = 2.75625
        assert_eq!(audio.frames_at_rate(44100), 3);
    }

    #[test]
    fn test_from_interleaved() {
        let audio = DecodedAudio::from_interleaved(44100, 2, &[0.1, -0.1, 0.2, -0.2]).unwrap();
        assert_eq!(audio.num_channels(), 2);
        assert_eq!(audio.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(audio.channel(1).unwrap(), &[-0.1, -0.2]);

        assert!(DecodedAudio::from_interleaved(44100, 2, &[0.0; 3]).is_err());
    }

    #[test]
    fn test_source_channel_mapping() {
        let mono = DecodedAudio::mono(44100, vec![0.5; 2]).unwrap();
        assert_eq!(mono.source_channel_for(0), mono.source_channel_for(1));

        let stereo = DecodedAudio::stereo(44100, vec![0.1; 2], vec![0.9; 2]).unwrap();
        assert_eq!(stereo.source_channel_for(0)[0], 0.1);
        assert_eq!(stereo.source_channel_for(1)[0], 0.9);
    }

    #[test]
    fn test_abs_peak_at() {
        let stereo = DecodedAudio::stereo(44100, vec![0.1, -0.7], vec![-0.3, 0.2]).unwrap();
        assert_eq!(stereo.abs_peak_at(0), 0.3);
        assert_eq!(stereo.abs_peak_at(1), 0.7);
        assert_eq!(stereo.abs_peak_at(5), 0.0);
    }
}
