//! Codec layer
//!
//! - WAV: canonical 44-byte RIFF header followed by interleaved little-endian
//!   samples, 16-bit PCM or 32-bit float
//! - MP3: native LAME via mp3lame-encoder, 320 kbit/s CBR, fed in
//!   frame-sized blocks

use crate::artifact::Artifact;
use crate::config::{MP3_FRAME_SAMPLES, WavBitDepth};
use crate::error::{ExportError, ExportResult};
use crate::formats::{ExportFormat, WAV_HEADER_LEN};
use crate::mixdown::RenderedMix;
use mx_core::Sample;

// ═══════════════════════════════════════════════════════════════════════════════
// ENCODER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Turns a rendered mix into an artifact
pub trait AudioEncoder {
    fn encode(&self, mix: &RenderedMix) -> ExportResult<Artifact>;

    fn format(&self) -> ExportFormat;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAMPLE CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Clamp and scale to i16 with two's-complement asymmetry:
/// negatives by 32768, positives by 32767, rounded to nearest.
#[inline]
pub fn to_pcm16(sample: Sample) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled.round().clamp(-32768.0, 32767.0) as i16
}

/// Clamp, scale by 32767 and round to nearest
#[inline]
pub fn to_pcm16_rounded(sample: Sample) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

// ═══════════════════════════════════════════════════════════════════════════════
// WAV ENCODER
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimal RIFF/WAVE writer
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder {
    bit_depth: WavBitDepth,
}

impl WavEncoder {
    pub fn new(bit_depth: WavBitDepth) -> Self {
        Self { bit_depth }
    }

    pub fn bit_depth(&self) -> WavBitDepth {
        self.bit_depth
    }

    fn write_header(
        &self,
        out: &mut Vec<u8>,
        channels: u16,
        sample_rate: u32,
        data_len: u32,
    ) -> ExportResult<()> {
        let bits = self.bit_depth.bits();
        let block_align = channels
            .checked_mul(bits / 8)
            .ok_or_else(|| ExportError::InvalidConfig(format!("{} channels", channels)))?;
        let byte_rate = sample_rate.checked_mul(block_align as u32).ok_or_else(|| {
            ExportError::InvalidConfig(format!("Sample rate {} too high", sample_rate))
        })?;

        // RIFF chunk
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");

        // fmt chunk
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&self.bit_depth.format_tag().to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());

        // data chunk
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());

        Ok(())
    }
}

impl AudioEncoder for WavEncoder {
    fn encode(&self, mix: &RenderedMix) -> ExportResult<Artifact> {
        let channels = u16::try_from(mix.num_channels()).map_err(|_| {
            ExportError::InvalidConfig(format!("Too many channels: {}", mix.num_channels()))
        })?;
        let frames = mix.frames();
        let data_len = frames
            .checked_mul(mix.num_channels() * self.bit_depth.bytes_per_sample())
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| n.checked_add(36).is_some())
            .ok_or_else(|| {
                ExportError::InvalidConfig(format!("{} frames exceed the 4 GiB WAV limit", frames))
            })?;

        let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
        self.write_header(&mut out, channels, mix.sample_rate(), data_len)?;

        let planes = mix.channels();
        match self.bit_depth {
            WavBitDepth::Int16 => {
                for n in 0..frames {
                    for plane in planes {
                        out.extend_from_slice(&to_pcm16(plane[n]).to_le_bytes());
                    }
                }
            }
            WavBitDepth::Float32 => {
                for n in 0..frames {
                    for plane in planes {
                        out.extend_from_slice(&plane[n].to_le_bytes());
                    }
                }
            }
        }

        log::debug!(
            "WAV encode: {} ch, {} frames, {}-bit, {} bytes",
            channels,
            frames,
            self.bit_depth.bits(),
            out.len()
        );
        Ok(Artifact::new(ExportFormat::Wav, out))
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Wav
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MP3 ENCODER
// ═══════════════════════════════════════════════════════════════════════════════

/// Native MP3 encoder using LAME via mp3lame-encoder
///
/// Blocking and not an [`AudioEncoder`]: the only way to run it is
/// [`crate::spawn_encode`], which keeps it off the caller's thread.
#[derive(Debug, Clone, Copy)]
pub struct LameMp3Encoder {
    block_size: usize,
}

impl Default for LameMp3Encoder {
    fn default() -> Self {
        Self::new(MP3_FRAME_SAMPLES)
    }
}

impl LameMp3Encoder {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Encode planar float channels. A missing right channel duplicates the left.
    pub fn encode_planar(
        &self,
        sample_rate: u32,
        left: &[Sample],
        right: Option<&[Sample]>,
    ) -> ExportResult<Vec<u8>> {
        use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, Quality};

        if let Some(right) = right.filter(|r| r.len() != left.len()) {
            return Err(ExportError::WorkerEncoding(format!(
                "Channel length mismatch: {} vs {}",
                left.len(),
                right.len()
            )));
        }

        let left_pcm: Vec<i16> = left.iter().copied().map(to_pcm16_rounded).collect();
        let right_pcm: Vec<i16> = match right {
            Some(right) => right.iter().copied().map(to_pcm16_rounded).collect(),
            None => left_pcm.clone(),
        };

        let mut builder = Builder::new()
            .ok_or_else(|| ExportError::WorkerEncoding("LAME encoder init failed".to_string()))?;

        builder.set_num_channels(2).map_err(|e| {
            ExportError::WorkerEncoding(format!("LAME set channels failed: {:?}", e))
        })?;

        builder.set_sample_rate(sample_rate).map_err(|e| {
            ExportError::WorkerEncoding(format!("LAME set sample rate failed: {:?}", e))
        })?;

        builder.set_brate(Bitrate::Kbps320).map_err(|e| {
            ExportError::WorkerEncoding(format!("LAME set bitrate failed: {:?}", e))
        })?;

        builder.set_quality(Quality::Best).map_err(|e| {
            ExportError::WorkerEncoding(format!("LAME set quality failed: {:?}", e))
        })?;

        let mut encoder = builder
            .build()
            .map_err(|e| ExportError::WorkerEncoding(format!("LAME build failed: {:?}", e)))?;

        let mut mp3_output: Vec<u8> = Vec::new();

        for (l, r) in left_pcm
            .chunks(self.block_size)
            .zip(right_pcm.chunks(self.block_size))
        {
            mp3_output.reserve(mp3lame_encoder::max_required_buffer_size(l.len()));

            let input = DualPcm { left: l, right: r };
            let written = encoder
                .encode(input, mp3_output.spare_capacity_mut())
                .map_err(|e| ExportError::WorkerEncoding(format!("LAME encode failed: {:?}", e)))?;

            // SAFETY: encoder wrote `written` bytes into spare capacity
            unsafe {
                mp3_output.set_len(mp3_output.len() + written);
            }
        }

        mp3_output.reserve(7200);
        let flushed = encoder
            .flush::<FlushNoGap>(mp3_output.spare_capacity_mut())
            .map_err(|e| ExportError::WorkerEncoding(format!("LAME flush failed: {:?}", e)))?;

        // SAFETY: encoder wrote `flushed` bytes into spare capacity
        unsafe {
            mp3_output.set_len(mp3_output.len() + flushed);
        }

        Ok(mp3_output)
    }
}
