//! Output format definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Target bitrate of the lossy path (kbit/s)
pub const MP3_BITRATE_KBPS: u32 = 320;

/// Size of the canonical WAV header
pub const WAV_HEADER_LEN: usize = 44;

/// Export format requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// RIFF/WAVE PCM (lossless)
    #[default]
    Wav,
    /// MPEG-1 Layer III at 320 kbit/s (lossy)
    Mp3,
}

impl ExportFormat {
    /// Artifact tag: `pcm-wav` or `mp3-320`
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Wav => "pcm-wav",
            Self::Mp3 => "mp3-320",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mp3",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Wav)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" => Ok(Self::Wav),
            "mp3" => Ok(Self::Mp3),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Advisory artifact size in bytes for a mix of `duration_secs`
///
/// Lossless assumes 44.1 kHz stereo 16-bit plus the header; lossy assumes
/// 320 kbit/s. Neither accounts for encoder padding.
pub fn estimate_size(format: ExportFormat, duration_secs: f64) -> u64 {
    let duration = if duration_secs.is_finite() {
        duration_secs.max(0.0)
    } else {
        0.0
    };

    match format {
        ExportFormat::Wav => (44100.0 * 2.0 * 2.0 * duration).round() as u64 + WAV_HEADER_LEN as u64,
        ExportFormat::Mp3 => {
            let bytes_per_sec = MP3_BITRATE_KBPS as f64 * 1000.0 / 8.0;
            (bytes_per_sec * duration).round() as u64
        }
    }
}
