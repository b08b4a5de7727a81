//! Export configuration

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use crate::formats::ExportFormat;

/// Samples per channel fed to LAME per call (one MPEG-1 Layer III frame)
pub const MP3_FRAME_SAMPLES: usize = 1152;

/// Default name of the lossy encoder thread
pub const DEFAULT_WORKER_NAME: &str = "mx-mp3-encoder";

/// WAV sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavBitDepth {
    /// 16-bit signed integer PCM
    #[default]
    Int16,
    /// 32-bit IEEE float
    Float32,
}

impl WavBitDepth {
    pub fn bits(&self) -> u16 {
        match self {
            Self::Int16 => 16,
            Self::Float32 => 32,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits() as usize / 8
    }

    /// `fmt ` chunk format tag: 1 = PCM, 3 = IEEE float
    pub fn format_tag(&self) -> u16 {
        match self {
            Self::Int16 => 1,
            Self::Float32 => 3,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output format
    pub format: ExportFormat,

    /// WAV sample encoding (ignored for MP3)
    pub wav_bit_depth: WavBitDepth,

    /// Samples per channel per LAME call
    pub mp3_block_size: usize,

    /// Thread name for the lossy encoder worker
    pub worker_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Wav,
            wav_bit_depth: WavBitDepth::Int16,
            mp3_block_size: MP3_FRAME_SAMPLES,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}

impl ExportConfig {
    /// 16-bit PCM WAV
    pub fn wav() -> Self {
        Self::default()
    }

    /// 32-bit float WAV
    pub fn wav_float() -> Self {
        Self {
            wav_bit_depth: WavBitDepth::Float32,
            ..Default::default()
        }
    }

    /// 320 kbit/s MP3
    pub fn mp3() -> Self {
        Self {
            format: ExportFormat::Mp3,
            ..Default::default()
        }
    }

    /// Preset for a format
    pub fn for_format(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Wav => Self::wav(),
            ExportFormat::Mp3 => Self::mp3(),
        }
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_bit_depth(mut self, depth: WavBitDepth) -> Self {
        self.wav_bit_depth = depth;
        self
    }

    pub fn with_block_size(mut self, samples: usize) -> Self {
        self.mp3_block_size = samples;
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn validate(&self) -> ExportResult<()> {
        if self.mp3_block_size == 0 {
            return Err(ExportError::InvalidConfig(
                "MP3 block size must be greater than zero".to_string(),
            ));
        }
        if self.worker_name.contains('\0') {
            return Err(ExportError::InvalidConfig(
                "Worker name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}
