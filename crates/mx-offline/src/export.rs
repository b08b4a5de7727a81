//! Export orchestration: mixdown, then encode
//!
//! ```text
//! tracks + master ──► mixdown ──► WAV encoder ──────────────► Artifact
//!                         │
//!                         └─────► EncodeRequest ─► worker ──► Artifact
//! ```
//!
//! Mixdown and WAV encoding run on the caller's thread and fail immediately.
//! MP3 encoding is dispatched to a worker and its outcome, success or error,
//! arrives through the returned [`ExportJob`].

use std::time::Duration;

use mx_core::{MasterParams, Track};

use crate::artifact::Artifact;
use crate::config::ExportConfig;
use crate::encoder::{AudioEncoder, LameMp3Encoder, WavEncoder};
use crate::error::{ExportError, ExportResult};
use crate::formats::ExportFormat;
use crate::mixdown::mixdown;
use crate::worker::{EncodeJob, EncodeRequest, spawn_encode};

/// Pending or completed export
#[derive(Debug)]
pub enum ExportJob {
    /// Encoded synchronously
    Done(Option<Artifact>),
    /// Waiting on the encoder worker
    Encoding(EncodeJob),
}

impl ExportJob {
    /// Non-blocking poll; `None` while encoding or once the result was taken
    pub fn try_result(&mut self) -> Option<ExportResult<Artifact>> {
        match self {
            Self::Done(slot) => slot.take().map(Ok),
            Self::Encoding(job) => job.try_result(),
        }
    }

    /// Block until the artifact (or the worker's error) is available
    pub fn wait(self) -> ExportResult<Artifact> {
        match self {
            Self::Done(slot) => slot.ok_or(ExportError::ResultTaken),
            Self::Encoding(job) => job.wait(),
        }
    }

    /// Block for at most `timeout`
    ///
    /// `None` means the encoder is still running. Dropping the job afterwards
    /// abandons the worker.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<ExportResult<Artifact>> {
        match self {
            Self::Done(slot) => slot.take().map(Ok),
            Self::Encoding(job) => job.wait_timeout(timeout),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Self::Done(_) => true,
            Self::Encoding(job) => job.is_finished(),
        }
    }
}

/// Renders and encodes the current mix
///
/// Holds no state between requests; the caller serializes exports.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Start one export
    pub fn export(&self, tracks: &[Track], master: &MasterParams) -> ExportResult<ExportJob> {
        self.config.validate()?;

        log::info!(
            "Export requested: {} tracks, master gain {:.2}, format {}",
            tracks.len(),
            master.master_gain(),
            self.config.format
        );

        let mix = mixdown(tracks, master)?;

        match self.config.format {
            ExportFormat::Wav => {
                let artifact = WavEncoder::new(self.config.wav_bit_depth).encode(&mix)?;
                log::info!("WAV export ready: {} bytes", artifact.len());
                Ok(ExportJob::Done(Some(artifact)))
            }
            ExportFormat::Mp3 => {
                let encoder = LameMp3Encoder::new(self.config.mp3_block_size);
                let job = spawn_encode(
                    EncodeRequest::from_mix(mix),
                    encoder,
                    &self.config.worker_name,
                )?;
                Ok(ExportJob::Encoding(job))
            }
        }
    }

    /// Export and block until the artifact is ready
    pub fn export_blocking(
        &self,
        tracks: &[Track],
        master: &MasterParams,
    ) -> ExportResult<Artifact> {
        self.export(tracks, master)?.wait()
    }
}

/// One-shot export request: `{ tracks, master_gain, format }`
///
/// `format` is `"wav"` or `"mp3"`; anything else is rejected before mixing.
pub fn bounce(tracks: &[Track], master_gain: f64, format: &str) -> ExportResult<Artifact> {
    let format: ExportFormat = format.parse()?;
    Exporter::new(ExportConfig::for_format(format))
        .export_blocking(tracks, &MasterParams::new(master_gain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mx_core::{DecodedAudio, TrackId};

    fn tracks() -> Vec<Track> {
        let audio = DecodedAudio::mono(44100, vec![0.25; 100]).unwrap();
        vec![Track::with_audio(TrackId::new(1), "one", audio)]
    }

    #[test]
    fn test_wav_job_is_ready_immediately() {
        let mut job = Exporter::default()
            .export(&tracks(), &MasterParams::default())
            .unwrap();
        assert!(job.is_finished());

        let artifact = job.try_result().unwrap().unwrap();
        assert_eq!(artifact.tag(), "pcm-wav");
        assert_eq!(artifact.len(), 44 + 100 * 2 * 2);
        assert!(job.try_result().is_none());
        assert!(matches!(job.wait(), Err(ExportError::ResultTaken)));
    }

    #[test]
    fn test_unsupported_format_rejected_before_mixing() {
        let mut silent = tracks();
        silent[0].muted = true;
        assert!(matches!(
            bounce(&silent, 1.0, "ogg"),
            Err(ExportError::UnsupportedFormat(_))
        ));
        assert!(matches!(bounce(&silent, 1.0, "wav"), Err(ExportError::NoActiveTracks)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let exporter = Exporter::new(ExportConfig::mp3().with_block_size(0));
        assert!(matches!(
            exporter.export(&tracks(), &MasterParams::default()),
            Err(ExportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_float_export() {
        let artifact = Exporter::new(ExportConfig::wav_float())
            .export_blocking(&tracks(), &MasterParams::default())
            .unwrap();
        assert_eq!(artifact.len(), 44 + 100 * 2 * 4);
    }
}
