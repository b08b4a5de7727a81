//! Off-thread lossy encoding
//!
//! One export spawns one short-lived named thread. The request's sample
//! buffers are moved into it, it replies exactly once on a bounded channel
//! (artifact or error), then exits. A panic inside LAME or the conversion code
//! is caught and reported as [`ExportError::WorkerEncoding`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, bounded};
use mx_core::Sample;

use crate::artifact::Artifact;
use crate::encoder::LameMp3Encoder;
use crate::error::{ExportError, ExportResult};
use crate::formats::ExportFormat;
use crate::mixdown::RenderedMix;

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Message handed to the encoder thread
///
/// `right` is empty for mono sources; the encoder duplicates `left`.
#[derive(Debug)]
pub struct EncodeRequest {
    pub channels: usize,
    pub sample_rate: u32,
    pub left: Vec<Sample>,
    pub right: Vec<Sample>,
}

impl EncodeRequest {
    /// Take the first two channels of a mix without copying them
    pub fn from_mix(mix: RenderedMix) -> Self {
        let sample_rate = mix.sample_rate();
        let channels = mix.num_channels();
        let mut planes = mix.into_channels().into_iter();
        let left = planes.next().unwrap_or_default();
        let right = planes.next().unwrap_or_default();

        Self {
            channels: channels.min(2),
            sample_rate,
            left,
            right,
        }
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    fn encode(self, encoder: &LameMp3Encoder) -> ExportResult<Artifact> {
        let right = (self.channels >= 2 && !self.right.is_empty()).then_some(self.right.as_slice());
        let bytes = encoder.encode_planar(self.sample_rate, &self.left, right)?;
        Ok(Artifact::new(ExportFormat::Mp3, bytes))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JOB HANDLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle to an in-flight encode
///
/// Dropping it abandons the worker: the thread finishes on its own and its
/// reply is discarded.
#[derive(Debug)]
pub struct EncodeJob {
    reply: Option<Receiver<ExportResult<Artifact>>>,
    handle: Option<JoinHandle<()>>,
}

impl EncodeJob {
    /// Non-blocking poll
    ///
    /// `None` while encoding, and again after the result has been taken.
    pub fn try_result(&mut self) -> Option<ExportResult<Artifact>> {
        let outcome = match self.reply.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(worker_vanished()),
        };
        Some(self.finish(outcome))
    }

    /// Block until the worker replies
    pub fn wait(mut self) -> ExportResult<Artifact> {
        let reply = self.reply.take().ok_or(ExportError::ResultTaken)?;
        let outcome = reply.recv().unwrap_or_else(|_| Err(worker_vanished()));
        self.finish(outcome)
    }

    /// Block for at most `timeout`; `None` if the worker is still running
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<ExportResult<Artifact>> {
        let outcome = match self.reply.as_ref()?.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Err(worker_vanished()),
        };
        Some(self.finish(outcome))
    }

    /// True once a result is waiting, or the worker exited without one
    pub fn is_finished(&self) -> bool {
        match &self.reply {
            None => true,
            Some(reply) => {
                !reply.is_empty() || self.handle.as_ref().is_none_or(JoinHandle::is_finished)
            }
        }
    }

    fn finish(&mut self, outcome: ExportResult<Artifact>) -> ExportResult<Artifact> {
        self.reply = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Encoder worker panicked after replying");
            }
        }
        outcome
    }
}

fn worker_vanished() -> ExportError {
    ExportError::WorkerEncoding("Worker exited without replying".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Move `request` onto a new named thread and start encoding
pub fn spawn_encode(
    request: EncodeRequest,
    encoder: LameMp3Encoder,
    thread_name: &str,
) -> ExportResult<EncodeJob> {
    let (tx, rx) = bounded(1);
    let frames = request.frames();

    let handle = thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || {
            let start = Instant::now();

            let result = panic::catch_unwind(AssertUnwindSafe(|| request.encode(&encoder)))
                .unwrap_or_else(|payload| {
                    Err(ExportError::WorkerEncoding(format!(
                        "Encoder panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });

            match &result {
                Ok(artifact) => log::info!(
                    "MP3 encode finished: {} frames -> {} bytes in {:.2?}",
                    frames,
                    artifact.len(),
                    start.elapsed()
                ),
                Err(e) => log::warn!("MP3 encode failed: {}", e),
            }

            // Receiver gone means the job was abandoned
            if tx.send(result).is_err() {
                log::debug!("Encode result discarded, job was dropped");
            }
        })
        .map_err(|e| ExportError::WorkerDispatch(e.to_string()))?;

    log::debug!("Dispatched MP3 encode of {} frames to '{}'", frames, thread_name);

    Ok(EncodeJob {
        reply: Some(rx),
        handle: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_takes_mix_planes() {
        let mix = RenderedMix::from_channels(44100, vec![vec![0.1; 4], vec![0.2; 4]]).unwrap();
        let request = EncodeRequest::from_mix(mix);
        assert_eq!(request.channels, 2);
        assert_eq!(request.left, vec![0.1; 4]);
        assert_eq!(request.right, vec![0.2; 4]);

        let mono = RenderedMix::from_channels(22050, vec![vec![0.3; 2]]).unwrap();
        let request = EncodeRequest::from_mix(mono);
        assert_eq!(request.channels, 1);
        assert!(request.right.is_empty());
        assert_eq!(request.sample_rate, 22050);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "Unknown panic");
    }

    #[test]
    fn test_worker_reports_errors_as_values() {
        // Mismatched planes fail inside the worker, not in the caller
        let request = EncodeRequest {
            channels: 2,
            sample_rate: 44100,
            left: vec![0.0; 8],
            right: vec![0.0; 4],
        };
        let job = spawn_encode(request, LameMp3Encoder::default(), "mx-test-encoder").unwrap();
        assert!(matches!(job.wait(), Err(ExportError::WorkerEncoding(_))));
    }

    #[test]
    fn test_result_taken_once() {
        let request = EncodeRequest {
            channels: 2,
            sample_rate: 44100,
            left: vec![0.0; 2],
            right: vec![0.0; 1],
        };
        let mut job = spawn_encode(request, LameMp3Encoder::default(), "mx-test-encoder").unwrap();
        let first = job.wait_timeout(Duration::from_secs(30));
        assert!(matches!(first, Some(Err(ExportError::WorkerEncoding(_)))));
        assert!(job.try_result().is_none());
        assert!(job.is_finished());
        assert!(matches!(job.wait(), Err(ExportError::ResultTaken)));
    }

    fn sine(frames: usize) -> Vec<Sample> {
        (0..frames)
            .map(|n| (2.0 * std::f32::consts::PI * 440.0 * n as f32 / 44100.0).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_mono_request_duplicates_left() {
        let left = sine(44100);

        let mono = EncodeRequest {
            channels: 1,
            sample_rate: 44100,
            left: left.clone(),
            right: Vec::new(),
        };
        let stereo = EncodeRequest {
            channels: 2,
            sample_rate: 44100,
            right: left.clone(),
            left,
        };

        let mono = spawn_encode(mono, LameMp3Encoder::default(), "mx-test-mono")
            .unwrap()
            .wait()
            .unwrap();
        let stereo = spawn_encode(stereo, LameMp3Encoder::default(), "mx-test-stereo")
            .unwrap()
            .wait()
            .unwrap();

        assert_eq!(mono.format(), ExportFormat::Mp3);
        assert!(!mono.is_empty());
        // Same frame count at constant bitrate
        let (m, s) = (mono.len() as f64, stereo.len() as f64);
        assert!((m - s).abs() <= s * 0.1, "mono {} vs stereo {}", m, s);
        assert!(mono.bytes().windows(2).any(|w| w[0] == 0xFF && w[1] & 0xE0 == 0xE0));
    }

    #[test]
    fn test_silent_worker_exit_counts_as_finished() {
        let (tx, rx) = bounded::<ExportResult<Artifact>>(1);
        let handle = thread::spawn(move || drop(tx));
        let mut job = EncodeJob {
            reply: Some(rx),
            handle: Some(handle),
        };

        let deadline = Instant::now() + Duration::from_secs(10);
        while !job.is_finished() {
            assert!(Instant::now() < deadline, "job never reported finished");
            thread::sleep(Duration::from_millis(1));
        }

        assert!(matches!(job.try_result(), Some(Err(ExportError::WorkerEncoding(_)))));
        assert!(job.is_finished());
        assert!(job.try_result().is_none());
    }
}
