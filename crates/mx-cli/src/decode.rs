//! WAV decoding for track sources

use std::path::Path;

use anyhow::{Context, Result, bail};
use mx_core::{DecodedAudio, Sample};

/// Decode a WAV file into planar float channels
pub fn decode_wav(path: &Path) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<Sample> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("Failed to read samples from {}", path.display()))?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                bail!("Unsupported bit depth {} in {}", spec.bits_per_sample, path.display());
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f64 * scale) as Sample))
                .collect::<Result<_, _>>()
                .with_context(|| format!("Failed to read samples from {}", path.display()))?
        }
    };

    let audio = DecodedAudio::from_interleaved(spec.sample_rate, spec.channels as usize, &samples)
        .with_context(|| format!("Invalid audio layout in {}", path.display()))?;

    log::debug!(
        "Decoded {}: {} ch, {} Hz, {:.2}s",
        path.display(),
        audio.num_channels(),
        audio.sample_rate(),
        audio.duration_secs()
    );
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_int16_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(16384i16, -16384i16), (0, 32767), (-32768, 0)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let audio = decode_wav(&path).unwrap();
        assert_eq!(audio.sample_rate(), 22050);
        assert_eq!(audio.num_channels(), 2);
        assert_eq!(audio.channel(0).unwrap(), &[0.5, 0.0, -1.0]);
        assert_eq!(audio.channel(1).unwrap()[0], -0.5);
    }

    #[test]
    fn test_decode_float_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.25f32, -0.75, 1.5] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let audio = decode_wav(&path).unwrap();
        assert_eq!(audio.channel(0).unwrap(), &[0.25, -0.75, 1.5]);
    }

    #[test]
    fn test_missing_file() {
        let err = decode_wav(Path::new("/nonexistent/nope.wav")).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
