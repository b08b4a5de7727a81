//! Mixbounce command-line host
//!
//! Usage:
//!   mxbounce mix mix.json                 - Render and encode a manifest
//!   mxbounce peaks mix.json --width 80    - Print the waveform overview
//!   mxbounce meter track.wav              - Run the level meter over a file
//!   mxbounce estimate --format mp3 -s 180 - Advisory artifact size

mod decode;
mod manifest;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mx_dsp::{LevelMeter, SampleTap, summarize};
use mx_offline::{ExportConfig, ExportFormat, Exporter, WavBitDepth, estimate_size};

use crate::decode::decode_wav;
use crate::manifest::MixManifest;

/// How often a running MP3 export reports progress
const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "mxbounce", version, about = "Mix tracks down and export WAV or MP3")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a manifest and write the encoded artifact
    Mix {
        /// Mix manifest (JSON)
        manifest: PathBuf,
        /// Override the manifest's format ("wav" or "mp3")
        #[arg(short, long)]
        format: Option<String>,
        /// Override the manifest's output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write 32-bit float WAV instead of 16-bit PCM
        #[arg(long)]
        float: bool,
    },
    /// Print the waveform peak summary of a manifest
    Peaks {
        manifest: PathBuf,
        /// Number of buckets
        #[arg(short, long, default_value_t = 80)]
        width: usize,
        /// Emit JSON instead of a text plot
        #[arg(long)]
        json: bool,
    },
    /// Feed a WAV file through the level meter, one tick per window
    Meter {
        input: PathBuf,
        /// Samples per channel per tick
        #[arg(short, long, default_value_t = 2048)]
        window: usize,
    },
    /// Estimate the artifact size for a duration
    Estimate {
        #[arg(short, long, default_value = "wav")]
        format: String,
        /// Duration in seconds
        #[arg(short, long)]
        seconds: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Mix {
            manifest,
            format,
            output,
            float,
        } => run_mix(manifest, format, output, float),
        Commands::Peaks {
            manifest,
            width,
            json,
        } => run_peaks(manifest, width, json),
        Commands::Meter { input, window } => run_meter(input, window),
        Commands::Estimate { format, seconds } => run_estimate(&format, seconds),
    }
}

fn run_mix(
    manifest_path: PathBuf,
    format: Option<String>,
    output: Option<PathBuf>,
    float: bool,
) -> Result<()> {
    let manifest = MixManifest::load(&manifest_path)?;
    let format = match format {
        Some(tag) => tag.parse::<ExportFormat>()?,
        None => manifest.format,
    };
    let output = output.unwrap_or_else(|| manifest.output_path(format));

    let tracks = manifest.load_tracks();
    let mut config = ExportConfig::for_format(format);
    if float {
        config = config.with_bit_depth(WavBitDepth::Float32);
    }

    let started = Instant::now();
    let mut job = Exporter::new(config)
        .export(tracks.all(), &manifest.master())
        .context("Export failed")?;

    let artifact = loop {
        if let Some(result) = job.wait_timeout(EXPORT_POLL_INTERVAL) {
            break result.context("Encoding failed")?;
        }
        log::info!("Encoding... {:.1}s", started.elapsed().as_secs_f64());
    };

    artifact
        .write_to(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} ({}, {} bytes) in {:.2?}",
        output.display(),
        artifact.mime(),
        artifact.len(),
        started.elapsed()
    );
    Ok(())
}

fn run_peaks(manifest_path: PathBuf, width: usize, json: bool) -> Result<()> {
    let manifest = MixManifest::load(&manifest_path)?;
    let tracks = manifest.load_tracks();
    let summary = summarize(tracks.all(), width);

    if json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    const ROWS: usize = 8;
    let heights: Vec<usize> = summary
        .clamped()
        .map(|v| (v * ROWS as f32).round() as usize)
        .collect();
    for row in (1..=ROWS).rev() {
        let line: String = heights
            .iter()
            .map(|&h| if h >= row { '#' } else { ' ' })
            .collect();
        println!("|{}|", line);
    }
    println!("peak {:.3} over {:.2}s", summary.max(), tracks.total_duration());
    Ok(())
}

fn run_meter(input: PathBuf, window: usize) -> Result<()> {
    if window == 0 {
        bail!("Window must be at least one sample");
    }

    let audio = decode_wav(&input)?;
    let mut meter = LevelMeter::new(audio.num_channels());

    for (tick, start) in (0..audio.frames()).step_by(window).enumerate() {
        let end = (start + window).min(audio.frames());
        let taps: Vec<SampleTap<'_>> = audio
            .channels()
            .iter()
            .map(|ch| SampleTap::Float(&ch[start..end]))
            .collect();

        let readings = meter.tick(&taps);
        let cols: Vec<String> = readings
            .iter()
            .map(|r| format!("rms {:6.1} dB  peak {:.3}", r.rms_db(), r.peak))
            .collect();
        println!("{:5}  {}", tick, cols.join("  |  "));
    }
    Ok(())
}

fn run_estimate(format: &str, seconds: f64) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    println!(
        "{}: ~{} bytes for {:.1}s",
        format.tag(),
        estimate_size(format, seconds),
        seconds
    );
    Ok(())
}
