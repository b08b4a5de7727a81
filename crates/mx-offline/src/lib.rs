//! mx-offline: Offline mixdown and export for Mixbounce
//!
//! Renders a track set into one buffer per output channel and encodes it:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Exporter                              │
//! │                                                               │
//! │  ┌─────────┐   ┌─────────────┐   ┌──────────────────────────┐ │
//! │  │ Tracks  │ → │  Mixdown    │ → │ WAV (caller thread)      │ │
//! │  │ Master  │   │ (sum, gain) │   │ MP3 (worker thread)      │ │
//! │  └─────────┘   └─────────────┘   └──────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mx_offline::{ExportConfig, Exporter};
//!
//! let job = Exporter::new(ExportConfig::mp3()).export(tracks.all(), &master)?;
//! let artifact = job.wait()?;
//! artifact.write_to("bounce.mp3")?;
//! ```

mod artifact;
mod config;
mod encoder;
mod error;
mod export;
mod formats;
mod mixdown;
mod worker;

pub use artifact::*;
pub use config::*;
pub use encoder::*;
pub use error::*;
pub use export::*;
pub use formats::*;
pub use mixdown::*;
pub use worker::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
