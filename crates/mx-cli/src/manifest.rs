//! Mix manifest: the JSON session description consumed by `mxbounce`
//!
//! ```json
//! {
//!   "tracks": [
//!     { "path": "drums.wav", "gain": 0.8 },
//!     { "path": "vox.wav", "name": "Lead", "soloed": true }
//!   ],
//!   "master_gain": 1.2,
//!   "format": "mp3",
//!   "output": "bounce.mp3"
//! }
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mx_core::{MasterParams, Track, TrackId, TrackList};
use mx_offline::ExportFormat;
use serde::{Deserialize, Serialize};

use crate::decode::decode_wav;

fn unity() -> f64 {
    1.0
}

/// One source file and its mix settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "unity")]
    pub gain: f64,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub soloed: bool,
}

impl TrackEntry {
    /// Display name: explicit name or the file stem
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixManifest {
    pub tracks: Vec<TrackEntry>,
    pub master_gain: f64,
    pub format: ExportFormat,
    pub output: Option<PathBuf>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Default for MixManifest {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            master_gain: 1.0,
            format: ExportFormat::Wav,
            output: None,
            base_dir: PathBuf::new(),
        }
    }
}

impl MixManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let mut manifest: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn master(&self) -> MasterParams {
        MasterParams::new(self.master_gain)
    }

    /// Output path, defaulting to `bounce.<ext>` next to the manifest
    pub fn output_path(&self, format: ExportFormat) -> PathBuf {
        match &self.output {
            Some(path) => self.resolve(path),
            None => self.base_dir.join(format!("bounce.{}", format.extension())),
        }
    }

    /// Decode every entry; unreadable sources become failed tracks
    pub fn load_tracks(&self) -> TrackList {
        let mut list = TrackList::new();

        for entry in &self.tracks {
            let mut track = Track::new(TrackId::default(), entry.display_name());
            track.set_gain(entry.gain);
            track.muted = entry.muted;
            track.soloed = entry.soloed;
            let id = list.add_track(track);

            let path = self.resolve(&entry.path);
            let outcome = match decode_wav(&path) {
                Ok(audio) => list.mark_ready(id, audio),
                Err(e) => list.mark_failed(id, format!("{:#}", e)),
            };
            if let Err(e) = outcome {
                log::error!("Track {} vanished while loading: {}", id, e);
            }
        }

        log::info!(
            "Loaded {} tracks ({} active), longest {:.2}s",
            list.count(),
            list.active_tracks().len(),
            list.total_duration()
        );
        list
    }
}
