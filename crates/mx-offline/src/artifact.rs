//! Encoded export artifacts

use std::fs;
use std::path::Path;

use crate::error::ExportResult;
use crate::formats::ExportFormat;

/// Immutable encoded bytes tagged with their format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    format: ExportFormat,
    bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    #[inline]
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// `pcm-wav` or `mp3-320`
    #[inline]
    pub fn tag(&self) -> &'static str {
        self.format.tag()
    }

    #[inline]
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    #[inline]
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Write to `path`, creating parent directories as needed
    pub fn write_to(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.bytes)?;

        log::info!(
            "Wrote {} artifact ({} bytes) to {}",
            self.tag(),
            self.len(),
            path.display()
        );
        Ok(())
    }
}
