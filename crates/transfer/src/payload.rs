//! Payload resolution and best-effort icon preparation.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// What one send operation carries: the items to transfer and an optional
/// presentation icon for the receiving side's consent prompt.
#[derive(Clone, Debug)]
pub struct Payload {
    pub items: Vec<PathBuf>,
    pub icon: Option<FileIcon>,
}

impl Payload {
    /// Payload of a single file, no icon.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            items: vec![path.into()],
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: FileIcon) -> Self {
        self.icon = Some(icon);
        self
    }
}

/// Image formats we can present as an icon.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IconFormat {
    Jpeg,
    Png,
}

/// Icon preparation failure. Always recoverable: an operation simply proceeds
/// without an icon.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("failed to read icon source: {0}")]
    Io(#[from] std::io::Error),
    #[error("icon source is not a recognized image")]
    UnrecognizedFormat,
}

/// A decoded-enough presentation icon: raw image bytes plus their sniffed
/// format. Real rendering happens on the receiving side.
#[derive(Clone)]
pub struct FileIcon {
    format: IconFormat,
    bytes: Vec<u8>,
}

impl FileIcon {
    /// Read `path` and sniff it as JPEG or PNG.
    pub fn prepare(path: &Path) -> Result<Self, IconError> {
        let bytes = fs::read(path)?;
        let format = sniff_format(&bytes).ok_or(IconError::UnrecognizedFormat)?;
        Ok(Self { format, bytes })
    }

    pub fn format(&self) -> IconFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for FileIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileIcon")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn sniff_format(bytes: &[u8]) -> Option<IconFormat> {
    const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    if bytes.starts_with(&JPEG_MAGIC) {
        Some(IconFormat::Jpeg)
    } else if bytes.starts_with(&PNG_MAGIC) {
        Some(IconFormat::Png)
    } else {
        None
    }
}
