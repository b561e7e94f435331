//! Error types for the analysis core
//!
//! Degenerate handwriting (no ink, no words, a single line) is never an error;
//! only input that cannot be turned into a grayscale image ends up here.

use std::path::PathBuf;

/// Failures surfaced by the analysis pipeline and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Failed to decode image {path:?}: {source}")]
    Decode {
        path: Option<PathBuf>,
        #[source]
        source: image::ImageError,
    },

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Chart rendering failed: {0}")]
    Render(String),
}

impl AnalysisError {
    /// Wrap a decode failure for an image that came from disk
    pub fn decode_at(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Decode {
            path: Some(path.into()),
            source,
        }
    }
}

impl From<image::ImageError> for AnalysisError {
    fn from(source: image::ImageError) -> Self {
        Self::Decode { path: None, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_message() {
        let err = AnalysisError::EmptyImage {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "Image has no pixels (0x12)");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AnalysisError = io.into();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
