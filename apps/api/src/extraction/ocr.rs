//! OCR: encoded image rasters in, recognized text out.

use std::io::Write;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR binary is not installed on the host.
    #[error("OCR engine not found")]
    EngineMissing,

    #[error("{0}")]
    Failed(String),
}

/// Text recognition over an encoded raster (PNG or JPEG bytes).
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Tesseract via its command-line interface.
///
/// The language set is a tesseract selector like `eng+tur`; the default
/// covers the expected candidate pool (English and Turkish resumes).
pub struct TesseractCli {
    languages: String,
}

impl TesseractCli {
    pub fn new(languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
        }
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut input = tempfile::Builder::new()
            .prefix("cvscore-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Failed(format!("failed to create temp image: {e}")))?;
        input
            .write_all(image)
            .map_err(|e| OcrError::Failed(format!("failed to write temp image: {e}")))?;

        let output = Command::new("tesseract")
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .args(["--psm", "1"])
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrError::EngineMissing
                } else {
                    OcrError::Failed(format!("failed to run tesseract: {e}"))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if !output.stderr.is_empty() {
            // Tesseract chatters on stderr even when it succeeds.
            warn!(stderr = %String::from_utf8_lossy(&output.stderr).trim(), "tesseract warning");
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.len(), "OCR pass complete");
        Ok(text)
    }
}
