//! Paged-document access: text-layer reading and page rasterization.

use std::fs;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

/// The PDF side of extraction, object-safe so tests can drive the
/// extractor with scripted fakes.
pub trait PdfEngine: Send + Sync {
    /// Embedded text of the whole document, pages concatenated in page
    /// order. Empty or whitespace-only output means no text layer.
    fn text_layer(&self, data: &[u8]) -> Result<String>;

    /// Renders up to `max_pages` pages to PNG at `dpi`, in page order.
    fn rasterize(&self, data: &[u8], dpi: u32, max_pages: usize) -> Result<Vec<Vec<u8>>>;
}

/// Production engine: `pdf-extract` for the text layer, poppler's
/// `pdftoppm` for rasterization.
#[derive(Default)]
pub struct PdfExtractEngine;

impl PdfExtractEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for PdfExtractEngine {
    fn text_layer(&self, data: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(data).context("failed to read PDF text layer")
    }

    fn rasterize(&self, data: &[u8], dpi: u32, max_pages: usize) -> Result<Vec<Vec<u8>>> {
        // pdftoppm works on files, so the document and its page images
        // share one scratch directory, deleted when this scope ends.
        let scratch = tempfile::tempdir().context("failed to create scratch directory")?;
        let pdf_path = scratch.path().join("input.pdf");
        fs::write(&pdf_path, data).context("failed to spool PDF to disk")?;

        let prefix = scratch.path().join("page");
        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-l")
            .arg(max_pages.to_string())
            .arg(&pdf_path)
            .arg(&prefix)
            .output()
            .context("failed to run pdftoppm (is poppler installed?)")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("pdftoppm failed: {}", stderr.trim()));
        }

        // pdftoppm zero-pads page numbers, so a name sort is page order.
        let mut page_files: Vec<_> = fs::read_dir(scratch.path())
            .context("failed to list scratch directory")?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
            .collect();
        page_files.sort();

        if page_files.is_empty() {
            return Err(anyhow!("pdftoppm produced no page images"));
        }
        if page_files.len() == max_pages {
            warn!(max_pages, "OCR page cap reached, any pages past the cap were not rendered");
        }

        debug!(pages = page_files.len(), dpi, "rasterized PDF pages");

        page_files
            .iter()
            .map(|path| {
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))
            })
            .collect()
    }
}
