//! Document text extraction.
//!
//! Turns an uploaded resume file (PDF or image) into plain text for the
//! analysis layer. PDFs are read from their embedded text layer first;
//! only when no text layer exists (a scanned document) is every page
//! rasterized and run through OCR, page by page. Images go straight to
//! OCR. The text-layer-first policy keeps the common case cheap and
//! deterministic.
//!
//! Extraction never aborts a screening batch: every failure becomes an
//! `ExtractionError` value, and the screening layer decides how each
//! kind is presented on the candidate card.

mod ocr;
mod pdf;

pub use self::ocr::{OcrEngine, OcrError, TesseractCli};
pub use self::pdf::{PdfEngine, PdfExtractEngine};

use std::io::Cursor;
use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use image::ImageFormat;
use thiserror::Error;
use tracing::debug;

/// A file received from the client. The name drives format dispatch; the
/// content is handed to whichever engine the format calls for. Owned
/// exclusively by one extraction call.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub content: Bytes,
}

/// Supported input formats, classified once at the boundary and then
/// matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    Unsupported,
}

impl DocumentKind {
    /// Case-insensitive filename-suffix sniffing. No magic-byte
    /// validation: a mislabeled file surfaces later as a decode failure.
    pub fn classify(file_name: &str) -> Self {
        let name = file_name.to_lowercase();
        if name.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if name.ends_with(".png") || name.ends_with(".jpg") || name.ends_with(".jpeg") {
            DocumentKind::Image
        } else {
            DocumentKind::Unsupported
        }
    }
}

/// Why a document produced no text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file format")]
    UnsupportedFormat,

    /// The OCR binary is absent on the host. Kept distinct from `Failed`
    /// so an operator can tell "install tesseract" apart from "bad input".
    #[error("OCR engine not found")]
    OcrEngineMissing,

    #[error("error processing image: {0}")]
    ImageProcessing(String),

    #[error("could not process '{file}': {reason}")]
    Failed { file: String, reason: String },
}

impl ExtractionError {
    fn failed(file: &str, err: anyhow::Error) -> Self {
        ExtractionError::Failed {
            file: file.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

/// The extractor: suffix dispatch plus the two-tier PDF policy.
///
/// Holds its engines as trait objects so tests can drive the control flow
/// with scripted fakes, and carries the rasterization policy (DPI and the
/// per-document page cap) from config.
pub struct TextExtractor {
    pdf: Arc<dyn PdfEngine>,
    ocr: Arc<dyn OcrEngine>,
    ocr_dpi: u32,
    max_ocr_pages: usize,
}

impl TextExtractor {
    pub fn new(
        pdf: Arc<dyn PdfEngine>,
        ocr: Arc<dyn OcrEngine>,
        ocr_dpi: u32,
        max_ocr_pages: usize,
    ) -> Self {
        Self {
            pdf,
            ocr,
            ocr_dpi,
            max_ocr_pages,
        }
    }

    /// Extracts all machine-readable text from `document`.
    ///
    /// Synchronous by design; callers on the async runtime wrap this in
    /// `spawn_blocking`. An empty `Ok` string is a valid outcome (e.g. a
    /// blank page that OCR finds nothing on); only `Err` means the file
    /// could not be handled at all.
    pub fn extract(&self, document: &UploadedDocument) -> Result<String, ExtractionError> {
        match DocumentKind::classify(&document.name) {
            DocumentKind::Pdf => self.extract_pdf(document),
            DocumentKind::Image => self.extract_image(document),
            DocumentKind::Unsupported => Err(ExtractionError::UnsupportedFormat),
        }
    }

    fn extract_pdf(&self, document: &UploadedDocument) -> Result<String, ExtractionError> {
        let text = self
            .pdf
            .text_layer(&document.content)
            .map_err(|e| ExtractionError::failed(&document.name, e))?;

        if !text.trim().is_empty() {
            debug!(file = %document.name, chars = text.len(), "PDF text layer read");
            return Ok(text);
        }

        // No embedded text anywhere: a scanned document. Rasterize and
        // OCR page by page, in page order.
        debug!(file = %document.name, "no text layer, falling back to per-page OCR");
        let pages = self
            .pdf
            .rasterize(&document.content, self.ocr_dpi, self.max_ocr_pages)
            .map_err(|e| ExtractionError::failed(&document.name, e))?;

        let mut page_texts = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let text = self.ocr.recognize(page).map_err(|e| match e {
                OcrError::EngineMissing => ExtractionError::OcrEngineMissing,
                OcrError::Failed(reason) => ExtractionError::failed(
                    &document.name,
                    anyhow!("OCR failed on page {}: {reason}", index + 1),
                ),
            })?;
            page_texts.push(text);
        }

        Ok(page_texts.concat())
    }

    fn extract_image(&self, document: &UploadedDocument) -> Result<String, ExtractionError> {
        // Normalize whatever the client sent (PNG or JPEG) into PNG
        // before handing it to the OCR engine.
        let raster = image::load_from_memory(&document.content)
            .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))?;

        let mut png = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))?;

        self.ocr.recognize(&png).map_err(|e| match e {
            OcrError::EngineMissing => ExtractionError::OcrEngineMissing,
            OcrError::Failed(reason) => ExtractionError::ImageProcessing(reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted PDF engine: pops one text-layer result per call and
    /// records every rasterize invocation.
    struct FakePdf {
        text_layers: Mutex<Vec<anyhow::Result<String>>>,
        pages: Vec<Vec<u8>>,
        text_layer_calls: AtomicUsize,
        rasterize_calls: Mutex<Vec<(u32, usize)>>,
    }

    impl FakePdf {
        fn with_layer(text: &str) -> Self {
            Self::scripted(vec![Ok(text.to_string())], vec![])
        }

        fn scanned(pages: Vec<Vec<u8>>) -> Self {
            Self::scripted(vec![Ok(String::new())], pages)
        }

        fn scripted(text_layers: Vec<anyhow::Result<String>>, pages: Vec<Vec<u8>>) -> Self {
            Self {
                text_layers: Mutex::new(text_layers),
                pages,
                text_layer_calls: AtomicUsize::new(0),
                rasterize_calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PdfEngine for FakePdf {
        fn text_layer(&self, _data: &[u8]) -> anyhow::Result<String> {
            self.text_layer_calls.fetch_add(1, Ordering::SeqCst);
            self.text_layers.lock().unwrap().remove(0)
        }

        fn rasterize(&self, _data: &[u8], dpi: u32, max_pages: usize) -> anyhow::Result<Vec<Vec<u8>>> {
            self.rasterize_calls.lock().unwrap().push((dpi, max_pages));
            Ok(self.pages.clone())
        }
    }

    /// Scripted OCR engine: pops one result per call and records inputs.
    struct FakeOcr {
        outputs: Mutex<Vec<Result<String, OcrError>>>,
        inputs: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeOcr {
        fn with_outputs(outputs: Vec<Result<String, OcrError>>) -> Self {
            Self {
                outputs: Mutex::new(outputs),
                inputs: Mutex::new(Vec::new()),
            }
        }

        fn never_called() -> Self {
            Self::with_outputs(vec![])
        }

        fn calls(&self) -> usize {
            self.inputs.lock().unwrap().len()
        }
    }

    impl OcrEngine for FakeOcr {
        fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
            self.inputs.lock().unwrap().push(image.to_vec());
            self.outputs.lock().unwrap().remove(0)
        }
    }

    fn extractor(pdf: Arc<FakePdf>, ocr: Arc<FakeOcr>) -> TextExtractor {
        TextExtractor::new(pdf, ocr, 300, 20)
    }

    fn doc(name: &str, content: &[u8]) -> UploadedDocument {
        UploadedDocument {
            name: name.to_string(),
            content: Bytes::copy_from_slice(content),
        }
    }

    /// A real 2x2 PNG so the image path's decode step succeeds.
    fn tiny_png() -> Vec<u8> {
        let raster = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let mut buf = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_classify_by_suffix() {
        assert_eq!(DocumentKind::classify("cv.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::classify("photo.png"), DocumentKind::Image);
        assert_eq!(DocumentKind::classify("photo.jpg"), DocumentKind::Image);
        assert_eq!(DocumentKind::classify("photo.jpeg"), DocumentKind::Image);
        assert_eq!(DocumentKind::classify("resume.docx"), DocumentKind::Unsupported);
        assert_eq!(DocumentKind::classify("noextension"), DocumentKind::Unsupported);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(DocumentKind::classify("CV.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::classify("IMAGE.PNG"), DocumentKind::Image);
        assert_eq!(DocumentKind::classify("image.Png"), DocumentKind::Image);
        assert_eq!(DocumentKind::classify("scan.JPEG"), DocumentKind::Image);
    }

    #[test]
    fn test_unsupported_suffix_touches_no_engine() {
        let pdf = Arc::new(FakePdf::with_layer("never read"));
        let ocr = Arc::new(FakeOcr::never_called());
        let sut = extractor(pdf.clone(), ocr.clone());

        let result = sut.extract(&doc("resume.docx", b"whatever"));

        assert!(matches!(result, Err(ExtractionError::UnsupportedFormat)));
        assert_eq!(pdf.text_layer_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn test_text_native_pdf_skips_ocr() {
        // 2-page document: page 1 has text, page 2 is blank but still has
        // a (empty) text layer. The concatenated layer is non-empty, so
        // OCR must not run for either page.
        let pdf = Arc::new(FakePdf::with_layer("Jane Doe, Engineer"));
        let ocr = Arc::new(FakeOcr::never_called());
        let sut = extractor(pdf.clone(), ocr.clone());

        let text = sut.extract(&doc("cv.pdf", b"%PDF")).unwrap();

        assert_eq!(text, "Jane Doe, Engineer");
        assert!(pdf.rasterize_calls.lock().unwrap().is_empty());
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn test_whitespace_only_layer_triggers_per_page_ocr_in_order() {
        let pages = vec![b"raster-1".to_vec(), b"raster-2".to_vec(), b"raster-3".to_vec()];
        let pdf = Arc::new(FakePdf::scripted(
            vec![Ok("  \n\t  ".to_string())],
            pages.clone(),
        ));
        let ocr = Arc::new(FakeOcr::with_outputs(vec![
            Ok("one ".to_string()),
            Ok("two ".to_string()),
            Ok("three".to_string()),
        ]));
        let sut = extractor(pdf.clone(), ocr.clone());

        let text = sut.extract(&doc("scan.pdf", b"%PDF")).unwrap();

        assert_eq!(text, "one two three");
        assert_eq!(*ocr.inputs.lock().unwrap(), pages);
        assert_eq!(*pdf.rasterize_calls.lock().unwrap(), vec![(300, 20)]);
    }

    #[test]
    fn test_scanned_single_page_invokes_ocr_exactly_once() {
        let pdf = Arc::new(FakePdf::scanned(vec![b"page-raster".to_vec()]));
        let ocr = Arc::new(FakeOcr::with_outputs(vec![Ok(
            "John Smith\nSoftware Engineer".to_string(),
        )]));
        let sut = extractor(pdf.clone(), ocr.clone());

        let text = sut.extract(&doc("scan.pdf", b"%PDF")).unwrap();

        assert_eq!(text, "John Smith\nSoftware Engineer");
        assert_eq!(ocr.calls(), 1);
    }

    #[test]
    fn test_rasterize_receives_configured_dpi_and_page_cap() {
        let pdf = Arc::new(FakePdf::scanned(vec![b"p".to_vec()]));
        let ocr = Arc::new(FakeOcr::with_outputs(vec![Ok(String::new())]));
        let sut = TextExtractor::new(pdf.clone(), ocr, 150, 5);

        sut.extract(&doc("scan.pdf", b"%PDF")).unwrap();

        assert_eq!(*pdf.rasterize_calls.lock().unwrap(), vec![(150, 5)]);
    }

    #[test]
    fn test_image_suffix_dispatches_to_ocr_regardless_of_case() {
        for name in ["IMAGE.PNG", "image.png", "image.Png", "photo.JPEG", "scan.Jpg"] {
            let pdf = Arc::new(FakePdf::with_layer("never read"));
            let ocr = Arc::new(FakeOcr::with_outputs(vec![Ok("ocr text".to_string())]));
            let sut = extractor(pdf.clone(), ocr.clone());

            let text = sut.extract(&doc(name, &tiny_png())).unwrap();

            assert_eq!(text, "ocr text", "failed for {name}");
            assert_eq!(ocr.calls(), 1, "failed for {name}");
            assert_eq!(pdf.text_layer_calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_missing_ocr_engine_reported_for_images() {
        let pdf = Arc::new(FakePdf::with_layer("never read"));
        let ocr = Arc::new(FakeOcr::with_outputs(vec![Err(OcrError::EngineMissing)]));
        let sut = extractor(pdf, ocr);

        let result = sut.extract(&doc("photo.png", &tiny_png()));

        assert!(matches!(result, Err(ExtractionError::OcrEngineMissing)));
    }

    #[test]
    fn test_missing_ocr_engine_reported_for_scanned_pdfs() {
        let pdf = Arc::new(FakePdf::scanned(vec![b"p1".to_vec(), b"p2".to_vec()]));
        let ocr = Arc::new(FakeOcr::with_outputs(vec![Err(OcrError::EngineMissing)]));
        let sut = extractor(pdf, ocr);

        let result = sut.extract(&doc("scan.pdf", b"%PDF"));

        assert!(matches!(result, Err(ExtractionError::OcrEngineMissing)));
    }

    #[test]
    fn test_corrupt_image_fails_before_ocr() {
        let pdf = Arc::new(FakePdf::with_layer("never read"));
        let ocr = Arc::new(FakeOcr::never_called());
        let sut = extractor(pdf, ocr.clone());

        let result = sut.extract(&doc("photo.png", b"not an image"));

        assert!(matches!(result, Err(ExtractionError::ImageProcessing(_))));
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn test_ocr_page_failure_names_file_and_page() {
        let pdf = Arc::new(FakePdf::scanned(vec![b"p1".to_vec(), b"p2".to_vec()]));
        let ocr = Arc::new(FakeOcr::with_outputs(vec![
            Ok("fine".to_string()),
            Err(OcrError::Failed("blank raster".to_string())),
        ]));
        let sut = extractor(pdf, ocr);

        let result = sut.extract(&doc("scan.pdf", b"%PDF"));

        match result {
            Err(ExtractionError::Failed { file, reason }) => {
                assert_eq!(file, "scan.pdf");
                assert!(reason.contains("page 2"), "reason was: {reason}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_is_contained_per_document() {
        // First document blows up inside the PDF engine; the second,
        // handled by the same extractor, must still succeed.
        let pdf = Arc::new(FakePdf::scripted(
            vec![
                Err(anyhow!("broken xref table")),
                Ok("Second candidate".to_string()),
            ],
            vec![],
        ));
        let ocr = Arc::new(FakeOcr::never_called());
        let sut = extractor(pdf, ocr);

        let first = sut.extract(&doc("bad.pdf", b"%PDF"));
        match first {
            Err(ExtractionError::Failed { file, .. }) => assert_eq!(file, "bad.pdf"),
            other => panic!("expected Failed, got {other:?}"),
        }

        let second = sut.extract(&doc("good.pdf", b"%PDF")).unwrap();
        assert_eq!(second, "Second candidate");
    }

    #[test]
    fn test_error_display_uses_the_diagnostic_wording() {
        assert_eq!(
            ExtractionError::UnsupportedFormat.to_string(),
            "unsupported file format"
        );
        assert_eq!(
            ExtractionError::OcrEngineMissing.to_string(),
            "OCR engine not found"
        );
    }

    #[test]
    fn test_empty_ocr_output_is_a_valid_result() {
        let pdf = Arc::new(FakePdf::scanned(vec![b"blank".to_vec()]));
        let ocr = Arc::new(FakeOcr::with_outputs(vec![Ok(String::new())]));
        let sut = extractor(pdf, ocr);

        let text = sut.extract(&doc("scan.pdf", b"%PDF")).unwrap();

        assert_eq!(text, "");
    }
}
