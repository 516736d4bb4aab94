use std::sync::Arc;

use crate::analysis::CvAnalyzer;
use crate::extraction::TextExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable analyzer. Production: `LlmCvAnalyzer` over Claude.
    pub analyzer: Arc<dyn CvAnalyzer>,
    /// Document text extractor: suffix dispatch plus the PDF/OCR chain.
    pub extractor: Arc<TextExtractor>,
}
