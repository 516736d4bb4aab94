use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails fast if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Tesseract language selector, e.g. "eng+tur".
    pub ocr_languages: String,
    /// Rasterization resolution for the scanned-PDF fallback. 300 is the
    /// sweet spot: lower hurts OCR accuracy, higher mostly costs memory.
    pub ocr_dpi: u32,
    /// Upper bound on pages rasterized and OCR'd per document.
    pub max_ocr_pages: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ocr_languages: std::env::var("OCR_LANGUAGES")
                .unwrap_or_else(|_| "eng+tur".to_string()),
            ocr_dpi: std::env::var("OCR_DPI")
                .unwrap_or_else(|_| "300".to_string())
                .parse::<u32>()
                .context("OCR_DPI must be a positive integer")?,
            max_ocr_pages: std::env::var("MAX_OCR_PAGES")
                .unwrap_or_else(|_| "20".to_string())
                .parse::<usize>()
                .context("MAX_OCR_PAGES must be a positive integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
