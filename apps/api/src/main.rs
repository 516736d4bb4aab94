mod analysis;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod screening;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::LlmCvAnalyzer;
use crate::config::Config;
use crate::extraction::{PdfExtractEngine, TesseractCli, TextExtractor};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CVScore API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client + analyzer
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    let analyzer = Arc::new(LlmCvAnalyzer::new(llm));
    info!("LLM analyzer initialized (model: {})", llm_client::MODEL);

    // Initialize the document text extractor
    let extractor = Arc::new(TextExtractor::new(
        Arc::new(PdfExtractEngine::new()),
        Arc::new(TesseractCli::new(config.ocr_languages.clone())),
        config.ocr_dpi,
        config.max_ocr_pages,
    ));
    info!(
        "Text extractor initialized (ocr languages: {}, dpi: {}, page cap: {})",
        config.ocr_languages, config.ocr_dpi, config.max_ocr_pages
    );

    // Build app state
    let state = AppState {
        analyzer,
        extractor,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
