mod catalog;
mod config;
mod errors;
mod llm_client;
mod models;
mod recommendation;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::ProductCatalog;
use crate::config::{Config, Credential};
use crate::llm_client::LlmClient;
use crate::recommendation::orchestrator::{RecommendationOrchestrator, Upstream};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; only malformed values are fatal
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Advisor API v{}", env!("CARGO_PKG_VERSION"));

    // Load the product catalog (read-only for the process lifetime)
    let (catalog, report) = ProductCatalog::load(&config.catalog_path).with_context(|| {
        format!(
            "Failed to load product catalog from {}",
            config.catalog_path.display()
        )
    })?;
    if catalog.is_empty() {
        warn!(
            "Product catalog is empty ({} rows skipped); every request will return no recommendations",
            report.skipped
        );
    }

    // Initialize the completion upstream, or run template-only without a key
    let upstream = match &config.credential {
        Credential::ApiKey(key) => {
            let client = LlmClient::new(key.clone(), config.llm_api_url.clone())
                .context("Failed to build HTTP client")?;
            info!(
                "API key loaded: {} (endpoint: {})",
                config.credential.masked().unwrap_or_default(),
                client.api_url()
            );
            Upstream::Configured(Arc::new(client))
        }
        Credential::Missing => {
            warn!(
                "API key is not set. Provide TOGETHER_API_KEY / API_KEY or --api-key=YOUR_KEY; \
                 AI recommendations will fall back to templates"
            );
            Upstream::ConfigurationMissing
        }
    };

    let orchestrator =
        RecommendationOrchestrator::new(upstream, config.llm_models.clone(), config.llm_timeout);
    info!(
        "Model failover order: [{}], timeout {:?} per call",
        orchestrator.models().join(", "),
        config.llm_timeout
    );

    // Build app state
    let state = AppState {
        catalog: Arc::new(catalog),
        orchestrator: Arc::new(orchestrator),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
