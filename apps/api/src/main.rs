mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
mod loader;
mod models;
mod progress;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::service::{AnalysisContext, FetchLimits};
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::loader::PgStore;
use crate::progress::PgProgressSink;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

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

    info!("Starting copilot API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url, config.fetch_timeout).await?;

    let store = Arc::new(PgStore::new(db.clone()));
    let limits = FetchLimits::from_config(&config);
    info!(
        "Fetch limits: timeout {}ms, batch concurrency {}",
        limits.timeout.as_millis(),
        limits.max_concurrency
    );
    let analysis = AnalysisContext {
        loader: store.clone(),
        heatmap_source: store,
        progress: Arc::new(PgProgressSink::new(db)),
        limits,
    };

    let llm = match config.anthropic_api_key.clone() {
        Some(key) => {
            let client = LlmClient::new(key)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(client)
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; narration disabled");
            None
        }
    };

    let app = build_router(AppState { analysis, llm })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
