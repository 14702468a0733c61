//! Main Entrypoint for the Learning Plan API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading the topic catalog, history and prompt templates.
//! 3. Initializing the text generator and the planning pipeline.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use kidplan_api::{config::Config, router::create_router, state::AppState};
use kidplan_core::{
    Catalog, Planner,
    history::{HistorySource, NoHistory, StaticHistory},
    llm_client::generator_for,
    prompts::PromptTemplates,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

fn load_history(config: &Config) -> Arc<dyn HistorySource> {
    let Some(path) = &config.history_path else {
        return Arc::new(NoHistory);
    };
    match StaticHistory::from_path(path) {
        Ok(history) => Arc::new(history),
        Err(e) => {
            warn!(error = ?e, "Completed-topic history unavailable; ignoring it");
            Arc::new(NoHistory)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Load Catalog, History and Prompts ---
    let catalog = Arc::new(Catalog::load_or_empty(&config.catalog_path));
    let history = load_history(&config);
    let templates = PromptTemplates::from_dir_or_default(&config.prompts_path);

    // --- 4. Initialize Shared Services ---
    let generator = generator_for(config.provider, config.api_key(), &config.chat_model)?;
    let planner = Planner::new(catalog, history, generator, templates, config.llm_timeout);

    let app_state = Arc::new(AppState {
        planner: Arc::new(planner),
        config: Arc::new(config.clone()),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
