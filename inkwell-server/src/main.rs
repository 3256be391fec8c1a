use inkwell_preview::DocumentOptions;
use inkwell_server::config::ServerConfig;
use inkwell_server::generator::{self, SketchDescriber};
use inkwell_server::routes::{router, AppState};
use inkwell_server::store::{GenerationStore, MemoryGenerationStore, PgGenerationStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[inkwell] no .env loaded ({})", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // ── Store ──
    let store: Arc<dyn GenerationStore> = match config.database_url.as_deref() {
        Some(url) => match PgGenerationStore::open(url).await {
            Ok(store) => {
                tracing::info!("connected to PostgreSQL, migrations applied");
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "database not available, keeping generations in memory");
                Arc::new(MemoryGenerationStore::new())
            }
        },
        None => {
            tracing::info!("DATABASE_URL not set, keeping generations in memory");
            Arc::new(MemoryGenerationStore::new())
        }
    };

    // ── Generation ──
    let generator = generator::from_config(&config);
    let mut state = AppState::new(generator.clone(), store)
        .with_preview(DocumentOptions::from_asset_setting(config.preview_assets.as_deref()));
    if let Some(describer) = &config.describer {
        tracing::info!(model = %describer.model, "sketch describer enabled");
        state = state.with_describer(SketchDescriber::new(describer));
    }

    // ── HTTP ──
    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %config.addr, generator = generator.name(), "inkwell listening");

    if let Err(e) = axum::serve(listener, router(state)).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
