// Lifedesk - headless engine for a personal productivity dashboard
// Entry point and application setup

use lifedesk::app::AppState;
use lifedesk::error::Result;
use lifedesk::functions::FunctionsClient;
use lifedesk::services::LogNotifier;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn data_dir() -> PathBuf {
    std::env::var("LIFEDESK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifedesk=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lifedesk engine");

    let base_url = std::env::var("LIFEDESK_FUNCTIONS_URL")
        .unwrap_or_else(|_| "http://localhost:54321".to_string());
    let api_key = std::env::var("LIFEDESK_API_KEY").ok();
    let functions = FunctionsClient::new(base_url, api_key);

    let db_path = data_dir().join("lifedesk.db");
    let state = AppState::initialize(&db_path, functions, Arc::new(LogNotifier)).await?;

    // Re-arm reminders for the signed-in user, if a session was restored
    if let Some(profile) = state.auth.current_profile().await {
        state.habits.refresh_notifications(&profile.id).await?;
    }

    tracing::info!("Engine ready; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;

    state.shutdown();
    tracing::info!("Goodbye");

    Ok(())
}
