use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dinner_bingo::{
    api,
    clock::SystemClock,
    config::AppConfig,
    state::AppState,
    store::JsonFileStore,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dinner_bingo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Dinner Bingo...");

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let store = Arc::new(JsonFileStore::new(&config.data_file));
    tracing::info!("Using data file {}", store.path().display());
    let state = Arc::new(AppState::load(store, Arc::new(SystemClock)).await?);

    if state.transact(|data| Ok(data.seed_default_settings())).await? {
        tracing::info!("Installed default round settings");
    }
    state.ensure_admin(&config.admin_password).await?;
    state.provision_participants(&config.users).await?;

    let mut app = api::router(state);
    if config.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }
    let app = app.layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
