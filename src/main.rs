use std::panic;
use std::sync::Arc;

use note_collab::config::Config;
use note_collab::db::PgNoteStore;
use note_collab::routes::create_app;
use note_collab::services::{MemoryNoteStore, NotePersistence};
use note_collab::state::AppState;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "note_collab=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    let mut pg_store = None;
    let store: Arc<dyn NotePersistence> = match &config.db_url {
        Some(db_url) => match PgNoteStore::connect(db_url).await {
            Ok(pg) => {
                info!("Database initialized successfully");
                let pg = Arc::new(pg);
                pg_store = Some(pg.clone());
                pg
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Notes are kept in memory and lost on restart");
                Arc::new(MemoryNoteStore::new())
            }
        },
        None => {
            warn!("No database URL configured - notes are kept in memory and lost on restart");
            Arc::new(MemoryNoteStore::new())
        }
    };

    let address = config.server_address();
    let state = Arc::new(AppState::new(config, store));
    let app = create_app(state);

    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", address, e);
            std::process::exit(1);
        }
    };

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("Server error: {}", e);
    }

    if let Some(pg) = pg_store {
        pg.close().await;
    }
    info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
