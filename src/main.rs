//! # Sonote Backend - Main Application Entry Point
//!
//! Sets up the Actix-web HTTP server:
//! 1. **Loads configuration** from `.env`, config.toml and environment variables
//! 2. **Sets up logging** with `tracing`
//! 3. **Builds the shared state** (orchestrator, upstream clients, probes)
//! 4. **Runs the server** until SIGINT/SIGTERM, then stops gracefully

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use sonote_backend::config::AppConfig;
use sonote_backend::state::AppState;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    // It's fine if there's no .env file
    dotenv::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(config.server.debug);
    config.validate()?;

    info!("Starting sonote-backend v{}", env!("CARGO_PKG_VERSION"));
    info!(
        mock_mode = config.mock.enabled,
        mock_fallback = config.mock.fallback,
        llm_provider = %config.llm.provider,
        asr_configured = config.has_asr_credential(),
        llm_configured = config.has_llm_credential(),
        "Configuration loaded"
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let cors_origins = config.cors_origins_list();
    let app_state = AppState::new(config);

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .configure(sonote_backend::configure_routes)
    })
    .disable_signals()
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    // Whichever finishes first: the server (usually an error) or a shutdown signal
    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the `debug` config flag picks the default level.
fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "sonote_backend=debug,actix_web=info"
    } else {
        "sonote_backend=info,actix_web=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// CORS policy from the configured origin list; `*` allows any origin.
fn build_cors(origins: &[String]) -> Cors {
    let cors = if origins.iter().any(|origin| origin == "*") {
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .supports_credentials()
    };

    cors.allow_any_method().allow_any_header().max_age(3600)
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
