//! # Sonote Backend
//!
//! HTTP service that transcribes uploaded audio with DashScope Paraformer and polishes the
//! transcript with an OpenAI-compatible LLM (Qwen or DeepSeek). When credentials are
//! missing, mock mode is on, or an upstream call fails, deterministic placeholder results
//! are returned instead so the frontend keeps working.
//!
//! ## Application Architecture:
//! - **config**: layered configuration (defaults, config.toml, environment)
//! - **error**: HTTP-facing error type
//! - **services**: upstream clients, mock generator, orchestrator and probes
//! - **state**: shared read-only state for the handlers
//! - **health** / **handlers**: HTTP endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod services;
pub mod state;

use actix_web::web;

/// Register every route. Shared by the server and the handler tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::service_info)).service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/config", web::get().to(handlers::check_config))
            .route("/transcribe", web::post().to(handlers::transcribe))
            .route("/polish", web::post().to(handlers::polish)),
    );
}
