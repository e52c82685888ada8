//! # formrelay
//!
//! Renders HubSpot marketing forms as HTML and relays their submissions back
//! to HubSpot.
//!
//! ## Features
//!
//! - **Form translation**: HubSpot field groups become a flat form configuration
//! - **Validation**: per-field rules built from the configuration (required, email, number, URL)
//! - **Relay**: forms secure-submit API or CRM contact creation
//! - **HTML and JSON**: server-rendered pages plus a REST API
//! - **Health Checks**: `/health`, readiness and liveness endpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formrelay::adapters::api_handler::AppState;
//! use formrelay::adapters::health_handler::HealthHandler;
//! use formrelay::adapters::hubspot_client::HubSpotClient;
//! use formrelay::config::Settings;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Reads ./formrelay.toml and FORMRELAY__* variables
//!     let settings = Arc::new(Settings::new()?);
//!     let client = Arc::new(HubSpotClient::new(&settings.hubspot));
//!
//!     let state = AppState::new(settings.clone(), client)?;
//!     let health = Arc::new(HealthHandler::new(settings.clone()));
//!     let app = formrelay::create_app(state, health);
//!
//!     let addr = (settings.server.host.as_str(), settings.server.port);
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: form model, translation, validation, controller and the `FormPort` seam
//! - **Adapters**: HubSpot client, HTTP handlers, submission log
//! - **Config**: configuration management

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;

use crate::adapters::api_handler::{self, AppState};
use crate::adapters::form_handler;
use crate::adapters::health_handler::HealthHandler;
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Creates the Axum application router with all endpoints configured.
///
/// # Arguments
///
/// * `state` - Shared settings, forms port, submission log and templates
/// * `health_handler` - Health check handler
pub fn create_app(state: AppState, health_handler: Arc<HealthHandler>) -> Router {
    let health_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }));

    let api_router = Router::new()
        .route("/config", get(api_handler::get_config))
        .route("/forms/:form_id", get(api_handler::get_form))
        .route("/forms/:form_id/validate", post(api_handler::validate_form))
        .route("/forms/:form_id/submit", post(api_handler::submit_form))
        .route("/submissions", get(api_handler::list_submissions));

    let app_router = Router::new()
        .route("/", get(form_handler::show_default_form))
        .route(
            "/forms/:form_id",
            get(form_handler::show_form).post(form_handler::submit_form),
        )
        .nest("/api", api_router)
        .with_state(state);

    health_router
        .merge(app_router)
        .layer(TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}
