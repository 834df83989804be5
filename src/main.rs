//! Inkpress Backend
//!
//! REST backend for a document publishing platform: block-structured
//! documents with attachable forms, published under slugs and served
//! publicly with cached on-demand machine translation.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod render;
mod translate;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use translate::{HttpTranslationEngine, Translator};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub translator: Arc<Translator>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Inkpress Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Translation endpoint: {}", config.translate.endpoint);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (INKPRESS_API_PSK). Authentication is disabled!");
    }
    if config.translate.api_key.is_empty() {
        tracing::warn!(
            "No translation API key configured (INKPRESS_TRANSLATE_API_KEY). Engine calls may be rejected."
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize the translation pipeline
    let engine = Arc::new(HttpTranslationEngine::new(&config.translate)?);
    let translator = Arc::new(Translator::new(repo.clone(), engine));

    // Create application state
    let state = AppState {
        repo,
        translator,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // Authoring routes, PSK-guarded
    let api_routes = Router::new()
        // Documents
        .route("/documents", get(api::list_documents))
        .route("/documents", post(api::create_document))
        .route("/documents/{id}", get(api::get_document))
        .route("/documents/{id}", put(api::update_document))
        .route("/documents/{id}", delete(api::delete_document))
        .route("/documents/{id}/publish", post(api::publish_document))
        .route("/documents/{id}/unpublish", post(api::unpublish_document))
        // Forms
        .route("/documents/{id}/form", put(api::put_form))
        .route("/documents/{id}/form", get(api::get_form))
        .route("/documents/{id}/form", delete(api::delete_form))
        // Responses
        .route("/documents/{id}/responses", get(api::list_responses))
        .route(
            "/documents/{id}/responses/export",
            get(api::export_responses),
        )
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Public reader routes (no auth)
    let page_routes = Router::new()
        .route("/{slug}", get(api::get_page))
        .route("/{slug}/html", get(api::get_page_html))
        .route("/{slug}/form/responses", post(api::submit_response));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .nest("/pages", page_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
