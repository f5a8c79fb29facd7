//! Innovara site - marketing pages, blog and admin content editor

pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod logging;
pub mod notify;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::notify::EmailJsTransport;
use crate::routes::{admin, blog, editor, health, pages, partner};
pub use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database unavailable: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not build email client: {0}")]
    EmailClient(#[from] reqwest::Error),
    #[error("invalid bind address '{0}'")]
    Address(String),
    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configure CORS from ALLOWED_ORIGINS (comma-separated), defaulting to
/// the local development origins.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty())
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:5000"),
                HeaderValue::from_static("http://127.0.0.1:5000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    let editor = Router::new()
        .route(
            "/admin/create",
            get(editor::create_post_page).post(editor::create_post),
        )
        .route(
            "/admin/team",
            get(editor::team).post(editor::save_team_member),
        )
        .route(
            "/admin/projects",
            get(editor::projects).post(editor::save_project),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let site = Router::new()
        .route("/", get(pages::index))
        .route("/services", get(pages::services))
        .route("/about", get(pages::about))
        .route(
            "/partner",
            get(partner::partner_page).post(partner::submit_contact),
        )
        .route("/blog", get(blog::list_posts))
        .route("/blog/{slug}", get(blog::get_post))
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .route("/admin/logout", get(admin::logout))
        .merge(editor)
        .layer(auth::session_manager(
            state.sessions.clone(),
            &state.config.session,
            state.config.is_production(),
        ));

    Router::new()
        .merge(site)
        .route("/health", get(health::health_ping))
        .route("/health/database", get(health::health_database))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // Form posts are small; cap request bodies at 2 MB
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    // Dropping the guards stops the background log writers.
    let _log_guards = logging::init(&environment);

    health::init_start_time();

    let config = AppConfig::from_env();
    config.warn_insecure_defaults();

    let pool = db::init_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let transport = Arc::new(EmailJsTransport::new(&config.email)?);

    let bind = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = bind.parse().map_err(|_| StartupError::Address(bind))?;

    let app = create_app(AppState::new(config, pool, transport));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
