//! Web server module
//!
//! Router assembly and startup. Page/form routes carry an optional identity
//! resolved by the auth middleware; the JSON content API and auth endpoints
//! sit under /api.

pub mod auth;
pub mod http;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::content::{ContentCatalog, ContentLibrary};
use crate::progress::ProgressStore;
use crate::server::auth::AuthState;
use crate::session::SessionStore;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub catalog: Arc<ContentCatalog>,
    pub library: Arc<ContentLibrary>,
    pub progress: Arc<ProgressStore>,
    pub sessions: Arc<SessionStore>,
    pub auth_state: Arc<AuthState>,
}

impl ServerState {
    /// Build state from config: loads and validates the catalog (fatal on
    /// malformed content) and wires up the stores.
    pub fn new(mut config: Config) -> Result<Self> {
        let jwt_secret = match &config.auth.jwt_secret {
            Some(secret) => secret.clone(),
            None => config.ensure_jwt_secret()?,
        };

        let catalog = ContentCatalog::load(&config.content.catalog_path)
            .with_context(|| {
                format!(
                    "Failed to load content catalog from {}",
                    config.content.catalog_path.display()
                )
            })?;

        let library = ContentLibrary::new(
            config.content.manifest_path.clone(),
            config.content.content_root.clone(),
        );

        let auth_state = AuthState::new(config.auth.clone(), jwt_secret);

        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            library: Arc::new(library),
            progress: Arc::new(ProgressStore::new()),
            sessions: Arc::new(SessionStore::new()),
            auth_state,
        })
    }
}

/// Assemble the application router
pub fn build_router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        // Learner-facing pages and forms (anonymous allowed)
        .route("/", get(http::home_handler))
        .route("/modules/{id}", get(http::module_handler))
        .route("/preferences", post(http::preferences_handler))
        .route("/progress/complete", post(http::complete_handler))
        .route("/progress/pin", post(http::pin_handler))
        .route("/quiz/submit", post(http::quiz_submit_handler))
        // Content JSON API
        .route("/api/content/manifest", get(http::manifest_handler))
        .route("/api/content/documents", get(http::documents_handler))
        .route(
            "/api/content/documents/by-module",
            get(http::documents_by_module_handler),
        )
        .route(
            "/api/content/documents/{id}",
            get(http::document_by_id_handler),
        )
        // Auth + health
        .route("/api/auth/login", post(http::login_handler))
        .route("/api/auth/refresh", post(http::refresh_handler))
        .route("/api/auth/logout", post(http::logout_handler))
        .route("/api/status", get(http::status_handler))
        .layer(middleware::from_fn_with_state(
            state.auth_state.clone(),
            auth::identity_middleware,
        ))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(
    host: Option<String>,
    port: Option<u16>,
    https: bool,
    cert: Option<String>,
    key: Option<String>,
) -> Result<()> {
    let config = Config::load()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let state = ServerState::new(config)?;
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     Scholar Server Starting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!(
        "✓ Catalog: {} modules, {} sections",
        state.catalog.modules.len(),
        state.catalog.section_count()
    );
    println!("✓ Server binding to: {}", addr);
    if https {
        println!("✓ HTTPS enabled");
    } else {
        println!("⚠ HTTPS disabled");
    }
    println!();
    println!("🚀 Listening on http{}://{}", if https { "s" } else { "" }, addr);
    println!();

    info!(
        modules = state.catalog.modules.len(),
        sections = state.catalog.section_count(),
        "content catalog loaded"
    );

    let app = build_router(state);

    // HTTPS mode
    if https {
        if let (Some(cert_path), Some(key_path)) = (cert, key) {
            let cert_data = tokio::fs::read(&cert_path)
                .await
                .context("Failed to read certificate file")?;
            let key_data = tokio::fs::read(&key_path)
                .await
                .context("Failed to read key file")?;

            let tls = axum_server::tls_rustls::RustlsConfig::from_pem(cert_data, key_data).await?;
            axum_server::bind_rustls(addr, tls)
                .serve(app.into_make_service())
                .await?;
            return Ok(());
        }
        anyhow::bail!("HTTPS requested but --cert/--key not provided");
    }

    // HTTP mode
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
