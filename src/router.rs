use crate::{
    auth::{router as auth_router, user::Backend},
    routes::{bookings, tables},
    services::booking::ReleaseWindow,
    util::asset_loader::AssetLoader,
};
use axum::{
    Json, Router,
    routing::{get, get_service},
};
use axum_login::{
    AuthManagerLayerBuilder,
    tower_sessions::{
        Expiry, SessionManagerLayer, SessionStore,
        cookie::{SameSite, time},
    },
};
use minijinja::Environment;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::{signal, task::AbortHandle};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub templates: Arc<Environment<'static>>,
    pub release_window: ReleaseWindow,
}

pub struct RouterOptions {
    pub release_window: ReleaseWindow,
    pub secure_cookies: bool,
}

pub fn create_router<S>(db: DatabaseConnection, session_store: S, options: RouterOptions) -> Router
where
    S: SessionStore + Clone,
{
    let templates = setup_templates();

    let state = AppState {
        db: db.clone(),
        templates: Arc::new(templates),
        release_window: options.release_window,
    };

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(options.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(1)));

    // Handlers receive `AuthSession` as a request extension from this layer.
    let backend = Backend::new(db);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    Router::new()
        .nest("/api/bookings", bookings::routes())
        .nest("/api/tables", tables::routes())
        .route("/health", get(health))
        .merge(auth_router::router())
        .with_state(state)
        .nest_service("/static", get_service(ServeDir::new("static")))
        .layer(auth_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn setup_templates() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader("templates"));
    let asset_loader = AssetLoader::new();
    asset_loader.register(&mut env);
    env
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}

/// Resolves on Ctrl+C or SIGTERM and stops the session cleanup task.
pub async fn shutdown_signal(session_cleanup: AbortHandle) {
    let interrupt = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(%err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(%err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("interrupt received, shutting down"),
        _ = terminate => info!("terminate received, shutting down"),
    }
    session_cleanup.abort();
}
