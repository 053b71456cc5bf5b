//! HTTP layer - axum router, shared state and server lifecycle.
//!
//! Handlers live in one module per resource and only translate between JSON
//! and the functions in [`crate::core`]. Errors become responses through the
//! `IntoResponse` impl on [`crate::errors::Error`].

/// Category, subcategory, origin and tag endpoints
pub mod catalog;
/// Comment endpoints
pub mod comments;
/// Product endpoints
pub mod products;
/// User endpoints
pub mod users;

use crate::config::AppConfig;
use crate::errors::{Error, Result};
use axum::{
    Json, Router,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
    http::{Method, header::CONTENT_TYPE},
};
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, instrument};

/// Shared data available to all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection pool for all catalog operations
    pub db: DatabaseConnection,
}

impl AppState {
    /// Wraps a database connection for use as router state.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Unwraps a JSON body, reporting malformed payloads as `BadRequest`.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| Error::bad_request(rejection.body_text()))
}

/// Unwraps a path parameter, reporting unparsable segments as `BadRequest`.
pub(crate) fn path_param<T>(param: std::result::Result<Path<T>, PathRejection>) -> Result<T> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| Error::bad_request(rejection.body_text()))
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .merge(products::router())
        .merge(catalog::router())
        .merge(comments::router())
        .merge(users::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds the listener and serves until Ctrl+C or SIGTERM.
#[instrument(skip_all, fields(address = %config.bind_address()))]
pub async fn serve(config: &AppConfig, db: DatabaseConnection) -> Result<()> {
    let app = router(AppState::new(db));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
