pub mod api;
pub mod auth;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use log::{info, warn};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::{create_router, expose_error_details, AppState};
use crate::auth::TokenVerifier;
use crate::config::{AppConfig, StoreBackend};

// Export API types
pub use api::handlers;
pub use api::routes;

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

/// Pool size used when `database.max_connections` is not set
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// The full application: routes, state and the request body limit.
pub fn build_app<S: Store + 'static>(state: AppState<S>, max_body_bytes: usize) -> Router {
    create_router::<S>()
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

/// Serve `store` on an already bound listener until the server stops.
pub async fn serve_store<S: Store + 'static>(
    listener: TcpListener,
    store: Arc<S>,
    tokens: TokenVerifier,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let state = AppState::new(store, tokens, config.environment.clone());
    let app = build_app(state, config.server.max_body_bytes);

    info!("Family tree API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the configured store and serve it on the configured address.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    expose_error_details(config.is_development());
    let tokens = TokenVerifier::new(&config.jwt_secret()?);
    let listener = TcpListener::bind(config.server_address()).await?;

    match config.database.backend {
        StoreBackend::Postgres => {
            let database_url = config.database_url()?;
            let max_connections = config
                .database
                .max_connections
                .unwrap_or(DEFAULT_MAX_CONNECTIONS);
            let store = PostgresStore::new(&database_url, max_connections).await?;
            store.migrate().await?;
            info!("Connected to PostgreSQL, migrations applied");

            serve_store(listener, Arc::new(store), tokens, config).await
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; all data is lost on shutdown");
            serve_store(listener, Arc::new(MemoryStore::new()), tokens, config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let tokens = TokenVerifier::new("limit-secret");
        let user = CurrentUser {
            id: "alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        let token = tokens.issue(&user, chrono::Duration::hours(1)).unwrap();
        let state = AppState::new(Arc::new(MemoryStore::new()), tokens, "test");
        let app = build_app(state, 64);

        let body = serde_json::json!({ "name": "x".repeat(256) }).to_string();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/family-trees")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
