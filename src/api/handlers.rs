use axum::{
    extract::{FromRef, State},
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::api::error::{ApiError, ApiResult};
use crate::auth::TokenVerifier;
use crate::model::{CurrentUser, FamilyTree, Id, Person};
use crate::store::traits::Store;

/// Shared state behind every route.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub tokens: TokenVerifier,
    pub environment: String,
    pub started_at: Instant,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, tokens: TokenVerifier, environment: impl Into<String>) -> Self {
        Self {
            store,
            tokens,
            environment: environment.into(),
            started_at: Instant::now(),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tokens: self.tokens.clone(),
            environment: self.environment.clone(),
            started_at: self.started_at,
        }
    }
}

impl<S> FromRef<AppState<S>> for Arc<S> {
    fn from_ref(state: &AppState<S>) -> Self {
        Arc::clone(&state.store)
    }
}

impl<S> FromRef<AppState<S>> for TokenVerifier {
    fn from_ref(state: &AppState<S>) -> Self {
        state.tokens.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime: f64,
    pub version: &'static str,
    pub environment: String,
}

pub async fn health_check<S: Store>(State(state): State<AppState<S>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Family tree API is running",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        version: env!("CARGO_PKG_VERSION"),
        environment: state.environment.clone(),
    })
}

/// `{ "message": ... }` body for deletions and other acknowledgements.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

pub(crate) async fn load_tree<S: Store>(store: &S, tree_id: &Id) -> ApiResult<FamilyTree> {
    store
        .get_tree(tree_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Family tree not found"))
}

pub(crate) async fn load_person<S: Store>(store: &S, person_id: &Id) -> ApiResult<Person> {
    store
        .get_person(person_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Person not found"))
}

/// The owner can read any of their trees; others only public ones.
pub(crate) fn ensure_can_read(tree: &FamilyTree, user: &CurrentUser) -> ApiResult<()> {
    if tree.is_owned_by(&user.id) || tree.is_public {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have access to this family tree"))
    }
}

pub(crate) fn ensure_owner(tree: &FamilyTree, user: &CurrentUser) -> ApiResult<()> {
    if tree.is_owned_by(&user.id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only the owner can modify this family tree"))
    }
}

pub(crate) async fn readable_tree<S: Store>(
    store: &S,
    tree_id: &Id,
    user: &CurrentUser,
) -> ApiResult<FamilyTree> {
    let tree = load_tree(store, tree_id).await?;
    ensure_can_read(&tree, user)?;
    Ok(tree)
}

pub(crate) async fn owned_tree<S: Store>(
    store: &S,
    tree_id: &Id,
    user: &CurrentUser,
) -> ApiResult<FamilyTree> {
    let tree = load_tree(store, tree_id).await?;
    ensure_owner(&tree, user)?;
    Ok(tree)
}
