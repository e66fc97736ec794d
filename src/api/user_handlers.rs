use axum::{extract::State, response::Json};
use log::info;
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::model::{CurrentUser, User, UserUpdate};
use crate::store::traits::Store;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserUpdatedResponse {
    pub message: String,
    pub user: User,
}

pub async fn get_profile<S: Store>(
    State(store): State<Arc<S>>,
    user: CurrentUser,
) -> ApiResult<Json<UserResponse>> {
    let user = store.ensure_user(&user.id, &user.email).await?;
    Ok(Json(UserResponse { user }))
}

pub async fn update_profile<S: Store>(
    State(store): State<Arc<S>>,
    current: CurrentUser,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<Json<UserUpdatedResponse>> {
    let mut user = store.ensure_user(&current.id, &current.email).await?;

    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("name: must not be empty"));
        }
        user.name = Some(name.to_string());
        user.updated_at = crate::model::now();
    }

    if !store.update_user(user.clone()).await? {
        return Err(ApiError::not_found("User not found"));
    }
    info!("Updated profile of user {}", user.id);

    Ok(Json(UserUpdatedResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}
