use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use log::info;
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::api::handlers::{load_person, owned_tree, readable_tree, MessageResponse};
use crate::logic::{check_lifespan, person_fields, person_patch};
use crate::model::{CurrentUser, Id, NewPerson, Person, PersonUpdate};
use crate::store::traits::Store;

#[derive(Debug, Serialize)]
pub struct PersonListResponse {
    pub persons: Vec<Person>,
}

#[derive(Debug, Serialize)]
pub struct PersonResponse {
    pub person: Person,
}

#[derive(Debug, Serialize)]
pub struct PersonChangedResponse {
    pub message: String,
    pub person: Person,
}

pub async fn list_persons<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<PersonListResponse>> {
    readable_tree(store.as_ref(), &tree_id, &user).await?;
    let persons = store.list_persons_for_tree(&tree_id).await?;
    Ok(Json(PersonListResponse { persons }))
}

pub async fn get_person<S: Store>(
    State(store): State<Arc<S>>,
    Path(person_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<PersonResponse>> {
    let person = load_person(store.as_ref(), &person_id).await?;
    readable_tree(store.as_ref(), &person.tree_id, &user).await?;
    Ok(Json(PersonResponse { person }))
}

pub async fn create_person<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
    ApiJson(request): ApiJson<NewPerson>,
) -> ApiResult<(StatusCode, Json<PersonChangedResponse>)> {
    owned_tree(store.as_ref(), &tree_id, &user).await?;
    let fields = person_fields(request)?;

    let person = Person::new(tree_id, fields);
    store.insert_person(person.clone()).await?;
    info!("Created person {} ({}) in tree {}", person.id, person.full_name(), person.tree_id);

    Ok((
        StatusCode::CREATED,
        Json(PersonChangedResponse {
            message: "Person created successfully".to_string(),
            person,
        }),
    ))
}

pub async fn update_person<S: Store>(
    State(store): State<Arc<S>>,
    Path(person_id): Path<Id>,
    user: CurrentUser,
    ApiJson(request): ApiJson<PersonUpdate>,
) -> ApiResult<Json<PersonChangedResponse>> {
    let mut person = load_person(store.as_ref(), &person_id).await?;
    owned_tree(store.as_ref(), &person.tree_id, &user).await?;

    let patch = person_patch(request)?;
    person.apply(patch);
    // Dates can arrive in separate updates, so check the merged record
    check_lifespan(person.birth_date, person.death_date)?;

    if !store.update_person(person.clone()).await? {
        return Err(ApiError::not_found("Person not found"));
    }
    info!("Updated person {}", person.id);

    Ok(Json(PersonChangedResponse {
        message: "Person updated successfully".to_string(),
        person,
    }))
}

pub async fn delete_person<S: Store>(
    State(store): State<Arc<S>>,
    Path(person_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    let person = load_person(store.as_ref(), &person_id).await?;
    owned_tree(store.as_ref(), &person.tree_id, &user).await?;

    if !store.delete_person(&person_id).await? {
        return Err(ApiError::not_found("Person not found"));
    }
    info!("Deleted person {} from tree {}", person_id, person.tree_id);

    Ok(MessageResponse::new("Person deleted successfully"))
}
