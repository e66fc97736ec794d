use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::api::handlers::{load_person, owned_tree, readable_tree, MessageResponse};
use crate::logic::{connections_to_remove, counterpart_key, optimal_handles, plan_relationship, ConnectionPlan};
use crate::model::{CurrentUser, Edge, Id, NewRelationship, Person, Relationship, RelationshipType};
use crate::store::traits::Store;

#[derive(Debug, Serialize)]
pub struct RelationshipListResponse {
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Serialize)]
pub struct RelationshipCreatedResponse {
    pub message: String,
    pub relationship: Relationship,
}

pub async fn list_relationships<S: Store>(
    State(store): State<Arc<S>>,
    Path(person_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<RelationshipListResponse>> {
    let person = load_person(store.as_ref(), &person_id).await?;
    readable_tree(store.as_ref(), &person.tree_id, &user).await?;

    let relationships = store.list_relationships_for_person(&person_id).await?;
    Ok(Json(RelationshipListResponse { relationships }))
}

pub async fn create_relationship<S: Store>(
    State(store): State<Arc<S>>,
    user: CurrentUser,
    ApiJson(request): ApiJson<NewRelationship>,
) -> ApiResult<(StatusCode, Json<RelationshipCreatedResponse>)> {
    if request.is_union_child() {
        return create_union_child_relationship(store.as_ref(), &user, request).await;
    }

    if request.source_id == request.target_id {
        return Err(ApiError::bad_request("A person cannot be related to themselves"));
    }

    let source = store.get_person(&request.source_id).await?;
    let target = store.get_person(&request.target_id).await?;
    let (Some(source), Some(target)) = (source, target) else {
        return Err(ApiError::not_found("One or more persons not found"));
    };
    if source.tree_id != target.tree_id {
        return Err(ApiError::bad_request(
            "Both persons must belong to the same family tree",
        ));
    }
    owned_tree(store.as_ref(), &source.tree_id, &user).await?;

    if store
        .find_relationship(&request.source_id, &request.target_id, request.kind)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("This relationship already exists"));
    }

    let plan = plan_relationship(request.kind, request.source_id, request.target_id);
    let edge = match plan.connection {
        Some(connection) => Some(connection_edge(store.as_ref(), &source, connection).await?),
        None => None,
    };
    store
        .insert_relationship_set(plan.relationship.clone(), plan.counterpart, edge)
        .await?;

    info!(
        "Created {} relationship {} -> {}",
        plan.relationship.kind, plan.relationship.source_id, plan.relationship.target_id
    );

    Ok((
        StatusCode::CREATED,
        Json(RelationshipCreatedResponse {
            message: "Relationship created successfully".to_string(),
            relationship: plan.relationship,
        }),
    ))
}

/// A child hanging off a marriage marker: only the child has to exist.
async fn create_union_child_relationship<S: Store>(
    store: &S,
    user: &CurrentUser,
    request: NewRelationship,
) -> ApiResult<(StatusCode, Json<RelationshipCreatedResponse>)> {
    let child = store
        .get_person(&request.target_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Child not found"))?;

    let marriage_edge = match request.marriage_edge_id() {
        Some(edge_id) => Some(
            store
                .get_edge(&edge_id.to_string())
                .await?
                .ok_or_else(|| ApiError::not_found("Marriage not found"))?,
        ),
        None => None,
    };
    if let Some(marriage) = &marriage_edge {
        if marriage.tree_id != child.tree_id {
            return Err(ApiError::bad_request(
                "The marriage and the child must belong to the same family tree",
            ));
        }
    }
    owned_tree(store, &child.tree_id, user).await?;

    if store
        .find_relationship(&request.source_id, &request.target_id, RelationshipType::UnionChild)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("This relationship already exists"));
    }

    let relationship = Relationship::new(
        RelationshipType::UnionChild,
        request.source_id,
        request.target_id,
    );
    let edge = marriage_edge
        .map(|marriage| Edge::union_child(child.tree_id.clone(), marriage.id, child.id.clone()));
    store
        .insert_relationship_set(relationship.clone(), None, edge)
        .await?;
    info!("Created union child relationship for {}", child.id);

    Ok((
        StatusCode::CREATED,
        Json(RelationshipCreatedResponse {
            message: "Union child created successfully".to_string(),
            relationship,
        }),
    ))
}

/// Connection edge with handles picked from where both persons are drawn.
async fn connection_edge<S: Store>(
    store: &S,
    person: &Person,
    connection: ConnectionPlan,
) -> ApiResult<Edge> {
    let tree_id = &person.tree_id;
    let source_point = store
        .find_node_position(&connection.source, tree_id)
        .await?
        .map(|position| position.point())
        .unwrap_or_default();
    let target_point = store
        .find_node_position(&connection.target, tree_id)
        .await?
        .map(|position| position.point())
        .unwrap_or_default();

    let handles = optimal_handles(source_point, target_point, connection.handles_for);
    Ok(
        Edge::connection(tree_id.clone(), connection.source, connection.target, connection.kind)
            .with_handles(handles.source_handle, handles.target_handle),
    )
}

pub async fn delete_relationship<S: Store>(
    State(store): State<Arc<S>>,
    Path(relationship_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    let relationship = store
        .get_relationship(&relationship_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Relationship not found"))?;
    let person = load_person(store.as_ref(), &relationship.target_id).await?;
    owned_tree(store.as_ref(), &person.tree_id, &user).await?;

    store.delete_relationship(&relationship.id).await?;

    if let Some((source, target, kind)) =
        counterpart_key(relationship.kind, &relationship.source_id, &relationship.target_id)
    {
        store.delete_relationships_matching(&source, &target, kind).await?;
    }

    let connections = connections_to_remove(&relationship);
    let expects_edge = !connections.is_empty();
    let mut removed_edges = 0;
    for (source, target, kind) in connections {
        removed_edges += store
            .delete_edges_matching(&source, &target, kind.as_str())
            .await?;
    }
    if expects_edge && removed_edges == 0 {
        warn!("No connection edge found for relationship {}", relationship.id);
    }
    info!("Deleted {} relationship {}", relationship.kind, relationship.id);

    Ok(MessageResponse::new("Relationship deleted successfully"))
}
