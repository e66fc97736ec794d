use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::api::handlers::{owned_tree, readable_tree, MessageResponse};
use crate::logic::{all_smart_handles, required_text, HandleUpdate, TreeGraph};
use crate::model::{normalize_edge_data, CurrentUser, Edge, EdgePatch, EdgeUpdate, Id, NewEdge};
use crate::store::traits::Store;

#[derive(Debug, Serialize)]
pub struct EdgeListResponse {
    pub edges: Vec<Edge>,
}

#[derive(Debug, Serialize)]
pub struct EdgeChangedResponse {
    pub message: String,
    pub edge: Edge,
}

#[derive(Debug, Serialize)]
pub struct SmartHandlesResponse {
    pub message: String,
    pub updated: Vec<HandleUpdate>,
}

fn edge_data(data: Option<Value>) -> ApiResult<Value> {
    normalize_edge_data(data).map_err(|e| ApiError::bad_request(format!("data: invalid JSON ({})", e)))
}

fn edge_patch(update: EdgeUpdate) -> ApiResult<EdgePatch> {
    let source = update
        .source
        .map(|source| required_text("source", Some(&source)))
        .transpose()?;
    let target = update
        .target
        .map(|target| required_text("target", Some(&target)))
        .transpose()?;

    Ok(EdgePatch {
        source,
        target,
        kind: update.kind,
        source_handle: update.source_handle,
        target_handle: update.target_handle,
        data: update.data.map(edge_data).transpose()?,
    })
}

async fn load_edge<S: Store>(store: &S, edge_id: &Id) -> ApiResult<Edge> {
    store
        .get_edge(edge_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Edge not found"))
}

pub async fn list_edges<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<EdgeListResponse>> {
    readable_tree(store.as_ref(), &tree_id, &user).await?;
    let edges = store.list_edges_for_tree(&tree_id).await?;
    Ok(Json(EdgeListResponse { edges }))
}

pub async fn create_edge<S: Store>(
    State(store): State<Arc<S>>,
    user: CurrentUser,
    ApiJson(request): ApiJson<NewEdge>,
) -> ApiResult<(StatusCode, Json<EdgeChangedResponse>)> {
    owned_tree(store.as_ref(), &request.tree_id, &user).await?;

    let source = required_text("source", Some(&request.source))?;
    let target = required_text("target", Some(&request.target))?;
    let data = edge_data(request.data)?;

    let edge = Edge::new(request.tree_id, source, target, request.kind, data)
        .with_handles(request.source_handle, request.target_handle);
    store.insert_edge(edge.clone()).await?;
    info!("Created edge {} ({} -> {})", edge.id, edge.source, edge.target);

    Ok((
        StatusCode::CREATED,
        Json(EdgeChangedResponse {
            message: "Edge created successfully".to_string(),
            edge,
        }),
    ))
}

pub async fn update_edge<S: Store>(
    State(store): State<Arc<S>>,
    Path(edge_id): Path<Id>,
    user: CurrentUser,
    ApiJson(update): ApiJson<EdgeUpdate>,
) -> ApiResult<Json<EdgeChangedResponse>> {
    let mut edge = load_edge(store.as_ref(), &edge_id).await?;
    owned_tree(store.as_ref(), &edge.tree_id, &user).await?;

    edge.apply(edge_patch(update)?);
    if !store.update_edge(edge.clone()).await? {
        return Err(ApiError::not_found("Edge not found"));
    }

    Ok(Json(EdgeChangedResponse {
        message: "Edge updated successfully".to_string(),
        edge,
    }))
}

pub async fn delete_edge<S: Store>(
    State(store): State<Arc<S>>,
    Path(edge_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    let edge = load_edge(store.as_ref(), &edge_id).await?;
    owned_tree(store.as_ref(), &edge.tree_id, &user).await?;

    store.delete_edge(&edge_id).await?;
    info!("Deleted edge {}", edge_id);

    Ok(MessageResponse::new("Edge deleted successfully"))
}

/// Recompute side handles of spouse edges from where the partners are drawn.
pub async fn apply_smart_handles<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<SmartHandlesResponse>> {
    owned_tree(store.as_ref(), &tree_id, &user).await?;

    let persons = store.list_persons_for_tree(&tree_id).await?;
    let positions = store.list_node_positions_for_tree(&tree_id).await?;
    let edges = store.list_edges_for_tree(&tree_id).await?;
    let graph = TreeGraph::from_records(&persons, &positions, &edges);

    let updated = all_smart_handles(&graph);
    for update in &updated {
        let Some(edge) = edges.iter().find(|edge| edge.id == update.edge_id) else {
            continue;
        };
        let mut edge = edge.clone();
        edge.apply(EdgePatch {
            source_handle: Some(update.handles.source_handle.clone()),
            target_handle: Some(update.handles.target_handle.clone()),
            ..Default::default()
        });
        store.update_edge(edge).await?;
    }
    info!("Updated handles of {} edges in tree {}", updated.len(), tree_id);

    Ok(Json(SmartHandlesResponse {
        message: format!("{} edges updated", updated.len()),
        updated,
    }))
}
