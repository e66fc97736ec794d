use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::api::handlers::{owned_tree, readable_tree, MessageResponse};
use crate::logic::{avoid_overlap, check_coordinates, optimal_position, Relation, TreeGraph, NODE_WIDTH};
use crate::model::{
    BulkPositions, CurrentUser, Id, NewNodePosition, NodePosition, NodePositionUpdate, Point,
};
use crate::store::traits::Store;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePositionListResponse {
    pub node_positions: Vec<NodePosition>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePositionResponse {
    pub node_position: NodePosition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestQuery {
    pub anchor_id: Option<Id>,
    pub relation: Option<String>,
    /// Place a new child of this marriage when there is no anchor
    pub marriage_edge_id: Option<Id>,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub position: Point,
}

pub async fn list_node_positions<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<NodePositionListResponse>> {
    readable_tree(store.as_ref(), &tree_id, &user).await?;
    let node_positions = store.list_node_positions_for_tree(&tree_id).await?;
    Ok(Json(NodePositionListResponse { node_positions }))
}

/// Create or move the position of a node.
pub async fn upsert_node_position<S: Store>(
    State(store): State<Arc<S>>,
    user: CurrentUser,
    ApiJson(request): ApiJson<NewNodePosition>,
) -> ApiResult<Json<NodePositionResponse>> {
    owned_tree(store.as_ref(), &request.tree_id, &user).await?;
    let point = check_coordinates(request.x, request.y)?;

    let node_position = store
        .upsert_node_position(NodePosition::new(request.tree_id, request.node_id, point))
        .await?;
    Ok(Json(NodePositionResponse { node_position }))
}

pub async fn update_node_position<S: Store>(
    State(store): State<Arc<S>>,
    Path(position_id): Path<Id>,
    user: CurrentUser,
    ApiJson(update): ApiJson<NodePositionUpdate>,
) -> ApiResult<Json<NodePositionResponse>> {
    let mut node_position = store
        .get_node_position(&position_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Node position not found"))?;
    owned_tree(store.as_ref(), &node_position.tree_id, &user).await?;

    let point = check_coordinates(
        update.x.unwrap_or(node_position.x),
        update.y.unwrap_or(node_position.y),
    )?;
    node_position.move_to(point);

    if !store.update_node_position(node_position.clone()).await? {
        return Err(ApiError::not_found("Node position not found"));
    }
    Ok(Json(NodePositionResponse { node_position }))
}

/// Save many positions at once, typically after dragging a selection.
pub async fn bulk_update_node_positions<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
    ApiJson(request): ApiJson<BulkPositions>,
) -> ApiResult<Json<NodePositionListResponse>> {
    owned_tree(store.as_ref(), &tree_id, &user).await?;

    // Validate everything before writing anything
    let points = request
        .positions
        .iter()
        .map(|input| check_coordinates(input.x, input.y))
        .collect::<Result<Vec<_>, _>>()?;

    let mut node_positions = Vec::with_capacity(points.len());
    for (input, point) in request.positions.into_iter().zip(points) {
        let position = NodePosition::new(tree_id.clone(), input.node_id, point);
        node_positions.push(store.upsert_node_position(position).await?);
    }
    info!("Saved {} node positions in tree {}", node_positions.len(), tree_id);

    Ok(Json(NodePositionListResponse { node_positions }))
}

pub async fn delete_node_position<S: Store>(
    State(store): State<Arc<S>>,
    Path(position_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    let node_position = store
        .get_node_position(&position_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Node position not found"))?;
    owned_tree(store.as_ref(), &node_position.tree_id, &user).await?;

    store.delete_node_position(&position_id).await?;
    Ok(MessageResponse::new("Node position deleted successfully"))
}

/// Where to draw a new relative of `anchorId`, clear of existing nodes.
pub async fn suggest_position<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
    Query(query): Query<SuggestQuery>,
) -> ApiResult<Json<SuggestResponse>> {
    readable_tree(store.as_ref(), &tree_id, &user).await?;

    let relation = query
        .relation
        .as_deref()
        .filter(|relation| !relation.is_empty())
        .map(str::parse::<Relation>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let persons = store.list_persons_for_tree(&tree_id).await?;
    let positions = store.list_node_positions_for_tree(&tree_id).await?;
    let edges = store.list_edges_for_tree(&tree_id).await?;
    let graph = TreeGraph::from_records(&persons, &positions, &edges);

    let marriage_point = query
        .marriage_edge_id
        .as_deref()
        .and_then(|edge_id| graph.edge(edge_id))
        .and_then(|edge| {
            let source = graph.position_of(&edge.source)?;
            let target = graph.position_of(&edge.target)?;
            Some(source.midpoint(&target))
        });

    let candidate = optimal_position(&graph, query.anchor_id.as_deref(), relation, marriage_point);
    let position = avoid_overlap(&graph, candidate, NODE_WIDTH);

    Ok(Json(SuggestResponse { position }))
}
