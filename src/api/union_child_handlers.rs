use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use itertools::Itertools;
use log::info;
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::api::handlers::{owned_tree, readable_tree, MessageResponse};
use crate::logic::{
    find_marriage_children, next_union_child_position, union_children_positions, TreeGraph,
};
use crate::model::{ConnectionKind, CurrentUser, Edge, Id, NewUnionChild, NodePosition, UnionChild};
use crate::store::traits::Store;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionChildCreatedResponse {
    pub message: String,
    pub union_child: UnionChild,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionChildListResponse {
    pub union_children: Vec<UnionChild>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositionResponse {
    pub message: String,
    pub node_positions: Vec<NodePosition>,
}

async fn load_marriage<S: Store>(store: &S, marriage_edge_id: &Id) -> ApiResult<Edge> {
    store
        .get_edge(marriage_edge_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Marriage not found"))
}

pub async fn create_union_child<S: Store>(
    State(store): State<Arc<S>>,
    user: CurrentUser,
    ApiJson(request): ApiJson<NewUnionChild>,
) -> ApiResult<(StatusCode, Json<UnionChildCreatedResponse>)> {
    let child = store
        .get_person(&request.child_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Child not found"))?;
    let marriage = load_marriage(store.as_ref(), &request.marriage_edge_id).await?;

    let tree_id = child.tree_id.clone();
    let same_tree = marriage.tree_id == tree_id
        && request.tree_id.as_ref().map_or(true, |requested| *requested == tree_id);
    if !same_tree {
        return Err(ApiError::bad_request(
            "The marriage and the child must belong to the same family tree",
        ));
    }
    owned_tree(store.as_ref(), &tree_id, &user).await?;

    if store
        .find_union_child(&marriage.id, &child.id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("This child is already attached to this union"));
    }

    // A child without a position joins the right end of the union's row
    if store.find_node_position(&child.id, &tree_id).await?.is_none() {
        let persons = store.list_persons_for_tree(&tree_id).await?;
        let positions = store.list_node_positions_for_tree(&tree_id).await?;
        let edges = store.list_edges_for_tree(&tree_id).await?;
        let graph = TreeGraph::from_records(&persons, &positions, &edges);
        let siblings = store
            .list_union_children_for_marriage(&marriage.id)
            .await?
            .len();
        let point = next_union_child_position(&graph, graph.edge(&marriage.id), siblings);
        store
            .upsert_node_position(NodePosition::new(tree_id.clone(), child.id.clone(), point))
            .await?;
    }

    let union_child = UnionChild::new(tree_id.clone(), marriage.id.clone(), child.id.clone());
    store.insert_union_child(union_child.clone()).await?;
    store
        .insert_edge(Edge::union_child(tree_id, marriage.id, child.id))
        .await?;
    info!(
        "Attached child {} to union {}",
        union_child.child_id, union_child.marriage_edge_id
    );

    Ok((
        StatusCode::CREATED,
        Json(UnionChildCreatedResponse {
            message: "Union child created successfully".to_string(),
            union_child,
        }),
    ))
}

pub async fn list_union_children<S: Store>(
    State(store): State<Arc<S>>,
    Path(marriage_edge_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<UnionChildListResponse>> {
    let marriage = load_marriage(store.as_ref(), &marriage_edge_id).await?;
    readable_tree(store.as_ref(), &marriage.tree_id, &user).await?;

    let union_children = store
        .list_union_children_for_marriage(&marriage_edge_id)
        .await?;
    Ok(Json(UnionChildListResponse { union_children }))
}

pub async fn delete_union_child<S: Store>(
    State(store): State<Arc<S>>,
    Path(union_child_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    let union_child = store
        .get_union_child(&union_child_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Union child not found"))?;
    owned_tree(store.as_ref(), &union_child.tree_id, &user).await?;

    store
        .delete_edges_matching(
            &union_child.marriage_edge_id,
            &union_child.child_id,
            ConnectionKind::UnionChild.as_str(),
        )
        .await?;
    store.delete_union_child(&union_child.id).await?;
    info!(
        "Detached child {} from union {}",
        union_child.child_id, union_child.marriage_edge_id
    );

    Ok(MessageResponse::new("Union child deleted successfully"))
}

/// Centre every child of a union one generation below the couple.
pub async fn reposition_union_children<S: Store>(
    State(store): State<Arc<S>>,
    Path(marriage_edge_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<RepositionResponse>> {
    let marriage = load_marriage(store.as_ref(), &marriage_edge_id).await?;
    let tree_id = marriage.tree_id.clone();
    owned_tree(store.as_ref(), &tree_id, &user).await?;

    let persons = store.list_persons_for_tree(&tree_id).await?;
    let positions = store.list_node_positions_for_tree(&tree_id).await?;
    let edges = store.list_edges_for_tree(&tree_id).await?;
    let graph = TreeGraph::from_records(&persons, &positions, &edges);

    let Some(marriage_edge) = graph.edge(&marriage.id) else {
        return Err(ApiError::not_found("Marriage not found"));
    };

    // Children attached without a display edge still count
    let attached = store.list_union_children_for_marriage(&marriage.id).await?;
    let child_ids: Vec<Id> = find_marriage_children(&graph, &marriage.id)
        .into_iter()
        .map(|child| child.child_id)
        .chain(attached.into_iter().map(|row| row.child_id))
        .filter(|id| graph.contains(id))
        .unique()
        .collect();

    let mut node_positions = Vec::with_capacity(child_ids.len());
    for placed in union_children_positions(&graph, marriage_edge, &child_ids) {
        let position = NodePosition::new(tree_id.clone(), placed.id, placed.position);
        node_positions.push(store.upsert_node_position(position).await?);
    }
    info!(
        "Repositioned {} children of union {}",
        node_positions.len(),
        marriage.id
    );

    Ok(Json(RepositionResponse {
        message: "Union children repositioned".to_string(),
        node_positions,
    }))
}
