use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::api::handlers::{owned_tree, readable_tree, MessageResponse};
use crate::logic::{
    optional_text, required_text, root_person_fields, run_layout, LayoutOptions, LayoutStrategy,
    TreeGraph,
};
use crate::model::{
    CurrentUser, FamilyTree, FamilyTreeUpdate, Id, NewFamilyTree, NodePosition, Person, Point,
    TreeSnapshot,
};
use crate::store::traits::Store;

/// Where the root person of a new tree is drawn.
pub const ROOT_POSITION: Point = Point { x: 300.0, y: 200.0 };

#[derive(Debug, Serialize)]
pub struct TreeListResponse {
    pub trees: Vec<FamilyTree>,
}

#[derive(Debug, Serialize)]
pub struct TreeSnapshotResponse {
    pub tree: TreeSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeCreatedResponse {
    pub message: String,
    pub tree: FamilyTree,
    pub root_person: Person,
}

#[derive(Debug, Serialize)]
pub struct TreeUpdatedResponse {
    pub message: String,
    pub tree: FamilyTree,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub strategy: LayoutStrategy,
    #[serde(default)]
    pub align_spouses: bool,
    #[serde(default)]
    pub center_union_children: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePositionsResponse {
    pub message: String,
    pub node_positions: Vec<NodePosition>,
}

pub async fn list_trees<S: Store>(
    State(store): State<Arc<S>>,
    user: CurrentUser,
) -> ApiResult<Json<TreeListResponse>> {
    let trees = store.list_trees_for_owner(&user.id).await?;
    Ok(Json(TreeListResponse { trees }))
}

pub async fn get_tree<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<TreeSnapshotResponse>> {
    let tree = readable_tree(store.as_ref(), &tree_id, &user).await?;
    let tree = load_snapshot(store.as_ref(), tree).await?;
    Ok(Json(TreeSnapshotResponse { tree }))
}

/// Everything drawn in a tree, with the relationships of its persons.
pub(crate) async fn load_snapshot<S: Store>(store: &S, tree: FamilyTree) -> ApiResult<TreeSnapshot> {
    let persons = store.list_persons_for_tree(&tree.id).await?;
    let node_positions = store.list_node_positions_for_tree(&tree.id).await?;
    let edges = store.list_edges_for_tree(&tree.id).await?;
    let union_children = store.list_union_children_for_tree(&tree.id).await?;

    let person_ids: Vec<Id> = persons.iter().map(|person| person.id.clone()).collect();
    let relationships = if person_ids.is_empty() {
        Vec::new()
    } else {
        store.list_relationships_for_persons(&person_ids).await?
    };

    Ok(TreeSnapshot {
        tree,
        persons,
        node_positions,
        edges,
        union_children,
        relationships,
    })
}

pub async fn create_tree<S: Store>(
    State(store): State<Arc<S>>,
    user: CurrentUser,
    ApiJson(request): ApiJson<NewFamilyTree>,
) -> ApiResult<(StatusCode, Json<TreeCreatedResponse>)> {
    let name = required_text("name", Some(request.name.as_str()))?;
    let root_fields = root_person_fields(request.root_person)?;

    store.ensure_user(&user.id, &user.email).await?;

    let tree = FamilyTree::new(
        user.id.clone(),
        name,
        optional_text(request.description),
        request.is_public.unwrap_or(false),
    );
    let root = Person::new(tree.id.clone(), root_fields);
    let position = NodePosition::new(tree.id.clone(), root.id.clone(), ROOT_POSITION);

    store
        .create_tree_with_root(tree.clone(), root.clone(), position)
        .await?;
    info!("Created family tree {} ({}) for user {}", tree.id, tree.name, user.id);

    Ok((
        StatusCode::CREATED,
        Json(TreeCreatedResponse {
            message: "Family tree created successfully".to_string(),
            tree,
            root_person: root,
        }),
    ))
}

pub async fn update_tree<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
    ApiJson(mut update): ApiJson<FamilyTreeUpdate>,
) -> ApiResult<Json<TreeUpdatedResponse>> {
    let mut tree = owned_tree(store.as_ref(), &tree_id, &user).await?;

    if let Some(name) = update.name.take() {
        update.name = Some(required_text("name", Some(name.as_str()))?);
    }
    update.description = update.description.map(optional_text);
    tree.apply(update);

    if !store.update_tree(tree.clone()).await? {
        return Err(ApiError::not_found("Family tree not found"));
    }
    info!("Updated family tree {}", tree.id);

    Ok(Json(TreeUpdatedResponse {
        message: "Family tree updated successfully".to_string(),
        tree,
    }))
}

pub async fn delete_tree<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    owned_tree(store.as_ref(), &tree_id, &user).await?;

    if !store.delete_tree(&tree_id).await? {
        return Err(ApiError::not_found("Family tree not found"));
    }
    info!("Deleted family tree {}", tree_id);

    Ok(MessageResponse::new("Family tree deleted successfully"))
}

/// Lay out the stored graph and persist every resulting position.
pub async fn apply_layout<S: Store>(
    State(store): State<Arc<S>>,
    Path(tree_id): Path<Id>,
    user: CurrentUser,
    ApiJson(request): ApiJson<LayoutRequest>,
) -> ApiResult<Json<NodePositionsResponse>> {
    owned_tree(store.as_ref(), &tree_id, &user).await?;

    let persons = store.list_persons_for_tree(&tree_id).await?;
    let positions = store.list_node_positions_for_tree(&tree_id).await?;
    let edges = store.list_edges_for_tree(&tree_id).await?;
    let graph = TreeGraph::from_records(&persons, &positions, &edges);

    let options = LayoutOptions {
        align_spouses: request.align_spouses,
        center_union_children: request.center_union_children,
    };
    let placed = run_layout(&graph, request.strategy, options);

    let mut node_positions = Vec::with_capacity(placed.len());
    for node in placed {
        let position = NodePosition::new(tree_id.clone(), node.id, node.position);
        node_positions.push(store.upsert_node_position(position).await?);
    }
    info!(
        "Applied {:?} layout to tree {} ({} nodes)",
        request.strategy,
        tree_id,
        node_positions.len()
    );

    Ok(Json(NodePositionsResponse {
        message: "Layout applied successfully".to_string(),
        node_positions,
    }))
}
