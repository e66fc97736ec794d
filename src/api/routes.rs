use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::{
    edge_handlers, family_tree_handlers, handlers, node_position_handlers, person_handlers,
    relationship_handlers, union_child_handlers, user_handlers, AppState,
};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check::<S>))
        .route("/api/health", get(handlers::health_check::<S>))
        // Users
        .route(
            "/api/users/profile",
            get(user_handlers::get_profile::<S>).put(user_handlers::update_profile::<S>),
        )
        // Family trees
        .route(
            "/api/family-trees",
            get(family_tree_handlers::list_trees::<S>).post(family_tree_handlers::create_tree::<S>),
        )
        .route(
            "/api/family-trees/:id",
            get(family_tree_handlers::get_tree::<S>)
                .put(family_tree_handlers::update_tree::<S>)
                .delete(family_tree_handlers::delete_tree::<S>),
        )
        .route(
            "/api/family-trees/:id/layout",
            post(family_tree_handlers::apply_layout::<S>),
        )
        // Persons
        .route(
            "/api/persons/tree/:tree_id",
            get(person_handlers::list_persons::<S>).post(person_handlers::create_person::<S>),
        )
        .route(
            "/api/persons/:id",
            get(person_handlers::get_person::<S>)
                .put(person_handlers::update_person::<S>)
                .delete(person_handlers::delete_person::<S>),
        )
        // Relationships
        .route(
            "/api/relationships",
            post(relationship_handlers::create_relationship::<S>),
        )
        .route(
            "/api/relationships/person/:person_id",
            get(relationship_handlers::list_relationships::<S>),
        )
        .route(
            "/api/relationships/:id",
            delete(relationship_handlers::delete_relationship::<S>),
        )
        // Node positions
        .route(
            "/api/node-positions",
            post(node_position_handlers::upsert_node_position::<S>),
        )
        .route(
            "/api/node-positions/tree/:tree_id",
            get(node_position_handlers::list_node_positions::<S>),
        )
        .route(
            "/api/node-positions/tree/:tree_id/bulk",
            put(node_position_handlers::bulk_update_node_positions::<S>),
        )
        .route(
            "/api/node-positions/tree/:tree_id/suggest",
            get(node_position_handlers::suggest_position::<S>),
        )
        .route(
            "/api/node-positions/:id",
            put(node_position_handlers::update_node_position::<S>)
                .delete(node_position_handlers::delete_node_position::<S>),
        )
        // Edges
        .route("/api/edges", post(edge_handlers::create_edge::<S>))
        .route("/api/edges/tree/:tree_id", get(edge_handlers::list_edges::<S>))
        .route(
            "/api/edges/tree/:tree_id/smart-handles",
            post(edge_handlers::apply_smart_handles::<S>),
        )
        .route(
            "/api/edges/:id",
            put(edge_handlers::update_edge::<S>).delete(edge_handlers::delete_edge::<S>),
        )
        // Union children
        .route(
            "/api/union-children",
            post(union_child_handlers::create_union_child::<S>),
        )
        .route(
            "/api/union-children/marriage/:marriage_edge_id",
            get(union_child_handlers::list_union_children::<S>),
        )
        .route(
            "/api/union-children/marriage/:marriage_edge_id/reposition",
            post(union_child_handlers::reposition_union_children::<S>),
        )
        .route(
            "/api/union-children/:id",
            delete(union_child_handlers::delete_union_child::<S>),
        )
}
