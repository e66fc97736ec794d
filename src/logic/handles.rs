use serde::Serialize;

use crate::logic::graph::{LayoutEdge, TreeGraph};
use crate::model::{Id, Point, RelationshipType};

pub const SPOUSE_RIGHT_SOURCE: &str = "spouse-right-source";
pub const SPOUSE_LEFT_SOURCE: &str = "spouse-left-source";
pub const SPOUSE_RIGHT_TARGET: &str = "spouse-right-target";
pub const SPOUSE_LEFT_TARGET: &str = "spouse-left-target";
pub const PARENT_SOURCE: &str = "parent-source";
pub const PARENT_TARGET: &str = "parent-target";
pub const CHILD_SOURCE: &str = "child-source";
pub const CHILD_TARGET: &str = "child-target";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlePair {
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl HandlePair {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source_handle: Some(source.to_string()),
            target_handle: Some(target.to_string()),
        }
    }

    fn of(edge: &LayoutEdge) -> Self {
        Self {
            source_handle: edge.source_handle.clone(),
            target_handle: edge.target_handle.clone(),
        }
    }
}

/// Handles for an edge whose handles changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleUpdate {
    pub edge_id: Id,
    #[serde(flatten)]
    pub handles: HandlePair,
}

/// Side-facing handles for a couple: the left partner connects from its right.
fn spouse_handles(source: Point, target: Point) -> HandlePair {
    if source.x < target.x {
        HandlePair::new(SPOUSE_RIGHT_SOURCE, SPOUSE_LEFT_TARGET)
    } else {
        HandlePair::new(SPOUSE_LEFT_SOURCE, SPOUSE_RIGHT_TARGET)
    }
}

/// Handles an edge should use given where its endpoints sit. Edges that
/// already have both handles, non-spouse edges and edges with a missing
/// endpoint keep what they have.
pub fn smart_handles(edge: &LayoutEdge, graph: &TreeGraph) -> HandlePair {
    if edge.source_handle.is_some() && edge.target_handle.is_some() {
        return HandlePair::of(edge);
    }
    let (Some(source), Some(target)) = (graph.node(&edge.source), graph.node(&edge.target)) else {
        return HandlePair::of(edge);
    };
    if !edge.is_spouse() {
        return HandlePair::of(edge);
    }

    spouse_handles(source.point(), target.point())
}

/// Smart handles for every edge of the graph whose handles would change.
pub fn all_smart_handles(graph: &TreeGraph) -> Vec<HandleUpdate> {
    graph
        .edges
        .iter()
        .filter_map(|edge| {
            let handles = smart_handles(edge, graph);
            (handles != HandlePair::of(edge)).then(|| HandleUpdate {
                edge_id: edge.id.clone(),
                handles,
            })
        })
        .collect()
}

/// Handles for a new connection of the given relationship kind.
pub fn optimal_handles(source: Point, target: Point, kind: RelationshipType) -> HandlePair {
    match kind {
        RelationshipType::Spouse => spouse_handles(source, target),
        RelationshipType::Parent => HandlePair::new(PARENT_SOURCE, CHILD_TARGET),
        RelationshipType::Child => HandlePair::new(CHILD_SOURCE, PARENT_TARGET),
        _ => HandlePair::default(),
    }
}
