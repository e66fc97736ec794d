use std::collections::HashMap;

use serde::Serialize;

use crate::model::{ConnectionKind, Edge, Id, NodePosition, Person, Point};

/// A person as the layout engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: Id,
    /// `None` when the person has never been placed
    pub position: Option<Point>,
}

impl LayoutNode {
    pub fn new(id: impl Into<Id>, position: Option<Point>) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }

    pub fn at(id: impl Into<Id>, x: f64, y: f64) -> Self {
        Self::new(id, Some(Point::new(x, y)))
    }

    /// Stored position, or the origin for nodes that were never placed.
    pub fn point(&self) -> Point {
        self.position.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEdge {
    pub id: Id,
    pub source: Id,
    pub target: Id,
    pub kind: Option<ConnectionKind>,
    pub marriage_edge_id: Option<Id>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl LayoutEdge {
    pub fn new(
        id: impl Into<Id>,
        source: impl Into<Id>,
        target: impl Into<Id>,
        kind: Option<ConnectionKind>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
            marriage_edge_id: None,
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_marriage(mut self, marriage_edge_id: impl Into<Id>) -> Self {
        self.marriage_edge_id = Some(marriage_edge_id.into());
        self
    }

    pub fn is_spouse(&self) -> bool {
        self.kind == Some(ConnectionKind::Spouse)
    }

    pub fn is_descent(&self) -> bool {
        self.kind.map_or(false, |kind| kind.is_descent())
    }
}

impl From<&Edge> for LayoutEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.connection_kind(),
            marriage_edge_id: edge.marriage_edge_id().map(str::to_string),
            source_handle: edge.source_handle.clone(),
            target_handle: edge.target_handle.clone(),
        }
    }
}

/// Output of every layout function: the new position of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedNode {
    pub id: Id,
    pub position: Point,
}

impl PlacedNode {
    pub fn new(id: impl Into<Id>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Point::new(x, y),
        }
    }
}

/// Nodes and edges of one tree, in the order they were loaded.
#[derive(Debug, Clone, Default)]
pub struct TreeGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    node_index: HashMap<Id, usize>,
    edge_index: HashMap<Id, usize>,
}

impl TreeGraph {
    pub fn new(nodes: Vec<LayoutNode>, edges: Vec<LayoutEdge>) -> Self {
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            node_index.entry(node.id.clone()).or_insert(index);
        }
        let mut edge_index = HashMap::with_capacity(edges.len());
        for (index, edge) in edges.iter().enumerate() {
            edge_index.entry(edge.id.clone()).or_insert(index);
        }

        Self {
            nodes,
            edges,
            node_index,
            edge_index,
        }
    }

    /// Mirror the stored records of a tree: one node per person, positioned
    /// from its node position when there is one.
    pub fn from_records(persons: &[Person], positions: &[NodePosition], edges: &[Edge]) -> Self {
        let by_node: HashMap<&str, Point> = positions
            .iter()
            .map(|position| (position.node_id.as_str(), position.point()))
            .collect();

        let nodes = persons
            .iter()
            .map(|person| LayoutNode::new(person.id.clone(), by_node.get(person.id.as_str()).copied()))
            .collect();
        let edges = edges.iter().map(LayoutEdge::from).collect();

        Self::new(nodes, edges)
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }

    pub fn edge(&self, id: &str) -> Option<&LayoutEdge> {
        self.edge_index.get(id).map(|&index| &self.edges[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn position_of(&self, id: &str) -> Option<Point> {
        self.node(id).map(LayoutNode::point)
    }

    /// Write placed positions back onto the nodes they belong to.
    pub fn apply(&mut self, placed: &[PlacedNode]) {
        for node in placed {
            if let Some(&index) = self.node_index.get(&node.id) {
                self.nodes[index].position = Some(node.position);
            }
        }
    }

    /// Resolve an endpoint to the persons it stands for: a person id is
    /// itself, a marriage edge id stands for both spouses.
    pub fn persons_behind(&self, endpoint: &str) -> Vec<Id> {
        if self.contains(endpoint) {
            return vec![endpoint.to_string()];
        }
        match self.edge(endpoint) {
            Some(edge) if edge.is_spouse() => vec![edge.source.clone(), edge.target.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PersonFields;
    use serde_json::json;

    #[test]
    fn test_from_records_uses_stored_positions() {
        let a = Person::new("t".into(), PersonFields::default());
        let b = Person::new("t".into(), PersonFields::default());
        let position = NodePosition::new("t".into(), a.id.clone(), Point::new(10.0, 20.0));
        let edge = Edge::connection(
            "t".into(),
            a.id.clone(),
            b.id.clone(),
            ConnectionKind::Spouse,
        );

        let graph = TreeGraph::from_records(&[a.clone(), b.clone()], &[position], &[edge.clone()]);

        assert_eq!(graph.node(&a.id).unwrap().position, Some(Point::new(10.0, 20.0)));
        assert_eq!(graph.node(&b.id).unwrap().position, None);
        assert_eq!(graph.position_of(&b.id), Some(Point::default()));
        assert!(graph.edge(&edge.id).unwrap().is_spouse());
    }

    #[test]
    fn test_edge_kind_falls_back_to_type_column() {
        let mut edge = Edge::new(
            "t".into(),
            "a".into(),
            "b".into(),
            Some("parent_child_connection".into()),
            json!({}),
        );
        assert_eq!(LayoutEdge::from(&edge).kind, Some(ConnectionKind::ParentChild));

        edge.kind = None;
        assert_eq!(LayoutEdge::from(&edge).kind, None);
    }

    #[test]
    fn test_persons_behind_marriage_edge() {
        let graph = TreeGraph::new(
            vec![LayoutNode::at("a", 0.0, 0.0), LayoutNode::at("b", 180.0, 0.0)],
            vec![LayoutEdge::new("m", "a", "b", Some(ConnectionKind::Spouse))],
        );

        assert_eq!(graph.persons_behind("a"), vec!["a".to_string()]);
        assert_eq!(graph.persons_behind("m"), vec!["a".to_string(), "b".to_string()]);
        assert!(graph.persons_behind("missing").is_empty());
    }
}
