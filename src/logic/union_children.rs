use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::logic::graph::{LayoutEdge, PlacedNode, TreeGraph};
use crate::model::{ConnectionKind, Id, Point};

pub const CHILD_VERTICAL_OFFSET: f64 = 250.0;
pub const CHILD_SPACING: f64 = 180.0;
/// Where a child goes when its parents cannot be located.
pub const DEFAULT_CHILD_POSITION: Point = Point { x: 400.0, y: 400.0 };

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarriageChild {
    pub child_id: Id,
    pub edge_id: Id,
}

/// Marriage an edge hangs a child off, if it is a marriage/union child edge.
fn marriage_of(edge: &LayoutEdge) -> Option<&str> {
    match edge.kind {
        Some(ConnectionKind::MarriageChild) => edge.marriage_edge_id.as_deref(),
        Some(ConnectionKind::UnionChild) => {
            Some(edge.marriage_edge_id.as_deref().unwrap_or(edge.source.as_str()))
        }
        _ => None,
    }
}

/// Children drawn under a marriage edge, each child once, in edge order.
pub fn find_marriage_children(graph: &TreeGraph, marriage_edge_id: &str) -> Vec<MarriageChild> {
    if graph.edge(marriage_edge_id).is_none() {
        return Vec::new();
    }

    graph
        .edges
        .iter()
        .filter(|edge| marriage_of(edge) == Some(marriage_edge_id))
        .filter(|edge| graph.contains(&edge.target))
        .unique_by(|edge| edge.target.clone())
        .map(|edge| MarriageChild {
            child_id: edge.target.clone(),
            edge_id: edge.id.clone(),
        })
        .collect()
}

/// Centre between the spouses horizontally, and the lower spouse's y.
fn couple_anchor(graph: &TreeGraph, marriage: &LayoutEdge) -> Option<Point> {
    let source = graph.node(&marriage.source)?.point();
    let target = graph.node(&marriage.target)?.point();
    Some(Point::new((source.x + target.x) / 2.0, source.y.max(target.y)))
}

/// Place children one generation below the couple, centred between the
/// spouses and [`CHILD_SPACING`] apart. Empty when a spouse is missing.
pub fn union_children_positions(
    graph: &TreeGraph,
    marriage: &LayoutEdge,
    child_ids: &[Id],
) -> Vec<PlacedNode> {
    let Some(anchor) = couple_anchor(graph, marriage) else {
        return Vec::new();
    };
    if child_ids.is_empty() {
        return Vec::new();
    }

    let y = anchor.y + CHILD_VERTICAL_OFFSET;
    let total_width = (child_ids.len() - 1) as f64 * CHILD_SPACING;
    let start_x = anchor.x - total_width / 2.0;

    child_ids
        .iter()
        .enumerate()
        .map(|(index, id)| PlacedNode::new(id.clone(), start_x + index as f64 * CHILD_SPACING, y))
        .collect()
}

/// Position for one more child appended to the right end of the centred row.
pub fn next_union_child_position(
    graph: &TreeGraph,
    marriage: Option<&LayoutEdge>,
    existing_children: usize,
) -> Point {
    let Some(anchor) = marriage.and_then(|marriage| couple_anchor(graph, marriage)) else {
        return DEFAULT_CHILD_POSITION;
    };

    let y = anchor.y + CHILD_VERTICAL_OFFSET;
    if existing_children == 0 {
        return Point::new(anchor.x, y);
    }

    let total_width = existing_children as f64 * CHILD_SPACING;
    let start_x = anchor.x - total_width / 2.0;
    Point::new(start_x + existing_children as f64 * CHILD_SPACING, y)
}

/// Children per marriage edge, marriages in order of first appearance.
pub fn group_children_by_marriage(edges: &[LayoutEdge]) -> Vec<(Id, Vec<MarriageChild>)> {
    let mut groups: Vec<(Id, Vec<MarriageChild>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for edge in edges {
        let Some(marriage_id) = marriage_of(edge) else {
            continue;
        };
        let slot = *index.entry(marriage_id).or_insert_with(|| {
            groups.push((marriage_id.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(MarriageChild {
            child_id: edge.target.clone(),
            edge_id: edge.id.clone(),
        });
    }

    groups
}

/// Re-centre the children of every marriage in the graph under their parents.
pub fn center_union_children(graph: &TreeGraph) -> Vec<PlacedNode> {
    group_children_by_marriage(&graph.edges)
        .into_iter()
        .filter_map(|(marriage_id, children)| {
            let marriage = graph.edge(&marriage_id)?;
            let child_ids: Vec<Id> = children
                .into_iter()
                .map(|child| child.child_id)
                .filter(|id| graph.contains(id))
                .unique()
                .collect();
            Some(union_children_positions(graph, marriage, &child_ids))
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::graph::LayoutNode;

    fn couple_with_children(children: &[&str]) -> TreeGraph {
        let mut nodes = vec![LayoutNode::at("a", 100.0, 100.0), LayoutNode::at("b", 300.0, 120.0)];
        let mut edges = vec![LayoutEdge::new("m", "a", "b", Some(ConnectionKind::Spouse))];
        for (i, child) in children.iter().enumerate() {
            nodes.push(LayoutNode::at(*child, 0.0, 0.0));
            edges.push(
                LayoutEdge::new(format!("u{}", i), "m", *child, Some(ConnectionKind::UnionChild))
                    .with_marriage("m"),
            );
        }
        TreeGraph::new(nodes, edges)
    }

    #[test]
    fn test_single_child_is_centred() {
        let graph = couple_with_children(&["c"]);
        let marriage = graph.edge("m").unwrap();

        let placed = union_children_positions(&graph, marriage, &["c".to_string()]);
        assert_eq!(placed, vec![PlacedNode::new("c", 200.0, 370.0)]);
    }

    #[test]
    fn test_children_spread_around_centre() {
        let graph = couple_with_children(&["c1", "c2", "c3"]);
        let marriage = graph.edge("m").unwrap();
        let ids: Vec<Id> = vec!["c1".into(), "c2".into(), "c3".into()];

        let placed = union_children_positions(&graph, marriage, &ids);
        let xs: Vec<f64> = placed.iter().map(|node| node.position.x).collect();
        assert_eq!(xs, vec![20.0, 200.0, 380.0]);
        assert!(placed.iter().all(|node| node.position.y == 370.0));
    }

    #[test]
    fn test_missing_spouse_places_nothing() {
        let graph = couple_with_children(&["c"]);
        let orphan = LayoutEdge::new("x", "a", "ghost", Some(ConnectionKind::Spouse));

        assert!(union_children_positions(&graph, &orphan, &["c".to_string()]).is_empty());
    }

    #[test]
    fn test_next_child_position() {
        let graph = couple_with_children(&[]);
        let marriage = graph.edge("m");

        assert_eq!(next_union_child_position(&graph, marriage, 0), Point::new(200.0, 370.0));
        assert_eq!(next_union_child_position(&graph, marriage, 1), Point::new(290.0, 370.0));
        assert_eq!(next_union_child_position(&graph, marriage, 2), Point::new(380.0, 370.0));
        assert_eq!(next_union_child_position(&graph, None, 3), DEFAULT_CHILD_POSITION);
    }

    #[test]
    fn test_find_marriage_children_dedupes() {
        let base = couple_with_children(&["c1", "c2"]);
        let mut edges = base.edges.clone();
        edges.push(LayoutEdge::new("dup", "m", "c1", Some(ConnectionKind::MarriageChild)).with_marriage("m"));
        let graph = TreeGraph::new(base.nodes.clone(), edges);

        let children = find_marriage_children(&graph, "m");
        let ids: Vec<&str> = children.iter().map(|child| child.child_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert!(find_marriage_children(&graph, "missing").is_empty());
    }

    #[test]
    fn test_group_children_by_marriage() {
        let edges = vec![
            LayoutEdge::new("e1", "p", "c1", Some(ConnectionKind::MarriageChild)).with_marriage("m2"),
            LayoutEdge::new("e2", "m1", "c2", Some(ConnectionKind::UnionChild)),
            LayoutEdge::new("e3", "p", "c3", Some(ConnectionKind::MarriageChild)).with_marriage("m2"),
            LayoutEdge::new("e4", "p", "c4", Some(ConnectionKind::ParentChild)),
            // marriage child without a marriage id is ignored
            LayoutEdge::new("e5", "p", "c5", Some(ConnectionKind::MarriageChild)),
        ];

        let groups = group_children_by_marriage(&edges);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "m2");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "m1");
        assert_eq!(groups[1].1[0].child_id, "c2");
    }

    #[test]
    fn test_center_union_children() {
        let graph = couple_with_children(&["c1", "c2"]);

        let placed = center_union_children(&graph);
        assert_eq!(
            placed,
            vec![PlacedNode::new("c1", 110.0, 370.0), PlacedNode::new("c2", 290.0, 370.0)]
        );
    }
}
