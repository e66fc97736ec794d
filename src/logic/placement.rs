use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::logic::graph::TreeGraph;
use crate::model::Point;

pub const DEFAULT_POSITION: Point = Point { x: 400.0, y: 200.0 };
pub const GENERATION_OFFSET: f64 = 250.0;
pub const SPOUSE_OFFSET: f64 = 200.0;
pub const SIBLING_OFFSET: f64 = 220.0;
pub const NODE_WIDTH: f64 = 140.0;
pub const MIN_NODE_DISTANCE: f64 = 50.0;
const SPOUSE_ROW_TOLERANCE: f64 = 30.0;
const SIBLING_ROW_TOLERANCE: f64 = 50.0;
const MAX_OVERLAP_ATTEMPTS: usize = 10;

/// How a new person relates to the node it is placed next to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Child,
    Parent,
    Spouse,
    Sibling,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Relation::Child => "child",
            Relation::Parent => "parent",
            Relation::Spouse => "spouse",
            Relation::Sibling => "sibling",
        };
        f.write_str(name)
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "child" => Ok(Relation::Child),
            "parent" => Ok(Relation::Parent),
            "spouse" => Ok(Relation::Spouse),
            "sibling" => Ok(Relation::Sibling),
            other => Err(format!("Unknown relation '{}'", other)),
        }
    }
}

/// Suggested position for a new person related to `anchor_id`.
///
/// Without an anchor, a new child of a marriage goes just below the
/// marriage point. Anything else falls back to [`DEFAULT_POSITION`].
pub fn optimal_position(
    graph: &TreeGraph,
    anchor_id: Option<&str>,
    relation: Option<Relation>,
    marriage_point: Option<Point>,
) -> Point {
    match anchor_id {
        Some(anchor_id) => {
            let (Some(anchor), Some(relation)) = (graph.node(anchor_id), relation) else {
                return DEFAULT_POSITION;
            };
            let origin = anchor.point();

            match relation {
                Relation::Child => Point::new(origin.x, origin.y + GENERATION_OFFSET),
                Relation::Parent => Point::new(origin.x, origin.y - GENERATION_OFFSET),
                Relation::Spouse => {
                    let right_taken = placed_others(graph, anchor_id).any(|point| {
                        (point.y - origin.y).abs() < SPOUSE_ROW_TOLERANCE && point.x > origin.x
                    });
                    let x = if right_taken {
                        origin.x - SPOUSE_OFFSET
                    } else {
                        origin.x + SPOUSE_OFFSET
                    };
                    Point::new(x, origin.y)
                }
                Relation::Sibling => {
                    let max_x = placed_others(graph, anchor_id)
                        .filter(|point| (point.y - origin.y).abs() < SIBLING_ROW_TOLERANCE)
                        .map(|point| point.x)
                        .fold(origin.x, f64::max);
                    Point::new(max_x + SIBLING_OFFSET, origin.y)
                }
            }
        }
        None => match marriage_point {
            Some(point) => Point::new(point.x - NODE_WIDTH / 2.0, point.y + 180.0),
            None => DEFAULT_POSITION,
        },
    }
}

/// Positions of every placed node except `anchor_id`. Unplaced persons
/// take no room.
fn placed_others<'a>(graph: &'a TreeGraph, anchor_id: &'a str) -> impl Iterator<Item = Point> + 'a {
    graph
        .nodes
        .iter()
        .filter(move |node| node.id != anchor_id)
        .filter_map(|node| node.position)
}

/// Nudge `candidate` right by a node width plus margin until it clears every
/// node, giving up after a fixed number of attempts.
pub fn avoid_overlap(graph: &TreeGraph, candidate: Point, node_width: f64) -> Point {
    let clearance = node_width + MIN_NODE_DISTANCE;
    let mut adjusted = candidate;

    for _ in 0..MAX_OVERLAP_ATTEMPTS {
        let overlaps = graph
            .nodes
            .iter()
            .filter_map(|node| node.position)
            .any(|point| adjusted.distance_to(&point) < clearance);
        if !overlaps {
            break;
        }
        adjusted.x += clearance;
    }

    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::graph::LayoutNode;

    fn graph(nodes: Vec<LayoutNode>) -> TreeGraph {
        TreeGraph::new(nodes, Vec::new())
    }

    #[test]
    fn test_child_and_parent_offsets() {
        let g = graph(vec![LayoutNode::at("a", 300.0, 500.0)]);

        assert_eq!(
            optimal_position(&g, Some("a"), Some(Relation::Child), None),
            Point::new(300.0, 750.0)
        );
        assert_eq!(
            optimal_position(&g, Some("a"), Some(Relation::Parent), None),
            Point::new(300.0, 250.0)
        );
    }

    #[test]
    fn test_spouse_goes_left_when_right_is_taken() {
        let free = graph(vec![LayoutNode::at("a", 300.0, 200.0)]);
        assert_eq!(
            optimal_position(&free, Some("a"), Some(Relation::Spouse), None),
            Point::new(500.0, 200.0)
        );

        let taken = graph(vec![LayoutNode::at("a", 300.0, 200.0), LayoutNode::at("b", 480.0, 220.0)]);
        assert_eq!(
            optimal_position(&taken, Some("a"), Some(Relation::Spouse), None),
            Point::new(100.0, 200.0)
        );
    }

    #[test]
    fn test_sibling_goes_right_of_row() {
        let g = graph(vec![
            LayoutNode::at("a", 300.0, 200.0),
            LayoutNode::at("b", 600.0, 240.0),
            LayoutNode::at("far", 900.0, 400.0),
        ]);

        assert_eq!(
            optimal_position(&g, Some("a"), Some(Relation::Sibling), None),
            Point::new(820.0, 200.0)
        );
    }

    #[test]
    fn test_fallbacks() {
        let g = graph(vec![LayoutNode::at("a", 300.0, 200.0)]);

        assert_eq!(optimal_position(&g, Some("missing"), Some(Relation::Child), None), DEFAULT_POSITION);
        assert_eq!(optimal_position(&g, Some("a"), None, None), DEFAULT_POSITION);
        assert_eq!(optimal_position(&g, None, None, None), DEFAULT_POSITION);
        assert_eq!(
            optimal_position(&g, None, None, Some(Point::new(270.0, 100.0))),
            Point::new(200.0, 280.0)
        );
    }

    #[test]
    fn test_avoid_overlap_shifts_right() {
        let g = graph(vec![LayoutNode::at("a", 400.0, 200.0), LayoutNode::at("b", 590.0, 200.0)]);

        let adjusted = avoid_overlap(&g, Point::new(400.0, 200.0), NODE_WIDTH);
        assert_eq!(adjusted, Point::new(780.0, 200.0));

        let clear = Point::new(400.0, 600.0);
        assert_eq!(avoid_overlap(&g, clear, NODE_WIDTH), clear);
    }

    #[test]
    fn test_avoid_overlap_gives_up() {
        let nodes = (0..20)
            .map(|i| LayoutNode::at(format!("n{}", i), i as f64 * 190.0, 0.0))
            .collect();
        let g = graph(nodes);

        let adjusted = avoid_overlap(&g, Point::new(0.0, 0.0), NODE_WIDTH);
        assert_eq!(adjusted.x, 1900.0);
    }

    #[test]
    fn test_unplaced_persons_take_no_room() {
        let g = graph(vec![
            LayoutNode::at("a", -400.0, 10.0),
            LayoutNode::new("ghost", None),
        ]);

        assert_eq!(
            optimal_position(&g, Some("a"), Some(Relation::Spouse), None),
            Point::new(-200.0, 10.0)
        );
        assert_eq!(
            optimal_position(&g, Some("a"), Some(Relation::Sibling), None),
            Point::new(-180.0, 10.0)
        );
        let origin = Point::new(0.0, 0.0);
        assert_eq!(avoid_overlap(&g, origin, NODE_WIDTH), origin);
    }

    #[test]
    fn test_relation_parse() {
        assert_eq!("spouse".parse::<Relation>(), Ok(Relation::Spouse));
        assert!("cousin".parse::<Relation>().is_err());
    }
}
