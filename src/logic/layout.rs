use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};
use serde::Deserialize;

use crate::logic::graph::{LayoutEdge, PlacedNode, TreeGraph};
use crate::logic::union_children::center_union_children;
use crate::model::{ConnectionKind, Point};

pub const BASE_Y: f64 = 150.0;
pub const GENERATION_HEIGHT: f64 = 300.0;
pub const SMART_GENERATION_HEIGHT: f64 = 400.0;
pub const NODE_SPACING: f64 = 200.0;
pub const COUPLE_SPACING: f64 = 180.0;
pub const ROW_CENTER_X: f64 = 400.0;
pub const GENERATION_CENTER_X: f64 = 500.0;
/// Vertical tolerance used to bucket nodes into rows.
pub const ROW_TOLERANCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    Generations,
    Smart,
    Rows,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutOptions {
    pub align_spouses: bool,
    pub center_union_children: bool,
}

/// Run one layout strategy over the graph, then the optional passes.
pub fn run_layout(graph: &TreeGraph, strategy: LayoutStrategy, options: LayoutOptions) -> Vec<PlacedNode> {
    let mut placed = match strategy {
        LayoutStrategy::Generations => generation_layout(graph),
        LayoutStrategy::Smart => smart_alignment(graph),
        LayoutStrategy::Rows => row_alignment(graph),
    };

    if options.align_spouses {
        placed = align_spouses(&placed, &graph.edges);
    }
    if options.center_union_children {
        let mut moved = graph.clone();
        moved.apply(&placed);
        let centred = center_union_children(&moved);
        merge_placements(&mut placed, centred);
    }

    placed
}

fn merge_placements(placed: &mut Vec<PlacedNode>, updates: Vec<PlacedNode>) {
    for update in updates {
        match placed.iter_mut().find(|node| node.id == update.id) {
            Some(existing) => existing.position = update.position,
            None => placed.push(update),
        }
    }
}

/// Rounds half up, matching how the editor buckets rows.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Lay `ids` out left to right on row `y`, `spacing` apart, centred on `center_x`.
fn spread_row(ids: &[&str], y: f64, spacing: f64, center_x: f64) -> Vec<PlacedNode> {
    let total_width = (ids.len().saturating_sub(1)) as f64 * spacing;
    let start_x = center_x - total_width / 2.0;

    ids.iter()
        .enumerate()
        .map(|(index, id)| PlacedNode::new(*id, start_x + index as f64 * spacing, y))
        .collect()
}

/// Depth-first level assignment. Nodes are visited in the same order a
/// recursive walk would visit them and the first level a node receives wins.
/// Returns `(node, level)` in visit order.
fn walk_levels<'a, F>(starts: &[&'a str], mut neighbours: F) -> Vec<(&'a str, i64)>
where
    F: FnMut(&'a str, i64) -> Vec<(&'a str, i64)>,
{
    let mut visited: HashSet<&str> = HashSet::new();
    let mut order = Vec::new();

    for &start in starts {
        let mut stack = vec![(start, 0_i64)];
        while let Some((id, level)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            order.push((id, level));
            let next = neighbours(id, level);
            stack.extend(next.into_iter().rev().filter(|(next_id, _)| !visited.contains(next_id)));
        }
    }

    order
}

/// Group visited nodes by level, keeping visit order inside a level.
/// Ids that are not nodes of the graph are dropped.
fn group_by_level<'a>(graph: &TreeGraph, levels: &[(&'a str, i64)]) -> BTreeMap<i64, Vec<&'a str>> {
    let mut groups: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
    for &(id, level) in levels {
        if graph.contains(id) {
            groups.entry(level).or_default().push(id);
        }
    }
    groups
}

/// Snap nodes onto horizontal rows: nodes whose y rounds to the same hundred
/// share a row, rows are re-spaced from the top and each row is re-centred.
pub fn row_alignment(graph: &TreeGraph) -> Vec<PlacedNode> {
    let mut rows: BTreeMap<i64, Vec<(&str, Point)>> = BTreeMap::new();

    for node in &graph.nodes {
        let Some(point) = node.position.filter(Point::is_finite) else {
            warn!("Skipping node {} without a valid position", node.id);
            continue;
        };
        let key = (round_half_up(point.y / ROW_TOLERANCE) * ROW_TOLERANCE) as i64;
        rows.entry(key).or_default().push((node.id.as_str(), point));
    }

    let mut placed = Vec::with_capacity(graph.nodes.len());
    for (index, (_, mut row)) in rows.into_iter().enumerate() {
        row.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));
        let ids: Vec<&str> = row.iter().map(|(id, _)| *id).collect();
        let y = BASE_Y + index as f64 * GENERATION_HEIGHT;
        placed.extend(spread_row(&ids, y, NODE_SPACING, ROW_CENTER_X));
    }

    placed
}

/// Generation leveling over parent/child links: children sit one level below
/// their parents. Nodes the walk never reaches keep their position.
pub fn generation_layout(graph: &TreeGraph) -> Vec<PlacedNode> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();

    for edge in &graph.edges {
        if matches!(
            edge.kind,
            Some(ConnectionKind::ParentChild) | Some(ConnectionKind::MarriageChild)
        ) {
            children.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
            parents.entry(edge.target.as_str()).or_default().push(edge.source.as_str());
        }
    }

    let mut roots: Vec<&str> = graph
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .filter(|id| !parents.contains_key(id))
        .collect();
    if roots.is_empty() {
        roots.extend(graph.nodes.first().map(|node| node.id.as_str()));
    }

    let levels = walk_levels(&roots, |id, level| {
        let down = children.get(id).into_iter().flatten().map(|child| (*child, level + 1));
        let up = parents.get(id).into_iter().flatten().map(|parent| (*parent, level - 1));
        down.chain(up).collect()
    });

    let groups = group_by_level(graph, &levels);
    debug!("Generation layout: {} levels", groups.len());

    let mut placed = Vec::with_capacity(graph.nodes.len());
    for (index, ids) in groups.values().enumerate() {
        let y = BASE_Y + index as f64 * GENERATION_HEIGHT;
        placed.extend(spread_row(ids, y, NODE_SPACING, GENERATION_CENTER_X));
    }

    let reached: HashSet<&str> = levels.iter().map(|(id, _)| *id).collect();
    placed.extend(
        graph
            .nodes
            .iter()
            .filter(|node| !reached.contains(node.id.as_str()))
            .filter_map(|node| node.position.map(|position| PlacedNode { id: node.id.clone(), position })),
    );

    placed
}

/// Relationship-aware leveling: spouses share a level, children go one level
/// down, and each row is laid out as couples and singles.
pub fn smart_alignment(graph: &TreeGraph) -> Vec<PlacedNode> {
    let mut children: HashMap<String, Vec<&str>> = HashMap::new();
    let mut has_parent: HashSet<&str> = HashSet::new();
    let mut spouses: HashMap<&str, Vec<&str>> = HashMap::new();

    for edge in &graph.edges {
        if edge.is_descent() {
            // a child of a marriage edge is a child of both spouses
            for parent in graph.persons_behind(&edge.source) {
                children.entry(parent).or_default().push(edge.target.as_str());
            }
            has_parent.insert(edge.target.as_str());
        }
        if edge.is_spouse() {
            spouses.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
            spouses.entry(edge.target.as_str()).or_default().push(edge.source.as_str());
        }
    }

    let mut roots: Vec<&str> = graph
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .filter(|id| !has_parent.contains(id))
        .collect();
    if roots.is_empty() {
        roots.extend(graph.nodes.first().map(|node| node.id.as_str()));
    }

    let mut levels = walk_levels(&roots, |id, level| {
        let partners = spouses.get(id).into_iter().flatten().map(|spouse| (*spouse, level));
        let offspring = children.get(id).into_iter().flatten().map(|child| (*child, level + 1));
        partners.chain(offspring).collect()
    });

    let reached: HashSet<&str> = levels.iter().map(|(id, _)| *id).collect();
    let isolated: Vec<(&str, i64)> = graph
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .filter(|id| !reached.contains(id))
        .map(|id| (id, 0))
        .collect();
    levels.extend(isolated);

    let groups = group_by_level(graph, &levels);

    let mut placed = Vec::with_capacity(graph.nodes.len());
    for (index, ids) in groups.values().enumerate() {
        let y = BASE_Y + index as f64 * SMART_GENERATION_HEIGHT;
        let families = family_groups(ids, &spouses);

        let total_width: f64 = families
            .iter()
            .enumerate()
            .map(|(i, family)| {
                let gap = if i > 0 { NODE_SPACING } else { 0.0 };
                COUPLE_SPACING * (family.len() - 1) as f64 + gap
            })
            .sum();

        let mut current_x = ROW_CENTER_X - total_width / 2.0;
        for (i, family) in families.iter().enumerate() {
            if i > 0 {
                current_x += NODE_SPACING;
            }
            for (offset, id) in family.iter().enumerate() {
                placed.push(PlacedNode::new(*id, current_x + offset as f64 * COUPLE_SPACING, y));
            }
            current_x += COUPLE_SPACING * (family.len() - 1) as f64;
        }
    }

    placed
}

/// Split one row into couples (a node followed by its spouses on the same row)
/// and singles. Every node lands in exactly one group.
fn family_groups<'a>(row: &[&'a str], spouses: &HashMap<&str, Vec<&'a str>>) -> Vec<Vec<&'a str>> {
    let on_row: HashSet<&str> = row.iter().copied().collect();
    let mut processed: HashSet<&str> = HashSet::new();
    let mut families = Vec::new();

    for &id in row {
        if !processed.insert(id) {
            continue;
        }
        let mut family = vec![id];
        for &spouse in spouses.get(id).into_iter().flatten() {
            if on_row.contains(spouse) && processed.insert(spouse) {
                family.push(spouse);
            }
        }
        families.push(family);
    }

    families
}

/// Put both partners of every spouse edge on their mean y and, unless they
/// are already exactly [`COUPLE_SPACING`] apart, re-centre them that far apart.
pub fn align_spouses(placed: &[PlacedNode], edges: &[LayoutEdge]) -> Vec<PlacedNode> {
    let mut aligned = placed.to_vec();
    let index: HashMap<String, usize> = aligned
        .iter()
        .enumerate()
        .rev()
        .map(|(i, node)| (node.id.clone(), i))
        .collect();

    for edge in edges.iter().filter(|edge| edge.is_spouse()) {
        let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) else {
            continue;
        };
        if s == t {
            continue;
        }

        let source = aligned[s].position;
        let target = aligned[t].position;
        let mean_y = (source.y + target.y) / 2.0;
        aligned[s].position.y = mean_y;
        aligned[t].position.y = mean_y;

        let min_x = source.x.min(target.x);
        let max_x = source.x.max(target.x);
        if (max_x - min_x).abs() != COUPLE_SPACING {
            let center_x = (min_x + max_x) / 2.0;
            aligned[s].position.x = center_x - COUPLE_SPACING / 2.0;
            aligned[t].position.x = center_x + COUPLE_SPACING / 2.0;
        }
    }

    aligned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::graph::LayoutNode;

    fn position<'a>(placed: &'a [PlacedNode], id: &str) -> &'a Point {
        &placed
            .iter()
            .find(|node| node.id == id)
            .unwrap_or_else(|| panic!("{} was not placed", id))
            .position
    }

    fn family() -> TreeGraph {
        // a + b married, c and d their children, e married to c
        TreeGraph::new(
            vec![
                LayoutNode::at("a", 0.0, 0.0),
                LayoutNode::at("b", 50.0, 10.0),
                LayoutNode::at("c", 10.0, 300.0),
                LayoutNode::at("d", 90.0, 290.0),
                LayoutNode::at("e", 300.0, 310.0),
            ],
            vec![
                LayoutEdge::new("m1", "a", "b", Some(ConnectionKind::Spouse)),
                LayoutEdge::new("p1", "a", "c", Some(ConnectionKind::ParentChild)),
                LayoutEdge::new("p2", "a", "d", Some(ConnectionKind::ParentChild)),
                LayoutEdge::new("m2", "c", "e", Some(ConnectionKind::Spouse)),
            ],
        )
    }

    #[test]
    fn test_row_alignment_buckets_and_centres() {
        let graph = TreeGraph::new(
            vec![
                LayoutNode::at("right", 500.0, 140.0),
                LayoutNode::at("left", 100.0, 120.0),
                LayoutNode::at("low", 0.0, 449.0),
                LayoutNode::new("unplaced", None),
            ],
            Vec::new(),
        );

        let placed = row_alignment(&graph);

        assert_eq!(placed.len(), 3);
        assert_eq!(position(&placed, "left"), &Point::new(300.0, 150.0));
        assert_eq!(position(&placed, "right"), &Point::new(500.0, 150.0));
        assert_eq!(position(&placed, "low"), &Point::new(400.0, 450.0));
    }

    #[test]
    fn test_row_alignment_rounds_half_up() {
        let graph = TreeGraph::new(
            vec![LayoutNode::at("a", 0.0, 150.0), LayoutNode::at("b", 10.0, 249.0)],
            Vec::new(),
        );

        // 150 rounds to 200 and 249 rounds to 200: one row
        let placed = row_alignment(&graph);
        assert_eq!(position(&placed, "a").y, position(&placed, "b").y);
    }

    #[test]
    fn test_generation_layout_levels() {
        let placed = generation_layout(&family());

        let a = position(&placed, "a");
        let c = position(&placed, "c");
        let d = position(&placed, "d");
        assert_eq!(a.y, BASE_Y);
        assert_eq!(c.y, BASE_Y + GENERATION_HEIGHT);
        assert_eq!(d.y, c.y);
        assert_eq!(d.x - c.x, NODE_SPACING);
        // spouses without parent links are roots of their own
        assert_eq!(position(&placed, "b").y, BASE_Y);
        assert_eq!(position(&placed, "e").y, BASE_Y);
    }

    #[test]
    fn test_generation_layout_centres_on_500() {
        let graph = TreeGraph::new(
            vec![LayoutNode::at("x", 0.0, 0.0), LayoutNode::at("y", 0.0, 0.0)],
            Vec::new(),
        );

        let placed = generation_layout(&graph);
        assert_eq!(position(&placed, "x"), &Point::new(400.0, BASE_Y));
        assert_eq!(position(&placed, "y"), &Point::new(600.0, BASE_Y));
    }

    #[test]
    fn test_generation_layout_cycle_starts_from_first_node() {
        let graph = TreeGraph::new(
            vec![LayoutNode::at("a", 1.0, 1.0), LayoutNode::at("b", 2.0, 2.0)],
            vec![
                LayoutEdge::new("e1", "a", "b", Some(ConnectionKind::ParentChild)),
                LayoutEdge::new("e2", "b", "a", Some(ConnectionKind::ParentChild)),
            ],
        );

        let placed = generation_layout(&graph);
        assert_eq!(position(&placed, "a").y, BASE_Y);
        assert_eq!(position(&placed, "b").y, BASE_Y + GENERATION_HEIGHT);
    }

    #[test]
    fn test_smart_alignment_spouses_share_level() {
        let placed = smart_alignment(&family());

        let a = position(&placed, "a");
        let b = position(&placed, "b");
        let c = position(&placed, "c");
        let e = position(&placed, "e");
        assert_eq!(a.y, b.y);
        assert_eq!(b.x - a.x, COUPLE_SPACING);
        assert_eq!(c.y, a.y + SMART_GENERATION_HEIGHT);
        assert_eq!(e.y, c.y);
        assert_eq!(e.x - c.x, COUPLE_SPACING);
        assert_eq!(placed.len(), 5);
    }

    #[test]
    fn test_smart_alignment_row_is_centred() {
        let placed = smart_alignment(&family());

        // row two: couple c+e (180 wide), gap 200, single d
        let c = position(&placed, "c");
        let e = position(&placed, "e");
        let d = position(&placed, "d");
        assert_eq!(c.x, ROW_CENTER_X - 190.0);
        assert_eq!(e.x, c.x + COUPLE_SPACING);
        assert_eq!(d.x, e.x + NODE_SPACING);
        // row one: a single couple centred on 400
        assert_eq!(position(&placed, "a").x, ROW_CENTER_X - 90.0);
    }

    #[test]
    fn test_smart_alignment_union_children_sit_under_both_spouses() {
        let graph = TreeGraph::new(
            vec![
                LayoutNode::at("a", 0.0, 0.0),
                LayoutNode::at("b", 0.0, 0.0),
                LayoutNode::at("c", 0.0, 0.0),
            ],
            vec![
                LayoutEdge::new("m", "b", "a", Some(ConnectionKind::Spouse)),
                LayoutEdge::new("u", "m", "c", Some(ConnectionKind::UnionChild)).with_marriage("m"),
            ],
        );

        let placed = smart_alignment(&graph);
        assert_eq!(position(&placed, "a").y, position(&placed, "b").y);
        assert_eq!(position(&placed, "c").y, BASE_Y + SMART_GENERATION_HEIGHT);
    }

    #[test]
    fn test_smart_alignment_places_each_node_once() {
        // b is married to both a and c
        let graph = TreeGraph::new(
            vec![
                LayoutNode::at("a", 0.0, 0.0),
                LayoutNode::at("b", 0.0, 0.0),
                LayoutNode::at("c", 0.0, 0.0),
            ],
            vec![
                LayoutEdge::new("m1", "a", "b", Some(ConnectionKind::Spouse)),
                LayoutEdge::new("m2", "b", "c", Some(ConnectionKind::Spouse)),
            ],
        );

        let placed = smart_alignment(&graph);
        assert_eq!(placed.len(), 3);
        let mut xs: Vec<f64> = placed.iter().map(|node| node.position.x).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        assert_eq!(xs.len(), 3);
    }

    #[test]
    fn test_align_spouses() {
        let placed = vec![PlacedNode::new("a", 100.0, 100.0), PlacedNode::new("b", 500.0, 200.0)];
        let edges = vec![LayoutEdge::new("m", "a", "b", Some(ConnectionKind::Spouse))];

        let aligned = align_spouses(&placed, &edges);
        assert_eq!(position(&aligned, "a"), &Point::new(210.0, 150.0));
        assert_eq!(position(&aligned, "b"), &Point::new(390.0, 150.0));
    }

    #[test]
    fn test_align_spouses_keeps_correct_gap() {
        let placed = vec![PlacedNode::new("a", 380.0, 100.0), PlacedNode::new("b", 200.0, 100.0)];
        let edges = vec![LayoutEdge::new("m", "a", "b", Some(ConnectionKind::Spouse))];

        let aligned = align_spouses(&placed, &edges);
        assert_eq!(aligned, placed);
    }

    #[test]
    fn test_run_layout_with_spouse_pass() {
        let placed = run_layout(
            &family(),
            LayoutStrategy::Generations,
            LayoutOptions {
                align_spouses: true,
                center_union_children: false,
            },
        );

        let a = position(&placed, "a");
        let b = position(&placed, "b");
        assert_eq!(a.y, b.y);
        assert_eq!((b.x - a.x).abs(), COUPLE_SPACING);
    }
}
