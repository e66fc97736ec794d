use serde::{Deserialize, Serialize};

use crate::model::{generate_id, now, Id, Point, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePosition {
    pub id: Id,
    pub node_id: Id,
    pub x: f64,
    pub y: f64,
    pub tree_id: Id,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NodePosition {
    pub fn new(tree_id: Id, node_id: Id, point: Point) -> Self {
        let created_at = now();
        Self {
            id: generate_id(),
            node_id,
            x: point.x,
            y: point.y,
            tree_id,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn move_to(&mut self, point: Point) {
        self.x = point.x;
        self.y = point.y;
        self.updated_at = now();
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNodePosition {
    pub node_id: Id,
    pub tree_id: Id,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodePositionUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    pub node_id: Id,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkPositions {
    pub positions: Vec<PositionInput>,
}
