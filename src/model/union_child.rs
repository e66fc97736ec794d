use serde::{Deserialize, Serialize};

use crate::model::{generate_id, now, Id, Timestamp};

/// A child attached to a marriage edge rather than to a single parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionChild {
    pub id: Id,
    pub marriage_edge_id: Id,
    pub child_id: Id,
    pub tree_id: Id,
    pub created_at: Timestamp,
}

impl UnionChild {
    pub fn new(tree_id: Id, marriage_edge_id: Id, child_id: Id) -> Self {
        Self {
            id: generate_id(),
            marriage_edge_id,
            child_id,
            tree_id,
            created_at: now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUnionChild {
    pub marriage_edge_id: Id,
    pub child_id: Id,
    pub tree_id: Option<Id>,
}
