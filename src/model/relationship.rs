use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{generate_id, now, Id, Timestamp};

/// Source ids starting with this prefix point at a marriage rather than a person.
pub const UNION_SOURCE_PREFIX: &str = "union-";
pub const UNION_MARKER: &str = "union-marker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Parent,
    Child,
    Spouse,
    Sibling,
    UnionChild,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Parent => "parent",
            RelationshipType::Child => "child",
            RelationshipType::Spouse => "spouse",
            RelationshipType::Sibling => "sibling",
            RelationshipType::UnionChild => "union_child",
        }
    }

    /// Type of the record stored in the opposite direction, if the type is paired.
    pub fn inverse(&self) -> Option<RelationshipType> {
        match self {
            RelationshipType::Parent => Some(RelationshipType::Child),
            RelationshipType::Child => Some(RelationshipType::Parent),
            RelationshipType::Spouse => Some(RelationshipType::Spouse),
            RelationshipType::Sibling => Some(RelationshipType::Sibling),
            RelationshipType::UnionChild => None,
        }
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self, RelationshipType::Spouse | RelationshipType::Sibling)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(RelationshipType::Parent),
            "child" => Ok(RelationshipType::Child),
            "spouse" => Ok(RelationshipType::Spouse),
            "sibling" => Ok(RelationshipType::Sibling),
            "union_child" => Ok(RelationshipType::UnionChild),
            other => Err(format!("Unknown relationship type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    pub source_id: Id,
    pub target_id: Id,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Relationship {
    pub fn new(kind: RelationshipType, source_id: Id, target_id: Id) -> Self {
        let created_at = now();
        Self {
            id: generate_id(),
            kind,
            source_id,
            target_id,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn involves(&self, person_id: &str) -> bool {
        self.source_id == person_id || self.target_id == person_id
    }

    pub fn matches(&self, source_id: &str, target_id: &str, kind: RelationshipType) -> bool {
        self.source_id == source_id && self.target_id == target_id && self.kind == kind
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRelationship {
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    pub source_id: Id,
    pub target_id: Id,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl NewRelationship {
    /// `union_child` records hang off a marriage marker instead of a person.
    pub fn is_union_child(&self) -> bool {
        self.kind == RelationshipType::UnionChild
            && (self.source_id == UNION_MARKER || self.source_id.starts_with(UNION_SOURCE_PREFIX))
    }

    pub fn marriage_edge_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("marriageEdgeId"))
            .and_then(|value| value.as_str())
            .filter(|id| !id.is_empty())
    }
}
