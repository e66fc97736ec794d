use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::model::{common::nullable, generate_id, now, Id, Timestamp};

/// Semantic kind of a drawn connection, stored in `data.type` (and usually `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    #[serde(rename = "parent_child_connection")]
    ParentChild,
    #[serde(rename = "spouse_connection")]
    Spouse,
    #[serde(rename = "union_child_connection")]
    UnionChild,
    #[serde(rename = "marriage_child_connection")]
    MarriageChild,
}

impl ConnectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::ParentChild => "parent_child_connection",
            ConnectionKind::Spouse => "spouse_connection",
            ConnectionKind::UnionChild => "union_child_connection",
            ConnectionKind::MarriageChild => "marriage_child_connection",
        }
    }

    /// Source is a parent (or a marriage) and target is a child.
    pub fn is_descent(&self) -> bool {
        !matches!(self, ConnectionKind::Spouse)
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent_child_connection" => Ok(ConnectionKind::ParentChild),
            "spouse_connection" => Ok(ConnectionKind::Spouse),
            "union_child_connection" => Ok(ConnectionKind::UnionChild),
            "marriage_child_connection" => Ok(ConnectionKind::MarriageChild),
            other => Err(format!("Unknown connection kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: Id,
    pub source: Id,
    pub target: Id,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub data: Value,
    pub tree_id: Id,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Edge {
    pub fn new(tree_id: Id, source: Id, target: Id, kind: Option<String>, data: Value) -> Self {
        let created_at = now();
        Self {
            id: generate_id(),
            source,
            target,
            kind,
            source_handle: None,
            target_handle: None,
            data,
            tree_id,
            created_at,
            updated_at: created_at,
        }
    }

    /// Edge drawn for a relationship: `type` and `data.type` both carry the kind.
    pub fn connection(tree_id: Id, source: Id, target: Id, kind: ConnectionKind) -> Self {
        Self::new(
            tree_id,
            source,
            target,
            Some(kind.as_str().to_string()),
            json!({ "type": kind.as_str() }),
        )
    }

    /// Edge from a marriage edge down to one of its children.
    pub fn union_child(tree_id: Id, marriage_edge_id: Id, child_id: Id) -> Self {
        let kind = ConnectionKind::UnionChild;
        Self::new(
            tree_id,
            marriage_edge_id.clone(),
            child_id,
            Some(kind.as_str().to_string()),
            json!({
                "type": kind.as_str(),
                "marriageEdgeId": marriage_edge_id,
                "isUnionChild": true,
            }),
        )
    }

    pub fn with_handles(mut self, source_handle: Option<String>, target_handle: Option<String>) -> Self {
        self.source_handle = source_handle;
        self.target_handle = target_handle;
        self
    }

    /// Kind from `data.type`, falling back to the `type` column.
    pub fn connection_kind(&self) -> Option<ConnectionKind> {
        self.data
            .get("type")
            .and_then(Value::as_str)
            .and_then(|kind| kind.parse().ok())
            .or_else(|| self.kind.as_deref().and_then(|kind| kind.parse().ok()))
    }

    pub fn marriage_edge_id(&self) -> Option<&str> {
        self.data.get("marriageEdgeId").and_then(Value::as_str)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    pub fn apply(&mut self, update: EdgePatch) {
        if let Some(source) = update.source {
            self.source = source;
        }
        if let Some(target) = update.target {
            self.target = target;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(source_handle) = update.source_handle {
            self.source_handle = source_handle;
        }
        if let Some(target_handle) = update.target_handle {
            self.target_handle = target_handle;
        }
        if let Some(data) = update.data {
            self.data = data;
        }
        self.updated_at = now();
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEdge {
    pub source: Id,
    pub target: Id,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    /// Object, or a JSON document encoded as a string
    pub data: Option<Value>,
    pub tree_id: Id,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUpdate {
    pub source: Option<Id>,
    pub target: Option<Id>,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub source_handle: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub target_handle: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub data: Option<Option<Value>>,
}

/// Validated form of [`EdgeUpdate`], with `data` already normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePatch {
    pub source: Option<Id>,
    pub target: Option<Id>,
    pub kind: Option<Option<String>>,
    pub source_handle: Option<Option<String>>,
    pub target_handle: Option<Option<String>>,
    pub data: Option<Value>,
}

/// Accepts an object, a JSON string, or nothing; nothing becomes `{}`.
pub fn normalize_edge_data(data: Option<Value>) -> Result<Value, serde_json::Error> {
    match data {
        None | Some(Value::Null) => Ok(json!({})),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(json!({})),
        Some(Value::String(raw)) => serde_json::from_str(&raw),
        Some(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_kind_prefers_data_type() {
        let mut edge = Edge::new(
            "t".into(),
            "a".into(),
            "b".into(),
            Some("straight".into()),
            json!({ "type": "spouse_connection" }),
        );
        assert_eq!(edge.connection_kind(), Some(ConnectionKind::Spouse));

        edge.data = json!({});
        edge.kind = Some("parent_child_connection".into());
        assert_eq!(edge.connection_kind(), Some(ConnectionKind::ParentChild));

        edge.kind = Some("straight".into());
        assert_eq!(edge.connection_kind(), None);
    }

    #[test]
    fn test_union_child_edge_payload() {
        let edge = Edge::union_child("t".into(), "m1".into(), "c1".into());
        assert_eq!(edge.source, "m1");
        assert_eq!(edge.connection_kind(), Some(ConnectionKind::UnionChild));
        assert_eq!(edge.marriage_edge_id(), Some("m1"));
        assert_eq!(edge.data["isUnionChild"], true);
    }

    #[test]
    fn test_normalize_edge_data() {
        assert_eq!(normalize_edge_data(None).unwrap(), json!({}));
        assert_eq!(normalize_edge_data(Some(Value::Null)).unwrap(), json!({}));
        assert_eq!(
            normalize_edge_data(Some(json!(r#"{"type":"spouse_connection"}"#))).unwrap(),
            json!({ "type": "spouse_connection" })
        );
        assert_eq!(
            normalize_edge_data(Some(json!({ "a": 1 }))).unwrap(),
            json!({ "a": 1 })
        );
        assert!(normalize_edge_data(Some(json!("{not json"))).is_err());
    }
}
