use serde::{Deserialize, Serialize};

use crate::model::{
    common::nullable, generate_id, now, Edge, Id, NodePosition, Person, Relationship, Timestamp,
    UnionChild,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTree {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub owner_id: Id,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FamilyTree {
    pub fn new(owner_id: Id, name: String, description: Option<String>, is_public: bool) -> Self {
        let created_at = now();
        Self {
            id: generate_id(),
            name,
            description,
            is_public,
            owner_id,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn apply(&mut self, update: FamilyTreeUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(is_public) = update.is_public {
            self.is_public = is_public;
        }
        self.updated_at = now();
    }
}

/// Optional overrides for the person created alongside a new tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootPerson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub occupation: Option<String>,
    pub biography: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFamilyTree {
    pub name: String,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub root_person: Option<RootPerson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTreeUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
}

/// A tree with everything the editor needs to draw it.
#[derive(Debug, Clone, Serialize)]
pub struct TreeSnapshot {
    #[serde(flatten)]
    pub tree: FamilyTree,
    #[serde(rename = "Person")]
    pub persons: Vec<Person>,
    #[serde(rename = "NodePosition")]
    pub node_positions: Vec<NodePosition>,
    #[serde(rename = "Edge")]
    pub edges: Vec<Edge>,
    #[serde(rename = "UnionChild")]
    pub union_children: Vec<UnionChild>,
    #[serde(rename = "Relationship")]
    pub relationships: Vec<Relationship>,
}
