use crate::model::{
    Edge, FamilyTree, Id, NodePosition, Person, Relationship, RelationshipType, UnionChild, User,
};
use anyhow::Result;

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Create the user row for a token subject if it does not exist yet
    async fn ensure_user(&self, id: &Id, email: &str) -> Result<User>;
    async fn update_user(&self, user: User) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait FamilyTreeStore: Send + Sync {
    async fn get_tree(&self, id: &Id) -> Result<Option<FamilyTree>>;
    /// Trees owned by a user, most recently updated first
    async fn list_trees_for_owner(&self, owner_id: &Id) -> Result<Vec<FamilyTree>>;
    /// Insert a tree together with its root person and that person's position, atomically
    async fn create_tree_with_root(
        &self,
        tree: FamilyTree,
        root: Person,
        position: NodePosition,
    ) -> Result<()>;
    async fn update_tree(&self, tree: FamilyTree) -> Result<bool>;
    /// Delete a tree and everything it owns
    async fn delete_tree(&self, id: &Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait PersonStore: Send + Sync {
    async fn get_person(&self, id: &Id) -> Result<Option<Person>>;
    /// Persons of a tree ordered by last name
    async fn list_persons_for_tree(&self, tree_id: &Id) -> Result<Vec<Person>>;
    async fn insert_person(&self, person: Person) -> Result<()>;
    async fn update_person(&self, person: Person) -> Result<bool>;
    /// Delete a person with its relationships, touching edges, position and union-child rows
    async fn delete_person(&self, id: &Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn get_relationship(&self, id: &Id) -> Result<Option<Relationship>>;
    /// Relationships where the person is source or target
    async fn list_relationships_for_person(&self, person_id: &Id) -> Result<Vec<Relationship>>;
    /// Relationships touching any of the given persons
    async fn list_relationships_for_persons(&self, person_ids: &[Id]) -> Result<Vec<Relationship>>;
    async fn find_relationship(
        &self,
        source_id: &Id,
        target_id: &Id,
        kind: RelationshipType,
    ) -> Result<Option<Relationship>>;
    /// Insert a relationship, its mirror or inverse (skipped when already present)
    /// and its connection edge in one transaction
    async fn insert_relationship_set(
        &self,
        relationship: Relationship,
        counterpart: Option<Relationship>,
        edge: Option<Edge>,
    ) -> Result<()>;
    async fn delete_relationship(&self, id: &Id) -> Result<bool>;
    async fn delete_relationships_matching(
        &self,
        source_id: &Id,
        target_id: &Id,
        kind: RelationshipType,
    ) -> Result<u64>;
}

#[async_trait::async_trait]
pub trait EdgeStore: Send + Sync {
    async fn get_edge(&self, id: &Id) -> Result<Option<Edge>>;
    async fn list_edges_for_tree(&self, tree_id: &Id) -> Result<Vec<Edge>>;
    async fn insert_edge(&self, edge: Edge) -> Result<()>;
    async fn update_edge(&self, edge: Edge) -> Result<bool>;
    /// Delete an edge, the edges hanging off it and its union-child rows
    async fn delete_edge(&self, id: &Id) -> Result<bool>;
    /// Delete edges by endpoints and `type` column
    async fn delete_edges_matching(&self, source: &Id, target: &Id, kind: &str) -> Result<u64>;
}

#[async_trait::async_trait]
pub trait NodePositionStore: Send + Sync {
    async fn get_node_position(&self, id: &Id) -> Result<Option<NodePosition>>;
    async fn find_node_position(&self, node_id: &Id, tree_id: &Id) -> Result<Option<NodePosition>>;
    async fn list_node_positions_for_tree(&self, tree_id: &Id) -> Result<Vec<NodePosition>>;
    /// Insert, or move the existing position of the same `(node_id, tree_id)`; returns the stored row
    async fn upsert_node_position(&self, position: NodePosition) -> Result<NodePosition>;
    async fn update_node_position(&self, position: NodePosition) -> Result<bool>;
    async fn delete_node_position(&self, id: &Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait UnionChildStore: Send + Sync {
    async fn get_union_child(&self, id: &Id) -> Result<Option<UnionChild>>;
    async fn find_union_child(&self, marriage_edge_id: &Id, child_id: &Id) -> Result<Option<UnionChild>>;
    async fn list_union_children_for_marriage(&self, marriage_edge_id: &Id) -> Result<Vec<UnionChild>>;
    async fn list_union_children_for_tree(&self, tree_id: &Id) -> Result<Vec<UnionChild>>;
    async fn insert_union_child(&self, union_child: UnionChild) -> Result<()>;
    async fn delete_union_child(&self, id: &Id) -> Result<bool>;
}

pub trait Store:
    UserStore
    + FamilyTreeStore
    + PersonStore
    + RelationshipStore
    + EdgeStore
    + NodePositionStore
    + UnionChildStore
    + Send
    + Sync
{
}
