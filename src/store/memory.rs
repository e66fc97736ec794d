use anyhow::{bail, Result};
use parking_lot::RwLock;

use crate::model::{
    now, Edge, FamilyTree, Id, NodePosition, Person, Relationship, RelationshipType, UnionChild,
    User,
};
use crate::store::traits::{
    EdgeStore, FamilyTreeStore, NodePositionStore, PersonStore, RelationshipStore, Store,
    UnionChildStore, UserStore,
};

/// Process-local store with the same cascade rules as the PostgreSQL schema.
/// Rows are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

#[derive(Debug, Default)]
struct MemoryData {
    users: Vec<User>,
    trees: Vec<FamilyTree>,
    persons: Vec<Person>,
    relationships: Vec<Relationship>,
    edges: Vec<Edge>,
    positions: Vec<NodePosition>,
    union_children: Vec<UnionChild>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryData {
    fn remove_person_cascade(&mut self, person_id: &str) {
        self.relationships.retain(|rel| !rel.involves(person_id));
        let removed_edges: Vec<Id> = self
            .edges
            .iter()
            .filter(|edge| edge.touches(person_id))
            .map(|edge| edge.id.clone())
            .collect();
        for edge_id in &removed_edges {
            self.remove_edge_cascade(edge_id);
        }
        self.positions.retain(|pos| pos.node_id != person_id);
        self.union_children.retain(|uc| uc.child_id != person_id);
        self.persons.retain(|person| person.id != person_id);
    }

    fn remove_edge_cascade(&mut self, edge_id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id != edge_id && edge.source != edge_id);
        self.union_children.retain(|uc| uc.marriage_edge_id != edge_id);
        self.edges.len() != before
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn ensure_user(&self, id: &Id, email: &str) -> Result<User> {
        let mut data = self.data.write();
        if let Some(user) = data.users.iter_mut().find(|u| &u.id == id) {
            user.email = email.to_string();
            return Ok(user.clone());
        }
        let created_at = now();
        let user = User {
            id: id.clone(),
            email: email.to_string(),
            name: None,
            created_at,
            updated_at: created_at,
        };
        data.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<bool> {
        let mut data = self.data.write();
        match data.users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl FamilyTreeStore for MemoryStore {
    async fn get_tree(&self, id: &Id) -> Result<Option<FamilyTree>> {
        Ok(self.data.read().trees.iter().find(|t| &t.id == id).cloned())
    }

    async fn list_trees_for_owner(&self, owner_id: &Id) -> Result<Vec<FamilyTree>> {
        let mut trees: Vec<FamilyTree> = self
            .data
            .read()
            .trees
            .iter()
            .filter(|t| &t.owner_id == owner_id)
            .cloned()
            .collect();
        trees.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(trees)
    }

    async fn create_tree_with_root(
        &self,
        tree: FamilyTree,
        root: Person,
        position: NodePosition,
    ) -> Result<()> {
        let mut data = self.data.write();
        if !data.users.iter().any(|u| u.id == tree.owner_id) {
            bail!("Owner {} does not exist", tree.owner_id);
        }
        data.trees.push(tree);
        data.persons.push(root);
        data.positions.push(position);
        Ok(())
    }

    async fn update_tree(&self, tree: FamilyTree) -> Result<bool> {
        let mut data = self.data.write();
        match data.trees.iter_mut().find(|t| t.id == tree.id) {
            Some(slot) => {
                *slot = tree;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_tree(&self, id: &Id) -> Result<bool> {
        let mut data = self.data.write();
        if !data.trees.iter().any(|t| &t.id == id) {
            return Ok(false);
        }
        let person_ids: Vec<Id> = data
            .persons
            .iter()
            .filter(|p| &p.tree_id == id)
            .map(|p| p.id.clone())
            .collect();
        for person_id in &person_ids {
            data.remove_person_cascade(person_id);
        }
        data.edges.retain(|e| &e.tree_id != id);
        data.positions.retain(|p| &p.tree_id != id);
        data.union_children.retain(|uc| &uc.tree_id != id);
        data.trees.retain(|t| &t.id != id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl PersonStore for MemoryStore {
    async fn get_person(&self, id: &Id) -> Result<Option<Person>> {
        Ok(self.data.read().persons.iter().find(|p| &p.id == id).cloned())
    }

    async fn list_persons_for_tree(&self, tree_id: &Id) -> Result<Vec<Person>> {
        let mut persons: Vec<Person> = self
            .data
            .read()
            .persons
            .iter()
            .filter(|p| &p.tree_id == tree_id)
            .cloned()
            .collect();
        persons.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        Ok(persons)
    }

    async fn insert_person(&self, person: Person) -> Result<()> {
        let mut data = self.data.write();
        if !data.trees.iter().any(|t| t.id == person.tree_id) {
            bail!("Family tree {} does not exist", person.tree_id);
        }
        data.persons.push(person);
        Ok(())
    }

    async fn update_person(&self, person: Person) -> Result<bool> {
        let mut data = self.data.write();
        match data.persons.iter_mut().find(|p| p.id == person.id) {
            Some(slot) => {
                *slot = person;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_person(&self, id: &Id) -> Result<bool> {
        let mut data = self.data.write();
        if !data.persons.iter().any(|p| &p.id == id) {
            return Ok(false);
        }
        data.remove_person_cascade(id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl RelationshipStore for MemoryStore {
    async fn get_relationship(&self, id: &Id) -> Result<Option<Relationship>> {
        Ok(self.data.read().relationships.iter().find(|r| &r.id == id).cloned())
    }

    async fn list_relationships_for_person(&self, person_id: &Id) -> Result<Vec<Relationship>> {
        Ok(self
            .data
            .read()
            .relationships
            .iter()
            .filter(|r| r.involves(person_id))
            .cloned()
            .collect())
    }

    async fn list_relationships_for_persons(&self, person_ids: &[Id]) -> Result<Vec<Relationship>> {
        Ok(self
            .data
            .read()
            .relationships
            .iter()
            .filter(|r| person_ids.iter().any(|id| r.involves(id)))
            .cloned()
            .collect())
    }

    async fn find_relationship(
        &self,
        source_id: &Id,
        target_id: &Id,
        kind: RelationshipType,
    ) -> Result<Option<Relationship>> {
        Ok(self
            .data
            .read()
            .relationships
            .iter()
            .find(|r| r.matches(source_id, target_id, kind))
            .cloned())
    }

    async fn insert_relationship_set(
        &self,
        relationship: Relationship,
        counterpart: Option<Relationship>,
        edge: Option<Edge>,
    ) -> Result<()> {
        let mut data = self.data.write();
        if !data.persons.iter().any(|p| p.id == relationship.target_id) {
            bail!("Person {} does not exist", relationship.target_id);
        }
        if let Some(edge) = &edge {
            if !data.trees.iter().any(|t| t.id == edge.tree_id) {
                bail!("Family tree {} does not exist", edge.tree_id);
            }
        }
        if data.relationships.iter().any(|r| {
            r.matches(&relationship.source_id, &relationship.target_id, relationship.kind)
        }) {
            bail!("Relationship {} already exists", relationship.id);
        }

        data.relationships.push(relationship);
        if let Some(counterpart) = counterpart {
            let exists = data.relationships.iter().any(|r| {
                r.matches(&counterpart.source_id, &counterpart.target_id, counterpart.kind)
            });
            if !exists {
                data.relationships.push(counterpart);
            }
        }
        if let Some(edge) = edge {
            data.edges.push(edge);
        }
        Ok(())
    }

    async fn delete_relationship(&self, id: &Id) -> Result<bool> {
        let mut data = self.data.write();
        let before = data.relationships.len();
        data.relationships.retain(|r| &r.id != id);
        Ok(data.relationships.len() != before)
    }

    async fn delete_relationships_matching(
        &self,
        source_id: &Id,
        target_id: &Id,
        kind: RelationshipType,
    ) -> Result<u64> {
        let mut data = self.data.write();
        let before = data.relationships.len();
        data.relationships
            .retain(|r| !r.matches(source_id, target_id, kind));
        Ok((before - data.relationships.len()) as u64)
    }
}

#[async_trait::async_trait]
impl EdgeStore for MemoryStore {
    async fn get_edge(&self, id: &Id) -> Result<Option<Edge>> {
        Ok(self.data.read().edges.iter().find(|e| &e.id == id).cloned())
    }

    async fn list_edges_for_tree(&self, tree_id: &Id) -> Result<Vec<Edge>> {
        Ok(self
            .data
            .read()
            .edges
            .iter()
            .filter(|e| &e.tree_id == tree_id)
            .cloned()
            .collect())
    }

    async fn insert_edge(&self, edge: Edge) -> Result<()> {
        let mut data = self.data.write();
        if !data.trees.iter().any(|t| t.id == edge.tree_id) {
            bail!("Family tree {} does not exist", edge.tree_id);
        }
        data.edges.push(edge);
        Ok(())
    }

    async fn update_edge(&self, edge: Edge) -> Result<bool> {
        let mut data = self.data.write();
        match data.edges.iter_mut().find(|e| e.id == edge.id) {
            Some(slot) => {
                *slot = edge;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_edge(&self, id: &Id) -> Result<bool> {
        let mut data = self.data.write();
        if !data.edges.iter().any(|e| &e.id == id) {
            return Ok(false);
        }
        data.remove_edge_cascade(id);
        Ok(true)
    }

    async fn delete_edges_matching(&self, source: &Id, target: &Id, kind: &str) -> Result<u64> {
        let mut data = self.data.write();
        let matching: Vec<Id> = data
            .edges
            .iter()
            .filter(|e| &e.source == source && &e.target == target && e.kind.as_deref() == Some(kind))
            .map(|e| e.id.clone())
            .collect();
        for edge_id in &matching {
            data.remove_edge_cascade(edge_id);
        }
        Ok(matching.len() as u64)
    }
}

#[async_trait::async_trait]
impl NodePositionStore for MemoryStore {
    async fn get_node_position(&self, id: &Id) -> Result<Option<NodePosition>> {
        Ok(self.data.read().positions.iter().find(|p| &p.id == id).cloned())
    }

    async fn find_node_position(&self, node_id: &Id, tree_id: &Id) -> Result<Option<NodePosition>> {
        Ok(self
            .data
            .read()
            .positions
            .iter()
            .find(|p| &p.node_id == node_id && &p.tree_id == tree_id)
            .cloned())
    }

    async fn list_node_positions_for_tree(&self, tree_id: &Id) -> Result<Vec<NodePosition>> {
        Ok(self
            .data
            .read()
            .positions
            .iter()
            .filter(|p| &p.tree_id == tree_id)
            .cloned()
            .collect())
    }

    async fn upsert_node_position(&self, position: NodePosition) -> Result<NodePosition> {
        let mut data = self.data.write();
        if !data.trees.iter().any(|t| t.id == position.tree_id) {
            bail!("Family tree {} does not exist", position.tree_id);
        }
        if let Some(existing) = data
            .positions
            .iter_mut()
            .find(|p| p.node_id == position.node_id && p.tree_id == position.tree_id)
        {
            existing.move_to(position.point());
            return Ok(existing.clone());
        }
        data.positions.push(position.clone());
        Ok(position)
    }

    async fn update_node_position(&self, position: NodePosition) -> Result<bool> {
        let mut data = self.data.write();
        match data.positions.iter_mut().find(|p| p.id == position.id) {
            Some(slot) => {
                *slot = position;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_node_position(&self, id: &Id) -> Result<bool> {
        let mut data = self.data.write();
        let before = data.positions.len();
        data.positions.retain(|p| &p.id != id);
        Ok(data.positions.len() != before)
    }
}

#[async_trait::async_trait]
impl UnionChildStore for MemoryStore {
    async fn get_union_child(&self, id: &Id) -> Result<Option<UnionChild>> {
        Ok(self.data.read().union_children.iter().find(|uc| &uc.id == id).cloned())
    }

    async fn find_union_child(&self, marriage_edge_id: &Id, child_id: &Id) -> Result<Option<UnionChild>> {
        Ok(self
            .data
            .read()
            .union_children
            .iter()
            .find(|uc| &uc.marriage_edge_id == marriage_edge_id && &uc.child_id == child_id)
            .cloned())
    }

    async fn list_union_children_for_marriage(&self, marriage_edge_id: &Id) -> Result<Vec<UnionChild>> {
        Ok(self
            .data
            .read()
            .union_children
            .iter()
            .filter(|uc| &uc.marriage_edge_id == marriage_edge_id)
            .cloned()
            .collect())
    }

    async fn list_union_children_for_tree(&self, tree_id: &Id) -> Result<Vec<UnionChild>> {
        Ok(self
            .data
            .read()
            .union_children
            .iter()
            .filter(|uc| &uc.tree_id == tree_id)
            .cloned()
            .collect())
    }

    async fn insert_union_child(&self, union_child: UnionChild) -> Result<()> {
        let mut data = self.data.write();
        if data
            .union_children
            .iter()
            .any(|uc| uc.marriage_edge_id == union_child.marriage_edge_id && uc.child_id == union_child.child_id)
        {
            bail!(
                "Child {} is already attached to union {}",
                union_child.child_id,
                union_child.marriage_edge_id
            );
        }
        data.union_children.push(union_child);
        Ok(())
    }

    async fn delete_union_child(&self, id: &Id) -> Result<bool> {
        let mut data = self.data.write();
        let before = data.union_children.len();
        data.union_children.retain(|uc| &uc.id != id);
        Ok(data.union_children.len() != before)
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionKind, Point, PersonFields};

    fn person(tree_id: &str, first: &str, last: &str) -> Person {
        Person::new(
            tree_id.to_string(),
            PersonFields {
                first_name: first.to_string(),
                last_name: last.to_string(),
                ..Default::default()
            },
        )
    }

    async fn seeded() -> (MemoryStore, FamilyTree, Person) {
        let store = MemoryStore::new();
        store.ensure_user(&"u1".to_string(), "u1@example.com").await.unwrap();
        let tree = FamilyTree::new("u1".to_string(), "Tree".to_string(), None, false);
        let root = person(&tree.id, "Root", "Zed");
        let position = NodePosition::new(tree.id.clone(), root.id.clone(), Point::new(300.0, 200.0));
        store
            .create_tree_with_root(tree.clone(), root.clone(), position)
            .await
            .unwrap();
        (store, tree, root)
    }

    #[tokio::test]
    async fn test_persons_listed_by_last_name() {
        let (store, tree, _root) = seeded().await;
        store.insert_person(person(&tree.id, "Ada", "Adams")).await.unwrap();

        let names: Vec<String> = store
            .list_persons_for_tree(&tree.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.last_name)
            .collect();
        assert_eq!(names, vec!["Adams", "Zed"]);
    }

    #[tokio::test]
    async fn test_delete_person_cascades() {
        let (store, tree, root) = seeded().await;
        let spouse = person(&tree.id, "Eve", "Zed");
        store.insert_person(spouse.clone()).await.unwrap();
        let child = person(&tree.id, "Kid", "Zed");
        store.insert_person(child.clone()).await.unwrap();

        let marriage = Edge::connection(tree.id.clone(), root.id.clone(), spouse.id.clone(), ConnectionKind::Spouse);
        store
            .insert_relationship_set(
                Relationship::new(RelationshipType::Spouse, root.id.clone(), spouse.id.clone()),
                None,
                Some(marriage.clone()),
            )
            .await
            .unwrap();
        store
            .insert_edge(Edge::union_child(tree.id.clone(), marriage.id.clone(), child.id.clone()))
            .await
            .unwrap();
        store
            .insert_union_child(UnionChild::new(tree.id.clone(), marriage.id.clone(), child.id.clone()))
            .await
            .unwrap();

        assert!(store.delete_person(&root.id).await.unwrap());

        assert!(store.list_relationships_for_person(&spouse.id).await.unwrap().is_empty());
        assert!(store.list_edges_for_tree(&tree.id).await.unwrap().is_empty());
        assert!(store.list_union_children_for_tree(&tree.id).await.unwrap().is_empty());
        assert!(store.find_node_position(&root.id, &tree.id).await.unwrap().is_none());
        assert!(!store.delete_person(&root.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_position_moves_existing_row() {
        let (store, tree, root) = seeded().await;
        let original = store.find_node_position(&root.id, &tree.id).await.unwrap().unwrap();

        let moved = store
            .upsert_node_position(NodePosition::new(tree.id.clone(), root.id.clone(), Point::new(10.0, 20.0)))
            .await
            .unwrap();

        assert_eq!(moved.id, original.id);
        assert_eq!(moved.point(), Point::new(10.0, 20.0));
        assert_eq!(store.list_node_positions_for_tree(&tree.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_tree_removes_everything() {
        let (store, tree, root) = seeded().await;
        assert!(store.delete_tree(&tree.id).await.unwrap());
        assert!(store.get_tree(&tree.id).await.unwrap().is_none());
        assert!(store.get_person(&root.id).await.unwrap().is_none());
        assert!(store.list_node_positions_for_tree(&tree.id).await.unwrap().is_empty());
        assert!(!store.delete_tree(&tree.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_user_refreshes_email() {
        let store = MemoryStore::new();
        let id = "u1".to_string();
        store.ensure_user(&id, "old@example.com").await.unwrap();
        let user = store.ensure_user(&id, "new@example.com").await.unwrap();

        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_relationship_set_skips_existing_counterpart() {
        let (store, tree, root) = seeded().await;
        let spouse = person(&tree.id, "Eve", "Zed");
        store.insert_person(spouse.clone()).await.unwrap();
        store
            .insert_relationship_set(
                Relationship::new(RelationshipType::Spouse, spouse.id.clone(), root.id.clone()),
                None,
                None,
            )
            .await
            .unwrap();

        let edge = Edge::connection(tree.id.clone(), root.id.clone(), spouse.id.clone(), ConnectionKind::Spouse);
        store
            .insert_relationship_set(
                Relationship::new(RelationshipType::Spouse, root.id.clone(), spouse.id.clone()),
                Some(Relationship::new(RelationshipType::Spouse, spouse.id.clone(), root.id.clone())),
                Some(edge),
            )
            .await
            .unwrap();

        assert_eq!(store.list_relationships_for_person(&root.id).await.unwrap().len(), 2);
        assert_eq!(store.list_edges_for_tree(&tree.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_relationship_set_is_all_or_nothing() {
        let (store, tree, root) = seeded().await;
        let spouse = person(&tree.id, "Eve", "Zed");
        store.insert_person(spouse.clone()).await.unwrap();
        let first = Relationship::new(RelationshipType::Spouse, root.id.clone(), spouse.id.clone());
        store.insert_relationship_set(first, None, None).await.unwrap();

        let edge = Edge::connection(tree.id.clone(), root.id.clone(), spouse.id.clone(), ConnectionKind::Spouse);
        let duplicate = Relationship::new(RelationshipType::Spouse, root.id.clone(), spouse.id.clone());
        assert!(store
            .insert_relationship_set(duplicate, None, Some(edge))
            .await
            .is_err());
        assert!(store.list_edges_for_tree(&tree.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_union_child_rejected() {
        let (store, tree, root) = seeded().await;
        let row = UnionChild::new(tree.id.clone(), "m1".to_string(), root.id.clone());
        store.insert_union_child(row).await.unwrap();
        let duplicate = UnionChild::new(tree.id.clone(), "m1".to_string(), root.id.clone());
        assert!(store.insert_union_child(duplicate).await.is_err());
    }
}
