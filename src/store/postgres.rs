use anyhow::{Context, Result};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};

use crate::model::{
    Edge, FamilyTree, Gender, Id, NodePosition, Person, Relationship, RelationshipType,
    UnionChild, User,
};
use crate::store::traits::{
    EdgeStore, FamilyTreeStore, NodePositionStore, PersonStore, RelationshipStore, Store,
    UnionChildStore, UserStore,
};

const PERSON_COLUMNS: &str = "id, first_name, last_name, birth_date, birth_place, death_date, \
     occupation, biography, gender, photo_url, tree_id, created_at, updated_at";
const EDGE_COLUMNS: &str =
    "id, source, target, type, source_handle, target_handle, data, tree_id, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run the embedded migrations in `migrations/`
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn tree_from_row(row: &PgRow) -> Result<FamilyTree> {
    Ok(FamilyTree {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_public: row.try_get("is_public")?,
        owner_id: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn person_from_row(row: &PgRow) -> Result<Person> {
    let gender: Option<String> = row.try_get("gender")?;
    let gender = gender
        .map(|g| g.parse::<Gender>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    Ok(Person {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        birth_date: row.try_get("birth_date")?,
        birth_place: row.try_get("birth_place")?,
        death_date: row.try_get("death_date")?,
        occupation: row.try_get("occupation")?,
        biography: row.try_get("biography")?,
        gender,
        photo_url: row.try_get("photo_url")?,
        tree_id: row.try_get("tree_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn relationship_from_row(row: &PgRow) -> Result<Relationship> {
    let kind: String = row.try_get("type")?;
    Ok(Relationship {
        id: row.try_get("id")?,
        kind: kind.parse::<RelationshipType>().map_err(anyhow::Error::msg)?,
        source_id: row.try_get("source_id")?,
        target_id: row.try_get("target_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn edge_from_row(row: &PgRow) -> Result<Edge> {
    Ok(Edge {
        id: row.try_get("id")?,
        source: row.try_get("source")?,
        target: row.try_get("target")?,
        kind: row.try_get("type")?,
        source_handle: row.try_get("source_handle")?,
        target_handle: row.try_get("target_handle")?,
        data: row.try_get("data")?,
        tree_id: row.try_get("tree_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn position_from_row(row: &PgRow) -> Result<NodePosition> {
    Ok(NodePosition {
        id: row.try_get("id")?,
        node_id: row.try_get("node_id")?,
        x: row.try_get("x")?,
        y: row.try_get("y")?,
        tree_id: row.try_get("tree_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn union_child_from_row(row: &PgRow) -> Result<UnionChild> {
    Ok(UnionChild {
        id: row.try_get("id")?,
        marriage_edge_id: row.try_get("marriage_edge_id")?,
        child_id: row.try_get("child_id")?,
        tree_id: row.try_get("tree_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl UserStore for PostgresStore {
    async fn ensure_user(&self, id: &Id, email: &str) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .context("Failed to ensure user")?;

        user_from_row(&row)
    }

    async fn update_user(&self, user: User) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET name = $2, updated_at = $3 WHERE id = $1")
            .bind(&user.id)
            .bind(&user.name)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await
            .context("Failed to update user")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl FamilyTreeStore for PostgresStore {
    async fn get_tree(&self, id: &Id) -> Result<Option<FamilyTree>> {
        let row = sqlx::query(
            "SELECT id, name, description, is_public, owner_id, created_at, updated_at FROM family_trees WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch family tree")?;

        row.as_ref().map(tree_from_row).transpose()
    }

    async fn list_trees_for_owner(&self, owner_id: &Id) -> Result<Vec<FamilyTree>> {
        let rows = sqlx::query(
            "SELECT id, name, description, is_public, owner_id, created_at, updated_at \
             FROM family_trees WHERE owner_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list family trees")?;

        rows.iter().map(tree_from_row).collect()
    }

    async fn create_tree_with_root(
        &self,
        tree: FamilyTree,
        root: Person,
        position: NodePosition,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        sqlx::query(
            r#"
            INSERT INTO family_trees (id, name, description, is_public, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&tree.id)
        .bind(&tree.name)
        .bind(&tree.description)
        .bind(tree.is_public)
        .bind(&tree.owner_id)
        .bind(tree.created_at)
        .bind(tree.updated_at)
        .execute(&mut *tx)
        .await
        .context("Failed to create family tree")?;

        insert_person_query(&root)
            .execute(&mut *tx)
            .await
            .context("Failed to create root person")?;

        sqlx::query(
            r#"
            INSERT INTO node_positions (id, node_id, x, y, tree_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&position.id)
        .bind(&position.node_id)
        .bind(position.x)
        .bind(position.y)
        .bind(&position.tree_id)
        .bind(position.created_at)
        .bind(position.updated_at)
        .execute(&mut *tx)
        .await
        .context("Failed to create root position")?;

        tx.commit().await.context("Failed to commit family tree")?;
        Ok(())
    }

    async fn update_tree(&self, tree: FamilyTree) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE family_trees SET name = $2, description = $3, is_public = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(&tree.id)
        .bind(&tree.name)
        .bind(&tree.description)
        .bind(tree.is_public)
        .bind(tree.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to update family tree")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_tree(&self, id: &Id) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        // union markers are not foreign keys, so their rows go explicitly
        sqlx::query(
            "DELETE FROM relationships WHERE source_id IN (SELECT id FROM persons WHERE tree_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete tree relationships")?;

        let result = sqlx::query("DELETE FROM family_trees WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete family tree")?;

        tx.commit().await.context("Failed to commit tree deletion")?;
        Ok(result.rows_affected() > 0)
    }
}

fn insert_person_query(
    person: &Person,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO persons (id, first_name, last_name, birth_date, birth_place, death_date,
                             occupation, biography, gender, photo_url, tree_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(&person.id)
    .bind(&person.first_name)
    .bind(&person.last_name)
    .bind(person.birth_date)
    .bind(&person.birth_place)
    .bind(person.death_date)
    .bind(&person.occupation)
    .bind(&person.biography)
    .bind(person.gender.map(|g| g.as_str()))
    .bind(&person.photo_url)
    .bind(&person.tree_id)
    .bind(person.created_at)
    .bind(person.updated_at)
}

#[async_trait::async_trait]
impl PersonStore for PostgresStore {
    async fn get_person(&self, id: &Id) -> Result<Option<Person>> {
        let row = sqlx::query(&format!("SELECT {} FROM persons WHERE id = $1", PERSON_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch person")?;

        row.as_ref().map(person_from_row).transpose()
    }

    async fn list_persons_for_tree(&self, tree_id: &Id) -> Result<Vec<Person>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM persons WHERE tree_id = $1 ORDER BY last_name ASC",
            PERSON_COLUMNS
        ))
        .bind(tree_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list persons")?;

        rows.iter().map(person_from_row).collect()
    }

    async fn insert_person(&self, person: Person) -> Result<()> {
        insert_person_query(&person)
            .execute(&self.pool)
            .await
            .context("Failed to create person")?;
        Ok(())
    }

    async fn update_person(&self, person: Person) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE persons SET first_name = $2, last_name = $3, birth_date = $4, birth_place = $5,
                               death_date = $6, occupation = $7, biography = $8, gender = $9,
                               photo_url = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(&person.id)
        .bind(&person.first_name)
        .bind(&person.last_name)
        .bind(person.birth_date)
        .bind(&person.birth_place)
        .bind(person.death_date)
        .bind(&person.occupation)
        .bind(&person.biography)
        .bind(person.gender.map(|g| g.as_str()))
        .bind(&person.photo_url)
        .bind(person.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to update person")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_person(&self, id: &Id) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        sqlx::query("DELETE FROM relationships WHERE source_id = $1 OR target_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete person relationships")?;

        // edges hanging off a marriage edge of this person go first
        sqlx::query(
            "DELETE FROM edges WHERE source IN (SELECT id FROM edges WHERE source = $1 OR target = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete union edges")?;

        sqlx::query("DELETE FROM edges WHERE source = $1 OR target = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete person edges")?;

        sqlx::query("DELETE FROM node_positions WHERE node_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete person position")?;

        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete person")?;

        tx.commit().await.context("Failed to commit person deletion")?;
        Ok(result.rows_affected() > 0)
    }
}

fn insert_relationship_query(
    relationship: &Relationship,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO relationships (id, type, source_id, target_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&relationship.id)
    .bind(relationship.kind.as_str())
    .bind(&relationship.source_id)
    .bind(&relationship.target_id)
    .bind(relationship.created_at)
    .bind(relationship.updated_at)
}

fn insert_edge_query(
    edge: &Edge,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO edges (id, source, target, type, source_handle, target_handle, data, tree_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&edge.id)
    .bind(&edge.source)
    .bind(&edge.target)
    .bind(&edge.kind)
    .bind(&edge.source_handle)
    .bind(&edge.target_handle)
    .bind(&edge.data)
    .bind(&edge.tree_id)
    .bind(edge.created_at)
    .bind(edge.updated_at)
}

#[async_trait::async_trait]
impl RelationshipStore for PostgresStore {
    async fn get_relationship(&self, id: &Id) -> Result<Option<Relationship>> {
        let row = sqlx::query(
            "SELECT id, type, source_id, target_id, created_at, updated_at FROM relationships WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch relationship")?;

        row.as_ref().map(relationship_from_row).transpose()
    }

    async fn list_relationships_for_person(&self, person_id: &Id) -> Result<Vec<Relationship>> {
        let rows = sqlx::query(
            "SELECT id, type, source_id, target_id, created_at, updated_at FROM relationships \
             WHERE source_id = $1 OR target_id = $1 ORDER BY created_at",
        )
        .bind(person_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list relationships")?;

        rows.iter().map(relationship_from_row).collect()
    }

    async fn list_relationships_for_persons(&self, person_ids: &[Id]) -> Result<Vec<Relationship>> {
        if person_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, type, source_id, target_id, created_at, updated_at FROM relationships \
             WHERE source_id = ANY($1) OR target_id = ANY($1) ORDER BY created_at",
        )
        .bind(person_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tree relationships")?;

        rows.iter().map(relationship_from_row).collect()
    }

    async fn find_relationship(
        &self,
        source_id: &Id,
        target_id: &Id,
        kind: RelationshipType,
    ) -> Result<Option<Relationship>> {
        let row = sqlx::query(
            "SELECT id, type, source_id, target_id, created_at, updated_at FROM relationships \
             WHERE source_id = $1 AND target_id = $2 AND type = $3 LIMIT 1",
        )
        .bind(source_id)
        .bind(target_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up relationship")?;

        row.as_ref().map(relationship_from_row).transpose()
    }

    async fn insert_relationship_set(
        &self,
        relationship: Relationship,
        counterpart: Option<Relationship>,
        edge: Option<Edge>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        insert_relationship_query(&relationship)
            .execute(&mut *tx)
            .await
            .context("Failed to create relationship")?;

        if let Some(counterpart) = counterpart {
            sqlx::query(
                r#"
                INSERT INTO relationships (id, type, source_id, target_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (source_id, target_id, type) DO NOTHING
                "#,
            )
            .bind(&counterpart.id)
            .bind(counterpart.kind.as_str())
            .bind(&counterpart.source_id)
            .bind(&counterpart.target_id)
            .bind(counterpart.created_at)
            .bind(counterpart.updated_at)
            .execute(&mut *tx)
            .await
            .context("Failed to create counterpart relationship")?;
        }

        if let Some(edge) = edge {
            insert_edge_query(&edge)
                .execute(&mut *tx)
                .await
                .context("Failed to create connection edge")?;
        }

        tx.commit().await.context("Failed to commit relationship")?;
        Ok(())
    }

    async fn delete_relationship(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM relationships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete relationship")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_relationships_matching(
        &self,
        source_id: &Id,
        target_id: &Id,
        kind: RelationshipType,
    ) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM relationships WHERE source_id = $1 AND target_id = $2 AND type = $3",
        )
        .bind(source_id)
        .bind(target_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to delete relationships")?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl EdgeStore for PostgresStore {
    async fn get_edge(&self, id: &Id) -> Result<Option<Edge>> {
        let row = sqlx::query(&format!("SELECT {} FROM edges WHERE id = $1", EDGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch edge")?;

        row.as_ref().map(edge_from_row).transpose()
    }

    async fn list_edges_for_tree(&self, tree_id: &Id) -> Result<Vec<Edge>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM edges WHERE tree_id = $1 ORDER BY created_at",
            EDGE_COLUMNS
        ))
        .bind(tree_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list edges")?;

        rows.iter().map(edge_from_row).collect()
    }

    async fn insert_edge(&self, edge: Edge) -> Result<()> {
        insert_edge_query(&edge)
            .execute(&self.pool)
            .await
            .context("Failed to create edge")?;

        Ok(())
    }

    async fn update_edge(&self, edge: Edge) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE edges SET source = $2, target = $3, type = $4, source_handle = $5,
                             target_handle = $6, data = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(&edge.id)
        .bind(&edge.source)
        .bind(&edge.target)
        .bind(&edge.kind)
        .bind(&edge.source_handle)
        .bind(&edge.target_handle)
        .bind(&edge.data)
        .bind(edge.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to update edge")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_edge(&self, id: &Id) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        sqlx::query("DELETE FROM edges WHERE source = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete union edges")?;

        let result = sqlx::query("DELETE FROM edges WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete edge")?;

        tx.commit().await.context("Failed to commit edge deletion")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_edges_matching(&self, source: &Id, target: &Id, kind: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM edges WHERE source = $1 AND target = $2 AND type = $3")
            .bind(source)
            .bind(target)
            .bind(kind)
            .execute(&self.pool)
            .await
            .context("Failed to delete edges")?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl NodePositionStore for PostgresStore {
    async fn get_node_position(&self, id: &Id) -> Result<Option<NodePosition>> {
        let row = sqlx::query(
            "SELECT id, node_id, x, y, tree_id, created_at, updated_at FROM node_positions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch node position")?;

        row.as_ref().map(position_from_row).transpose()
    }

    async fn find_node_position(&self, node_id: &Id, tree_id: &Id) -> Result<Option<NodePosition>> {
        let row = sqlx::query(
            "SELECT id, node_id, x, y, tree_id, created_at, updated_at FROM node_positions \
             WHERE node_id = $1 AND tree_id = $2",
        )
        .bind(node_id)
        .bind(tree_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up node position")?;

        row.as_ref().map(position_from_row).transpose()
    }

    async fn list_node_positions_for_tree(&self, tree_id: &Id) -> Result<Vec<NodePosition>> {
        let rows = sqlx::query(
            "SELECT id, node_id, x, y, tree_id, created_at, updated_at FROM node_positions \
             WHERE tree_id = $1 ORDER BY created_at",
        )
        .bind(tree_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list node positions")?;

        rows.iter().map(position_from_row).collect()
    }

    async fn upsert_node_position(&self, position: NodePosition) -> Result<NodePosition> {
        let row = sqlx::query(
            r#"
            INSERT INTO node_positions (id, node_id, x, y, tree_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (node_id, tree_id) DO UPDATE SET
                x = EXCLUDED.x,
                y = EXCLUDED.y,
                updated_at = EXCLUDED.updated_at
            RETURNING id, node_id, x, y, tree_id, created_at, updated_at
            "#,
        )
        .bind(&position.id)
        .bind(&position.node_id)
        .bind(position.x)
        .bind(position.y)
        .bind(&position.tree_id)
        .bind(position.created_at)
        .bind(position.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert node position")?;

        position_from_row(&row)
    }

    async fn update_node_position(&self, position: NodePosition) -> Result<bool> {
        let result = sqlx::query("UPDATE node_positions SET x = $2, y = $3, updated_at = $4 WHERE id = $1")
            .bind(&position.id)
            .bind(position.x)
            .bind(position.y)
            .bind(position.updated_at)
            .execute(&self.pool)
            .await
            .context("Failed to update node position")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_node_position(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM node_positions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete node position")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl UnionChildStore for PostgresStore {
    async fn get_union_child(&self, id: &Id) -> Result<Option<UnionChild>> {
        let row = sqlx::query(
            "SELECT id, marriage_edge_id, child_id, tree_id, created_at FROM union_children WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch union child")?;

        row.as_ref().map(union_child_from_row).transpose()
    }

    async fn find_union_child(&self, marriage_edge_id: &Id, child_id: &Id) -> Result<Option<UnionChild>> {
        let row = sqlx::query(
            "SELECT id, marriage_edge_id, child_id, tree_id, created_at FROM union_children \
             WHERE marriage_edge_id = $1 AND child_id = $2",
        )
        .bind(marriage_edge_id)
        .bind(child_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up union child")?;

        row.as_ref().map(union_child_from_row).transpose()
    }

    async fn list_union_children_for_marriage(&self, marriage_edge_id: &Id) -> Result<Vec<UnionChild>> {
        let rows = sqlx::query(
            "SELECT id, marriage_edge_id, child_id, tree_id, created_at FROM union_children \
             WHERE marriage_edge_id = $1 ORDER BY created_at",
        )
        .bind(marriage_edge_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list union children")?;

        rows.iter().map(union_child_from_row).collect()
    }

    async fn list_union_children_for_tree(&self, tree_id: &Id) -> Result<Vec<UnionChild>> {
        let rows = sqlx::query(
            "SELECT id, marriage_edge_id, child_id, tree_id, created_at FROM union_children \
             WHERE tree_id = $1 ORDER BY created_at",
        )
        .bind(tree_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tree union children")?;

        rows.iter().map(union_child_from_row).collect()
    }

    async fn insert_union_child(&self, union_child: UnionChild) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO union_children (id, marriage_edge_id, child_id, tree_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&union_child.id)
        .bind(&union_child.marriage_edge_id)
        .bind(&union_child.child_id)
        .bind(&union_child.tree_id)
        .bind(union_child.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create union child")?;

        Ok(())
    }

    async fn delete_union_child(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM union_children WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete union child")?;

        Ok(result.rows_affected() > 0)
    }
}

impl Store for PostgresStore {}
