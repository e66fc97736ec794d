use crate::model::{ConnectionKind, Id, Relationship, RelationshipType};

/// The edge drawn for a relationship, oriented parent to child for descent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPlan {
    pub source: Id,
    pub target: Id,
    pub kind: ConnectionKind,
    /// Relationship kind used to pick handles for the drawn edge
    pub handles_for: RelationshipType,
}

/// Records and edge to write for a new person-to-person relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPlan {
    pub relationship: Relationship,
    /// Inverse or mirrored record, written only if it does not exist yet
    pub counterpart: Option<Relationship>,
    pub connection: Option<ConnectionPlan>,
}

/// `(source, target, type)` of the record paired with a relationship.
pub fn counterpart_key(kind: RelationshipType, source_id: &Id, target_id: &Id) -> Option<(Id, Id, RelationshipType)> {
    kind.inverse()
        .map(|inverse| (target_id.clone(), source_id.clone(), inverse))
}

pub fn connection_for(kind: RelationshipType, source_id: &Id, target_id: &Id) -> Option<ConnectionPlan> {
    let (source, target, kind, handles_for) = match kind {
        RelationshipType::Parent => (
            source_id,
            target_id,
            ConnectionKind::ParentChild,
            RelationshipType::Parent,
        ),
        RelationshipType::Child => (
            target_id,
            source_id,
            ConnectionKind::ParentChild,
            RelationshipType::Parent,
        ),
        RelationshipType::Spouse => (
            source_id,
            target_id,
            ConnectionKind::Spouse,
            RelationshipType::Spouse,
        ),
        RelationshipType::Sibling | RelationshipType::UnionChild => return None,
    };

    Some(ConnectionPlan {
        source: source.clone(),
        target: target.clone(),
        kind,
        handles_for,
    })
}

pub fn plan_relationship(kind: RelationshipType, source_id: Id, target_id: Id) -> RelationshipPlan {
    let counterpart = counterpart_key(kind, &source_id, &target_id)
        .map(|(source, target, inverse)| Relationship::new(inverse, source, target));
    let connection = connection_for(kind, &source_id, &target_id);

    RelationshipPlan {
        relationship: Relationship::new(kind, source_id, target_id),
        counterpart,
        connection,
    }
}

/// Connection edges, as `(source, target, kind)`, that may have been drawn
/// for a relationship or its counterpart.
pub fn connections_to_remove(relationship: &Relationship) -> Vec<(Id, Id, ConnectionKind)> {
    let Some(plan) = connection_for(relationship.kind, &relationship.source_id, &relationship.target_id) else {
        return Vec::new();
    };

    let mut edges = vec![(plan.source.clone(), plan.target.clone(), plan.kind)];
    if plan.kind == ConnectionKind::Spouse {
        edges.push((plan.target, plan.source, plan.kind));
    }
    edges
}
