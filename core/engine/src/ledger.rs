use chrono::{DateTime, Utc};
use memory_graph_schemas::{Entity, EntityId, EntityProperties, Relationship, RelationshipId};
use tracing::debug;

use crate::error::Result;
use crate::identity;
use crate::store::GraphStore;

/// Importance a freshly created entity starts with.
pub const ENTITY_BASE_IMPORTANCE: f64 = 0.5;
/// Importance accrued on each repeat mention. No upper cap.
pub const ENTITY_REINFORCEMENT: f64 = 0.1;
/// Strength a freshly observed relationship starts with. Repeat
/// observation refreshes recency and context but leaves strength as is.
pub const RELATIONSHIP_INITIAL_STRENGTH: f64 = 0.7;

/// Owns all entity mutation. Repeat sightings of a name reinforce the
/// existing record in place; nothing else in the engine writes entities.
pub struct EntityLedger;

impl Default for EntityLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityLedger {
    pub fn new() -> Self {
        Self
    }

    /// Reinforcing upsert. The first sighting fixes the entity's type;
    /// later mentions bump access count and importance, refresh
    /// `last_accessed`, and accumulate the observed context.
    pub fn upsert(
        &self,
        store: &GraphStore,
        name: &str,
        entity_type: &str,
        context: &str,
        now: DateTime<Utc>,
    ) -> Result<EntityId> {
        let id = identity::entity_id(name);

        match store.get_entity(&id)? {
            Some(mut entity) => {
                entity.last_accessed = now;
                entity.access_count += 1;
                entity.importance_score += ENTITY_REINFORCEMENT;
                entity.properties.contexts.push(context.to_string());
                store.put_entity(&entity)?;
                debug!(
                    "Reinforced entity {} ({}), access_count={}",
                    entity.name, id, entity.access_count
                );
            }
            None => {
                let entity = Entity {
                    id: id.clone(),
                    name: name.to_string(),
                    entity_type: entity_type.to_string(),
                    properties: EntityProperties {
                        contexts: vec![context.to_string()],
                        extra: Default::default(),
                    },
                    created_at: now,
                    last_accessed: now,
                    access_count: 1,
                    importance_score: ENTITY_BASE_IMPORTANCE,
                };
                store.put_entity(&entity)?;
                debug!("Created entity {} ({}) as {}", name, id, entity_type);
            }
        }

        Ok(id)
    }
}

/// Owns all relationship mutation. One record per (source, target, type)
/// triple; repeat extraction refreshes recency instead of duplicating.
pub struct RelationshipLedger;

impl Default for RelationshipLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipLedger {
    pub fn new() -> Self {
        Self
    }

    /// Deduplicating upsert. Endpoint existence is not checked; an edge
    /// naming unknown entities is stored but never surfaces in network
    /// views, which resolve names through the entity table.
    pub fn upsert(
        &self,
        store: &GraphStore,
        source_id: &EntityId,
        target_id: &EntityId,
        relation_type: &str,
        context: &str,
        now: DateTime<Utc>,
    ) -> Result<RelationshipId> {
        let id = identity::relationship_id(source_id, target_id, relation_type);

        match store.get_relationship(&id)? {
            Some(mut relationship) => {
                relationship.context = context.to_string();
                relationship.last_reinforced = now;
                store.put_relationship(&relationship)?;
                debug!("Refreshed relationship {} ({})", relation_type, id);
            }
            None => {
                let relationship = Relationship {
                    id: id.clone(),
                    source_id: source_id.clone(),
                    target_id: target_id.clone(),
                    relation_type: relation_type.to_string(),
                    strength: RELATIONSHIP_INITIAL_STRENGTH,
                    context: context.to_string(),
                    created_at: now,
                    last_reinforced: now,
                };
                store.put_relationship(&relationship)?;
                debug!(
                    "Created relationship {} -[{}]-> {} ({})",
                    source_id, relation_type, target_id, id
                );
            }
        }

        Ok(id)
    }
}
