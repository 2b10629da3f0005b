use std::sync::Arc;

use chrono::{DateTime, Utc};
use memory_graph_schemas::Memory;
use tracing::{debug, warn};

use crate::annotator::Annotator;
use crate::error::Result;
use crate::identity;
use crate::ledger::{EntityLedger, RelationshipLedger};
use crate::store::GraphStore;

/// Base importance of every memory.
const IMPORTANCE_BASE: f64 = 0.5;
/// Importance added per collected entity id, capped.
const ENTITY_DENSITY_WEIGHT: f64 = 0.1;
const ENTITY_DENSITY_CAP: f64 = 0.3;
/// Importance added per 1000 chars of content, capped.
const LENGTH_SCALE: f64 = 1000.0;
const LENGTH_CAP: f64 = 0.2;

/// Orchestrates one ingestion: annotator output flows through the entity
/// and relationship ledgers, then a Memory record is assembled and
/// persisted. Writes are best-effort; a failed sub-step is logged and its
/// effect dropped, never aborting the weave.
pub struct MemoryWeaver {
    annotator: Arc<dyn Annotator>,
    entities: EntityLedger,
    relationships: RelationshipLedger,
}

impl MemoryWeaver {
    pub fn new(annotator: Arc<dyn Annotator>) -> Self {
        Self {
            annotator,
            entities: EntityLedger::new(),
            relationships: RelationshipLedger::new(),
        }
    }

    /// Weave one fragment into the graph and return the Memory record
    /// built from whatever sub-steps succeeded.
    pub fn weave(
        &self,
        store: &GraphStore,
        content: &str,
        context_tags: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Memory> {
        // Entities first, in extraction order. Duplicate mentions append
        // their id again; each mention reinforces the ledger record.
        let candidates = self.annotator.extract_entities(content);
        let mut entity_ids = Vec::new();
        let mut entity_names = Vec::new();
        for candidate in &candidates {
            match self.entities.upsert(
                store,
                &candidate.name,
                &candidate.entity_type,
                &candidate.context,
                now,
            ) {
                Ok(id) => {
                    entity_ids.push(id);
                    entity_names.push(candidate.name.clone());
                }
                Err(e) => warn!("Dropping entity '{}' from weave: {}", candidate.name, e),
            }
        }

        let mut relationship_ids = Vec::new();
        for candidate in self
            .annotator
            .extract_relationships(content, &entity_names)
        {
            let source = identity::entity_id(&candidate.source);
            let target = identity::entity_id(&candidate.target);
            match self.relationships.upsert(
                store,
                &source,
                &target,
                &candidate.relation_type,
                &candidate.context,
                now,
            ) {
                Ok(id) => relationship_ids.push(id),
                Err(e) => warn!(
                    "Dropping relationship {} -[{}]-> {} from weave: {}",
                    candidate.source, candidate.relation_type, candidate.target, e
                ),
            }
        }

        let memory = Memory {
            id: identity::memory_id(content, now),
            content: content.to_string(),
            importance: memory_importance(content, entity_ids.len()),
            entities: entity_ids,
            relationships: relationship_ids,
            timestamp: now,
            context_tags,
        };

        if let Err(e) = store.insert_memory(&memory) {
            warn!("Memory {} not persisted: {}", memory.id, e);
        }

        debug!(
            "Wove memory {} ({} entities, {} relationships, importance {:.3})",
            memory.id,
            memory.entities.len(),
            memory.relationships.len(),
            memory.importance
        );
        Ok(memory)
    }
}

/// Memory importance: base plus a capped entity-density term and a capped
/// length term. Always in `[0.5, 1.0]`.
pub fn memory_importance(content: &str, entity_count: usize) -> f64 {
    let entity_boost = (ENTITY_DENSITY_WEIGHT * entity_count as f64).min(ENTITY_DENSITY_CAP);
    let length_boost = (content.chars().count() as f64 / LENGTH_SCALE).min(LENGTH_CAP);
    IMPORTANCE_BASE + entity_boost + length_boost
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use memory_graph_schemas::{EntityCandidate, RelationshipCandidate};

    /// Fixed-output annotator for exercising the weaver without pattern
    /// matching in the way.
    struct StubAnnotator {
        entities: Vec<EntityCandidate>,
        relationships: Vec<RelationshipCandidate>,
    }

    impl Annotator for StubAnnotator {
        fn extract_entities(&self, _text: &str) -> Vec<EntityCandidate> {
            self.entities.clone()
        }

        fn extract_relationships(
            &self,
            _text: &str,
            _known_entities: &[String],
        ) -> Vec<RelationshipCandidate> {
            self.relationships.clone()
        }

        fn similarity(&self, _a: &str, _b: &str) -> f64 {
            0.0
        }
    }

    fn candidate(name: &str) -> EntityCandidate {
        EntityCandidate {
            name: name.to_string(),
            entity_type: "CONCEPT".to_string(),
            context: format!("{} in context", name),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_importance_bounds_and_caps() {
        // Floor: no entities, empty content.
        assert_close(memory_importance("", 0), 0.5);

        // Entity term grows then caps at 0.3.
        assert_close(memory_importance("", 1), 0.6);
        assert_close(memory_importance("", 2), 0.7);
        assert_close(memory_importance("", 3), 0.8);
        assert_close(memory_importance("", 4), 0.8);
        assert_close(memory_importance("", 100), 0.8);

        // Length term grows then caps at 0.2.
        let short = "x".repeat(100);
        assert_close(memory_importance(&short, 0), 0.6);
        let long = "x".repeat(5000);
        assert_close(memory_importance(&long, 0), 0.7);

        // Ceiling.
        assert_close(memory_importance(&long, 100), 1.0);
    }

    #[test]
    fn test_weave_collects_ids_in_order_with_duplicates() {
        let store = GraphStore::in_memory().unwrap();
        let annotator = StubAnnotator {
            entities: vec![candidate("Google"), candidate("John"), candidate("Google")],
            relationships: vec![RelationshipCandidate {
                source: "John".to_string(),
                target: "Google".to_string(),
                relation_type: "WORKS_AT".to_string(),
                context: "John works at Google".to_string(),
            }],
        };
        let weaver = MemoryWeaver::new(Arc::new(annotator));

        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let memory = weaver
            .weave(&store, "John works at Google, Google again", vec![], now)
            .unwrap();

        // Extraction order preserved, duplicate Google kept.
        assert_eq!(memory.entities.len(), 3);
        assert_eq!(memory.entities[0], memory.entities[2]);
        assert_eq!(memory.entities[0], identity::entity_id("Google"));
        assert_eq!(memory.entities[1], identity::entity_id("John"));
        assert_eq!(memory.relationships.len(), 1);

        // The double mention reinforced the single Google record.
        let google = store
            .get_entity(&identity::entity_id("Google"))
            .unwrap()
            .unwrap();
        assert_eq!(google.access_count, 2);
        assert_eq!(store.stats().unwrap().entities, 2);

        // Memory was persisted.
        assert_eq!(store.stats().unwrap().memories, 1);
        // Duplicates count toward the density term: 0.5 + 0.3 + len/1000.
        assert!(memory.importance > 0.8 && memory.importance <= 1.0);
    }

    #[test]
    fn test_same_content_distinct_instants_distinct_memories() {
        let store = GraphStore::in_memory().unwrap();
        let annotator = StubAnnotator {
            entities: vec![],
            relationships: vec![],
        };
        let weaver = MemoryWeaver::new(Arc::new(annotator));

        let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 1).unwrap();
        let a = weaver.weave(&store, "same fragment", vec![], t1).unwrap();
        let b = weaver.weave(&store, "same fragment", vec![], t2).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.stats().unwrap().memories, 2);
    }
}
