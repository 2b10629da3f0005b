use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use memory_graph_schemas::{EntityNetwork, ScoredMemory};
use tracing::debug;

use crate::annotator::Annotator;
use crate::error::Result;
use crate::identity;
use crate::store::GraphStore;

/// Memories scoring at or below this are never returned.
pub const RELEVANCE_FLOOR: f64 = 0.1;
/// Flat boost applied when both the query and the memory carry entities.
/// A coarse boolean signal, not a true overlap measure.
const ENTITY_OVERLAP_BOOST: f64 = 0.2;
/// Weight of stored memory importance in the relevance score.
const IMPORTANCE_WEIGHT: f64 = 0.1;

/// Read side of the engine: relevance ranking over stored memories and
/// entity-network traversal with fuzzy fallback resolution. All outputs
/// are best-effort views, never authoritative.
pub struct Retriever {
    annotator: Arc<dyn Annotator>,
}

impl Retriever {
    pub fn new(annotator: Arc<dyn Annotator>) -> Self {
        Self { annotator }
    }

    /// Score every stored memory against `query` and return the top
    /// `limit` above the relevance floor. An empty result is not an error.
    pub fn find_related(
        &self,
        store: &GraphStore,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        let memories = store.scan_memories()?;
        let query_has_entities = !self.annotator.extract_entities(query).is_empty();

        let mut scored = Vec::new();
        for memory in memories {
            let content_similarity = self.annotator.similarity(query, &memory.content);
            let entity_boost = if query_has_entities && !memory.entities.is_empty() {
                ENTITY_OVERLAP_BOOST
            } else {
                0.0
            };
            let score = content_similarity + entity_boost + memory.importance * IMPORTANCE_WEIGHT;

            if score > RELEVANCE_FLOOR {
                scored.push(ScoredMemory {
                    id: memory.id,
                    content: memory.content,
                    score,
                    timestamp: memory.timestamp,
                    importance: memory.importance,
                });
            }
        }

        // Scan order is (importance desc, timestamp desc) and the sort is
        // stable, so that ordering breaks score ties.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        debug!("Query matched {} memories", scored.len());
        Ok(scored)
    }

    /// Direct relationships around `entity_name`, strongest first. When
    /// the name resolves to nothing, falls back to fuzzy name resolution
    /// over stored entities and retries, bounded by a visited-name set.
    ///
    /// `depth` is accepted for forward compatibility; traversal is
    /// single-hop.
    pub fn entity_network(
        &self,
        store: &GraphStore,
        entity_name: &str,
        depth: usize,
    ) -> Result<EntityNetwork> {
        debug!("Building entity network for '{}' (depth {})", entity_name, depth);
        let mut attempted = HashSet::new();
        self.resolve_network(store, entity_name, &mut attempted)
    }

    fn resolve_network(
        &self,
        store: &GraphStore,
        entity_name: &str,
        attempted: &mut HashSet<String>,
    ) -> Result<EntityNetwork> {
        attempted.insert(entity_name.to_lowercase());

        let id = identity::entity_id(entity_name);
        let edges = store.neighborhood(&id)?;

        if edges.is_empty() {
            debug!(
                "No direct relationships for '{}', trying fuzzy resolution",
                entity_name
            );
            let matches = store.entities_matching(entity_name)?;
            if let Some(first) = matches.first() {
                if !attempted.contains(&first.to_lowercase()) {
                    return self.resolve_network(store, first, attempted);
                }
            }
            return Ok(EntityNetwork::empty(entity_name));
        }

        let mut connected = Vec::new();
        let mut seen = HashSet::new();
        for edge in &edges {
            for name in [&edge.source, &edge.target] {
                if seen.insert(name.clone()) {
                    connected.push(name.clone());
                }
            }
        }

        Ok(EntityNetwork {
            center_entity: entity_name.to_string(),
            relationships: edges,
            connected_entities: connected,
        })
    }
}
