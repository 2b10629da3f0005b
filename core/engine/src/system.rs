use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use memory_graph_schemas::{EntityNetwork, GraphStats, Memory, ScoredMemory};

use crate::annotator::{Annotator, PatternAnnotator};
use crate::error::Result;
use crate::retriever::Retriever;
use crate::store::GraphStore;
use crate::weaver::MemoryWeaver;

/// Default result count for relevance queries.
pub const DEFAULT_QUERY_LIMIT: usize = 10;
/// Default (and currently only effective) network traversal depth.
pub const DEFAULT_NETWORK_DEPTH: usize = 2;

/// The assembled engine: one store, one annotator, weaving and retrieval
/// on top. Writes take `&mut self`, which keeps the engine single-writer
/// by construction; concurrent callers serialize around it.
pub struct MemoryGraph {
    store: GraphStore,
    weaver: MemoryWeaver,
    retriever: Retriever,
}

impl MemoryGraph {
    /// Open (or create) a graph at `path` with the bundled pattern
    /// annotator.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::assemble(
            GraphStore::open(path)?,
            Arc::new(PatternAnnotator::new()),
        ))
    }

    /// In-memory graph with the bundled pattern annotator.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::assemble(
            GraphStore::in_memory()?,
            Arc::new(PatternAnnotator::new()),
        ))
    }

    /// Assemble the engine around an existing store and a custom
    /// annotator implementation.
    pub fn assemble(store: GraphStore, annotator: Arc<dyn Annotator>) -> Self {
        Self {
            store,
            weaver: MemoryWeaver::new(annotator.clone()),
            retriever: Retriever::new(annotator),
        }
    }

    /// Ingest one fragment: extract, reinforce the graph, persist a
    /// Memory record, and return it.
    pub fn add_memory(&mut self, content: &str, context_tags: Vec<String>) -> Result<Memory> {
        self.weaver
            .weave(&self.store, content, context_tags, Utc::now())
    }

    /// Rank stored memories against `query`.
    pub fn query_memory(&self, query: &str, limit: usize) -> Result<Vec<ScoredMemory>> {
        self.retriever.find_related(&self.store, query, limit)
    }

    /// Local connectivity view around a named entity.
    pub fn explore_entity(&self, name: &str) -> Result<EntityNetwork> {
        self.retriever
            .entity_network(&self.store, name, DEFAULT_NETWORK_DEPTH)
    }

    /// Aggregate counts over the stored graph.
    pub fn stats(&self) -> Result<GraphStats> {
        self.store.stats()
    }
}
