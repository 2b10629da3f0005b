//! Contextual memory graph engine.
//!
//! Ingests short text fragments, extracts entities and relationships, and
//! persists both alongside the fragment as a "memory", building an
//! incrementally reinforced knowledge graph. Supports relevance queries
//! over stored memories and entity-network exploration with fuzzy
//! fallback resolution.

pub mod annotator;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod retriever;
pub mod store;
pub mod system;
pub mod weaver;

pub use annotator::{Annotator, PatternAnnotator};
pub use error::{GraphError, Result};
pub use ledger::{EntityLedger, RelationshipLedger};
pub use retriever::{Retriever, RELEVANCE_FLOOR};
pub use store::GraphStore;
pub use system::{MemoryGraph, DEFAULT_NETWORK_DEPTH, DEFAULT_QUERY_LIMIT};
pub use weaver::{memory_importance, MemoryWeaver};
