use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ID Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Well-Known Tags
// ============================================================================

/// Entity type tags the bundled annotator emits. The tag set is open:
/// any string is a valid `entity_type`, these are just the common ones.
pub mod tags {
    pub const PERSON: &str = "PERSON";
    pub const ORGANIZATION: &str = "ORGANIZATION";
    pub const LOCATION: &str = "LOCATION";
    pub const TECH: &str = "TECH";
    pub const CONCEPT: &str = "CONCEPT";
}

/// Relation type tags the bundled annotator emits. Open set, same as
/// [`tags`].
pub mod relations {
    pub const WORKS_AT: &str = "WORKS_AT";
    pub const LOCATED_IN: &str = "LOCATED_IN";
    pub const CREATED: &str = "CREATED";
    pub const USES: &str = "USES";
    pub const SPECIALIZES_IN: &str = "SPECIALIZES_IN";
    pub const RELATES_TO: &str = "RELATES_TO";
}

// ============================================================================
// Entity Schema
// ============================================================================

/// A deduplicated named concept node in the graph. Exactly one entity
/// exists per distinct lower-cased name; repeat mentions reinforce the
/// record in place instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub entity_type: String,
    pub properties: EntityProperties,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
    pub importance_score: f64,
}

/// Open property mapping attached to an entity. `contexts` accumulates the
/// textual window around each observed mention; everything else rides in
/// the flattened `extra` map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityProperties {
    #[serde(default)]
    pub contexts: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Relationship Schema
// ============================================================================

/// A directed, typed edge between two entities. At most one relationship
/// exists per (source, target, relation_type) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub relation_type: String,
    pub strength: f64,
    pub context: String,
    pub created_at: DateTime<Utc>,
    pub last_reinforced: DateTime<Utc>,
}

// ============================================================================
// Memory Schema
// ============================================================================

/// An immutable record of one ingested text fragment and the graph
/// elements it touched. `entities` and `relationships` are in extraction
/// order; duplicate mentions appear more than once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,
    pub content: String,
    pub entities: Vec<EntityId>,
    pub relationships: Vec<RelationshipId>,
    pub timestamp: DateTime<Utc>,
    pub context_tags: Vec<String>,
    pub importance: f64,
}

// ============================================================================
// Annotation Candidates
// ============================================================================

/// Entity candidate produced by an annotator: a name, a type tag, and the
/// textual window the mention was seen in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCandidate {
    pub name: String,
    pub entity_type: String,
    pub context: String,
}

/// Relationship candidate produced by an annotator. Source and target are
/// raw names, resolved to ids by the weaver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipCandidate {
    pub source: String,
    pub target: String,
    pub relation_type: String,
    pub context: String,
}

// ============================================================================
// Query & Network Views
// ============================================================================

/// A memory scored against a relevance query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMemory {
    pub id: MemoryId,
    pub content: String,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
    pub importance: f64,
}

/// One edge of an entity network, with endpoint names resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source: String,
    pub target: String,
    pub relation_type: String,
    pub strength: f64,
    pub context: String,
}

/// The local connectivity view around a named entity: its direct
/// relationships ordered by strength, plus the distinct set of entity
/// names they touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityNetwork {
    pub center_entity: String,
    pub relationships: Vec<NetworkEdge>,
    pub connected_entities: Vec<String>,
}

impl EntityNetwork {
    /// A network with no edges, centered on `name`. Unknown entities
    /// resolve to this rather than an error.
    pub fn empty(name: &str) -> Self {
        Self {
            center_entity: name.to_string(),
            relationships: Vec::new(),
            connected_entities: Vec::new(),
        }
    }
}

/// Aggregate counts over the stored graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub entities: u64,
    pub relationships: u64,
    pub memories: u64,
    pub storage_path: String,
}
