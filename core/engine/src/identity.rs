//! Deterministic, content-addressed identifiers.
//!
//! Entities and relationships are deduplicated facts, so their ids are
//! pure functions of their identity content. Memories are append-only
//! events, so the ingestion instant is folded into theirs.

use chrono::{DateTime, Utc};
use memory_graph_schemas::{EntityId, MemoryId, RelationshipId};
use sha2::{Digest, Sha256};

/// Hex length of every identifier. Truncation trades collision resistance
/// for compactness; acceptable at embedded-graph scale.
const ID_LEN: usize = 12;

fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let mut encoded = hex::encode(hasher.finalize());
    encoded.truncate(ID_LEN);
    encoded
}

/// Identifier for an entity, stable across mentions regardless of case.
pub fn entity_id(name: &str) -> EntityId {
    EntityId(digest(&name.to_lowercase()))
}

/// Identifier for a typed edge. The same (source, target, type) triple
/// always maps to the same record.
pub fn relationship_id(
    source: &EntityId,
    target: &EntityId,
    relation_type: &str,
) -> RelationshipId {
    RelationshipId(digest(&format!("{}_{}_{}", source, target, relation_type)))
}

/// Identifier for a memory. Identical content ingested at different
/// instants yields distinct records; memories are events, not facts.
pub fn memory_id(content: &str, now: DateTime<Utc>) -> MemoryId {
    MemoryId(digest(&format!("{}{}", content, now.to_rfc3339())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entity_id_deterministic_and_case_insensitive() {
        assert_eq!(entity_id("Google"), entity_id("Google"));
        assert_eq!(entity_id("Google"), entity_id("google"));
        assert_eq!(entity_id("GOOGLE"), entity_id("gOoGlE"));
        assert_ne!(entity_id("Google"), entity_id("Googles"));
        assert_eq!(entity_id("Google").0.len(), 12);
    }

    #[test]
    fn test_relationship_id_is_function_of_triple() {
        let john = entity_id("John");
        let google = entity_id("Google");

        let a = relationship_id(&john, &google, "WORKS_AT");
        let b = relationship_id(&john, &google, "WORKS_AT");
        assert_eq!(a, b);

        // Direction and type both matter.
        assert_ne!(a, relationship_id(&google, &john, "WORKS_AT"));
        assert_ne!(a, relationship_id(&john, &google, "CREATED"));
    }

    #[test]
    fn test_memory_id_varies_with_instant() {
        let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 1).unwrap();

        assert_eq!(memory_id("same content", t1), memory_id("same content", t1));
        assert_ne!(memory_id("same content", t1), memory_id("same content", t2));
    }
}
