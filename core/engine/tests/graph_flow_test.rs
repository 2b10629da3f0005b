//! End-to-end flows over a real on-disk database: weave fragments, then
//! verify reinforcement, deduplication, ranking, and network fallback
//! through the public engine surface.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use memory_graph_engine::{
    identity, GraphStore, MemoryGraph, MemoryWeaver, PatternAnnotator, Retriever, RELEVANCE_FLOOR,
};
use tempfile::tempdir;

fn engine_parts() -> (GraphStore, MemoryWeaver, Retriever) {
    let store = GraphStore::in_memory().unwrap();
    let annotator = Arc::new(PatternAnnotator::new());
    let weaver = MemoryWeaver::new(annotator.clone());
    let retriever = Retriever::new(annotator);
    (store, weaver, retriever)
}

#[test]
fn repeat_mentions_reinforce_without_duplicates() {
    let (store, weaver, retriever) = engine_parts();
    let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap();

    weaver
        .weave(&store, "John works at Google.", vec![], t1)
        .unwrap();
    weaver
        .weave(
            &store,
            "John works at Google and leads AI research.",
            vec![],
            t2,
        )
        .unwrap();

    // One John, one Google, each mentioned twice.
    let john = store
        .get_entity(&identity::entity_id("John"))
        .unwrap()
        .unwrap();
    assert_eq!(john.access_count, 2);
    assert!(john.importance_score > 0.5);
    assert_eq!(john.last_accessed, t2);

    let google = store
        .get_entity(&identity::entity_id("Google"))
        .unwrap()
        .unwrap();
    assert_eq!(google.access_count, 2);

    // Exactly one WORKS_AT edge between them, reinforced not duplicated.
    let edge_id = identity::relationship_id(&john.id, &google.id, "WORKS_AT");
    let edge = store.get_relationship(&edge_id).unwrap().unwrap();
    assert_eq!(edge.last_reinforced, t2);
    assert_eq!(edge.created_at, t1);

    let network = retriever.entity_network(&store, "John", 2).unwrap();
    let works_at: Vec<_> = network
        .relationships
        .iter()
        .filter(|e| e.relation_type == "WORKS_AT")
        .collect();
    assert_eq!(works_at.len(), 1);
    assert_eq!(works_at[0].source, "John");
    assert_eq!(works_at[0].target, "Google");
}

#[test]
fn approximate_name_falls_back_to_real_entity() {
    let (store, weaver, retriever) = engine_parts();
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();

    weaver
        .weave(&store, "John works at Google.", vec![], now)
        .unwrap();

    // "Jon" resolves nothing directly; fuzzy resolution lands on "John".
    let network = retriever.entity_network(&store, "Jon", 2).unwrap();
    assert_eq!(network.center_entity, "John");
    assert!(!network.relationships.is_empty());
    assert!(network.connected_entities.contains(&"Google".to_string()));
}

#[test]
fn unknown_entity_yields_empty_network() {
    let (store, weaver, retriever) = engine_parts();
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();

    weaver
        .weave(&store, "John works at Google.", vec![], now)
        .unwrap();

    let network = retriever
        .entity_network(&store, "Nonexistent", 2)
        .unwrap();
    assert_eq!(network.center_entity, "Nonexistent");
    assert!(network.relationships.is_empty());
    assert!(network.connected_entities.is_empty());
}

#[test]
fn woven_importance_stays_in_bounds() {
    let (store, weaver, _) = engine_parts();
    let fragments = [
        "".to_string(),
        "short".to_string(),
        "John works at Google and specializes in AI research.".to_string(),
        "x".repeat(3000),
    ];

    for (i, fragment) in fragments.iter().enumerate() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, i as u32).unwrap();
        let memory = weaver.weave(&store, fragment, vec![], now).unwrap();
        assert!(
            memory.importance >= 0.5 - 1e-9 && memory.importance <= 1.0 + 1e-9,
            "importance {} out of bounds for fragment {}",
            memory.importance,
            i
        );
    }
}

#[test]
fn no_overlap_query_returns_nothing_over_full_graph() {
    let dir = tempdir().unwrap();
    let mut graph = MemoryGraph::open(dir.path().join("graph.db")).unwrap();

    let fragments = [
        "John works at Google and specializes in AI research. He created a new machine learning algorithm.",
        "The AI algorithm that John developed uses Python and TensorFlow for neural network training.",
        "Google's AI research division is located in Mountain View, California.",
        "TensorFlow is a popular machine learning framework created by Google.",
        "Python is widely used for AI development and data science projects.",
    ];
    for (i, fragment) in fragments.iter().enumerate() {
        graph
            .add_memory(fragment, vec![format!("demo_tag_{}", i + 1)])
            .unwrap();
    }

    let stats = graph.stats().unwrap();
    assert_eq!(stats.memories, 5);
    assert!(stats.entities > 0);
    assert!(stats.relationships > 0);

    // With zero similarity and no query entities, importance alone can
    // contribute at most 0.1, which never clears the strict floor.
    let results = graph.query_memory("zzz_no_overlap_query", 5).unwrap();
    assert!(results.is_empty());
}

#[test]
fn relevant_query_ranks_and_respects_floor_and_limit() {
    let dir = tempdir().unwrap();
    let mut graph = MemoryGraph::open(dir.path().join("graph.db")).unwrap();

    graph
        .add_memory("John works at Google and specializes in AI research.", vec![])
        .unwrap();
    graph
        .add_memory("Python is widely used for AI development.", vec![])
        .unwrap();
    graph
        .add_memory("completely unrelated gardening notes", vec![])
        .unwrap();

    let results = graph
        .query_memory("who works at Google on AI research", 2)
        .unwrap();
    assert!(!results.is_empty());
    assert!(results.len() <= 2);
    assert!(results.iter().all(|m| m.score > RELEVANCE_FLOOR));

    // Descending by score, best match first.
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!(results[0].content.contains("John works at Google"));
}

#[test]
fn graph_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.db");

    {
        let mut graph = MemoryGraph::open(&path).unwrap();
        graph
            .add_memory("John works at Google.", vec!["session_1".to_string()])
            .unwrap();
    }

    let graph = MemoryGraph::open(&path).unwrap();
    let stats = graph.stats().unwrap();
    assert_eq!(stats.memories, 1);

    let network = graph.explore_entity("John").unwrap();
    assert!(!network.relationships.is_empty());
}
