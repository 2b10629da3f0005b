/// Demo seeding tool - populates a graph database with sample fragments
/// and walks through relevance queries and entity networks.
///
/// Usage:
///   cargo run --bin demo [--db-path <path>]
use anyhow::Result;
use clap::Parser;
use memory_graph_engine::MemoryGraph;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "demo")]
#[command(about = "Seed a memory graph with sample fragments and explore it")]
struct Args {
    /// Path to SQLite database file
    #[arg(long, short)]
    db_path: Option<PathBuf>,
}

const SAMPLE_FRAGMENTS: &[&str] = &[
    "John works at Google and specializes in AI research. He created a new machine learning algorithm.",
    "The AI algorithm that John developed uses Python and TensorFlow for neural network training.",
    "Google's AI research division is located in Mountain View, California.",
    "TensorFlow is a popular machine learning framework created by Google.",
    "Python is widely used for AI development and data science projects.",
];

const SAMPLE_QUERIES: &[&str] = &[
    "Tell me about John",
    "What programming languages are used for AI?",
    "Where is Google located?",
    "Machine learning algorithms",
];

const SAMPLE_ENTITIES: &[&str] = &["John", "Google", "Python", "TensorFlow"];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_target(false)
        .init();

    let args = Args::parse();
    let db_path = args
        .db_path
        .unwrap_or_else(|| PathBuf::from("demo_knowledge.db"));

    println!("=== Contextual Memory Graph Demo ===");
    println!("Database: {}\n", db_path.display());

    let mut graph = MemoryGraph::open(&db_path)?;

    println!("Adding sample memories...");
    for (i, fragment) in SAMPLE_FRAGMENTS.iter().enumerate() {
        let memory = graph.add_memory(fragment, vec![format!("demo_tag_{}", i + 1)])?;
        println!("{}. Memory stored with ID: {}", i + 1, memory.id);
    }

    let stats = graph.stats()?;
    println!(
        "\nGraph stats: {} entities, {} relationships, {} memories",
        stats.entities, stats.relationships, stats.memories
    );

    println!("\n=== Query Testing ===");
    for query in SAMPLE_QUERIES {
        println!("\nQuery: '{}'", query);
        let results = graph.query_memory(query, 3)?;

        if results.is_empty() {
            println!("  No relevant memories found.");
        }
        for (i, result) in results.iter().enumerate() {
            let preview: String = result.content.chars().take(80).collect();
            println!("  {}. [score {:.3}] {}...", i + 1, result.score, preview);
        }
    }

    println!("\n=== Entity Network Exploration ===");
    for name in SAMPLE_ENTITIES {
        let network = graph.explore_entity(name)?;
        println!(
            "\nNetwork for '{}': {} connected entities",
            name,
            network.connected_entities.len()
        );
        if network.relationships.is_empty() {
            println!("  No relationships found");
        }
        for edge in &network.relationships {
            println!(
                "  {} --[{}]--> {} (strength {:.1})",
                edge.source, edge.relation_type, edge.target, edge.strength
            );
        }
    }

    Ok(())
}
