use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use memory_graph_engine::{GraphError, MemoryGraph, DEFAULT_QUERY_LIMIT};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};

#[derive(Clone)]
struct AppState {
    graph: Arc<Mutex<MemoryGraph>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Memory Graph Engine v0.1.0");

    // Initialize database
    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/.local/share/memory-graph/graph.db", home)
    });

    // Create directory if it doesn't exist
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let graph = MemoryGraph::open(&db_path)?;
    info!("Graph database at: {}", db_path);

    let state = AppState {
        graph: Arc::new(Mutex::new(graph)),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/memories", post(add_memory))
        .route("/memories/query", get(query_memory))
        .route("/entities/:name/network", get(entity_network))
        .route("/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = "127.0.0.1:21961";
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "memory-graph",
        "status": "healthy",
        "version": "0.1.0"
    }))
}

#[derive(Debug, Deserialize)]
struct AddMemoryRequest {
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

async fn add_memory(
    State(state): State<AppState>,
    Json(request): Json<AddMemoryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut graph = state.graph.lock().await;
    let memory = graph
        .add_memory(&request.content, request.tags)
        .map_err(internal_error)?;

    info!(
        "Stored memory {} ({} entities, {} relationships)",
        memory.id,
        memory.entities.len(),
        memory.relationships.len()
    );

    Ok(Json(serde_json::json!({
        "memory_id": memory.id,
        "entities": memory.entities.len(),
        "relationships": memory.relationships.len(),
        "importance": memory.importance,
    })))
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    q: String,
    limit: Option<usize>,
}

async fn query_memory(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let graph = state.graph.lock().await;
    let results = graph
        .query_memory(&params.q, params.limit.unwrap_or(DEFAULT_QUERY_LIMIT))
        .map_err(internal_error)?;

    Ok(Json(results))
}

async fn entity_network(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let graph = state.graph.lock().await;
    let network = graph.explore_entity(&name).map_err(internal_error)?;

    Ok(Json(network))
}

async fn get_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let graph = state.graph.lock().await;
    let stats = graph.stats().map_err(internal_error)?;

    Ok(Json(stats))
}

fn internal_error(e: GraphError) -> (StatusCode, String) {
    error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
