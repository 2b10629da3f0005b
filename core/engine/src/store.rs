use chrono::{DateTime, Utc};
use memory_graph_schemas::{
    Entity, EntityId, EntityProperties, GraphStats, Memory, MemoryId, NetworkEdge, Relationship,
    RelationshipId,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{GraphError, Result};

/// Keyed SQLite store for entities, relationships, and memories.
///
/// The store holds no mutation policy: it offers keyed upsert, point
/// lookup, and the handful of ordered scans the engine needs. All
/// reinforcement and scoring decisions live in the ledgers and the
/// retriever.
pub struct GraphStore {
    conn: Connection,
    path: String,
}

impl GraphStore {
    /// Open (or create) a graph database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(&path)?;
        let store = Self {
            conn,
            path: path.as_ref().display().to_string(),
        };
        store.init_schema()?;
        info!("Graph store initialized at {}", store.path);
        Ok(store)
    }

    /// In-memory store, used by tests and throwaway sessions.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            path: ":memory:".to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                properties TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_accessed TEXT NOT NULL,
                access_count INTEGER NOT NULL DEFAULT 0,
                importance_score REAL NOT NULL DEFAULT 0.0
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS relationships (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                relation_type TEXT NOT NULL,
                strength REAL NOT NULL,
                context TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_reinforced TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS memories (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                entities TEXT NOT NULL,
                relationships TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                context_tags TEXT NOT NULL,
                importance REAL NOT NULL DEFAULT 0.0
            )",
            [],
        )?;

        // Indexes for performance
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entity_type ON entities(entity_type)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entity_name ON entities(name)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_relationship_source ON relationships(source_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_relationship_target ON relationships(target_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_memory_timestamp ON memories(timestamp DESC)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_memory_importance ON memories(importance DESC)",
            [],
        )?;

        debug!("Graph store schema initialized");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Keyed upsert: replaces the whole record for `entity.id`.
    pub fn put_entity(&self, entity: &Entity) -> Result<()> {
        let properties_json = serde_json::to_string(&entity.properties)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO entities
             (id, name, entity_type, properties, created_at, last_accessed, access_count, importance_score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entity.id.0,
                entity.name,
                entity.entity_type,
                properties_json,
                entity.created_at.to_rfc3339(),
                entity.last_accessed.to_rfc3339(),
                entity.access_count as i64,
                entity.importance_score,
            ],
        )?;

        Ok(())
    }

    pub fn get_entity(&self, id: &EntityId) -> Result<Option<Entity>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, entity_type, properties, created_at, last_accessed,
                        access_count, importance_score
                 FROM entities WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, f64>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((id_raw, name, entity_type, properties_json, created_at, last_accessed, access_count, importance_score)) = row
        else {
            return Ok(None);
        };

        let properties: EntityProperties =
            serde_json::from_str(&properties_json).map_err(|e| GraphError::MalformedRecord {
                table: "entities",
                id: id_raw.clone(),
                reason: e.to_string(),
            })?;

        Ok(Some(Entity {
            created_at: parse_timestamp("entities", &id_raw, &created_at)?,
            last_accessed: parse_timestamp("entities", &id_raw, &last_accessed)?,
            id: EntityId(id_raw),
            name,
            entity_type,
            properties,
            access_count: access_count.max(0) as u64,
            importance_score,
        }))
    }

    /// Case-insensitive fuzzy name scan: every entity whose name contains
    /// the chars of `name` in order (a superset of substring matching).
    /// Ordered by importance then name for deterministic resolution.
    pub fn entities_matching(&self, name: &str) -> Result<Vec<String>> {
        let pattern = subsequence_pattern(name);
        let mut stmt = self.conn.prepare(
            "SELECT name FROM entities
             WHERE LOWER(name) LIKE ?1 ESCAPE '\\'
             ORDER BY importance_score DESC, name ASC",
        )?;

        let names = stmt
            .query_map(params![pattern], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(names)
    }

    // ------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------

    pub fn put_relationship(&self, relationship: &Relationship) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO relationships
             (id, source_id, target_id, relation_type, strength, context, created_at, last_reinforced)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                relationship.id.0,
                relationship.source_id.0,
                relationship.target_id.0,
                relationship.relation_type,
                relationship.strength,
                relationship.context,
                relationship.created_at.to_rfc3339(),
                relationship.last_reinforced.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    pub fn get_relationship(&self, id: &RelationshipId) -> Result<Option<Relationship>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, source_id, target_id, relation_type, strength, context,
                        created_at, last_reinforced
                 FROM relationships WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((id_raw, source_id, target_id, relation_type, strength, context, created_at, last_reinforced)) = row
        else {
            return Ok(None);
        };

        Ok(Some(Relationship {
            created_at: parse_timestamp("relationships", &id_raw, &created_at)?,
            last_reinforced: parse_timestamp("relationships", &id_raw, &last_reinforced)?,
            id: RelationshipId(id_raw),
            source_id: EntityId(source_id),
            target_id: EntityId(target_id),
            relation_type,
            strength,
            context,
        }))
    }

    /// Direct relationships touching `id`, strongest first, with endpoint
    /// names resolved through the entity table. Edges whose endpoints are
    /// unknown never surface here.
    pub fn neighborhood(&self, id: &EntityId) -> Result<Vec<NetworkEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT e1.name, e2.name, r.relation_type, r.strength, r.context
             FROM relationships r
             JOIN entities e1 ON r.source_id = e1.id
             JOIN entities e2 ON r.target_id = e2.id
             WHERE r.source_id = ?1 OR r.target_id = ?1
             ORDER BY r.strength DESC",
        )?;

        let edges = stmt
            .query_map(params![id.0], |row| {
                Ok(NetworkEdge {
                    source: row.get(0)?,
                    target: row.get(1)?,
                    relation_type: row.get(2)?,
                    strength: row.get(3)?,
                    context: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(edges)
    }

    // ------------------------------------------------------------------
    // Memories
    // ------------------------------------------------------------------

    pub fn insert_memory(&self, memory: &Memory) -> Result<()> {
        let entities_json = serde_json::to_string(&memory.entities)?;
        let relationships_json = serde_json::to_string(&memory.relationships)?;
        let tags_json = serde_json::to_string(&memory.context_tags)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO memories
             (id, content, entities, relationships, timestamp, context_tags, importance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                memory.id.0,
                memory.content,
                entities_json,
                relationships_json,
                memory.timestamp.to_rfc3339(),
                tags_json,
                memory.importance,
            ],
        )?;

        debug!("Inserted memory: {}", memory.id);
        Ok(())
    }

    /// Full scan, ordered by (importance DESC, timestamp DESC). Malformed
    /// rows are skipped with a warning; a bad record never aborts the scan.
    pub fn scan_memories(&self) -> Result<Vec<Memory>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, entities, relationships, timestamp, context_tags, importance
             FROM memories
             ORDER BY importance DESC, timestamp DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, f64>(6)?,
            ))
        })?;

        let mut memories = Vec::new();
        for row in rows {
            let raw = row?;
            match decode_memory(raw) {
                Ok(memory) => memories.push(memory),
                Err(e) => warn!("Skipping malformed memory row: {}", e),
            }
        }

        Ok(memories)
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    pub fn stats(&self) -> Result<GraphStats> {
        let entities: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        let relationships: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        let memories: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;

        Ok(GraphStats {
            entities: entities.max(0) as u64,
            relationships: relationships.max(0) as u64,
            memories: memories.max(0) as u64,
            storage_path: self.path.clone(),
        })
    }
}

type RawMemoryRow = (String, String, String, String, String, String, f64);

fn decode_memory(raw: RawMemoryRow) -> Result<Memory> {
    let (id_raw, content, entities_json, relationships_json, timestamp, tags_json, importance) =
        raw;

    let entities: Vec<EntityId> =
        serde_json::from_str(&entities_json).map_err(|e| malformed("memories", &id_raw, e))?;
    let relationships: Vec<RelationshipId> = serde_json::from_str(&relationships_json)
        .map_err(|e| malformed("memories", &id_raw, e))?;
    let context_tags: Vec<String> =
        serde_json::from_str(&tags_json).map_err(|e| malformed("memories", &id_raw, e))?;

    Ok(Memory {
        timestamp: parse_timestamp("memories", &id_raw, &timestamp)?,
        id: MemoryId(id_raw),
        content,
        entities,
        relationships,
        context_tags,
        importance,
    })
}

fn malformed(table: &'static str, id: &str, e: impl std::fmt::Display) -> GraphError {
    GraphError::MalformedRecord {
        table,
        id: id.to_string(),
        reason: e.to_string(),
    }
}

fn parse_timestamp(table: &'static str, id: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| malformed(table, id, e))
}

/// LIKE pattern matching `name`'s chars as an in-order subsequence,
/// lower-cased, with LIKE metacharacters escaped.
fn subsequence_pattern(name: &str) -> String {
    let mut pattern = String::from("%");
    for ch in name.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
        pattern.push('%');
    }
    pattern
}
