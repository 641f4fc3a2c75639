//! Document persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Load a whole document snapshot into a `Store`.
//! - Replace the persisted snapshot with a `Store` in one transaction.
//!
//! # Invariants
//! - Save is all-or-nothing; a failed save leaves the previous snapshot.
//! - Load rejects invalid persisted state instead of masking it.
//! - An empty database loads as a fresh store holding only a root.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::graph::{GraphError, Store};
use crate::model::edge::Edge;
use crate::model::node::Node;
use log::{error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Result type used by document persistence operations.
pub type DocumentRepoResult<T> = Result<T, DocumentRepoError>;

/// Errors from document persistence operations.
#[derive(Debug)]
pub enum DocumentRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted into a valid model.
    InvalidData(String),
    /// Persisted rows violate graph invariants.
    Graph(GraphError),
}

impl Display for DocumentRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid document data: {message}"),
            Self::Graph(err) => write!(f, "invalid document graph: {err}"),
        }
    }
}

impl Error for DocumentRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Graph(err) => Some(err),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for DocumentRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DocumentRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<GraphError> for DocumentRepoError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

/// Persistence layer for whole-document snapshots.
pub trait DocumentRepository {
    /// Loads the last saved snapshot.
    fn load(&self) -> DocumentRepoResult<Store>;
    /// Replaces the saved snapshot with `store`.
    fn save(&self, store: &Store) -> DocumentRepoResult<()>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> DocumentRepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn load(&self) -> DocumentRepoResult<Store> {
        let started_at = Instant::now();

        let mut stmt = self.conn.prepare(
            "SELECT node_uuid, title, notes, created_at, completed_at, is_root
             FROM nodes;",
        )?;
        let mut rows = stmt.query([])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        if nodes.is_empty() {
            info!("event=document_load module=repo status=ok nodes=0 fresh=true");
            return Ok(Store::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT parent_uuid, child_uuid, priority, seq
             FROM edges
             ORDER BY parent_uuid ASC, seq ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(parse_edge_row(row)?);
        }

        let node_count = nodes.len();
        let edge_count = edges.len();
        let store = Store::from_parts(nodes, edges).map_err(|err| {
            error!("event=document_load module=repo status=error error_code=invalid_graph error={err}");
            DocumentRepoError::from(err)
        })?;
        info!(
            "event=document_load module=repo status=ok nodes={node_count} edges={edge_count} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(store)
    }

    fn save(&self, store: &Store) -> DocumentRepoResult<()> {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM edges;", [])?;
        tx.execute("DELETE FROM nodes;", [])?;

        {
            let mut insert_node = tx.prepare(
                "INSERT INTO nodes (node_uuid, title, notes, created_at, completed_at, is_root)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            )?;
            for node in store.nodes() {
                insert_node.execute(params![
                    node.id.to_string(),
                    node.title.as_str(),
                    node.notes.as_str(),
                    node.created_at,
                    node.completed_at,
                    i64::from(node.is_root),
                ])?;
            }

            let mut insert_edge = tx.prepare(
                "INSERT INTO edges (parent_uuid, child_uuid, priority, seq)
                 VALUES (?1, ?2, ?3, ?4);",
            )?;
            for edge in store.edges() {
                let seq = i64::try_from(edge.seq).map_err(|_| {
                    DocumentRepoError::InvalidData(format!("edge seq {} exceeds i64", edge.seq))
                })?;
                insert_edge.execute(params![
                    edge.parent.to_string(),
                    edge.child.to_string(),
                    edge.priority,
                    seq,
                ])?;
            }
        }

        tx.commit()?;
        info!(
            "event=document_save module=repo status=ok nodes={} edges={} duration_ms={}",
            store.node_count(),
            store.edge_count(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn parse_node_row(row: &Row<'_>) -> DocumentRepoResult<Node> {
    let id_text: String = row.get("node_uuid")?;
    let is_root = match row.get::<_, i64>("is_root")? {
        0 => false,
        1 => true,
        other => {
            return Err(DocumentRepoError::InvalidData(format!(
                "invalid is_root value `{other}` in nodes.is_root"
            )));
        }
    };
    Ok(Node {
        id: parse_uuid(&id_text, "nodes.node_uuid")?,
        title: row.get("title")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        completed_at: row.get("completed_at")?,
        is_root,
    })
}

fn parse_edge_row(row: &Row<'_>) -> DocumentRepoResult<Edge> {
    let parent_text: String = row.get("parent_uuid")?;
    let child_text: String = row.get("child_uuid")?;
    let seq: i64 = row.get("seq")?;
    let seq = u64::try_from(seq)
        .map_err(|_| DocumentRepoError::InvalidData(format!("negative seq `{seq}` in edges.seq")))?;
    Ok(Edge {
        parent: parse_uuid(&parent_text, "edges.parent_uuid")?,
        child: parse_uuid(&child_text, "edges.child_uuid")?,
        priority: row.get("priority")?,
        seq,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> DocumentRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| DocumentRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_connection_ready(conn: &Connection) -> DocumentRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(DocumentRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["nodes", "edges"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(DocumentRepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
