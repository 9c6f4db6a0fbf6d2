//! Oto DB: SQLite behind the relational binding.
//!
//! One long-lived connection in WAL mode, queried through
//! `spawn_blocking` so driver work never stalls the server's reactor.
//! The handle survives [`SqliteBinding::close`]: later queries fail with
//! [`QueryError::Closed`] instead of panicking, which keeps in-flight
//! requests well-behaved during shutdown.

mod convert;

use async_trait::async_trait;
use oto_env::{QueryError, RelationalBinding, Row};
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub use convert::{json_column, sql_param};

/// SQLite-backed [`RelationalBinding`]. Cheap to clone; clones share the
/// connection.
#[derive(Clone)]
pub struct SqliteBinding {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteBinding {
    /// Open the database at `path` and switch it to WAL journaling.
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        info!("database open: {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// In-memory database, for tests and scratch work.
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    /// Release the connection. Idempotent; a close failure is logged and
    /// the handle is considered closed either way.
    pub fn close(&self) {
        let conn = self.conn.lock().unwrap().take();
        if let Some(conn) = conn {
            if let Err((_, err)) = conn.close() {
                warn!("closing database: {err}");
            }
            info!("database closed");
        }
    }
}

#[async_trait]
impl RelationalBinding for SqliteBinding {
    async fn query(&self, text: &str, params: &[Value]) -> Result<Vec<Row>, QueryError> {
        let conn = Arc::clone(&self.conn);
        let text = text.to_owned();
        let params = params.to_vec();
        tokio::task::spawn_blocking(move || run_query(&conn, &text, &params))
            .await
            .map_err(|e| QueryError::Failed(format!("worker thread: {e}")))?
    }
}

fn run_query(
    conn: &Mutex<Option<Connection>>,
    text: &str,
    params: &[Value],
) -> Result<Vec<Row>, QueryError> {
    let bound = params
        .iter()
        .map(convert::sql_param)
        .collect::<Result<Vec<_>, _>>()?;

    let guard = conn.lock().unwrap();
    let conn = guard.as_ref().ok_or(QueryError::Closed)?;

    let mut stmt = conn.prepare(text).map_err(driver_error)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();

    let mut rows = stmt
        .query(rusqlite::params_from_iter(bound))
        .map_err(driver_error)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(driver_error)? {
        let mut record = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            let value = row.get_ref(idx).map_err(driver_error)?;
            record.insert(name.clone(), convert::json_column(value));
        }
        out.push(record);
    }
    Ok(out)
}

fn driver_error(err: rusqlite::Error) -> QueryError {
    QueryError::Failed(err.to_string())
}
