use crate::error::{FmexportError, Result};
use crate::lastfm::Snapshot;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tokio::task;

/// SQLite-backed snapshot store.
///
/// One row per artist, keyed by the exact artist name (identity key
/// derivation: names are already unique within the service's namespace).
/// Writes are create-or-overwrite, so re-running a persist task for the
/// same artist and the same remote state is idempotent.
pub struct ArtistStore {
    path: std::path::PathBuf,
}

impl ArtistStore {
    /// Create a new store handle for the database at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Execute a closure with a database connection in a blocking task
    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let mut conn = Connection::open(&path).map_err(FmexportError::Database)?;

            // WAL so pool workers writing concurrently don't serialize on
            // the journal; NORMAL sync is enough for a re-creatable export.
            conn.execute_batch(
                "PRAGMA journal_mode = WAL; \
                 PRAGMA synchronous = NORMAL; \
                 PRAGMA temp_store = MEMORY; \
                 PRAGMA busy_timeout = 5000;",
            )?;

            f(&mut conn)
        })
        .await
        .map_err(|e| FmexportError::Store(format!("store task failed: {}", e)))?
    }

    /// Create the artists table if it does not exist.
    pub async fn init_schema(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS artists (
                    name TEXT PRIMARY KEY,
                    snapshot TEXT NOT NULL,
                    fetched_at TEXT NOT NULL
                )",
                [],
            )?;
            Ok(())
        })
        .await
    }

    /// Write the snapshot for `name`, overwriting any existing row.
    pub async fn put_snapshot(&self, name: &str, snapshot: &Snapshot) -> Result<()> {
        let name = name.to_string();
        let snapshot = snapshot.clone();
        let fetched_at = Utc::now().to_rfc3339();

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO artists (name, snapshot, fetched_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET
                     snapshot = excluded.snapshot,
                     fetched_at = excluded.fetched_at",
                params![name, snapshot, fetched_at],
            )?;
            Ok(())
        })
        .await
    }

    /// Fetch the stored snapshot for `name`, if any.
    pub async fn get_snapshot(&self, name: &str) -> Result<Option<Snapshot>> {
        let name = name.to_string();
        self.with_connection(move |conn| {
            let snapshot = conn
                .query_row(
                    "SELECT snapshot FROM artists WHERE name = ?1",
                    params![name],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(snapshot)
        })
        .await
    }

    /// Number of artists persisted so far.
    pub async fn count(&self) -> Result<usize> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM artists", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}
