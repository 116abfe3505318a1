use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use vigil_core::{VigilError, VigilResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trusted_addresses (
    address TEXT PRIMARY KEY,
    added_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Addresses the user has marked safe, keyed lowercase. A trusted target
/// short-circuits the whole intercept pipeline.
pub struct TrustStore {
    conn: Arc<Mutex<Connection>>,
}

impl TrustStore {
    pub fn open(path: &str) -> VigilResult<Self> {
        let conn = Connection::open(path).map_err(|e| VigilError::Database(e.to_string()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> VigilResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| VigilError::Database(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> VigilResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| VigilError::Database(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> VigilResult<T>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VigilError::Database(e.to_string()))?;
        f(&conn).map_err(|e| VigilError::Database(e.to_string()))
    }

    pub fn is_trusted(&self, address: &str) -> VigilResult<bool> {
        let lowered = address.to_lowercase();
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT 1 FROM trusted_addresses WHERE address = ?1")?;
            stmt.exists(params![lowered])
        })
    }

    pub fn mark_trusted(&self, address: &str) -> VigilResult<()> {
        let lowered = address.to_lowercase();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO trusted_addresses (address) VALUES (?1)",
                params![lowered],
            )?;
            Ok(())
        })
    }

    pub fn all(&self) -> VigilResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT address FROM trusted_addresses ORDER BY address")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
    }
}
