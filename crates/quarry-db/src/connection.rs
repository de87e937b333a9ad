//! Database connection management.
//!
//! One connection handle is shared per process, wrapped in
//! `Arc<Mutex<Connection>>`; each request/operation seeds its own builder
//! from it. The handle is injected — nothing here reaches for globals.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use quarry_config::{DbConfig, Driver};
use rusqlite::Connection;
use tracing::debug;

use crate::{error::Result, query::QueryBuilder, DbError};

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Wraps an already-open connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Wraps a connection handle that is already shared elsewhere.
    pub fn from_shared(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Opens a database file and applies the session pragmas.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        apply_pragmas(&conn)?;
        debug!(path = %path.display(), "opened database");
        Ok(Self::new(conn))
    }

    /// Opens an in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_pragmas(&conn)?;
        Ok(Self::new(conn))
    }

    /// Opens the database described by a [`DbConfig`].
    ///
    /// Only the sqlite driver can be opened here; connections for the other
    /// drivers belong to the embedding application and are injected through
    /// [`Database::new`].
    pub fn from_config(config: &DbConfig) -> Result<Self> {
        match config.driver {
            Driver::Sqlite => Self::open(config.sqlite_path()),
            other => Err(DbError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Seeds a builder targeting `table`.
    pub fn from(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.conn.clone(), table)
    }

    /// Same as [`Database::from`]; reads better for inserts.
    pub fn to(&self, table: &str) -> QueryBuilder {
        self.from(table)
    }

    /// Seeds a builder around a caller-supplied SQL string, executed through
    /// the parameterized path with values bound via `bind`.
    pub fn raw(&self, sql: &str) -> QueryBuilder {
        QueryBuilder::from_raw(self.conn.clone(), sql)
    }

    /// The shared connection handle.
    pub fn handle(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

fn apply_pragmas(conn: &Connection) -> Result<()> {
    let _: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.execute("PRAGMA case_sensitive_like = ON;", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_connection_is_usable() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id INTEGER)", []).unwrap();

        let db = Database::new(conn);
        assert_eq!(db.from("t").count().unwrap(), 0);
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");

        let db = Database::open(&path).unwrap();
        {
            let handle = db.handle();
            let conn = handle.lock().unwrap();
            conn.execute("CREATE TABLE t (id INTEGER)", []).unwrap();
        }

        assert!(path.exists());
    }

    #[test]
    fn from_config_rejects_server_drivers() {
        let config = DbConfig::from_toml_str(r#"database = "app""#).unwrap();
        let err = Database::from_config(&config).unwrap_err();

        assert!(matches!(err, DbError::UnsupportedDriver(driver) if driver == "mysql"));
    }

    #[test]
    fn from_config_opens_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");

        let raw = format!(
            "driver = \"sqlite\"\ndatabase = \"{}\"\n",
            path.display()
        );
        let config = DbConfig::from_toml_str(&raw).unwrap();

        Database::from_config(&config).unwrap();
        assert!(path.exists());
    }
}
