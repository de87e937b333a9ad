use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"));

/// Accepts UTC offsets (`+00:00`, `-04:30`) and zone names (`America/Caracas`).
static TIMEZONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[+-]\d{2}:\d{2}|[A-Za-z]+(?:[/_][A-Za-z_]+)*)$").expect("valid regex")
});

/// Database driver kind.
///
/// The executor stack speaks sqlite natively; the other variants describe
/// connections owned by the embedding application, for which this crate can
/// still render the session timezone statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Mysql,
    #[serde(alias = "maria")]
    Mariadb,
    #[serde(alias = "pgsql")]
    Postgres,
    Sqlite,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Mysql => "mysql",
            Driver::Mariadb => "mariadb",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }

    fn default_port(&self) -> u16 {
        match self {
            Driver::Mysql | Driver::Mariadb => 3306,
            Driver::Postgres => 5432,
            Driver::Sqlite => 0,
        }
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection configuration consumed by the query builder's embedder.
///
/// The builder core itself receives an already-open connection handle;
/// this struct carries everything needed to open one.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DbConfig {
    /// Database driver kind.
    #[serde(default)]
    pub driver: Driver,

    /// Server hostname. Ignored for sqlite.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port. Defaults to the driver's standard port.
    pub port: Option<u16>,

    /// Database name, or the database file path for sqlite.
    pub database: String,

    /// Character set applied to the connection.
    pub charset: Option<String>,

    /// Collation applied to the connection.
    pub collation: Option<String>,

    /// Username credential.
    pub username: Option<String>,

    /// Password credential.
    pub password: Option<String>,

    /// Session timezone applied after connecting.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_timezone() -> String {
    "+00:00".to_string()
}

impl DbConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: DbConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&raw)?;
        debug!(path = %path.as_ref().display(), driver = %config.driver, "loaded database config");
        Ok(config)
    }

    /// Checks the fields that end up inside SQL or a connection string.
    ///
    /// Charset, collation and timezone are interpolated into session
    /// statements, so only identifier-shaped values are accepted.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingDatabase);
        }

        if let Some(charset) = &self.charset {
            if !IDENT_RE.is_match(charset) {
                return Err(ConfigError::InvalidCharset(charset.clone()));
            }
        }

        if let Some(collation) = &self.collation {
            if !IDENT_RE.is_match(collation) {
                return Err(ConfigError::InvalidCollation(collation.clone()));
            }
        }

        if !TIMEZONE_RE.is_match(&self.timezone) {
            return Err(ConfigError::InvalidTimezone(self.timezone.clone()));
        }

        Ok(())
    }

    /// The configured port, falling back to the driver's standard port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.driver.default_port())
    }

    /// The database file path for the sqlite driver.
    ///
    /// Backslashes and duplicate separators are normalized; relative values
    /// resolve against the process working directory.
    pub fn sqlite_path(&self) -> PathBuf {
        let raw = self.database.trim().replace('\\', "/");
        let path: PathBuf = raw.split('/').filter(|s| !s.is_empty()).collect();

        if raw.starts_with('/') {
            Path::new("/").join(path)
        } else {
            path
        }
    }

    /// The statement that applies the session timezone after connecting.
    ///
    /// Returns `None` for sqlite, which has no session timezone.
    pub fn session_timezone_sql(&self) -> Option<String> {
        match self.driver {
            Driver::Postgres => Some(format!("SET TIME ZONE '{}'", self.timezone)),
            Driver::Mysql | Driver::Mariadb => {
                Some(format!("SET time_zone = '{}'", self.timezone))
            }
            Driver::Sqlite => None,
        }
    }
}
