use miette::Diagnostic;
use thiserror::Error;

/// Error type for configuration loading and validation.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(quarry_config::toml_deserialize),
        help("Check your database config syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("IO error reading config: {0}")]
    #[diagnostic(code(quarry_config::io))]
    IoError(#[from] std::io::Error),

    #[error("Missing database name")]
    #[diagnostic(
        code(quarry_config::missing_database),
        help("Set `database` to a database name (or a file path for sqlite)")
    )]
    MissingDatabase,

    #[error("Invalid charset: {0}")]
    #[diagnostic(
        code(quarry_config::invalid_charset),
        help("Charsets must contain only letters, digits and underscores")
    )]
    InvalidCharset(String),

    #[error("Invalid collation: {0}")]
    #[diagnostic(
        code(quarry_config::invalid_collation),
        help("Collations must contain only letters, digits and underscores")
    )]
    InvalidCollation(String),

    #[error("Invalid timezone: {0}")]
    #[diagnostic(
        code(quarry_config::invalid_timezone),
        help("Use a UTC offset like '+00:00' or a zone name like 'America/Caracas'")
    )]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
