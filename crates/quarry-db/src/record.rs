//! Ordered row records with typed accessors.
//!
//! A [`Record`] preserves the column order of the SELECT that produced it
//! and exposes explicit typed accessors instead of a dynamic property bag.
//! "Not found" is represented by an empty record, never a null sentinel.

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::{types::Value, Row};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{DbError, Result};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});

/// An ordered mapping from column name to SQL value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub(crate) fn from_row(columns: &[String], row: &Row) -> Result<Self> {
        let mut entries = Vec::with_capacity(columns.len());

        for (index, name) in columns.iter().enumerate() {
            let value: Value = row.get(index)?;
            entries.push((name.clone(), value));
        }

        Ok(Self { entries })
    }

    /// Builds a record from column/value pairs, mostly useful in tests and
    /// model conversions.
    pub fn from_pairs<I, S, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Column names in SELECT order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(column, _)| column.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(column, value)| (column.as_str(), value))
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    fn required(&self, column: &str) -> Result<&Value> {
        self.get(column)
            .ok_or_else(|| DbError::MissingColumn(column.to_string()))
    }

    pub fn get_str(&self, column: &str) -> Result<&str> {
        match self.required(column)? {
            Value::Text(text) => Ok(text),
            _ => Err(DbError::TypeMismatch {
                column: column.to_string(),
                expected: "string",
            }),
        }
    }

    /// The text value, trimmed.
    pub fn get_string(&self, column: &str) -> Result<String> {
        Ok(self.get_str(column)?.trim().to_string())
    }

    /// Integer columns, accepting integer-shaped text.
    pub fn get_i64(&self, column: &str) -> Result<i64> {
        match self.required(column)? {
            Value::Integer(value) => Ok(*value),
            Value::Text(text) => text.trim().parse().map_err(|_| DbError::TypeMismatch {
                column: column.to_string(),
                expected: "integer",
            }),
            _ => Err(DbError::TypeMismatch {
                column: column.to_string(),
                expected: "integer",
            }),
        }
    }

    /// Float columns, accepting integers and numeric text.
    pub fn get_f64(&self, column: &str) -> Result<f64> {
        match self.required(column)? {
            Value::Real(value) => Ok(*value),
            Value::Integer(value) => Ok(*value as f64),
            Value::Text(text) => text.trim().parse().map_err(|_| DbError::TypeMismatch {
                column: column.to_string(),
                expected: "float",
            }),
            _ => Err(DbError::TypeMismatch {
                column: column.to_string(),
                expected: "float",
            }),
        }
    }

    /// Boolean columns, accepting 0/1 integers and true/false text.
    pub fn get_bool(&self, column: &str) -> Result<bool> {
        let mismatch = || DbError::TypeMismatch {
            column: column.to_string(),
            expected: "boolean",
        };

        match self.required(column)? {
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Text(text) => match text.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        }
    }

    /// A text value validated as an email address.
    pub fn get_email(&self, column: &str) -> Result<String> {
        let value = self.get_string(column)?;

        if !EMAIL_RE.is_match(&value) {
            return Err(DbError::FailedValidation {
                column: column.to_string(),
                check: "email",
            });
        }

        Ok(value)
    }

    /// A text value validated as a UUID.
    pub fn get_uuid(&self, column: &str) -> Result<String> {
        let value = self.get_string(column)?;

        if !UUID_RE.is_match(&value) {
            return Err(DbError::FailedValidation {
                column: column.to_string(),
                check: "uuid",
            });
        }

        Ok(value)
    }

    /// Deserializes a JSON text column.
    pub fn get_json<T: serde::de::DeserializeOwned>(&self, column: &str) -> Result<T> {
        Ok(serde_json::from_str(self.get_str(column)?)?)
    }
}

struct SqlValue<'a>(&'a Value);

impl Serialize for SqlValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_none(),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Real(value) => serializer.serialize_f64(*value),
            Value::Text(value) => serializer.serialize_str(value),
            Value::Blob(value) => serializer.serialize_bytes(value),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;

        for (column, value) in &self.entries {
            map.serialize_entry(column, &SqlValue(value))?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record::from_pairs([
            ("id", Value::Integer(7)),
            ("name", Value::Text("  Ada  ".to_string())),
            ("price", Value::Real(9.5)),
            ("active", Value::Integer(1)),
            ("email", Value::Text("ada@example.com".to_string())),
            (
                "uuid",
                Value::Text("3e4c2d1a-9f6b-4a3c-8e21-0b2a9d8c7f65".to_string()),
            ),
            ("tags", Value::Text(r#"["a","b"]"#.to_string())),
        ])
    }

    #[test]
    fn typed_accessors() {
        let record = record();

        assert_eq!(record.get_i64("id").unwrap(), 7);
        assert_eq!(record.get_string("name").unwrap(), "Ada");
        assert_eq!(record.get_str("name").unwrap(), "  Ada  ");
        assert_eq!(record.get_f64("price").unwrap(), 9.5);
        assert_eq!(record.get_f64("id").unwrap(), 7.0);
        assert!(record.get_bool("active").unwrap());
    }

    #[test]
    fn integer_shaped_text_parses() {
        let record = Record::from_pairs([("id", Value::Text(" 42 ".to_string()))]);
        assert_eq!(record.get_i64("id").unwrap(), 42);
    }

    #[test]
    fn missing_column_and_type_mismatch() {
        let record = record();

        assert!(matches!(
            record.get_str("nope").unwrap_err(),
            DbError::MissingColumn(column) if column == "nope"
        ));
        assert!(matches!(
            record.get_i64("name").unwrap_err(),
            DbError::TypeMismatch { expected: "integer", .. }
        ));
    }

    #[test]
    fn email_and_uuid_validation() {
        let record = record();

        assert_eq!(record.get_email("email").unwrap(), "ada@example.com");
        assert_eq!(
            record.get_uuid("uuid").unwrap(),
            "3e4c2d1a-9f6b-4a3c-8e21-0b2a9d8c7f65"
        );
        assert!(matches!(
            record.get_email("name").unwrap_err(),
            DbError::FailedValidation { check: "email", .. }
        ));
        assert!(matches!(
            record.get_uuid("name").unwrap_err(),
            DbError::FailedValidation { check: "uuid", .. }
        ));
    }

    #[test]
    fn json_columns_deserialize() {
        let record = record();
        let tags: Vec<String> = record.get_json("tags").unwrap();
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn preserves_column_order_and_serializes_as_object() {
        let record = Record::from_pairs([
            ("b", Value::Integer(2)),
            ("a", Value::Integer(1)),
        ]);

        let columns: Vec<&str> = record.columns().collect();
        assert_eq!(columns, vec!["b", "a"]);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"b":2,"a":1}"#);
    }

    #[test]
    fn empty_record_is_the_not_found_sentinel() {
        let record = Record::default();
        assert!(record.is_empty());
        assert_eq!(record.len(), 0);
        assert!(record.get("anything").is_none());
    }
}
