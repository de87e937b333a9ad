//! Typed models over the query builder.
//!
//! A model ties a struct to a table name and maps records into typed
//! values through [`FromRecord`]. The provided methods cover the common
//! operations; anything else drops down to [`Model::query`] for the full
//! builder surface.

use rusqlite::types::Value;

use crate::{
    connection::Database,
    error::Result,
    query::{Page, QueryBuilder},
    record::Record,
};

/// Conversion from a dynamic [`Record`] into a typed value.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self>;
}

/// A struct bound to a database table.
///
/// # Example
///
/// ```no_run
/// use quarry_db::{Database, FromRecord, Model, Record, Result, Value};
///
/// struct Product {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRecord for Product {
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(Self {
///             id: record.get_i64("id")?,
///             name: record.get_string("name")?,
///         })
///     }
/// }
///
/// impl Model for Product {
///     const TABLE: &'static str = "products";
///
///     fn to_row(&self) -> Vec<(String, Value)> {
///         vec![("name".to_string(), self.name.clone().into())]
///     }
/// }
///
/// # fn main() -> Result<()> {
/// let db = Database::open_in_memory()?;
/// let cheap = Product::query(&db)
///     .where_op("price", "<", 10_i64)
///     .get()?;
/// # Ok(())
/// # }
/// ```
pub trait Model: FromRecord {
    const TABLE: &'static str;

    /// Column/value pairs persisted by [`Model::save`].
    fn to_row(&self) -> Vec<(String, Value)>;

    /// A builder seeded with the model's table.
    fn query(db: &Database) -> QueryBuilder {
        db.from(Self::TABLE)
    }

    fn all(db: &Database) -> Result<Vec<Self>> {
        Self::query(db).get()?.iter().map(Self::from_record).collect()
    }

    fn first(db: &Database) -> Result<Option<Self>> {
        let record = Self::query(db).first()?;

        if record.is_empty() {
            Ok(None)
        } else {
            Self::from_record(&record).map(Some)
        }
    }

    /// The first row matching `column = value`.
    fn find(db: &Database, column: &str, value: impl Into<Value>) -> Result<Option<Self>> {
        let record = Self::query(db).where_eq(column, value).first()?;

        if record.is_empty() {
            Ok(None)
        } else {
            Self::from_record(&record).map(Some)
        }
    }

    fn insert<R, S, V>(db: &Database, row: R) -> Result<bool>
    where
        R: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        db.to(Self::TABLE).insert(row)
    }

    /// Persists this instance's row. Returns `false` without touching the
    /// backend when [`Model::to_row`] is empty.
    fn save(&self, db: &Database) -> Result<bool> {
        let row = self.to_row();

        if row.is_empty() {
            return Ok(false);
        }

        db.to(Self::TABLE).insert(row)
    }

    fn count(db: &Database) -> Result<u64> {
        Self::query(db).count()
    }

    fn paginate(db: &Database, page: u64, rows_per_page: u64) -> Result<Page<Self>> {
        Self::query(db).paginate(page, rows_per_page)?.into_models()
    }
}
