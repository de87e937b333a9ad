//! The fluent query builder.
//!
//! A builder is seeded from a [`crate::Database`] with `from`/`to`/`raw`,
//! mutated by chained calls, and consumed by exactly one terminal call
//! (`get`, `first`, `insert`, `update`, `delete`, an aggregate, or a
//! `*_sql` dry-run). Ownership enforces the one-shot contract: after a
//! terminal the builder is gone, and a new statement starts from a fresh
//! `from`/`to` seed.
//!
//! # Example
//!
//! ```no_run
//! use quarry_db::Database;
//!
//! # fn main() -> quarry_db::Result<()> {
//! let db = Database::open_in_memory()?;
//!
//! let rows = db
//!     .from("products")
//!     .select(["name", "price"])
//!     .where_op("price", ">", 100_i64)
//!     .or_where_eq("featured", 1_i64)
//!     .order_by(["name"])
//!     .asc()
//!     .limit(20)
//!     .get()?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};

use rusqlite::{types::Value, Connection};

use crate::error::Result;

use super::{
    condition::Logical,
    state::{Direction, Limit, Operation, QueryState},
};

pub struct QueryBuilder {
    pub(crate) db: Arc<Mutex<Connection>>,
    pub(crate) state: QueryState,
}

impl QueryBuilder {
    pub(crate) fn new(db: Arc<Mutex<Connection>>, table: &str) -> Self {
        let mut state = QueryState::new();
        state.table = table.trim().to_string();
        Self { db, state }
    }

    pub(crate) fn from_raw(db: Arc<Mutex<Connection>>, sql: &str) -> Self {
        let mut state = QueryState::new();
        state.raw = Some(sql.trim().to_string());
        Self { db, state }
    }

    /// During chaining the only settable operation is SELECT, so this
    /// cannot conflict; terminals go through the fallible setter.
    fn mark_select(&mut self) {
        if self.state.operation.is_none() {
            self.state.operation = Some(Operation::Select);
        }
    }

    /// Sets the column expressions to select, replacing any previous list.
    ///
    /// Each item may be a single column or a ready-made expression
    /// (`"COUNT(*) AS total"`).
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mark_select();
        self.state.fields = fields
            .into_iter()
            .map(|field| field.into().trim().to_string())
            .filter(|field| !field.is_empty())
            .collect();
        self
    }

    /// `field = value`, joined with AND.
    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cond(field, "=", value, "AND")
    }

    /// `field <operator> value`, joined with AND.
    pub fn where_op(self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.where_cond(field, operator, value, "AND")
    }

    /// `field = value`, joined with OR.
    pub fn or_where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cond(field, "=", value, "OR")
    }

    /// `field <operator> value`, joined with OR.
    pub fn or_where_op(self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.where_cond(field, operator, value, "OR")
    }

    /// Full condition tuple. The operator is normalized to uppercase and an
    /// unknown logical connective falls back to AND.
    pub fn where_cond(
        mut self,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
        logical: &str,
    ) -> Self {
        let logical = Logical::parse_permissive(logical);
        self.state.where_clause.push(
            &mut self.state.params,
            field,
            operator,
            Some(value.into()),
            logical,
        );
        self
    }

    /// Appends `field IS NULL` through the condition machinery.
    pub fn where_null(mut self, field: &str) -> Self {
        self.state.where_clause.push(
            &mut self.state.params,
            field,
            "IS NULL",
            None,
            Logical::And,
        );
        self
    }

    /// Appends `field IS NOT NULL` through the condition machinery.
    pub fn where_not_null(mut self, field: &str) -> Self {
        self.state.where_clause.push(
            &mut self.state.params,
            field,
            "IS NOT NULL",
            None,
            Logical::And,
        );
        self
    }

    /// Replaces the whole WHERE clause with `field IS NULL`.
    ///
    /// Unlike the other condition methods this does not append: any
    /// previously accumulated conditions are discarded.
    pub fn field_is_null(mut self, field: &str) -> Self {
        let field = field.trim().trim_matches(['"', '\'']);
        self.state
            .where_clause
            .replace_with(format!("{field} IS NULL"));
        self
    }

    /// `field IN (...)`, joined with AND. Fails fast on an empty list.
    pub fn where_in<I, V>(self, field: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_in_logical(field, values, Logical::And)
    }

    /// `field IN (...)`, joined with OR. Fails fast on an empty list.
    pub fn or_where_in<I, V>(self, field: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_in_logical(field, values, Logical::Or)
    }

    fn where_in_logical<I, V>(mut self, field: &str, values: I, logical: Logical) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.state
            .where_clause
            .push_in(&mut self.state.params, field, values, logical)?;
        Ok(self)
    }

    /// `HAVING field = value`, joined with AND.
    pub fn having_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.having_cond(field, "=", value, "AND")
    }

    /// `HAVING field <operator> value`, joined with AND.
    pub fn having_op(self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.having_cond(field, operator, value, "AND")
    }

    /// `HAVING field <operator> value`, joined with OR.
    pub fn or_having_op(self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.having_cond(field, operator, value, "OR")
    }

    /// Full HAVING condition tuple, symmetric with [`Self::where_cond`].
    pub fn having_cond(
        mut self,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
        logical: &str,
    ) -> Self {
        let logical = Logical::parse_permissive(logical);
        self.state.having_clause.push(
            &mut self.state.params,
            field,
            operator,
            Some(value.into()),
            logical,
        );
        self
    }

    /// Sets the GROUP BY column list, replacing any previous one.
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.group_by = columns
            .into_iter()
            .map(|column| column.into().trim().to_string())
            .filter(|column| !column.is_empty())
            .collect();
        self
    }

    /// Sets the ORDER BY column list, replacing any previous one and
    /// clearing the direction until `asc`/`desc` is called again.
    pub fn order_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.order_by = columns
            .into_iter()
            .map(|column| column.into().trim().to_string())
            .filter(|column| !column.is_empty())
            .collect();
        self.state.direction = None;
        self
    }

    pub fn asc(mut self) -> Self {
        self.state.direction = Some(Direction::Asc);
        self
    }

    pub fn desc(mut self) -> Self {
        self.state.direction = Some(Direction::Desc);
        self
    }

    /// `LIMIT rows`.
    pub fn limit(mut self, rows: u64) -> Self {
        self.state.limit = Some(Limit::Count(rows));
        self
    }

    /// `LIMIT start, rows`.
    pub fn limit_from(mut self, start: u64, rows: u64) -> Self {
        self.state.limit = Some(Limit::Range(start, rows));
        self
    }

    /// Binds a named parameter for a raw query. The `:` prefix is optional.
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        let name = name.trim();
        let key = if name.starts_with(':') {
            name.to_string()
        } else {
            format!(":{name}")
        };
        self.state.params.bind(key, value.into());
        self
    }
}
