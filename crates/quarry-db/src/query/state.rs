//! Builder state and statement rendering.
//!
//! [`QueryState`] is the bag of fields a builder chain mutates. Rendering
//! composes the shared options clause in a fixed order — WHERE, GROUP BY,
//! HAVING, ORDER BY, LIMIT — regardless of the order the chain used.

use rusqlite::types::Value;

use crate::error::{DbError, Result};

use super::condition::{ConditionSet, Params};

/// Statement kind produced by a builder.
///
/// A builder produces exactly one statement; once an operation is set,
/// changing it is a construction error. An unset operation renders as
/// SELECT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Select,
    Update,
    Delete,
    Insert,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::Select => "SELECT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Insert => "INSERT",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Limit {
    Count(u64),
    Range(u64, u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

pub(crate) struct QueryState {
    pub(crate) operation: Option<Operation>,
    pub(crate) table: String,
    pub(crate) fields: Vec<String>,
    pub(crate) where_clause: ConditionSet,
    pub(crate) having_clause: ConditionSet,
    pub(crate) params: Params,
    pub(crate) group_by: Vec<String>,
    pub(crate) order_by: Vec<String>,
    pub(crate) direction: Option<Direction>,
    pub(crate) limit: Option<Limit>,
    pub(crate) raw: Option<String>,
}

impl QueryState {
    pub(crate) fn new() -> Self {
        Self {
            operation: None,
            table: String::new(),
            fields: vec![],
            where_clause: ConditionSet::new("WHERE"),
            having_clause: ConditionSet::new("HAVING"),
            params: Params::default(),
            group_by: vec![],
            order_by: vec![],
            direction: None,
            limit: None,
            raw: None,
        }
    }

    pub(crate) fn set_operation(&mut self, operation: Operation) -> Result<()> {
        match self.operation {
            None => {
                self.operation = Some(operation);
                Ok(())
            }
            Some(current) if current == operation => Ok(()),
            Some(current) => Err(DbError::OperationChanged {
                current,
                requested: operation,
            }),
        }
    }

    pub(crate) fn table_name(&self) -> Result<&str> {
        let table = self.table.trim();
        if table.is_empty() {
            return Err(DbError::NoTableSelected);
        }
        Ok(table)
    }

    fn rendered_fields(&self) -> String {
        if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        }
    }

    /// The options clause: WHERE, GROUP BY, HAVING, ORDER BY, LIMIT.
    pub(crate) fn options(&self) -> String {
        let mut out = String::new();

        if !self.where_clause.is_empty() {
            out.push(' ');
            out.push_str(&self.where_clause.clause());
        }

        if !self.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            out.push_str(&self.group_by.join(", "));
        }

        if !self.having_clause.is_empty() {
            out.push(' ');
            out.push_str(&self.having_clause.clause());
        }

        if !self.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            out.push_str(&self.order_by.join(", "));

            if let Some(direction) = self.direction {
                out.push(' ');
                out.push_str(direction.as_str());
            }
        }

        match self.limit {
            Some(Limit::Count(rows)) => out.push_str(&format!(" LIMIT {rows}")),
            Some(Limit::Range(start, rows)) => out.push_str(&format!(" LIMIT {start}, {rows}")),
            None => {}
        }

        out
    }

    /// Renders the statement for the current operation.
    ///
    /// A raw query bypasses assembly entirely. UPDATE and INSERT carry their
    /// field data into [`Self::update_statement`]/[`Self::insert_statement`];
    /// reaching here without it is an empty-fields error.
    pub(crate) fn statement(&self) -> Result<String> {
        if let Some(raw) = &self.raw {
            return Ok(raw.trim().to_string());
        }

        let table = self.table_name()?;

        match self.operation.unwrap_or(Operation::Select) {
            Operation::Select => Ok(format!(
                "SELECT {} FROM {}{}",
                self.rendered_fields(),
                table,
                self.options()
            )),
            Operation::Delete => Ok(format!("DELETE FROM {}{}", table, self.options())),
            operation => Err(DbError::EmptyFields(operation)),
        }
    }

    /// Renders `UPDATE t SET ...` and binds the SET values.
    ///
    /// When a WHERE condition already bound `:field`, the SET key for that
    /// column becomes `:field_v` so both values survive in one statement.
    pub(crate) fn update_statement(&mut self, fields: Vec<(String, Value)>) -> Result<String> {
        self.set_operation(Operation::Update)?;

        if fields.is_empty() {
            return Err(DbError::EmptyFields(Operation::Update));
        }

        let table = self.table_name()?.to_string();
        let mut sets = Vec::with_capacity(fields.len());

        for (field, value) in fields {
            let field = field.trim().to_string();
            let mut key = format!(":{field}");

            if self.params.contains(&key) {
                key.push_str("_v");
            }

            sets.push(format!("{field} = {key}"));
            self.params.bind(key, value);
        }

        Ok(format!(
            "UPDATE {} SET {}{}",
            table,
            sets.join(", "),
            self.options()
        ))
    }

    /// Renders `INSERT INTO` with backticked identifiers, one placeholder
    /// per column in the order supplied.
    pub(crate) fn insert_statement(&mut self, columns: &[String]) -> Result<String> {
        self.set_operation(Operation::Insert)?;

        if columns.is_empty() {
            return Err(DbError::EmptyFields(Operation::Insert));
        }

        let table = self.table_name()?;
        let keys: Vec<String> = columns.iter().map(|c| format!("`{c}`")).collect();
        let placeholders: Vec<String> = columns.iter().map(|c| format!(":{c}")).collect();

        Ok(format!(
            "INSERT INTO `{}` ({}) VALUES ({})",
            table,
            keys.join(", "),
            placeholders.join(", ")
        ))
    }

    /// `SELECT COUNT(c) AS <c|count> FROM t`, plus the WHERE clause when one
    /// is active.
    pub(crate) fn count_statement(&self, column: &str) -> Result<String> {
        let table = self.table_name()?;
        let column = column.trim();
        let alias = if column == "*" { "count" } else { column };

        let mut query = format!("SELECT COUNT({column}) AS {alias} FROM {table}");

        if !self.where_clause.is_empty() {
            query.push(' ');
            query.push_str(&self.where_clause.clause());
        }

        Ok(query)
    }

    /// `SELECT MAX(c) AS c FROM t` / MIN. Fixed template, no options.
    pub(crate) fn extreme_statement(&self, column: &str, mode: &str) -> Result<String> {
        let table = self.table_name()?;
        let column = column.trim();

        Ok(format!("SELECT {mode}({column}) AS {column} FROM {table}"))
    }

    /// Last row by column: a MAX subquery pinned to one row.
    pub(crate) fn last_statement(&self, column: &str) -> Result<String> {
        let table = self.table_name()?;
        let column = column.trim();

        Ok(format!(
            "SELECT {} FROM {} WHERE {} = (SELECT MAX({}) FROM {}) LIMIT 1",
            self.rendered_fields(),
            table,
            column,
            column,
            table
        ))
    }
}
