//! Terminal operations: statement execution and dry-run rendering.
//!
//! Every method here consumes the builder. The `*_sql` twins render the
//! statement text without touching the backend, for statement-shape
//! verification; the executing forms bind the accumulated named parameters
//! through rusqlite and never interpolate values into SQL text. Identifiers
//! (table and column names) are interpolated directly, so they must not
//! come from untrusted input.

use rusqlite::{types::Value, ToSql};
use tracing::debug;

use crate::{
    error::{DbError, Result},
    record::Record,
};

use super::{builder::QueryBuilder, state::Operation};

impl QueryBuilder {
    /// Runs the assembled SELECT (or raw query) and returns all rows.
    pub fn get(self) -> Result<Vec<Record>> {
        let query = self.state.statement()?;
        self.fetch_rows(&query)
    }

    /// Returns the first row, or an empty record when nothing matches.
    pub fn first(mut self) -> Result<Record> {
        if self.state.limit.is_none() && self.state.raw.is_none() {
            self = self.limit(1);
        }

        let records = self.get()?;
        Ok(records.into_iter().next().unwrap_or_default())
    }

    /// Inserts one row. Column order follows the supplied order.
    ///
    /// Insert binds only its own values; parameters accumulated by earlier
    /// chain calls do not apply to an INSERT statement.
    pub fn insert<R, S, V>(mut self, row: R) -> Result<bool>
    where
        R: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let row = collect_row(row);
        let columns = column_names(&row);
        let query = self.state.insert_statement(&columns)?;

        debug!(sql = %query, "executing insert");

        let named: Vec<(String, Value)> = row
            .into_iter()
            .map(|(column, value)| (format!(":{column}"), value))
            .collect();
        let args: Vec<(&str, &dyn ToSql)> = named
            .iter()
            .map(|(key, value)| (key.as_str(), value as &dyn ToSql))
            .collect();

        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&query)?;
        stmt.execute(args.as_slice())?;
        Ok(true)
    }

    /// Inserts several rows inside one transaction.
    ///
    /// The column list comes from the first row; every row is executed as a
    /// separate bound execution of the same prepared statement, and the
    /// returned flag is the commit result — either every row lands or none
    /// does.
    pub fn insert_many<R, S, V>(mut self, rows: Vec<R>) -> Result<bool>
    where
        R: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let rows: Vec<Vec<(String, Value)>> = rows.into_iter().map(collect_row).collect();

        let first = rows.first().ok_or(DbError::EmptyFields(Operation::Insert))?;
        let columns = column_names(first);
        let query = self.state.insert_statement(&columns)?;

        debug!(sql = %query, rows = rows.len(), "executing batch insert");

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&query)?;

            for row in &rows {
                for column in &columns {
                    let value = row
                        .iter()
                        .find(|(name, _)| name == column)
                        .map(|(_, value)| value)
                        .ok_or_else(|| DbError::MissingColumn(column.clone()))?;

                    let index = stmt
                        .parameter_index(&format!(":{column}"))?
                        .ok_or_else(|| DbError::MissingColumn(column.clone()))?;
                    stmt.raw_bind_parameter(index, value)?;
                }

                stmt.raw_execute()?;
            }
        }
        tx.commit()?;

        Ok(true)
    }

    /// Updates the matching rows with the given column/value pairs.
    pub fn update<R, S, V>(mut self, fields: R) -> Result<bool>
    where
        R: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let query = self.state.update_statement(collect_row(fields))?;
        debug!(sql = %query, "executing update");
        self.execute_params(&query)?;
        Ok(true)
    }

    /// Deletes the matching rows.
    pub fn delete(mut self) -> Result<bool> {
        self.state.set_operation(Operation::Delete)?;
        let query = self.state.statement()?;
        debug!(sql = %query, "executing delete");
        self.execute_params(&query)?;
        Ok(true)
    }

    /// `COUNT(*)` over the current table and WHERE state.
    pub fn count(self) -> Result<u64> {
        self.count_column("*")
    }

    /// `COUNT(column)` over the current table and WHERE state.
    pub fn count_column(self, column: &str) -> Result<u64> {
        let query = self.state.count_statement(column)?;
        self.run_count(&query)
    }

    /// The row holding the maximum value of `column`, as `{column: value}`.
    pub fn max(self, column: &str) -> Result<Record> {
        let query = self.state.extreme_statement(column, "MAX")?;
        self.fetch_single(&query)
    }

    /// The row holding the minimum value of `column`, as `{column: value}`.
    pub fn min(self, column: &str) -> Result<Record> {
        let query = self.state.extreme_statement(column, "MIN")?;
        self.fetch_single(&query)
    }

    /// The last row of the table ordered by `column`.
    pub fn last(self, column: &str) -> Result<Record> {
        let query = self.state.last_statement(column)?;
        self.fetch_single(&query)
    }

    // Dry-run twins: render the statement, never touch the backend.

    /// The assembled SELECT (or raw query) text.
    pub fn sql(self) -> Result<String> {
        self.state.statement()
    }

    /// The DELETE statement text.
    pub fn delete_sql(mut self) -> Result<String> {
        self.state.set_operation(Operation::Delete)?;
        self.state.statement()
    }

    /// The UPDATE statement text.
    pub fn update_sql<R, S, V>(mut self, fields: R) -> Result<String>
    where
        R: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        self.state.update_statement(collect_row(fields))
    }

    /// The INSERT statement text for a single row.
    pub fn insert_sql<R, S, V>(mut self, row: R) -> Result<String>
    where
        R: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let row = collect_row(row);
        self.state.insert_statement(&column_names(&row))
    }

    /// The INSERT statement text for a batch. Identical to the single-row
    /// form: the same statement is re-executed per row.
    pub fn insert_many_sql<R, S, V>(mut self, rows: Vec<R>) -> Result<String>
    where
        R: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let rows: Vec<Vec<(String, Value)>> = rows.into_iter().map(collect_row).collect();
        let first = rows.first().ok_or(DbError::EmptyFields(Operation::Insert))?;
        self.state.insert_statement(&column_names(first))
    }

    /// The `COUNT(*)` statement text.
    pub fn count_sql(self) -> Result<String> {
        self.state.count_statement("*")
    }

    /// The `COUNT(column)` statement text.
    pub fn count_column_sql(self, column: &str) -> Result<String> {
        self.state.count_statement(column)
    }

    /// The MAX aggregate statement text.
    pub fn max_sql(self, column: &str) -> Result<String> {
        self.state.extreme_statement(column, "MAX")
    }

    /// The MIN aggregate statement text.
    pub fn min_sql(self, column: &str) -> Result<String> {
        self.state.extreme_statement(column, "MIN")
    }

    /// The last-by-column statement text.
    pub fn last_sql(self, column: &str) -> Result<String> {
        self.state.last_statement(column)
    }

    // Shared execution plumbing.

    fn fetch_rows(&self, query: &str) -> Result<Vec<Record>> {
        debug!(sql = %query, "executing select");

        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(query)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let named = self.state.params.to_named();
        let mut rows = stmt.query(named.as_slice())?;
        let mut records = vec![];

        while let Some(row) = rows.next()? {
            records.push(Record::from_row(&columns, row)?);
        }

        Ok(records)
    }

    fn fetch_single(&self, query: &str) -> Result<Record> {
        debug!(sql = %query, "executing select");

        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(query)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query([])?;

        match rows.next()? {
            Some(row) => Record::from_row(&columns, row),
            None => Ok(Record::default()),
        }
    }

    fn execute_params(&self, query: &str) -> Result<()> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(query)?;
        let named = self.state.params.to_named();
        stmt.execute(named.as_slice())?;
        Ok(())
    }

    /// Counts bind only the parameters the statement actually names, since
    /// the count template drops every clause except WHERE.
    pub(crate) fn run_count(&self, query: &str) -> Result<u64> {
        debug!(sql = %query, "executing count");

        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(query)?;

        for (key, value) in self.state.params.iter() {
            if let Some(index) = stmt.parameter_index(key)? {
                stmt.raw_bind_parameter(index, value)?;
            }
        }

        let mut rows = stmt.raw_query();
        let total = match rows.next()? {
            Some(row) => row.get::<_, i64>(0)?,
            None => 0,
        };

        Ok(total.max(0) as u64)
    }
}

fn collect_row<R, S, V>(row: R) -> Vec<(String, Value)>
where
    R: IntoIterator<Item = (S, V)>,
    S: Into<String>,
    V: Into<Value>,
{
    row.into_iter()
        .map(|(column, value)| (column.into().trim().to_string(), value.into()))
        .collect()
}

fn column_names(row: &[(String, Value)]) -> Vec<String> {
    row.iter().map(|(column, _)| column.clone()).collect()
}
