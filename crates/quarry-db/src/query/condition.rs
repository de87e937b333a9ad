//! Condition fragments and placeholder generation.
//!
//! WHERE and HAVING are handled symmetrically: both are a [`ConditionSet`]
//! accumulating rendered fragments, while placeholder keys and bound values
//! live in a statement-wide [`Params`] registry so keys stay unique even
//! when the same column appears in several clauses.

use std::collections::HashMap;

use rusqlite::{types::Value, ToSql};
use tracing::warn;

use crate::error::{DbError, Result};

/// Logical connective between condition fragments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Logical {
    #[default]
    And,
    Or,
}

impl Logical {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logical::And => "AND",
            Logical::Or => "OR",
        }
    }

    /// Anything other than AND/OR (case-insensitive) normalizes to AND.
    pub fn parse_permissive(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "AND" => Logical::And,
            "OR" => Logical::Or,
            other => {
                warn!(operator = other, "unknown logical operator, defaulting to AND");
                Logical::And
            }
        }
    }
}

/// Named parameters bound to one statement.
///
/// Keys keep their `:` prefix and are unique per statement: the first
/// predicate on `field` binds `:field`, the next `:field1`, then `:field2`.
#[derive(Debug, Default)]
pub(crate) struct Params {
    values: Vec<(String, Value)>,
    counters: HashMap<String, usize>,
}

impl Params {
    pub(crate) fn next_key(&mut self, field: &str) -> String {
        let count = self.counters.entry(field.to_string()).or_insert(0);
        let key = if *count == 0 {
            format!(":{field}")
        } else {
            format!(":{field}{count}")
        };
        *count += 1;
        key
    }

    /// Keys for IN lists are numbered from one (`:in_field1`, `:in_field2`)
    /// and keep counting across calls on the same field.
    pub(crate) fn next_in_key(&mut self, field: &str) -> String {
        let count = self.counters.entry(format!("in_{field}")).or_insert(0);
        *count += 1;
        format!(":in_{field}{count}")
    }

    pub(crate) fn bind(&mut self, key: String, value: Value) {
        self.values.push((key, value));
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.values.iter().any(|(k, _)| k == key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn to_named(&self) -> Vec<(&str, &dyn ToSql)> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str(), v as &dyn ToSql))
            .collect()
    }
}

/// String values are trimmed before binding.
fn normalize_value(value: Value) -> Value {
    match value {
        Value::Text(text) => Value::Text(text.trim().to_string()),
        other => other,
    }
}

fn normalize_operator(operator: &str) -> String {
    operator
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Operators that test a state rather than compare against a value.
fn is_nullity(operator: &str) -> bool {
    matches!(operator, "IS NULL" | "IS NOT NULL" | "IS TRUE" | "IS FALSE")
}

/// Accumulated condition fragments for one clause keyword.
#[derive(Debug, Default)]
pub(crate) struct ConditionSet {
    keyword: &'static str,
    fragments: Vec<String>,
}

impl ConditionSet {
    pub(crate) fn new(keyword: &'static str) -> Self {
        Self {
            keyword,
            fragments: vec![],
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Appends one condition, binding its value unless the operator is a
    /// nullity test.
    pub(crate) fn push(
        &mut self,
        params: &mut Params,
        field: &str,
        operator: &str,
        value: Option<Value>,
        logical: Logical,
    ) {
        let field = field.trim();
        let operator = normalize_operator(operator);

        let fragment = if is_nullity(&operator) {
            format!("{field} {operator}")
        } else {
            let key = params.next_key(field);
            params.bind(key.clone(), normalize_value(value.unwrap_or(Value::Null)));
            format!("{field} {operator} {key}")
        };

        self.append(fragment, logical);
    }

    /// Appends `field IN (:in_field1, ...)`, one key per value.
    pub(crate) fn push_in(
        &mut self,
        params: &mut Params,
        field: &str,
        values: Vec<Value>,
        logical: Logical,
    ) -> Result<()> {
        let field = field.trim();

        if values.is_empty() {
            return Err(DbError::EmptyValueList(field.to_string()));
        }

        let mut keys = Vec::with_capacity(values.len());

        for value in values {
            let key = params.next_in_key(field);
            params.bind(key.clone(), normalize_value(value));
            keys.push(key);
        }

        self.append(format!("{field} IN ({})", keys.join(", ")), logical);
        Ok(())
    }

    /// Throws away any accumulated fragments and sets the clause to a single
    /// fragment. Used by `field_is_null`, which replaces rather than appends.
    pub(crate) fn replace_with(&mut self, fragment: String) {
        self.fragments = vec![fragment];
    }

    fn append(&mut self, fragment: String, logical: Logical) {
        if self.fragments.is_empty() {
            self.fragments.push(fragment);
        } else {
            self.fragments.push(format!("{} {fragment}", logical.as_str()));
        }
    }

    /// The full clause, e.g. `WHERE a = :a OR b = :b`.
    pub(crate) fn clause(&self) -> String {
        format!("{} {}", self.keyword, self.fragments.join(" "))
    }
}
