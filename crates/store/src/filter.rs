//! Query conditions shared by the sub-stores.
//!
//! Column names are `&'static str` so only identifiers written in code ever
//! reach the SQL text; every value is bound as a parameter.

use sqlx::any::AnyArguments;
use sqlx::query::{Query, QueryScalar};
use sqlx::Any;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Eq(&'static str, Value),
    In(&'static str, Vec<Value>),
    Like(&'static str, String),
}

/// Filter + pagination options for store reads and deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Where {
    conditions: Vec<Condition>,
    offset: i64,
    limit: Option<i64>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality filter: `column = value`.
    pub fn f(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column, value.into()));
        self
    }

    /// Membership filter: `column IN (values...)`.
    pub fn is_in<V: Into<Value>>(mut self, column: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions
            .push(Condition::In(column, values.into_iter().map(Into::into).collect()));
        self
    }

    /// Substring filter: `column LIKE %needle%`.
    pub fn contains(mut self, column: &'static str, needle: &str) -> Self {
        self.conditions.push(Condition::Like(column, format!("%{needle}%")));
        self
    }

    /// Pagination window.
    pub fn p(mut self, offset: i64, limit: i64) -> Self {
        self.offset = offset.max(0);
        self.limit = Some(limit);
        self
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// ` WHERE ...` fragment, or an empty string when there are no conditions.
    pub(crate) fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|c| match c {
                Condition::Eq(col, _) => format!("{col} = ?"),
                // An empty IN list matches nothing.
                Condition::In(_, values) if values.is_empty() => "1 = 0".to_string(),
                Condition::In(col, values) => {
                    let marks = vec!["?"; values.len()].join(", ");
                    format!("{col} IN ({marks})")
                }
                Condition::Like(col, _) => format!("{col} LIKE ?"),
            })
            .collect();
        format!(" WHERE {}", parts.join(" AND "))
    }

    /// ` LIMIT ? OFFSET ?` fragment when a window was requested.
    pub(crate) fn page_sql(&self) -> &'static str {
        if self.limit.is_some() { " LIMIT ? OFFSET ?" } else { "" }
    }

    fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.conditions.iter().flat_map(|c| match c {
            Condition::Eq(_, v) => vec![v.clone()],
            Condition::In(_, vs) => vs.clone(),
            Condition::Like(_, pattern) => vec![Value::Str(pattern.clone())],
        })
    }

    pub(crate) fn bind<'q>(&self, mut query: Query<'q, Any, AnyArguments<'q>>) -> Query<'q, Any, AnyArguments<'q>> {
        for value in self.values() {
            query = match value {
                Value::Str(s) => query.bind(s),
                Value::Int(i) => query.bind(i),
            };
        }
        query
    }

    pub(crate) fn bind_page<'q>(&self, query: Query<'q, Any, AnyArguments<'q>>) -> Query<'q, Any, AnyArguments<'q>> {
        match self.limit {
            Some(limit) => query.bind(limit).bind(self.offset),
            None => query,
        }
    }

    pub(crate) fn bind_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, Any, O, AnyArguments<'q>>,
    ) -> QueryScalar<'q, Any, O, AnyArguments<'q>> {
        for value in self.values() {
            query = match value {
                Value::Str(s) => query.bind(s),
                Value::Int(i) => query.bind(i),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_where_renders_nothing() {
        let w = Where::new();
        assert_eq!(w.where_sql(), "");
        assert_eq!(w.page_sql(), "");
        assert!(!w.has_conditions());
    }

    #[test]
    fn renders_conditions_in_order() {
        let w = Where::new()
            .f("user_id", "user-abc123")
            .is_in("post_id", ["post-aaaaaa", "post-bbbbbb"])
            .contains("title", "rust");
        assert_eq!(
            w.where_sql(),
            " WHERE user_id = ? AND post_id IN (?, ?) AND title LIKE ?"
        );
        let values: Vec<Value> = w.values().collect();
        assert_eq!(values.len(), 4);
        assert_eq!(values[3], Value::Str("%rust%".to_string()));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let w = Where::new().is_in::<&str>("post_id", []);
        assert_eq!(w.where_sql(), " WHERE 1 = 0");
    }

    #[test]
    fn pagination_clamps_negative_offset() {
        let w = Where::new().p(-3, 10);
        assert_eq!(w.page_sql(), " LIMIT ? OFFSET ?");
        assert_eq!(w.offset, 0);
        assert_eq!(w.limit, Some(10));
    }
}
