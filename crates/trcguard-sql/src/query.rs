//! Structured representation of a SELECT query.

use serde::Serialize;
use std::fmt;

/// An attribute in the select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectAttribute {
    /// Column name, or `*`.
    pub name: String,
    /// Table alias or name qualifying the column.
    pub source: Option<String>,
}

impl SelectAttribute {
    /// The bare `*` selection.
    pub fn wildcard() -> Self {
        Self {
            name: "*".to_string(),
            source: None,
        }
    }

    /// Check if this is the unqualified `*`.
    pub fn is_wildcard(&self) -> bool {
        self.name == "*" && self.source.is_none()
    }
}

/// A table referenced in FROM or JOIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRef {
    /// Table name without schema prefix or quoting.
    pub name: String,
    /// Optional alias.
    pub alias: Option<String>,
}

impl TableRef {
    /// The name other clauses use to refer to this table.
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Kinds of join. `OUTER` is normalized away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Natural,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::Left => write!(f, "LEFT JOIN"),
            JoinKind::Right => write!(f, "RIGHT JOIN"),
            JoinKind::Full => write!(f, "FULL JOIN"),
            JoinKind::Cross => write!(f, "CROSS JOIN"),
            JoinKind::Natural => write!(f, "NATURAL JOIN"),
        }
    }
}

/// A joined table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    /// Raw ON condition text. `USING (c)` is rewritten to `left.c = right.c`.
    pub on: Option<String>,
}

/// Sort direction of an ORDER BY item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// An ORDER BY item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    /// Column text, possibly `alias.column`.
    pub column: String,
    pub direction: SortDirection,
}

/// A SELECT statement broken into clauses.
///
/// Always has at least one select attribute and at least one FROM table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredQuery {
    pub select: Vec<SelectAttribute>,
    pub from_tables: Vec<TableRef>,
    pub joins: Vec<Join>,
    pub where_conditions: Vec<String>,
    pub order_by: Vec<OrderItem>,
}

impl StructuredQuery {
    /// The first table after FROM.
    pub fn primary_table(&self) -> &TableRef {
        &self.from_tables[0]
    }

    /// Check if the select list is the bare `*`.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.select.as_slice(), [attr] if attr.is_wildcard())
    }

    /// Every table referenced by FROM and JOIN, in source order.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &TableRef> {
        self.from_tables
            .iter()
            .chain(self.joins.iter().map(|join| &join.table))
    }

    /// Resolve an alias or table name to the table it binds, case-insensitively.
    pub fn resolve_binding(&self, binding: &str) -> Option<&TableRef> {
        self.referenced_tables()
            .find(|table| table.binding().eq_ignore_ascii_case(binding))
    }
}
