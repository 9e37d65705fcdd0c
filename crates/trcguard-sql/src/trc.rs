//! Tuple relational calculus construction.
//!
//! Translates a read-only SELECT into a declarative expression such as
//!
//! ```text
//! { E.name, D.dept_name | (exists D) (employee(E) and department(D) and E.dept_id = D.id) }
//! ```
//!
//! The expression is an audit artifact shown next to the SQL; it is never
//! parsed back.

use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

use trcguard_core::KgDocument;

use crate::error::TrcError;
use crate::extractor::Extractor;
use crate::query::{StructuredQuery, TableRef};

/// Mutating keywords that can never appear in a statement being explained.
static UNSAFE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(DROP|DELETE|UPDATE|INSERT|ALTER|CREATE|TRUNCATE|EXEC|EXECUTE|CALL|GRANT|REVOKE|COMMIT|ROLLBACK)\b",
    )
    .unwrap()
});

/// A formatted TRC expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrcExpression(String);

impl TrcExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TrcExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Alias → tuple variable assignments for one query.
///
/// Variables are the uppercased alias when it is one character long, or its
/// uppercased first character otherwise. When that letter is already taken
/// by a different alias, a numeric suffix starting at 2 is appended.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    bindings: Vec<(String, String)>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variable bound to an alias, if any.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound.eq_ignore_ascii_case(alias))
            .map(|(_, var)| var.as_str())
    }

    /// Bind an alias, returning its variable. Binding an alias twice returns
    /// the first variable.
    pub fn bind(&mut self, alias: &str) -> String {
        if let Some(var) = self.resolve(alias) {
            return var.to_string();
        }

        let base = tuple_variable(alias);
        let mut var = base.clone();
        let mut suffix = 2;
        while self.bindings.iter().any(|(_, taken)| *taken == var) {
            var = format!("{base}{suffix}");
            suffix += 1;
        }

        self.bindings.push((alias.to_string(), var.clone()));
        var
    }

    /// Rewrite whole-word alias references in a condition.
    ///
    /// `alias.column` becomes `Var.column` and a bare `alias` becomes `Var`.
    /// Longer aliases win over shorter ones, and single-quoted string literals
    /// are left untouched.
    pub fn substitute(&self, condition: &str) -> String {
        let mut aliases: Vec<&str> = self.bindings.iter().map(|(a, _)| a.as_str()).collect();
        if aliases.is_empty() {
            return condition.to_string();
        }
        aliases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = aliases
            .iter()
            .map(|alias| regex::escape(alias))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?i)'(?:[^']|'')*'|\b({alternation})\b");

        let Ok(re) = Regex::new(&pattern) else {
            tracing::warn!(pattern = %pattern, "Alias pattern failed to compile");
            return condition.to_string();
        };

        re.replace_all(condition, |caps: &Captures| match caps.get(1) {
            Some(alias) => self
                .resolve(alias.as_str())
                .unwrap_or(alias.as_str())
                .to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
    }
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Tuple variable for an alias or table name.
fn tuple_variable(alias: &str) -> String {
    alias
        .chars()
        .next()
        .map(|first| first.to_uppercase().collect())
        .unwrap_or_else(|| "T".to_string())
}

/// Relation name for a table: lowercased and singular.
fn relation_name(table: &str) -> String {
    let lower = table.to_lowercase();
    if let Some(stem) = lower.strip_suffix("ies")
        && !stem.is_empty()
    {
        return format!("{stem}y");
    }
    if lower.len() <= 1 || lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is")
    {
        return lower;
    }
    match lower.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// Builds TRC expressions from SQL.
#[derive(Clone, Default)]
pub struct TrcBuilder {
    extractor: Extractor,
}

impl TrcBuilder {
    /// Create a new TRC builder.
    pub fn new() -> Self {
        Self {
            extractor: Extractor::new(),
        }
    }

    /// Translate a read-only SQL statement.
    pub fn build(&self, sql: &str) -> Result<TrcExpression, TrcError> {
        let query = self.prepare(sql)?;
        Ok(self.build_query(&query))
    }

    /// Strip the terminator, refuse mutating keywords and extract.
    fn prepare(&self, sql: &str) -> Result<StructuredQuery, TrcError> {
        let sql = sql.trim();
        let sql = sql.strip_suffix(';').unwrap_or(sql);

        if let Some(found) = UNSAFE_KEYWORD.captures(sql) {
            let keyword = found[1].to_uppercase();
            tracing::warn!(keyword = %keyword, "Refusing to explain mutating statement");
            return Err(TrcError::UnsafeOperation { keyword });
        }

        Ok(self.extractor.extract(sql)?)
    }

    /// Translate an already extracted query.
    pub fn build_query(&self, query: &StructuredQuery) -> TrcExpression {
        let mut aliases = AliasMap::new();
        let primary = aliases.bind(query.primary_table().binding());

        let mut quantifiers = Vec::new();
        let mut predicates = vec![format!(
            "{}({})",
            relation_name(&query.primary_table().name),
            primary
        )];

        // Comma-separated FROM tables behave like joins without a condition
        let extra_tables = query.from_tables.iter().skip(1).map(|t| (t, None));
        let joined_tables = query.joins.iter().map(|j| (&j.table, j.on.as_deref()));
        let related: Vec<(&TableRef, Option<&str>)> = extra_tables.chain(joined_tables).collect();

        for (table, _) in &related {
            let var = aliases.bind(table.binding());
            quantifiers.push(format!("(exists {var})"));
        }
        for (table, on) in &related {
            let var = aliases.bind(table.binding());
            predicates.push(format!("{}({})", relation_name(&table.name), var));
            if let Some(on) = on {
                predicates.push(aliases.substitute(on));
            }
        }

        for condition in &query.where_conditions {
            predicates.push(aliases.substitute(condition));
        }

        let attributes = if query.is_wildcard() {
            primary.clone()
        } else {
            query
                .select
                .iter()
                .map(|attr| {
                    let var = match &attr.source {
                        Some(source) => aliases.bind(source),
                        None => primary.clone(),
                    };
                    format!("{var}.{}", attr.name)
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let conjunction = predicates.join(" and ");
        let mut expression = if quantifiers.is_empty() {
            format!("{{ {attributes} | {conjunction} }}")
        } else {
            format!(
                "{{ {attributes} | {} ({conjunction}) }}",
                quantifiers.join(" ")
            )
        };

        if !query.order_by.is_empty() {
            let keys = query
                .order_by
                .iter()
                .map(|item| {
                    let key = match item.column.split_once('.') {
                        Some((alias, column)) if is_identifier(alias) && is_identifier(column) => {
                            format!("{}.{column}", aliases.bind(alias))
                        }
                        None if is_identifier(&item.column) => {
                            format!("{primary}.{}", item.column)
                        }
                        _ => aliases.substitute(&item.column),
                    };
                    format!("{key} {}", item.direction)
                })
                .collect::<Vec<_>>()
                .join(", ");
            expression.push_str(" sorted by ");
            expression.push_str(&keys);
        }

        TrcExpression(expression)
    }
}

/// Translate a read-only SQL statement into TRC.
///
/// The knowledge graph does not change the output; tables it does not
/// describe are logged so the audit trail shows unexplained relations.
pub fn to_trc(sql: &str, kg: &KgDocument) -> Result<TrcExpression, TrcError> {
    let builder = TrcBuilder::new();
    let query = builder.prepare(sql)?;

    let policy = kg.policy();
    for table in query.referenced_tables() {
        if !policy.contains_table(&table.name) {
            tracing::debug!(table = %table.name, "Relation not described by knowledge graph");
        }
    }

    Ok(builder.build_query(&query))
}

/// Format the explanation shown to a user next to generated SQL.
pub fn explain(trc: &TrcExpression, sql: &str, user_query: &str) -> String {
    format!("Query Translation:\n\"{user_query}\"\n\nSQL Generated:\n{sql}\n\nTRC Output:\n{trc}")
}
