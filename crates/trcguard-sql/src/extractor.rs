//! Structural extraction of SELECT statements.
//!
//! The extractor makes one pass over the token stream, cutting it into clause
//! segments at top-level clause keywords, and then interprets each segment in
//! order. Tokens inside parentheses never start a new clause.

use crate::error::StructuralError;
use crate::lexer::{Keyword, Lexeme, Lexer, TokenKind, render};
use crate::query::{
    Join, JoinKind, OrderItem, SelectAttribute, SortDirection, StructuredQuery, TableRef,
};

/// Characters stripped from identifiers in the select list and table names.
const QUOTE_CHARS: &[char] = &['"', '`', '[', ']'];

/// A single lexed SQL statement.
#[derive(Debug, Clone)]
pub struct Statement {
    tokens: Vec<Lexeme>,
}

impl Statement {
    /// All tokens, whitespace included.
    pub fn tokens(&self) -> &[Lexeme] {
        &self.tokens
    }

    /// The first word of the statement, uppercased.
    pub fn leading_word(&self) -> String {
        self.tokens
            .iter()
            .find(|t| !t.is_trivia())
            .map(|t| t.text.to_uppercase())
            .unwrap_or_default()
    }

    /// Check if the statement is a SELECT query.
    pub fn is_query(&self) -> bool {
        self.tokens
            .iter()
            .find(|t| !t.is_trivia())
            .is_some_and(|t| t.is_keyword(Keyword::Select))
    }
}

/// Extracts typed clauses from SQL text.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    lexer: Lexer,
}

impl Extractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self {
            lexer: Lexer::new(),
        }
    }

    /// Lex SQL text that must contain exactly one statement.
    pub fn statement(&self, sql: &str) -> Result<Statement, StructuralError> {
        let tokens = self.lexer.tokenize_statement(sql)?;
        Ok(Statement { tokens })
    }

    /// Extract the clauses of a single SELECT statement.
    pub fn extract(&self, sql: &str) -> Result<StructuredQuery, StructuralError> {
        let statement = self.statement(sql)?;
        self.extract_statement(&statement)
    }

    /// Extract the clauses of an already lexed statement.
    pub fn extract_statement(
        &self,
        statement: &Statement,
    ) -> Result<StructuredQuery, StructuralError> {
        if !statement.is_query() {
            return Err(StructuralError::NotAQuery {
                keyword: statement.leading_word(),
            });
        }

        let mut select = Vec::new();
        let mut from_tables = Vec::new();
        let mut joins: Vec<Join> = Vec::new();
        let mut where_conditions = Vec::new();
        let mut order_by = Vec::new();
        let mut saw_from = false;

        for segment in segment(statement.tokens()) {
            match segment.clause {
                Clause::Select => select = parse_select(&segment.tokens)?,
                Clause::From => {
                    saw_from = true;
                    for item in split_top_level(&segment.tokens) {
                        from_tables.push(parse_table_ref(item, "FROM")?);
                    }
                }
                Clause::Join(kind) => joins.push(Join {
                    kind,
                    table: parse_table_ref(&segment.tokens, "JOIN")?,
                    on: None,
                }),
                Clause::On => {
                    let join = joins
                        .last_mut()
                        .filter(|join| join.on.is_none())
                        .ok_or(StructuralError::DanglingOn)?;
                    let condition = render(&segment.tokens);
                    if !condition.is_empty() {
                        join.on = Some(condition);
                    }
                }
                Clause::Using => {
                    let left = match joins.len() {
                        0 => return Err(StructuralError::DanglingOn),
                        1 => from_tables.last().map(|t| t.binding().to_string()),
                        n => Some(joins[n - 2].table.binding().to_string()),
                    };
                    let join = joins
                        .last_mut()
                        .filter(|join| join.on.is_none())
                        .ok_or(StructuralError::DanglingOn)?;
                    if let Some(left) = left {
                        let condition =
                            using_condition(&left, join.table.binding(), &segment.tokens);
                        if !condition.is_empty() {
                            join.on = Some(condition);
                        }
                    }
                }
                Clause::Where => {
                    let condition = render(&segment.tokens);
                    if !condition.is_empty() {
                        where_conditions.push(condition);
                    }
                }
                Clause::OrderBy => order_by.extend(parse_order_by(&segment.tokens)),
                Clause::GroupBy | Clause::Having | Clause::Limit => {
                    tracing::debug!(clause = ?segment.clause, "Clause not extracted");
                }
            }
        }

        if select.is_empty() {
            return Err(StructuralError::EmptySelectList);
        }
        if !saw_from {
            return Err(StructuralError::MissingFrom);
        }

        Ok(StructuredQuery {
            select,
            from_tables,
            joins,
            where_conditions,
            order_by,
        })
    }
}

/// Extract the clauses of a single SELECT statement.
pub fn extract(sql: &str) -> Result<StructuredQuery, StructuralError> {
    Extractor::new().extract(sql)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Select,
    From,
    Join(JoinKind),
    On,
    Using,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
}

#[derive(Debug)]
struct Segment {
    clause: Clause,
    tokens: Vec<Lexeme>,
}

/// Index and token of the next non-whitespace token at or after `from`.
fn next_significant(tokens: &[Lexeme], from: usize) -> Option<(usize, &Lexeme)> {
    tokens
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, t)| !t.is_trivia())
}

fn join_prefix(keyword: Keyword) -> Option<JoinKind> {
    match keyword {
        Keyword::Inner => Some(JoinKind::Inner),
        Keyword::Left => Some(JoinKind::Left),
        Keyword::Right => Some(JoinKind::Right),
        Keyword::Full => Some(JoinKind::Full),
        Keyword::Cross => Some(JoinKind::Cross),
        Keyword::Natural => Some(JoinKind::Natural),
        _ => None,
    }
}

/// Cut the token stream into clause segments.
///
/// Tokens before the first clause keyword are dropped; the caller has already
/// checked that the statement starts with SELECT.
fn segment(tokens: &[Lexeme]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut depth = 0usize;
    let mut pending_join: Option<JoinKind> = None;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if depth == 0
            && let TokenKind::Keyword(keyword) = token.kind
        {
            let next = next_significant(tokens, i + 1);
            let next_is = |kw: Keyword| next.is_some_and(|(_, t)| t.is_keyword(kw));

            let boundary = match keyword {
                Keyword::Select if segments.is_empty() => Some((Clause::Select, i + 1)),
                Keyword::From => Some((Clause::From, i + 1)),
                Keyword::Inner
                | Keyword::Left
                | Keyword::Right
                | Keyword::Full
                | Keyword::Cross
                | Keyword::Natural
                    if next_is(Keyword::Join) || next_is(Keyword::Outer) =>
                {
                    pending_join = join_prefix(keyword);
                    i += 1;
                    continue;
                }
                Keyword::Outer if pending_join.is_some() => {
                    i += 1;
                    continue;
                }
                Keyword::Join => Some((
                    Clause::Join(pending_join.take().unwrap_or(JoinKind::Inner)),
                    i + 1,
                )),
                Keyword::On => Some((Clause::On, i + 1)),
                Keyword::Using => Some((Clause::Using, i + 1)),
                Keyword::Where => Some((Clause::Where, i + 1)),
                Keyword::Group | Keyword::Order if next_is(Keyword::By) => {
                    let clause = if keyword == Keyword::Group {
                        Clause::GroupBy
                    } else {
                        Clause::OrderBy
                    };
                    next.map(|(by, _)| (clause, by + 1))
                }
                Keyword::Having => Some((Clause::Having, i + 1)),
                Keyword::Limit | Keyword::Offset => Some((Clause::Limit, i + 1)),
                _ => None,
            };

            if let Some((clause, resume)) = boundary {
                segments.push(Segment {
                    clause,
                    tokens: Vec::new(),
                });
                i = resume;
                continue;
            }
        }

        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
        if let Some(current) = segments.last_mut() {
            current.tokens.push(token.clone());
        }
        i += 1;
    }

    segments
}

/// Split tokens at top-level commas.
fn split_top_level(tokens: &[Lexeme]) -> Vec<&[Lexeme]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

/// The leading expression of an item: tokens up to the first top-level
/// whitespace or `AS`, concatenated with quoting removed.
///
/// Returns the expression text and the remaining tokens.
fn leading_expression(tokens: &[Lexeme]) -> (String, &[Lexeme]) {
    let start = tokens
        .iter()
        .position(|t| !t.is_trivia())
        .unwrap_or(tokens.len());

    let mut text = String::new();
    let mut depth = 0usize;
    let mut end = start;

    while end < tokens.len() {
        let token = &tokens[end];
        if depth == 0 && (token.is_trivia() || token.is_keyword(Keyword::As)) {
            break;
        }
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Whitespace => {
                end += 1;
                continue;
            }
            _ => {}
        }
        text.push_str(token.unquoted());
        end += 1;
    }

    let text: String = text.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect();
    (text, &tokens[end..])
}

fn parse_select(tokens: &[Lexeme]) -> Result<Vec<SelectAttribute>, StructuralError> {
    let tokens = match next_significant(tokens, 0) {
        Some((i, t)) if t.is_keyword(Keyword::Distinct) => &tokens[i + 1..],
        _ => tokens,
    };

    let mut attributes = Vec::new();
    for (index, item) in split_top_level(tokens).into_iter().enumerate() {
        let significant: Vec<&Lexeme> = item.iter().filter(|t| !t.is_trivia()).collect();
        if index == 0
            && let [only] = significant.as_slice()
            && only.kind == TokenKind::Star
        {
            return Ok(vec![SelectAttribute::wildcard()]);
        }

        let (expression, _) = leading_expression(item);
        if expression.is_empty() {
            continue;
        }

        let segments: Vec<&str> = expression.split('.').collect();
        let attribute = match segments.as_slice() {
            [name] => SelectAttribute {
                name: name.to_string(),
                source: None,
            },
            [source, name] => SelectAttribute {
                name: name.to_string(),
                source: Some(source.to_string()),
            },
            // More than one dot: qualifiers are collapsed, not rejected
            [.., last] => SelectAttribute {
                name: last.to_string(),
                source: None,
            },
            [] => continue,
        };
        attributes.push(attribute);
    }

    if attributes.is_empty() {
        return Err(StructuralError::EmptySelectList);
    }
    Ok(attributes)
}

fn parse_table_ref(tokens: &[Lexeme], clause: &'static str) -> Result<TableRef, StructuralError> {
    let starts_with_name = next_significant(tokens, 0)
        .is_some_and(|(_, t)| matches!(t.kind, TokenKind::Ident { .. }));
    if !starts_with_name {
        return Err(StructuralError::MissingTable { clause });
    }

    let (path, rest) = leading_expression(tokens);
    let name = path.rsplit('.').next().unwrap_or(&path).to_string();
    if name.is_empty() {
        return Err(StructuralError::MissingTable { clause });
    }

    let mut rest = rest.iter().filter(|t| !t.is_trivia());
    let alias = match rest.next() {
        Some(t) if t.is_keyword(Keyword::As) => rest.next(),
        other => other,
    }
    .filter(|t| matches!(t.kind, TokenKind::Ident { .. }))
    .map(|t| t.unquoted().to_string());

    Ok(TableRef { name, alias })
}

/// Equality conjunction for the column list of `USING (a, b)`.
fn using_condition(left: &str, right: &str, tokens: &[Lexeme]) -> String {
    tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Ident { .. }))
        .map(|t| format!("{left}.{column} = {right}.{column}", column = t.unquoted()))
        .collect::<Vec<_>>()
        .join(" and ")
}

fn parse_order_by(tokens: &[Lexeme]) -> Vec<OrderItem> {
    let mut items = Vec::new();

    for item in split_top_level(tokens) {
        let Some(last) = item.iter().rposition(|t| !t.is_trivia()) else {
            continue;
        };

        let (column_tokens, direction) = match &item[last].kind {
            TokenKind::Keyword(Keyword::Desc) => (&item[..last], SortDirection::Desc),
            TokenKind::Keyword(Keyword::Asc) => (&item[..last], SortDirection::Asc),
            _ => (item, SortDirection::Asc),
        };

        let column = render(column_tokens);
        if !column.is_empty() {
            items.push(OrderItem { column, direction });
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(name: &str, alias: Option<&str>) -> TableRef {
        TableRef {
            name: name.to_string(),
            alias: alias.map(str::to_string),
        }
    }

    fn attr(source: Option<&str>, name: &str) -> SelectAttribute {
        SelectAttribute {
            name: name.to_string(),
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn test_select_star() {
        let query = extract("SELECT * FROM employees").unwrap();
        assert!(query.is_wildcard());
        assert_eq!(query.from_tables, vec![table("employees", None)]);
        assert!(query.joins.is_empty());
        assert!(query.where_conditions.is_empty());
    }

    #[test]
    fn test_select_list_with_sources() {
        let query = extract("SELECT e.name, salary, \"d\".\"dept_name\" FROM employees e").unwrap();
        assert_eq!(
            query.select,
            vec![
                attr(Some("e"), "name"),
                attr(None, "salary"),
                attr(Some("d"), "dept_name"),
            ]
        );
    }

    #[test]
    fn test_extra_dots_are_collapsed() {
        let query = extract("SELECT public.employees.name FROM public.employees").unwrap();
        assert_eq!(query.select, vec![attr(None, "name")]);
        assert_eq!(query.from_tables, vec![table("employees", None)]);
    }

    #[test]
    fn test_distinct_and_item_alias_ignored() {
        let query = extract("SELECT DISTINCT e.name AS full_name FROM employees AS e").unwrap();
        assert_eq!(query.select, vec![attr(Some("e"), "name")]);
        assert_eq!(query.from_tables, vec![table("employees", Some("e"))]);
    }

    #[test]
    fn test_join_with_on_condition() {
        let query = extract(
            "SELECT e.name, d.dept_name FROM employees e JOIN departments d ON e.dept_id = d.id",
        )
        .unwrap();

        assert_eq!(query.joins.len(), 1);
        let join = &query.joins[0];
        assert_eq!(join.kind, JoinKind::Inner);
        assert_eq!(join.table, table("departments", Some("d")));
        assert_eq!(join.on.as_deref(), Some("e.dept_id = d.id"));
    }

    #[test]
    fn test_outer_is_normalized_away() {
        let query = extract(
            "SELECT * FROM a LEFT OUTER JOIN b ON a.id = b.a_id \
             RIGHT JOIN c ON b.id = c.b_id FULL OUTER JOIN d ON c.id = d.c_id",
        )
        .unwrap();

        let kinds: Vec<JoinKind> = query.joins.iter().map(|j| j.kind).collect();
        assert_eq!(kinds, vec![JoinKind::Left, JoinKind::Right, JoinKind::Full]);
        assert_eq!(query.joins[2].on.as_deref(), Some("c.id = d.c_id"));
    }

    #[test]
    fn test_on_condition_stops_at_where() {
        let query = extract(
            "SELECT * FROM orders o INNER JOIN users u ON o.user_id = u.id WHERE o.total > 100 ORDER BY o.total DESC, u.name",
        )
        .unwrap();

        assert_eq!(query.joins[0].on.as_deref(), Some("o.user_id = u.id"));
        assert_eq!(query.where_conditions, vec!["o.total > 100".to_string()]);
        assert_eq!(
            query.order_by,
            vec![
                OrderItem {
                    column: "o.total".to_string(),
                    direction: SortDirection::Desc
                },
                OrderItem {
                    column: "u.name".to_string(),
                    direction: SortDirection::Asc
                },
            ]
        );
    }

    #[test]
    fn test_where_keeps_nested_keywords() {
        let query = extract(
            "SELECT * FROM t WHERE id IN (SELECT id FROM u WHERE x = 1) GROUP BY id LIMIT 5",
        )
        .unwrap();
        assert_eq!(
            query.where_conditions,
            vec!["id IN (SELECT id FROM u WHERE x = 1)".to_string()]
        );
    }

    #[test]
    fn test_left_function_is_not_a_join() {
        let query = extract("SELECT LEFT(name, 3) FROM t").unwrap();
        assert_eq!(query.select, vec![attr(None, "LEFT(name,3)")]);
        assert!(query.joins.is_empty());
    }

    #[test]
    fn test_natural_join_is_not_an_alias() {
        let query = extract("SELECT * FROM employees NATURAL JOIN departments").unwrap();
        assert_eq!(query.from_tables, vec![table("employees", None)]);
        assert_eq!(query.joins.len(), 1);
        assert_eq!(query.joins[0].kind, JoinKind::Natural);
        assert_eq!(query.joins[0].table, table("departments", None));
    }

    #[test]
    fn test_using_becomes_equality() {
        let query = extract(
            "SELECT * FROM employees e JOIN departments d USING (dept_id) \
             JOIN sites s USING (site_id, region)",
        )
        .unwrap();
        assert_eq!(query.joins[0].table, table("departments", Some("d")));
        assert_eq!(query.joins[0].on.as_deref(), Some("e.dept_id = d.dept_id"));
        assert_eq!(
            query.joins[1].on.as_deref(),
            Some("d.site_id = s.site_id and d.region = s.region")
        );
    }

    #[test]
    fn test_comma_separated_from_tables() {
        let query = extract("SELECT * FROM a x, b AS y").unwrap();
        assert_eq!(
            query.from_tables,
            vec![table("a", Some("x")), table("b", Some("y"))]
        );
    }

    #[test]
    fn test_missing_from() {
        assert_eq!(extract("SELECT 1").unwrap_err(), StructuralError::MissingFrom);
    }

    #[test]
    fn test_missing_table_after_from() {
        assert_eq!(
            extract("SELECT * FROM (SELECT 1) s").unwrap_err(),
            StructuralError::MissingTable { clause: "FROM" }
        );
    }

    #[test]
    fn test_not_a_query() {
        assert_eq!(
            extract("insert into t (a) values (1)").unwrap_err(),
            StructuralError::NotAQuery {
                keyword: "INSERT".to_string()
            }
        );
    }

    #[test]
    fn test_multi_statement_rejected() {
        assert!(matches!(
            extract("SELECT * FROM a; DROP TABLE a"),
            Err(StructuralError::MultipleStatements { count: 2 })
        ));
    }

    #[test]
    fn test_dangling_on() {
        assert_eq!(
            extract("SELECT * FROM a ON a.id = 1").unwrap_err(),
            StructuralError::DanglingOn
        );
    }

    #[test]
    fn test_statement_leading_word() {
        let statement = Extractor::new().statement("  create table foo (id int);").unwrap();
        assert!(!statement.is_query());
        assert_eq!(statement.leading_word(), "CREATE");
    }
}
