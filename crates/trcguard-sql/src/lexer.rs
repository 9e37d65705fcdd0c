//! SQL lexing.
//!
//! Raw tokens come from the `sqlparser` tokenizer and are folded into a small
//! closed set of [`TokenKind`]s. Only the keywords that delimit clauses are
//! recognized; every other word is an identifier as far as extraction is
//! concerned.

use crate::error::StructuralError;
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::fmt;

/// Keywords that shape clause boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    Distinct,
    From,
    As,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Natural,
    On,
    Using,
    Where,
    Group,
    Having,
    Order,
    By,
    Limit,
    Offset,
    Asc,
    Desc,
}

impl Keyword {
    /// Recognize an unquoted word, case-insensitively.
    pub fn parse(word: &str) -> Option<Self> {
        let keyword = match word.to_ascii_uppercase().as_str() {
            "SELECT" => Keyword::Select,
            "DISTINCT" => Keyword::Distinct,
            "FROM" => Keyword::From,
            "AS" => Keyword::As,
            "JOIN" => Keyword::Join,
            "INNER" => Keyword::Inner,
            "LEFT" => Keyword::Left,
            "RIGHT" => Keyword::Right,
            "FULL" => Keyword::Full,
            "OUTER" => Keyword::Outer,
            "CROSS" => Keyword::Cross,
            "NATURAL" => Keyword::Natural,
            "ON" => Keyword::On,
            "USING" => Keyword::Using,
            "WHERE" => Keyword::Where,
            "GROUP" => Keyword::Group,
            "HAVING" => Keyword::Having,
            "ORDER" => Keyword::Order,
            "BY" => Keyword::By,
            "LIMIT" => Keyword::Limit,
            "OFFSET" => Keyword::Offset,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            _ => return None,
        };
        Some(keyword)
    }
}

/// The closed set of token kinds seen by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A clause keyword.
    Keyword(Keyword),
    /// Any other word. `value` has quoting removed.
    Ident { value: String, quoted: bool },
    /// String and numeric literals.
    Literal,
    Comma,
    Period,
    Star,
    LParen,
    RParen,
    Semicolon,
    /// Whitespace and comments.
    Whitespace,
    /// Operators and any other punctuation.
    Operator,
}

/// A token together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub text: String,
}

impl Lexeme {
    /// Check if this token is the given keyword.
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Whitespace and comments carry no meaning for extraction.
    pub fn is_trivia(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    /// The token text with identifier quoting removed.
    pub fn unquoted(&self) -> &str {
        match &self.kind {
            TokenKind::Ident { value, .. } => value,
            _ => &self.text,
        }
    }

    fn from_token(token: Token) -> Self {
        // Display drops the doubling of embedded quotes
        let text = match &token {
            Token::SingleQuotedString(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.to_string(),
        };
        let kind = match token {
            Token::Word(word) => match word.quote_style {
                None => match Keyword::parse(&word.value) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Ident {
                        value: word.value,
                        quoted: false,
                    },
                },
                Some(_) => TokenKind::Ident {
                    value: word.value,
                    quoted: true,
                },
            },
            Token::Number(..) | Token::SingleQuotedString(_) => TokenKind::Literal,
            Token::Comma => TokenKind::Comma,
            Token::Period => TokenKind::Period,
            Token::Mul => TokenKind::Star,
            Token::LParen => TokenKind::LParen,
            Token::RParen => TokenKind::RParen,
            Token::SemiColon => TokenKind::Semicolon,
            Token::Whitespace(_) => TokenKind::Whitespace,
            _ => TokenKind::Operator,
        };
        Self { kind, text }
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Tokenizes SQL text.
pub struct Lexer {
    dialect: GenericDialect,
}

impl fmt::Debug for Lexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer").field("dialect", &"generic").finish()
    }
}

impl Clone for Lexer {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    /// Create a new lexer.
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
        }
    }

    /// Tokenize SQL text into lexemes, whitespace included.
    pub fn tokenize(&self, sql: &str) -> Result<Vec<Lexeme>, StructuralError> {
        let tokens = Tokenizer::new(&self.dialect, sql)
            .tokenize()
            .map_err(|e| StructuralError::Tokenize(e.to_string()))?;

        Ok(tokens
            .into_iter()
            .filter(|token| !matches!(token, Token::EOF))
            .map(Lexeme::from_token)
            .collect())
    }

    /// Tokenize text that must hold exactly one statement.
    ///
    /// Statements are separated by top-level semicolons; separators with
    /// nothing but whitespace between them do not count, so a trailing
    /// terminator is accepted. The returned tokens exclude the terminator.
    pub fn tokenize_statement(&self, sql: &str) -> Result<Vec<Lexeme>, StructuralError> {
        let mut statements = split_statements(self.tokenize(sql)?);
        match statements.len() {
            0 => Err(StructuralError::Empty),
            1 => Ok(statements.remove(0)),
            count => Err(StructuralError::MultipleStatements { count }),
        }
    }
}

/// Split a token stream at top-level semicolons, dropping empty statements.
fn split_statements(tokens: Vec<Lexeme>) -> Vec<Vec<Lexeme>> {
    let mut statements = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;

    for token in tokens {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => {
                if current.iter().any(|t: &Lexeme| !t.is_trivia()) {
                    statements.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                continue;
            }
            _ => {}
        }
        current.push(token);
    }

    if current.iter().any(|t| !t.is_trivia()) {
        statements.push(current);
    }
    statements
}

/// Render tokens back to text, collapsing whitespace and comments into
/// single spaces.
pub fn render(tokens: &[Lexeme]) -> String {
    let mut out = String::new();
    let mut pending_space = false;

    for token in tokens {
        if token.is_trivia() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push_str(&token.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        Lexer::new()
            .tokenize(sql)
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("select * From t"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Star,
                TokenKind::Keyword(Keyword::From),
                TokenKind::Ident {
                    value: "t".to_string(),
                    quoted: false
                },
            ]
        );
    }

    #[test]
    fn test_quoted_keyword_is_identifier() {
        assert_eq!(
            kinds("\"order\""),
            vec![TokenKind::Ident {
                value: "order".to_string(),
                quoted: true
            }]
        );
    }

    #[test]
    fn test_trailing_terminator_is_one_statement() {
        let tokens = Lexer::new()
            .tokenize_statement("SELECT * FROM t;  ")
            .unwrap();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Semicolon));
    }

    #[test]
    fn test_multiple_statements_rejected() {
        let err = Lexer::new()
            .tokenize_statement("SELECT * FROM a; SELECT * FROM b;")
            .unwrap_err();
        assert_eq!(err, StructuralError::MultipleStatements { count: 2 });
    }

    #[test]
    fn test_only_terminators_is_empty() {
        assert_eq!(
            Lexer::new().tokenize_statement(" ; ;").unwrap_err(),
            StructuralError::Empty
        );
    }

    #[test]
    fn test_string_literal_keeps_doubled_quotes() {
        let tokens = Lexer::new().tokenize("name = 'it''s e'").unwrap();
        assert_eq!(render(&tokens), "name = 'it''s e'");
    }

    #[test]
    fn test_lexer_is_debug() {
        assert_eq!(format!("{:?}", Lexer::new()), "Lexer { dialect: \"generic\" }");
    }

    #[test]
    fn test_render_collapses_whitespace() {
        let tokens = Lexer::new().tokenize("a.x   =\n\t'b  c'").unwrap();
        assert_eq!(render(&tokens), "a.x = 'b  c'");
    }
}
