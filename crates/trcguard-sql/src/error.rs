//! Error types for SQL extraction and TRC construction.

use thiserror::Error;

/// The statement could not be broken into clauses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// Nothing but whitespace, comments or terminators.
    #[error("empty SQL statement")]
    Empty,

    /// The tokenizer rejected the input.
    #[error("failed to tokenize SQL: {0}")]
    Tokenize(String),

    /// More than one top-level statement was supplied.
    #[error("expected exactly one SQL statement, found {count}")]
    MultipleStatements { count: usize },

    /// The statement is not a SELECT query.
    #[error("expected a SELECT query, found {keyword}")]
    NotAQuery { keyword: String },

    /// SELECT was not followed by any attribute.
    #[error("SELECT list is empty")]
    EmptySelectList,

    /// The query has no FROM clause.
    #[error("query has no FROM clause")]
    MissingFrom,

    /// A FROM or JOIN keyword was not followed by a table name.
    #[error("expected a table name after {clause}")]
    MissingTable { clause: &'static str },

    /// An ON condition appeared without a preceding JOIN.
    #[error("ON condition without a JOIN")]
    DanglingOn,
}

/// Errors that can occur while building a TRC expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrcError {
    /// The statement could not be extracted.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// The statement contains a mutating keyword.
    #[error("unsafe operation {keyword} cannot be expressed in relational calculus")]
    UnsafeOperation { keyword: String },
}

/// Errors raised while deriving a knowledge graph from DDL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The DDL could not be parsed.
    #[error("failed to parse schema: {0}")]
    Parse(String),

    /// The DDL defines no tables.
    #[error("schema contains no CREATE TABLE statements")]
    NoTables,
}
