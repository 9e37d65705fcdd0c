//! Validation error types for the gauntlet.
//!
//! Policy outcomes are values, not failures of the call: each stage collects
//! [`ValidationError`]s and reports their messages in its [`StageResult`].
//!
//! [`StageResult`]: crate::result::StageResult

use std::fmt;

/// A single reason a stage rejected a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The kind of validation error.
    pub kind: ValidationErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // =========================================================================
    // SYNTACTIC ERRORS
    // =========================================================================

    /// Create an empty query error.
    pub fn empty_query() -> Self {
        Self::new(ValidationErrorKind::EmptyQuery, "Empty SQL query")
    }

    /// Create a syntax error from an extraction failure.
    pub fn syntax_error(reason: impl fmt::Display) -> Self {
        Self::new(
            ValidationErrorKind::SyntaxError,
            format!("Syntax error: {}", reason),
        )
    }

    // =========================================================================
    // SEMANTIC ERRORS
    // =========================================================================

    /// Create a table not in policy error.
    pub fn table_not_in_policy(table: &str) -> Self {
        Self::new(
            ValidationErrorKind::TableNotInPolicy,
            format!("Table '{}' is not defined in the schema policy", table),
        )
    }

    /// Create a column not in policy error.
    pub fn column_not_in_policy(table: &str, column: &str) -> Self {
        Self::new(
            ValidationErrorKind::ColumnNotInPolicy,
            format!(
                "Column '{}' is not defined for table '{}' in the schema policy",
                column, table
            ),
        )
    }

    /// Create an unknown alias error.
    pub fn unknown_alias(alias: &str) -> Self {
        Self::new(
            ValidationErrorKind::UnknownAlias,
            format!("Unknown table or alias '{}'", alias),
        )
    }

    // =========================================================================
    // LOGICAL / SECURITY ERRORS
    // =========================================================================

    /// Create a destructive intent error.
    pub fn destructive_intent(word: &str) -> Self {
        Self::new(
            ValidationErrorKind::DestructiveIntent,
            format!(
                "Natural language query requests a destructive operation: '{}'",
                word
            ),
        )
    }

    /// Create a delete not allowed error.
    pub fn delete_not_allowed() -> Self {
        Self::new(
            ValidationErrorKind::DeleteNotAllowed,
            "DELETE queries are not allowed",
        )
    }

    /// Create an unsupported statement error.
    pub fn unsupported_statement() -> Self {
        Self::new(
            ValidationErrorKind::UnsupportedStatement,
            "SQL query type not recognized or unsupported",
        )
    }

    /// Create a required table error.
    pub fn table_required(operation: &str, table: &str) -> Self {
        Self::new(
            ValidationErrorKind::TableRequired,
            format!(
                "Cannot {} table '{}': table is required by the schema policy",
                operation, table
            ),
        )
    }

    /// Create a required column error.
    pub fn column_required(operation: &str, table: &str, column: &str) -> Self {
        Self::new(
            ValidationErrorKind::ColumnRequired,
            format!(
                "Cannot {} column '{}' on table '{}': column is required by the schema policy",
                operation, column, table
            ),
        )
    }

    /// Create a required column missing error.
    pub fn required_column_missing(table: &str, column: &str) -> Self {
        Self::new(
            ValidationErrorKind::RequiredColumnMissing,
            format!(
                "Required column '{}' is missing from INSERT into table '{}'",
                column, table
            ),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    // =========================================================================
    // Syntactic errors
    // =========================================================================
    /// The statement is empty.
    EmptyQuery,
    /// The statement could not be extracted.
    SyntaxError,

    // =========================================================================
    // Semantic errors
    // =========================================================================
    /// A referenced table is absent from the policy.
    TableNotInPolicy,
    /// A referenced column is absent from its table's policy entry.
    ColumnNotInPolicy,
    /// A column qualifier names no table in the query.
    UnknownAlias,

    // =========================================================================
    // Logical / security errors
    // =========================================================================
    /// The natural-language request asks for a destructive operation.
    DestructiveIntent,
    /// The statement mentions DELETE.
    DeleteNotAllowed,
    /// The statement matches no supported pattern.
    UnsupportedStatement,
    /// The statement would create or drop a required table.
    TableRequired,
    /// The statement would add or drop a required column.
    ColumnRequired,
    /// An INSERT omits a required column.
    RequiredColumnMissing,
}
