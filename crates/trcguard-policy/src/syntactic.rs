//! Stage 1: structural checks.

use trcguard_sql::{Extractor, StructuredQuery};

use crate::error::ValidationError;
use crate::result::StageResult;

/// Checks that a statement is a single well-formed statement and, for
/// SELECT queries, that its clauses can be extracted.
///
/// Statements that are not queries only need to lex; whether they are
/// permitted at all is decided by the logical stage.
#[derive(Debug, Clone, Default)]
pub struct SyntacticValidator {
    extractor: Extractor,
}

impl SyntacticValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the stage, returning the extracted query when there is one.
    pub fn validate(&self, sql: &str) -> (StageResult, Option<StructuredQuery>) {
        if sql.trim().is_empty() {
            return (StageResult::fail(ValidationError::empty_query()), None);
        }

        let statement = match self.extractor.statement(sql) {
            Ok(statement) => statement,
            Err(e) => return (StageResult::fail(ValidationError::syntax_error(e)), None),
        };

        if !statement.is_query() {
            tracing::debug!(
                keyword = %statement.leading_word(),
                "Statement is not a query, skipping clause extraction"
            );
            return (StageResult::pass(), None);
        }

        match self.extractor.extract_statement(&statement) {
            Ok(query) => (StageResult::pass(), Some(query)),
            Err(e) => (StageResult::fail(ValidationError::syntax_error(e)), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_extracted() {
        let (stage, query) = SyntacticValidator::new().validate("SELECT name FROM employees");
        assert!(stage.valid);
        assert_eq!(query.unwrap().primary_table().name, "employees");
    }

    #[test]
    fn test_validator_is_debug() {
        let debug = format!("{:?}", SyntacticValidator::new());
        assert!(debug.contains("Extractor"));
        assert!(debug.contains("Lexer"));
    }

    #[test]
    fn test_empty() {
        let (stage, query) = SyntacticValidator::new().validate("   ");
        assert!(!stage.valid);
        assert_eq!(stage.errors, vec!["Empty SQL query"]);
        assert!(query.is_none());
    }

    #[test]
    fn test_missing_from() {
        let (stage, _) = SyntacticValidator::new().validate("SELECT name");
        assert!(!stage.valid);
        assert!(stage.errors[0].starts_with("Syntax error"));
    }

    #[test]
    fn test_non_query_only_lexes() {
        let (stage, query) = SyntacticValidator::new().validate("DROP TABLE orders");
        assert!(stage.valid);
        assert!(query.is_none());
    }

    #[test]
    fn test_multiple_statements() {
        let (stage, _) =
            SyntacticValidator::new().validate("SELECT * FROM a; SELECT * FROM b");
        assert!(!stage.valid);
    }
}
