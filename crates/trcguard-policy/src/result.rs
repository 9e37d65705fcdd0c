//! Gauntlet result types.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Outcome of one stage.
///
/// The default value (`valid: false`, no errors) marks a stage that never ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl StageResult {
    /// A passing stage.
    pub fn pass() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A stage that failed for a single reason.
    pub fn fail(error: ValidationError) -> Self {
        Self::from_errors(vec![error])
    }

    /// A stage that is valid iff `errors` is empty.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors: errors.into_iter().map(|e| e.message).collect(),
        }
    }
}

/// Outcome of the whole gauntlet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub syntactic: StageResult,
    pub semantic: StageResult,
    pub logical: StageResult,
    /// Conjunction of the three stage flags.
    pub overall_valid: bool,
}

impl ValidationResult {
    /// Every error message, in stage order.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.syntactic
            .errors
            .iter()
            .chain(&self.semantic.errors)
            .chain(&self.logical.errors)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_stage_never_ran() {
        let stage = StageResult::default();
        assert!(!stage.valid);
        assert!(stage.errors.is_empty());
    }

    #[test]
    fn test_from_errors() {
        assert!(StageResult::from_errors(vec![]).valid);

        let stage = StageResult::from_errors(vec![ValidationError::delete_not_allowed()]);
        assert!(!stage.valid);
        assert_eq!(stage.errors, vec!["DELETE queries are not allowed"]);
    }

    #[test]
    fn test_serialized_shape() {
        let result = ValidationResult {
            syntactic: StageResult::pass(),
            semantic: StageResult::pass(),
            logical: StageResult::fail(ValidationError::unsupported_statement()),
            overall_valid: false,
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "syntactic": {"valid": true, "errors": []},
                "semantic": {"valid": true, "errors": []},
                "logical": {"valid": false, "errors": ["SQL query type not recognized or unsupported"]},
                "overall_valid": false,
            })
        );
    }
}
