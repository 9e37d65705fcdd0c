//! The three-stage validation pipeline.

use trcguard_core::SchemaPolicy;

use crate::logical::LogicalValidator;
use crate::result::{StageResult, ValidationResult};
use crate::semantic::SemanticValidator;
use crate::syntactic::SyntacticValidator;

/// Knobs for the gauntlet.
#[derive(Debug, Clone, Copy)]
pub struct GauntletOptions {
    /// Check SELECT tables and qualified columns against the policy.
    /// When off, the semantic stage always passes.
    pub semantic_checks: bool,
}

impl Default for GauntletOptions {
    fn default() -> Self {
        Self {
            semantic_checks: true,
        }
    }
}

/// Runs the syntactic, semantic and logical stages in order.
///
/// A stage runs only when the previous one passed; stages that did not run
/// keep their default `{ valid: false, errors: [] }`. The gauntlet never
/// fails, every rejection is reported in the returned [`ValidationResult`].
pub struct Gauntlet<'a> {
    policy: &'a SchemaPolicy,
    options: GauntletOptions,
    syntactic: SyntacticValidator,
}

impl<'a> Gauntlet<'a> {
    pub fn new(policy: &'a SchemaPolicy) -> Self {
        Self::with_options(policy, GauntletOptions::default())
    }

    pub fn with_options(policy: &'a SchemaPolicy, options: GauntletOptions) -> Self {
        Self {
            policy,
            options,
            syntactic: SyntacticValidator::new(),
        }
    }

    pub fn validate(&self, sql: &str, nl_query: &str) -> ValidationResult {
        let mut result = ValidationResult::default();

        let (syntactic, query) = self.syntactic.validate(sql);
        result.syntactic = syntactic;
        if !result.syntactic.valid {
            tracing::debug!(errors = ?result.syntactic.errors, "Syntactic stage failed");
            return result;
        }

        result.semantic = match &query {
            Some(query) if self.options.semantic_checks => {
                SemanticValidator::new(self.policy).validate(query)
            }
            _ => StageResult::pass(),
        };
        if !result.semantic.valid {
            tracing::debug!(errors = ?result.semantic.errors, "Semantic stage failed");
            return result;
        }

        result.logical = LogicalValidator::new(self.policy).validate(sql, nl_query);
        result.overall_valid = result.logical.valid;

        tracing::debug!(valid = result.overall_valid, "Validation complete");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> SchemaPolicy {
        SchemaPolicy::normalize(&json!({
            "employees": {"required": false, "columns": {"id": true, "name": false}}
        }))
    }

    #[test]
    fn test_all_stages_pass() {
        let policy = policy();
        let result = Gauntlet::new(&policy).validate("SELECT e.name FROM employees e", "names");
        assert!(result.syntactic.valid);
        assert!(result.semantic.valid);
        assert!(result.logical.valid);
        assert!(result.overall_valid);
    }

    #[test]
    fn test_semantic_failure_stops_pipeline() {
        let policy = policy();
        let result = Gauntlet::new(&policy).validate("SELECT * FROM salaries", "salaries");
        assert!(result.syntactic.valid);
        assert!(!result.semantic.valid);
        assert_eq!(result.logical, StageResult::default());
        assert!(!result.overall_valid);
    }

    #[test]
    fn test_semantic_checks_can_be_disabled() {
        let policy = policy();
        let gauntlet = Gauntlet::with_options(
            &policy,
            GauntletOptions {
                semantic_checks: false,
            },
        );
        let result = gauntlet.validate("SELECT * FROM salaries", "salaries");
        assert!(result.semantic.valid);
        assert!(result.overall_valid);
    }

    #[test]
    fn test_non_query_skips_semantic_checks() {
        let policy = policy();
        let result = Gauntlet::new(&policy).validate("DROP TABLE employees", "tidy up");
        assert!(result.semantic.valid);
        assert!(result.logical.valid);
    }
}
