//! Stage 2: schema checks against the policy.

use trcguard_core::SchemaPolicy;
use trcguard_sql::StructuredQuery;

use crate::error::ValidationError;
use crate::result::StageResult;

/// Checks that every referenced table, and every explicitly qualified column,
/// exists in the policy.
pub struct SemanticValidator<'a> {
    policy: &'a SchemaPolicy,
}

impl<'a> SemanticValidator<'a> {
    pub fn new(policy: &'a SchemaPolicy) -> Self {
        Self { policy }
    }

    pub fn validate(&self, query: &StructuredQuery) -> StageResult {
        let mut errors = Vec::new();

        for table in query.referenced_tables() {
            if !self.policy.contains_table(&table.name) {
                errors.push(ValidationError::table_not_in_policy(&table.name));
            }
        }

        for attribute in &query.select {
            let Some(source) = &attribute.source else {
                continue;
            };

            match query.resolve_binding(source) {
                None => errors.push(ValidationError::unknown_alias(source)),
                Some(_) if attribute.name == "*" => {}
                // Missing tables were already reported above.
                Some(table) if self.policy.contains_table(&table.name) => {
                    if !self.policy.contains_column(&table.name, &attribute.name) {
                        errors.push(ValidationError::column_not_in_policy(
                            &table.name,
                            &attribute.name,
                        ));
                    }
                }
                Some(_) => {}
            }
        }

        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "Semantic validation failed");
        }
        StageResult::from_errors(errors)
    }
}
