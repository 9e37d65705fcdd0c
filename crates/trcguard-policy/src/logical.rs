//! Stage 3: logical and security checks.
//!
//! The natural-language request is screened for destructive intent before
//! the statement itself is looked at. Statements are then classified by
//! their leading pattern and checked against the policy's required flags.

use regex::Regex;
use std::sync::LazyLock;
use trcguard_core::SchemaPolicy;

use crate::error::ValidationError;
use crate::result::StageResult;

/// Words in a request that signal a destructive operation, in checking order.
const DESTRUCTIVE_WORDS: [&str; 7] = [
    "delete", "remove", "drop", "insert", "update", "truncate", "alter",
];

static INTENT_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    DESTRUCTIVE_WORDS
        .iter()
        .map(|word| (*word, Regex::new(&format!(r"(?i)\b{}\b", word)).unwrap()))
        .collect()
});

const NAME: &str = r#"["`]?(\w+)["`]?"#;

static SELECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^select\b").unwrap());

static CREATE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^create\s+table\s+{NAME}")).unwrap());

static DROP_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^drop\s+table\s+{NAME}")).unwrap());

static ALTER_ADD_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^alter\s+table\s+{NAME}\s+add\s+column\s+{NAME}")).unwrap()
});

static ALTER_DROP_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^alter\s+table\s+{NAME}\s+drop\s+column\s+{NAME}")).unwrap()
});

static INSERT_INTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^insert\s+into\s+{NAME}\s*\(([^)]*)\)\s*values\b")).unwrap()
});

/// Statement shapes the logical stage knows how to judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementClass {
    Select,
    CreateTable { table: String },
    DropTable { table: String },
    AlterAddColumn { table: String, column: String },
    AlterDropColumn { table: String, column: String },
    Insert { table: String, columns: Vec<String> },
}

impl StatementClass {
    /// Classify normalized (trimmed, lowercased) SQL. First match wins.
    pub fn classify(normalized: &str) -> Option<Self> {
        if SELECT.is_match(normalized) {
            return Some(Self::Select);
        }
        if let Some(caps) = CREATE_TABLE.captures(normalized) {
            return Some(Self::CreateTable {
                table: caps[1].to_string(),
            });
        }
        if let Some(caps) = DROP_TABLE.captures(normalized) {
            return Some(Self::DropTable {
                table: caps[1].to_string(),
            });
        }
        if let Some(caps) = ALTER_ADD_COLUMN.captures(normalized) {
            return Some(Self::AlterAddColumn {
                table: caps[1].to_string(),
                column: caps[2].to_string(),
            });
        }
        if let Some(caps) = ALTER_DROP_COLUMN.captures(normalized) {
            return Some(Self::AlterDropColumn {
                table: caps[1].to_string(),
                column: caps[2].to_string(),
            });
        }
        if let Some(caps) = INSERT_INTO.captures(normalized) {
            let columns = caps[2]
                .split(',')
                .map(|c| c.trim().trim_matches(|q: char| q == '"' || q == '`').to_string())
                .filter(|c| !c.is_empty())
                .collect();
            return Some(Self::Insert {
                table: caps[1].to_string(),
                columns,
            });
        }
        None
    }
}

/// Applies the intent guard and the policy's required-flag rules.
pub struct LogicalValidator<'a> {
    policy: &'a SchemaPolicy,
}

impl<'a> LogicalValidator<'a> {
    pub fn new(policy: &'a SchemaPolicy) -> Self {
        Self { policy }
    }

    pub fn validate(&self, sql: &str, nl_query: &str) -> StageResult {
        if let Some(error) = Self::check_intent(nl_query) {
            tracing::warn!(reason = %error, "Rejected request with destructive intent");
            return StageResult::fail(error);
        }

        let normalized = sql.trim().to_lowercase();

        if normalized.contains("delete") {
            tracing::warn!("Rejected statement mentioning DELETE");
            return StageResult::fail(ValidationError::delete_not_allowed());
        }

        let Some(class) = StatementClass::classify(&normalized) else {
            tracing::warn!("Rejected unrecognized statement");
            return StageResult::fail(ValidationError::unsupported_statement());
        };

        tracing::debug!(statement = ?class, "Classified statement");
        let errors = self.evaluate(&class);
        if !errors.is_empty() {
            tracing::warn!(errors = errors.len(), "Statement violates schema policy");
        }
        StageResult::from_errors(errors)
    }

    /// The first destructive word found in a request, as an error.
    pub fn check_intent(nl_query: &str) -> Option<ValidationError> {
        INTENT_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(nl_query))
            .map(|(word, _)| ValidationError::destructive_intent(word))
    }

    /// Policy rules for a classified statement.
    pub fn evaluate(&self, class: &StatementClass) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        match class {
            StatementClass::Select => {}
            StatementClass::CreateTable { table } => {
                self.check_table_mutation("CREATE", table, &mut errors);
            }
            StatementClass::DropTable { table } => {
                self.check_table_mutation("DROP", table, &mut errors);
            }
            StatementClass::AlterAddColumn { table, column } => {
                self.check_column_mutation("ADD", table, column, &mut errors);
            }
            StatementClass::AlterDropColumn { table, column } => {
                self.check_column_mutation("DROP", table, column, &mut errors);
            }
            StatementClass::Insert { table, columns } => match self.policy.table(table) {
                None => errors.push(ValidationError::table_not_in_policy(table)),
                Some(policy) => {
                    for required in policy.required_columns() {
                        if !columns.iter().any(|c| c == required) {
                            errors.push(ValidationError::required_column_missing(
                                table, required,
                            ));
                        }
                    }
                }
            },
        }

        errors
    }

    fn check_table_mutation(
        &self,
        operation: &str,
        table: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        match self.policy.table(table) {
            None => errors.push(ValidationError::table_not_in_policy(table)),
            Some(policy) if policy.required => {
                errors.push(ValidationError::table_required(operation, table));
            }
            Some(_) => {}
        }
    }

    fn check_column_mutation(
        &self,
        operation: &str,
        table: &str,
        column: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(policy) = self.policy.table(table) else {
            errors.push(ValidationError::table_not_in_policy(table));
            return;
        };
        match policy.column_required(column) {
            None => errors.push(ValidationError::column_not_in_policy(table, column)),
            Some(true) => {
                errors.push(ValidationError::column_required(operation, table, column));
            }
            Some(false) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn policy() -> SchemaPolicy {
        SchemaPolicy::normalize(&json!({
            "customers": {
                "required": false,
                "columns": {"id": true, "email": true, "name": false}
            },
            "orders": {
                "required": true,
                "columns": {"id": true, "note": false}
            },
            "foo": {"required": false, "columns": {}}
        }))
    }

    fn check(sql: &str, nl: &str) -> StageResult {
        let policy = policy();
        LogicalValidator::new(&policy).validate(sql, nl)
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            StatementClass::classify("select * from t"),
            Some(StatementClass::Select)
        );
        assert_eq!(
            StatementClass::classify("alter table orders drop column note"),
            Some(StatementClass::AlterDropColumn {
                table: "orders".into(),
                column: "note".into()
            })
        );
        assert_eq!(
            StatementClass::classify("insert into customers (id, \"name\") values (1, 'x')"),
            Some(StatementClass::Insert {
                table: "customers".into(),
                columns: vec!["id".into(), "name".into()]
            })
        );
        assert_eq!(StatementClass::classify("insert into customers values (1)"), None);
        assert_eq!(StatementClass::classify("show tables"), None);
    }

    #[test]
    fn test_intent_guard_order_and_words() {
        let error = LogicalValidator::check_intent("please drop and delete it").unwrap();
        assert_eq!(error.kind, ValidationErrorKind::DestructiveIntent);
        assert!(error.message.contains("'delete'"));

        assert!(LogicalValidator::check_intent("Please UPDATE the list").is_some());
        assert!(LogicalValidator::check_intent("show the updated list").is_none());
        assert!(LogicalValidator::check_intent("list all employees").is_none());
    }

    #[test]
    fn test_intent_guard_runs_before_sql() {
        let stage = check("SELECT * FROM customers", "please delete the employee with id 5");
        assert!(!stage.valid);
        assert_eq!(stage.errors.len(), 1);
        assert!(stage.errors[0].contains("delete"));
    }

    #[test]
    fn test_delete_substring() {
        let stage = check("SELECT is_deleted FROM customers", "list customers");
        assert_eq!(stage.errors, vec!["DELETE queries are not allowed"]);
    }

    #[test]
    fn test_select_always_valid() {
        assert!(check("SELECT * FROM anything_at_all", "show everything").valid);
    }

    #[test]
    fn test_unsupported() {
        let stage = check("UPDATE customers SET name = 'x'", "rename");
        assert_eq!(
            stage.errors,
            vec!["SQL query type not recognized or unsupported"]
        );
    }

    #[test]
    fn test_drop_required_table() {
        let stage = check("DROP TABLE orders", "get rid of orders");
        assert!(!stage.valid);
        assert!(stage.errors[0].contains("'orders'"));
        assert!(stage.errors[0].contains("required"));
    }

    #[test]
    fn test_create_and_drop_optional_table() {
        assert!(check("CREATE TABLE foo (id INT)", "make foo").valid);
        assert!(check("DROP TABLE foo", "get rid of foo").valid);
        assert!(!check("CREATE TABLE bar (id INT)", "make bar").valid);
    }

    #[test]
    fn test_alter_columns() {
        assert!(check("ALTER TABLE orders ADD COLUMN note TEXT", "add note").valid);
        assert!(!check("ALTER TABLE orders ADD COLUMN id INT", "add id").valid);
        assert!(!check("ALTER TABLE orders DROP COLUMN missing", "x").valid);
        assert!(!check("ALTER TABLE nowhere DROP COLUMN note", "x").valid);
    }

    #[test]
    fn test_insert_missing_required_column() {
        let stage = check(
            "INSERT INTO customers (id, name) VALUES (1,'x')",
            "add a customer",
        );
        assert!(!stage.valid);
        assert_eq!(stage.errors.len(), 1);
        assert!(stage.errors[0].contains("'email'"));

        assert!(
            check(
                "INSERT INTO customers (id, email) VALUES (1,'a@b')",
                "add a customer"
            )
            .valid
        );
    }

    #[test]
    fn test_case_and_whitespace_do_not_change_verdict() {
        let a = check("  CREATE table Foo (id INT)", "make foo");
        let b = check("create TABLE FOO(id INT)", "make foo");
        assert_eq!(a, b);
        assert!(a.valid);
    }
}
