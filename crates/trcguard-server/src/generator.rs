//! SQL generation capability.
//!
//! A generator turns a natural-language request plus the table layout of a
//! database into one SQL statement. Generators have an explicit lifecycle:
//! the server initializes one at startup, shares it through [`AppState`],
//! and shuts it down on exit.
//!
//! [`AppState`]: crate::state::AppState

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{GeneratorConfig, GeneratorKind};

/// Table name → column names.
pub type TableLayout = BTreeMap<String, Vec<String>>;

/// Errors raised by SQL generators.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("SQL generator used before initialization")]
    NotInitialized,

    #[error("SQL generation failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait SqlGenerator: Send + Sync {
    /// Acquire whatever the generator needs. Calling it twice is a no-op.
    async fn initialize(&self) -> Result<(), GeneratorError>;

    /// Produce a single `;`-terminated statement.
    async fn generate(&self, nl_query: &str, tables: &TableLayout)
    -> Result<String, GeneratorError>;

    /// Release resources. The generator must be initialized again before use.
    async fn shutdown(&self);
}

/// Create the generator named by configuration.
pub fn create_generator(config: &GeneratorConfig) -> Arc<dyn SqlGenerator> {
    match config.kind {
        GeneratorKind::RuleBased => Arc::new(RuleBasedGenerator::new()),
    }
}

/// Ensure a statement is trimmed and terminated.
pub fn clean_sql(sql: &str) -> String {
    let sql = sql.trim();
    if sql.ends_with(';') {
        sql.to_string()
    } else {
        format!("{};", sql)
    }
}

/// Keyword-routing generator.
///
/// Requests mentioning departments or employees select from those tables;
/// anything else selects everything from the first table.
#[derive(Debug, Default)]
pub struct RuleBasedGenerator {
    ready: AtomicBool,
}

impl RuleBasedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(nl_query: &str, tables: &TableLayout) -> String {
        let Some(first_table) = tables.keys().next() else {
            return "SELECT * FROM table;".to_string();
        };

        let request = nl_query.to_lowercase();
        if request.contains("department") {
            return "SELECT * FROM departments;".to_string();
        }
        if request.contains("employee") {
            return "SELECT * FROM employees;".to_string();
        }

        format!("SELECT * FROM {};", first_table)
    }
}

#[async_trait]
impl SqlGenerator for RuleBasedGenerator {
    async fn initialize(&self) -> Result<(), GeneratorError> {
        if !self.ready.swap(true, Ordering::SeqCst) {
            tracing::info!("Rule-based SQL generator ready");
        }
        Ok(())
    }

    async fn generate(
        &self,
        nl_query: &str,
        tables: &TableLayout,
    ) -> Result<String, GeneratorError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(GeneratorError::NotInitialized);
        }
        let sql = clean_sql(&Self::route(nl_query, tables));
        tracing::debug!(sql = %sql, "Generated SQL");
        Ok(sql)
    }

    async fn shutdown(&self) {
        if self.ready.swap(false, Ordering::SeqCst) {
            tracing::info!("Rule-based SQL generator shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(tables: &[&str]) -> TableLayout {
        tables
            .iter()
            .map(|t| (t.to_string(), vec!["id".to_string()]))
            .collect()
    }

    #[test]
    fn test_clean_sql() {
        assert_eq!(clean_sql("  SELECT 1 "), "SELECT 1;");
        assert_eq!(clean_sql("SELECT 1;"), "SELECT 1;");
    }

    #[tokio::test]
    async fn test_routing() {
        let generator = RuleBasedGenerator::new();
        generator.initialize().await.unwrap();

        let tables = layout(&["customers", "departments", "employees"]);
        assert_eq!(
            generator.generate("List every Department", &tables).await.unwrap(),
            "SELECT * FROM departments;"
        );
        assert_eq!(
            generator.generate("show employees", &tables).await.unwrap(),
            "SELECT * FROM employees;"
        );
        assert_eq!(
            generator.generate("what is there", &tables).await.unwrap(),
            "SELECT * FROM customers;"
        );
        assert_eq!(
            generator.generate("anything", &TableLayout::new()).await.unwrap(),
            "SELECT * FROM table;"
        );
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let generator = RuleBasedGenerator::new();
        let tables = layout(&["t"]);
        assert!(matches!(
            generator.generate("x", &tables).await,
            Err(GeneratorError::NotInitialized)
        ));

        generator.initialize().await.unwrap();
        generator.initialize().await.unwrap();
        assert!(generator.generate("x", &tables).await.is_ok());

        generator.shutdown().await;
        assert!(generator.generate("x", &tables).await.is_err());
    }
}
