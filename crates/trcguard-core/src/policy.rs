//! Schema policy derived from a knowledge graph.
//!
//! The policy is a case-insensitive allow-list: a table or column that is not
//! present is not permitted. Every key is stored lowercased and every lookup
//! lowercases its argument, so callers never have to normalize SQL-side case
//! themselves.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Policy entry for a single table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TablePolicy {
    /// Whether the table itself must never be created or dropped.
    pub required: bool,
    /// Lowercased column name → required flag.
    pub columns: BTreeMap<String, bool>,
}

impl TablePolicy {
    /// Check if a column is listed for this table.
    pub fn contains_column(&self, column: &str) -> bool {
        self.columns.contains_key(&column.to_lowercase())
    }

    /// Required flag of a column, `None` when the column is not listed.
    pub fn column_required(&self, column: &str) -> Option<bool> {
        self.columns.get(&column.to_lowercase()).copied()
    }

    /// Columns flagged as required, in sorted order.
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|(_, required)| **required)
            .map(|(name, _)| name.as_str())
    }
}

/// Allow-list of tables and columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaPolicy {
    tables: BTreeMap<String, TablePolicy>,
}

impl SchemaPolicy {
    /// Normalize a raw KG table mapping.
    ///
    /// Entries whose value is not an object are skipped. Column entries may be
    /// an object carrying `required` or a bare boolean; anything else is
    /// skipped. Missing `required` flags default to `false`.
    pub fn normalize(raw_tables: &Value) -> Self {
        let Some(entries) = raw_tables.as_object() else {
            if !raw_tables.is_null() {
                tracing::warn!("Knowledge graph tables is not a mapping, policy is empty");
            }
            return Self::default();
        };

        let mut tables = BTreeMap::new();
        for (table_name, entry) in entries {
            let Some(entry) = entry.as_object() else {
                tracing::warn!(table = %table_name, "Skipping malformed knowledge graph table");
                continue;
            };

            let required = entry
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            let mut columns = BTreeMap::new();
            if let Some(raw_columns) = entry.get("columns").and_then(Value::as_object) {
                for (column_name, column) in raw_columns {
                    let column_required = match column {
                        Value::Bool(flag) => *flag,
                        Value::Object(fields) => fields
                            .get("required")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        _ => {
                            tracing::warn!(
                                table = %table_name,
                                column = %column_name,
                                "Skipping malformed knowledge graph column"
                            );
                            continue;
                        }
                    };
                    columns.insert(column_name.to_lowercase(), column_required);
                }
            }

            tables.insert(table_name.to_lowercase(), TablePolicy { required, columns });
        }

        Self { tables }
    }

    /// Look up a table's policy entry.
    pub fn table(&self, name: &str) -> Option<&TablePolicy> {
        self.tables.get(&name.to_lowercase())
    }

    /// Check if a table is listed.
    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Check if a column is listed under a table.
    pub fn contains_column(&self, table: &str, column: &str) -> bool {
        self.table(table)
            .is_some_and(|policy| policy.contains_column(column))
    }

    /// Iterate over `(table, policy)` pairs in sorted order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TablePolicy)> {
        self.tables.iter().map(|(name, policy)| (name.as_str(), policy))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_normalize_lowercases_names() {
        let policy = SchemaPolicy::normalize(&json!({
            "Customers": {
                "required": true,
                "columns": {"ID": {"required": true}, "Email": {"required": false}}
            }
        }));

        let customers = policy.table("CUSTOMERS").unwrap();
        assert!(customers.required);
        assert_eq!(customers.column_required("id"), Some(true));
        assert_eq!(customers.column_required("EMAIL"), Some(false));
        assert!(policy.contains_column("customers", "Email"));
    }

    #[test]
    fn test_normalize_skips_malformed_tables() {
        let policy = SchemaPolicy::normalize(&json!({
            "orders": {"columns": {"id": true}},
            "bogus": ["not", "a", "mapping"],
            "nothing": null,
        }));

        assert_eq!(policy.len(), 1);
        assert!(policy.contains_table("orders"));
        assert!(!policy.contains_table("bogus"));
    }

    #[test]
    fn test_required_defaults_to_false() {
        let policy = SchemaPolicy::normalize(&json!({
            "logs": {"columns": {"message": {}, "level": 3}}
        }));

        let logs = policy.table("logs").unwrap();
        assert!(!logs.required);
        assert_eq!(logs.column_required("message"), Some(false));
        // Non-boolean, non-object columns are dropped
        assert_eq!(logs.column_required("level"), None);
    }

    #[test]
    fn test_required_columns() {
        let policy = SchemaPolicy::normalize(&json!({
            "customers": {"columns": {"id": true, "email": true, "name": false}}
        }));

        let required: Vec<_> = policy.table("customers").unwrap().required_columns().collect();
        assert_eq!(required, vec!["email", "id"]);
    }

    #[test]
    fn test_non_object_root_is_empty() {
        assert!(SchemaPolicy::normalize(&json!("tables")).is_empty());
        assert!(SchemaPolicy::normalize(&Value::Null).is_empty());
    }
}
