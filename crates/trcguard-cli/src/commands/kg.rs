//! `trcguard kg` command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use trcguard_sql::build_kg;

/// Generate a knowledge graph document from a DDL file.
pub fn run(schema_path: &Path, out: Option<&Path>) -> Result<()> {
    let ddl = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let kg = build_kg(&ddl).context("failed to generate knowledge graph")?;
    let json = serde_json::to_string_pretty(&kg)?;

    match out {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote knowledge graph");
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trcguard_core::KgDocument;

    #[test]
    fn test_writes_loadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.sql");
        let out = dir.path().join("kg.json");
        fs::write(
            &schema,
            "CREATE TABLE customers (id INT PRIMARY KEY, email TEXT NOT NULL, name TEXT);",
        )
        .unwrap();

        run(&schema, Some(&out)).unwrap();

        let kg = KgDocument::from_file(&out).unwrap();
        let customers = kg.policy().table("customers").cloned().unwrap();
        assert_eq!(customers.required_columns().collect::<Vec<_>>(), vec!["email", "id"]);
    }

    #[test]
    fn test_missing_schema_file() {
        assert!(run(Path::new("/nonexistent/schema.sql"), None).is_err());
    }
}
