//! `trcguard trc` command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use trcguard_core::KgDocument;
use trcguard_sql::{explain, to_trc};

/// Translate `sql` and render it, optionally as a full explanation of `nl_query`.
pub fn render(sql: &str, kg: &KgDocument, nl_query: Option<&str>) -> Result<String> {
    let trc = to_trc(sql, kg).context("could not explain this query")?;
    Ok(match nl_query {
        Some(nl) => explain(&trc, sql.trim(), nl),
        None => trc.into_string(),
    })
}

pub fn run(sql: &str, kg_path: Option<&Path>, nl_query: Option<&str>) -> Result<()> {
    let kg = match kg_path {
        Some(path) => KgDocument::from_file(path)
            .with_context(|| format!("failed to load knowledge graph {}", path.display()))?,
        None => KgDocument::default(),
    };
    println!("{}", render(sql, &kg, nl_query)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_plain() {
        let out = render("SELECT * FROM employees", &KgDocument::default(), None).unwrap();
        assert_eq!(out, "{ E | employee(E) }");
    }

    #[test]
    fn test_render_explained() {
        let out = render(
            "SELECT * FROM employees;",
            &KgDocument::default(),
            Some("everyone"),
        )
        .unwrap();
        assert_eq!(
            out,
            "Query Translation:\n\"everyone\"\n\nSQL Generated:\nSELECT * FROM employees;\n\nTRC Output:\n{ E | employee(E) }"
        );
    }

    #[test]
    fn test_render_rejects_mutation() {
        let err = render("DROP TABLE employees", &KgDocument::default(), None).unwrap_err();
        assert!(err.to_string().contains("could not explain"));
    }
}
