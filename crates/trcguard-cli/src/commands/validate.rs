//! `trcguard validate` command implementation.
//!
//! Runs the validation gauntlet and prints either a per-stage report or the
//! raw result as JSON.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use trcguard_core::KgDocument;
use trcguard_policy::{Gauntlet, GauntletOptions, StageResult, ValidationResult};

fn stage_line(out: &mut String, name: &str, stage: &StageResult, ran: bool) {
    let label = match (ran, stage.valid) {
        (false, _) => "SKIP",
        (true, true) => "PASS",
        (true, false) => "FAIL",
    };
    let _ = writeln!(out, "[{}] {}", label, name);
    for error in &stage.errors {
        let _ = writeln!(out, "       - {}", error);
    }
}

/// Human-readable report of a gauntlet run.
pub fn render_report(result: &ValidationResult) -> String {
    let mut out = String::new();
    stage_line(&mut out, "syntactic", &result.syntactic, true);
    stage_line(&mut out, "semantic", &result.semantic, result.syntactic.valid);
    stage_line(
        &mut out,
        "logical",
        &result.logical,
        result.syntactic.valid && result.semantic.valid,
    );
    let verdict = if result.overall_valid {
        "valid"
    } else {
        "rejected"
    };
    let _ = write!(out, "\nResult: {}", verdict);
    out
}

/// Returns whether the statement passed.
pub fn run(
    sql: &str,
    kg_path: &Path,
    nl_query: &str,
    semantic_checks: bool,
    json: bool,
) -> Result<bool> {
    let kg = KgDocument::from_file(kg_path)
        .with_context(|| format!("failed to load knowledge graph {}", kg_path.display()))?;
    let policy = kg.policy();
    tracing::debug!(tables = policy.len(), "Loaded schema policy");

    let result = Gauntlet::with_options(&policy, GauntletOptions { semantic_checks })
        .validate(sql, nl_query);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_report(&result));
    }
    Ok(result.overall_valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kg_file() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let kg = KgDocument::with_tables(json!({
            "orders": {"required": true, "columns": {"id": true}}
        }));
        std::fs::write(file.path(), serde_json::to_string(&kg).unwrap()).unwrap();
        file
    }

    #[test]
    fn test_report_marks_skipped_stages() {
        let result = trcguard_policy::validate("", &KgDocument::default(), "x");
        let report = render_report(&result);
        assert!(report.contains("[FAIL] syntactic"));
        assert!(report.contains("- Empty SQL query"));
        assert!(report.contains("[SKIP] semantic"));
        assert!(report.contains("[SKIP] logical"));
        assert!(report.ends_with("Result: rejected"));
    }

    #[test]
    fn test_run_from_file() {
        let file = kg_file();
        assert!(run("SELECT * FROM orders", file.path(), "show orders", true, false).unwrap());
        assert!(!run("DROP TABLE orders", file.path(), "tidy", true, true).unwrap());
    }

    #[test]
    fn test_semantic_checks_toggle() {
        let file = kg_file();
        assert!(!run("SELECT * FROM customers", file.path(), "all", true, false).unwrap());
        assert!(run("SELECT * FROM customers", file.path(), "all", false, false).unwrap());
    }

    #[test]
    fn test_missing_kg_file() {
        assert!(run("SELECT 1", Path::new("/nonexistent/kg.json"), "x", true, false).is_err());
    }
}
