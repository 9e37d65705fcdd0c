//! # trcguard-policy
//!
//! Validation gauntlet for generated SQL.
//!
//! Every statement passes through three stages, each gated on the previous:
//!
//! 1. **Syntactic**: a single statement that lexes, and for SELECT queries
//!    one whose clauses can be extracted.
//! 2. **Semantic**: SELECT tables and qualified columns exist in the policy.
//! 3. **Logical**: the request shows no destructive intent, the statement is
//!    of a supported kind, and it leaves required tables and columns intact.
//!
//! ```ignore
//! let result = trcguard_policy::validate(sql, &kg, "show all employees");
//! if !result.overall_valid {
//!     // withhold the SQL
//! }
//! ```

pub mod error;
pub mod gauntlet;
pub mod logical;
pub mod result;
pub mod semantic;
pub mod syntactic;

pub use error::{ValidationError, ValidationErrorKind};
pub use gauntlet::{Gauntlet, GauntletOptions};
pub use logical::{LogicalValidator, StatementClass};
pub use result::{StageResult, ValidationResult};
pub use semantic::SemanticValidator;
pub use syntactic::SyntacticValidator;

use trcguard_core::KgDocument;

/// Validate `sql` against the policy of `kg` with default options.
pub fn validate(sql: &str, kg: &KgDocument, nl_query: &str) -> ValidationResult {
    let policy = kg.policy();
    Gauntlet::new(&policy).validate(sql, nl_query)
}
