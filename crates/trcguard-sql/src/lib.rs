//! # trcguard-sql
//!
//! SQL handling for trcguard.
//!
//! This crate provides functionality to:
//! - Lex SQL into a closed set of clause-aware tokens
//! - Extract the clauses of a single SELECT statement
//! - Translate read-only queries into tuple relational calculus (TRC)
//! - Derive a knowledge graph document from `CREATE TABLE` statements
//!
//! ## Example
//!
//! ```sql
//! SELECT e.name, d.dept_name FROM employees e JOIN departments d ON e.dept_id = d.id
//! ```
//!
//! becomes
//!
//! ```text
//! { E.name, D.dept_name | (exists D) (employee(E) and department(D) and E.dept_id = D.id) }
//! ```

pub mod error;
pub mod extractor;
pub mod lexer;
pub mod query;
pub mod schema;
pub mod trc;

pub use error::{SchemaError, StructuralError, TrcError};
pub use extractor::{Extractor, Statement, extract};
pub use query::{
    Join, JoinKind, OrderItem, SelectAttribute, SortDirection, StructuredQuery, TableRef,
};
pub use schema::build_kg;
pub use trc::{AliasMap, TrcBuilder, TrcExpression, explain, to_trc};
