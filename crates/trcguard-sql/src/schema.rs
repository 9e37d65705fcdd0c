//! Knowledge graph generation from DDL.
//!
//! Every `CREATE TABLE` statement becomes a table entry. A column is required
//! when it is `NOT NULL` or part of the primary key; a table is required when
//! another table references it through a foreign key, since dropping it would
//! orphan rows elsewhere.

use serde_json::{Map, Value, json};
use sqlparser::ast::{
    ColumnOption, Expr, IndexColumn, ObjectName, ObjectNamePart, Statement, TableConstraint,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::{BTreeMap, BTreeSet};

use trcguard_core::{GeneratedKg, KgDocument};

use crate::error::SchemaError;

#[derive(Debug, Clone, Default)]
struct ColumnSchema {
    data_type: String,
    required: bool,
}

#[derive(Debug, Clone, Default)]
struct TableSchema {
    columns: BTreeMap<String, ColumnSchema>,
    references: BTreeSet<String>,
}

impl TableSchema {
    fn mark_required(&mut self, key: &str) {
        if let Some(column) = self
            .columns
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, column)| column)
        {
            column.required = true;
        }
    }
}

/// Last part of a possibly schema-qualified name, without quoting.
fn object_name(name: &ObjectName) -> String {
    name.0
        .last()
        .and_then(ObjectNamePart::as_ident)
        .map(|ident| ident.value.clone())
        .unwrap_or_else(|| name.to_string())
}

fn index_column(index: &IndexColumn) -> Option<&str> {
    match &index.column.expr {
        Expr::Identifier(ident) => Some(ident.value.as_str()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|ident| ident.value.as_str()),
        _ => None,
    }
}

/// Build a knowledge graph document from `CREATE TABLE` statements.
pub fn build_kg(ddl: &str) -> Result<KgDocument, SchemaError> {
    let statements = Parser::parse_sql(&GenericDialect {}, ddl)
        .map_err(|e| SchemaError::Parse(e.to_string()))?;

    let mut tables: BTreeMap<String, TableSchema> = BTreeMap::new();

    for statement in &statements {
        let Statement::CreateTable(create) = statement else {
            tracing::debug!("Skipping non CREATE TABLE statement in schema");
            continue;
        };

        let table_name = object_name(&create.name);
        let mut table = TableSchema::default();

        for column in &create.columns {
            let mut schema = ColumnSchema {
                data_type: column.data_type.to_string(),
                required: false,
            };
            for option in &column.options {
                match &option.option {
                    ColumnOption::NotNull | ColumnOption::PrimaryKey(_) => schema.required = true,
                    ColumnOption::ForeignKey(fk) => {
                        table.references.insert(object_name(&fk.foreign_table));
                    }
                    _ => {}
                }
            }
            table.columns.insert(column.name.value.clone(), schema);
        }

        for constraint in &create.constraints {
            match constraint {
                TableConstraint::PrimaryKey(pk) => {
                    for key in pk.columns.iter().filter_map(index_column) {
                        table.mark_required(key);
                    }
                }
                TableConstraint::ForeignKey(fk) => {
                    table.references.insert(object_name(&fk.foreign_table));
                }
                _ => {}
            }
        }

        tracing::debug!(table = %table_name, columns = table.columns.len(), "Parsed table");
        tables.insert(table_name, table);
    }

    if tables.is_empty() {
        return Err(SchemaError::NoTables);
    }

    let referenced: BTreeSet<String> = tables
        .iter()
        .flat_map(|(name, table)| {
            table
                .references
                .iter()
                .filter(move |target| !target.eq_ignore_ascii_case(name))
                .map(|target| target.to_lowercase())
        })
        .collect();

    let mut generated = Map::new();
    let mut upper_bound = Map::new();
    let mut lower_bound = Map::new();

    for (name, table) in &tables {
        let required = referenced.contains(&name.to_lowercase());

        let columns: Map<String, Value> = table
            .columns
            .iter()
            .map(|(column, schema)| {
                (
                    column.clone(),
                    json!({ "type": schema.data_type, "required": schema.required }),
                )
            })
            .collect();

        generated.insert(
            name.clone(),
            json!({
                "required": required,
                "columns": columns,
                "references": table.references,
            }),
        );

        upper_bound.insert(name.clone(), json!(table.columns.keys().collect::<Vec<_>>()));
        if required {
            let required_columns: Vec<&String> = table
                .columns
                .iter()
                .filter(|(_, schema)| schema.required)
                .map(|(column, _)| column)
                .collect();
            lower_bound.insert(name.clone(), json!(required_columns));
        }
    }

    tracing::info!(tables = tables.len(), "Generated knowledge graph from schema");

    Ok(KgDocument {
        schema_content: ddl.to_string(),
        lower_bound_schema: Some(Value::Object(lower_bound)),
        upper_bound_schema: Some(Value::Object(upper_bound)),
        generated_kg: GeneratedKg {
            tables: Value::Object(generated),
        },
    })
}
