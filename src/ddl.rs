//! DDL text generation for the schema helpers.
//!
//! Identifiers go through [`quote_identifier`]: plain names are emitted bare,
//! anything else is double-quoted, so callers cannot splice SQL through a
//! table or column name.

use crate::error::{Error, Result};
use crate::schema::{ColumnDefinition, DefaultValue, ForeignKeyAction, TableDefinition};
use tracing::warn;

/// Reserved words of SQLite's grammar, uppercase and sorted.
const KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHOUT",
];

fn is_plain(ident: &str) -> bool {
    let mut chars = ident.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && KEYWORDS
            .binary_search(&ident.to_ascii_uppercase().as_str())
            .is_err()
}

/// Renders an identifier for interpolation into SQL text.
pub fn quote_identifier(ident: &str) -> Result<String> {
    if ident.is_empty() || ident.contains('\0') {
        return Err(Error::InvalidIdentifier(ident.to_string()));
    }
    if is_plain(ident) {
        return Ok(ident.to_string());
    }
    Ok(format!("\"{}\"", ident.replace('"', "\"\"")))
}

/// Reals keep a fractional part (`2.0`, not `2`) so SQLite reads them back as
/// REAL; NaN and infinities have no SQL literal and are rejected.
fn default_literal(value: &DefaultValue) -> Result<String> {
    Ok(match value {
        DefaultValue::Integer(v) => v.to_string(),
        DefaultValue::Real(v) if v.is_finite() => format!("{v:?}"),
        DefaultValue::Real(v) => return Err(Error::InvalidDefault(v.to_string())),
        DefaultValue::Text(v) => format!("\"{}\"", v.replace('"', "\"\"")),
        DefaultValue::Null => "NULL".to_string(),
        DefaultValue::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
    })
}

/// `<name> <TYPE> [NOT NULL] [UNIQUE] [DEFAULT v] [REFERENCES t(k) ON UPDATE a ON DELETE b]`
pub fn column_fragment(name: &str, column: &ColumnDefinition) -> Result<String> {
    let mut sql = format!("{} {}", quote_identifier(name)?, column.data_type.as_sql());
    if !column.allow_null || column.primary_key {
        sql.push_str(" NOT NULL");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_literal(default)?);
    }
    if let Some(reference) = &column.references {
        let on_update = reference.on_update.unwrap_or(ForeignKeyAction::Cascade);
        let on_delete = reference.on_delete.unwrap_or(ForeignKeyAction::Cascade);
        sql.push_str(&format!(
            " REFERENCES {}({}) ON UPDATE {} ON DELETE {}",
            quote_identifier(&reference.table)?,
            quote_identifier(&reference.key)?,
            on_update,
            on_delete
        ));
    }
    Ok(sql)
}

/// `CREATE TABLE` for the definition, primary-key clause last.
///
/// AUTOINCREMENT is only valid on a single-column key; for a composite key the
/// flag is dropped and a warning logged.
pub fn create_table(table: &str, definition: &TableDefinition) -> Result<String> {
    let mut parts = definition
        .columns
        .iter()
        .map(|(name, column)| column_fragment(name, column))
        .collect::<Result<Vec<_>>>()?;

    match definition.primary_key_columns().as_slice() {
        [] => {}
        [(name, column)] => {
            let autoincrement = if column.auto_increment {
                " AUTOINCREMENT"
            } else {
                ""
            };
            parts.push(format!(
                "PRIMARY KEY({}{autoincrement})",
                quote_identifier(name)?
            ));
        }
        composite => {
            if composite.iter().any(|(_, column)| column.auto_increment) {
                warn!(table, "autoincrement ignored on composite primary key");
            }
            let names = composite
                .iter()
                .map(|(name, _)| quote_identifier(name))
                .collect::<Result<Vec<_>>>()?;
            parts.push(format!("PRIMARY KEY({})", names.join(",")));
        }
    }

    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table)?,
        parts.join(", ")
    ))
}

pub fn add_column(table: &str, name: &str, column: &ColumnDefinition) -> Result<String> {
    Ok(format!(
        "ALTER TABLE {} ADD {}",
        quote_identifier(table)?,
        column_fragment(name, column)?
    ))
}

pub fn rename_table(from: &str, to: &str) -> Result<String> {
    Ok(format!(
        "ALTER TABLE {} RENAME TO {}",
        quote_identifier(from)?,
        quote_identifier(to)?
    ))
}

pub fn rename_column(table: &str, from: &str, to: &str) -> Result<String> {
    Ok(format!(
        "ALTER TABLE {} RENAME COLUMN {} TO {}",
        quote_identifier(table)?,
        quote_identifier(from)?,
        quote_identifier(to)?
    ))
}

pub fn drop_column(table: &str, column: &str) -> Result<String> {
    Ok(format!(
        "ALTER TABLE {} DROP {}",
        quote_identifier(table)?,
        quote_identifier(column)?
    ))
}

pub fn drop_table(table: &str) -> Result<String> {
    Ok(format!("DROP TABLE {}", quote_identifier(table)?))
}
