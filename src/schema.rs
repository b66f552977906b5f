//! Schema descriptors: what the DDL helpers consume and what introspection returns.

use crate::value::{Row, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Real,
    Text,
    Blob,
    Numeric,
    Boolean,
    Date,
    DateTime,
}

impl DataType {
    pub fn as_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
            DataType::Numeric => "NUMERIC",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::DateTime => "DATETIME",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl ForeignKeyAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Cascade => "CASCADE",
        }
    }
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `REFERENCES <table>(<key>)`; unset actions render as `CASCADE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub table: String,
    pub key: String,
    #[serde(default)]
    pub on_update: Option<ForeignKeyAction>,
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
}

impl Reference {
    pub fn new(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
            on_update: None,
            on_delete: None,
        }
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    Integer(i64),
    Real(f64),
    /// Rendered inside double quotes.
    Text(String),
    Null,
    CurrentTimestamp,
}

impl From<i64> for DefaultValue {
    fn from(v: i64) -> Self {
        DefaultValue::Integer(v)
    }
}

impl From<i32> for DefaultValue {
    fn from(v: i32) -> Self {
        DefaultValue::Integer(i64::from(v))
    }
}

impl From<f64> for DefaultValue {
    fn from(v: f64) -> Self {
        DefaultValue::Real(v)
    }
}

impl From<&str> for DefaultValue {
    fn from(v: &str) -> Self {
        DefaultValue::Text(v.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(v: String) -> Self {
        DefaultValue::Text(v)
    }
}

/// One column of a table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub data_type: DataType,
    #[serde(default)]
    pub primary_key: bool,
    /// Only honoured when this is the table's sole primary-key column.
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub references: Option<Reference>,
    #[serde(default = "allow_null_default")]
    pub allow_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<DefaultValue>,
}

fn allow_null_default() -> bool {
    true
}

impl ColumnDefinition {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            primary_key: false,
            auto_increment: false,
            references: None,
            allow_null: true,
            unique: false,
            default: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn references(mut self, reference: Reference) -> Self {
        self.references = Some(reference);
        self
    }
}

/// Ordered mapping of column name to definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub columns: Vec<(String, ColumnDefinition)>,
}

impl TableDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, definition: ColumnDefinition) -> Self {
        self.columns.push((name.into(), definition));
        self
    }

    /// Columns flagged as primary key, in declaration order.
    pub fn primary_key_columns(&self) -> Vec<(&str, &ColumnDefinition)> {
        self.columns
            .iter()
            .filter(|(_, def)| def.primary_key)
            .map(|(name, def)| (name.as_str(), def))
            .collect()
    }
}

/// One entry of `pragma_table_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableListEntry {
    pub schema: String,
    pub name: String,
    /// `table`, `view`, `shadow` or `virtual`.
    pub kind: String,
    pub column_count: i64,
    pub without_rowid: bool,
    pub strict: bool,
}

impl TableListEntry {
    pub(crate) fn from_row(row: &Row) -> Self {
        Self {
            schema: text(row, "schema"),
            name: text(row, "name"),
            kind: text(row, "type"),
            column_count: integer(row, "ncol"),
            without_rowid: integer(row, "wr") != 0,
            strict: integer(row, "strict") != 0,
        }
    }
}

/// One entry of `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    /// Declared type, as written in the DDL.
    pub data_type: String,
    pub not_null: bool,
    /// Default expression text, if any.
    pub default_value: Option<String>,
    /// 1-based position within the primary key, 0 when not part of it.
    pub primary_key: i64,
}

impl ColumnInfo {
    pub(crate) fn from_row(row: &Row) -> Self {
        Self {
            cid: integer(row, "cid"),
            name: text(row, "name"),
            data_type: text(row, "type"),
            not_null: integer(row, "notnull") != 0,
            default_value: row.get("dflt_value").and_then(|v| v.as_str()).map(str::to_string),
            primary_key: integer(row, "pk"),
        }
    }
}

fn text(row: &Row, column: &str) -> String {
    row.get(column)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn integer(row: &Row, column: &str) -> i64 {
    row.get(column).and_then(Value::as_i64).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_key_columns_keep_declaration_order() {
        let table = TableDefinition::new()
            .column("b", ColumnDefinition::new(DataType::Text).primary_key())
            .column("note", ColumnDefinition::new(DataType::Text))
            .column(
                "a",
                ColumnDefinition::new(DataType::Integer)
                    .primary_key()
                    .auto_increment(),
            );
        let keys = table.primary_key_columns();
        let names: Vec<_> = keys.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["b", "a"]);
        assert!(keys[1].1.auto_increment);
        assert!(TableDefinition::new().primary_key_columns().is_empty());
    }
}
