use std::fmt;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::ordered_map::OrderedMap;
use crate::core::types::{Record, Value};

/// Declared column type. DATE is stored and validated like TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Int,
    Float,
    Boolean,
    Text,
    Date,
}

impl ColumnType {
    /// Map a CREATE TABLE type keyword to a column type
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => Some(ColumnType::Int),
            "FLOAT" | "DOUBLE" | "DECIMAL" => Some(ColumnType::Float),
            "BOOLEAN" | "BOOL" => Some(ColumnType::Boolean),
            "DATE" | "DATETIME" => Some(ColumnType::Date),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ColumnType::Int => "INT",
            ColumnType::Float => "FLOAT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
            ColumnType::Date => "DATE",
        };
        f.write_str(name)
    }
}

/// Column definition with constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl ColumnDefinition {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        ColumnDefinition {
            name: name.to_string(),
            column_type,
            primary_key: false,
            not_null: false,
            unique: false,
            default: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Constraint keywords as they would appear in CREATE TABLE
    pub fn constraints(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.primary_key {
            out.push("PRIMARY KEY".to_string());
        }
        if self.not_null {
            out.push("NOT NULL".to_string());
        }
        if self.unique {
            out.push("UNIQUE".to_string());
        }
        if let Some(default) = &self.default {
            out.push(format!("DEFAULT {}", default));
        }
        out
    }
}

/// Ordered column definitions of one table.
///
/// Column order decides positional INSERT binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    columns: OrderedMap<ColumnDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Schema { columns: OrderedMap::new() }
    }

    /// Add a column. Returns false if the name is already taken.
    pub fn add_column(&mut self, column: ColumnDefinition) -> bool {
        if self.columns.contains_key(&column.name) {
            return false;
        }
        self.columns.insert(column.name.clone(), column);
        true
    }

    pub fn with_column(mut self, column: ColumnDefinition) -> Self {
        self.add_column(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.get(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.values()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().map(String::from).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// First column flagged PRIMARY KEY
    pub fn primary_key(&self) -> Option<&ColumnDefinition> {
        self.columns().find(|c| c.primary_key)
    }

    pub fn unique_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns().filter(|c| c.unique && !c.primary_key)
    }

    /// Fill absent columns that declare a DEFAULT
    pub fn apply_defaults(&self, record: &mut Record) {
        for column in self.columns() {
            if record.contains_key(&column.name) {
                continue;
            }
            if let Some(default) = &column.default {
                record.insert(column.name.clone(), default.clone());
            }
        }
    }

    /// Required columns first, then every field against its column
    pub fn validate_record(&self, table: &str, record: &Record) -> Result<()> {
        for column in self.columns() {
            if column.not_null && !record.contains_key(&column.name) {
                return Err(Error::new(
                    ErrorKind::MissingRequiredColumn,
                    format!("Required column '{}' is missing", column.name),
                ));
            }
        }

        for (name, value) in record.iter() {
            let column = self.column(name).ok_or_else(|| unknown_column(name, table))?;
            value.validate_against(column)?;
        }

        Ok(())
    }

    /// Convert every field to its declared column type
    pub fn conform_record(&self, record: Record) -> Record {
        record
            .into_iter()
            .map(|(name, value)| {
                let value = match self.column(&name) {
                    Some(column) => value.conform_to(column.column_type),
                    None => value,
                };
                (name, value)
            })
            .collect()
    }
}

pub fn unknown_column(column: &str, table: &str) -> Error {
    Error::new(
        ErrorKind::UnknownColumn,
        format!("Unknown column '{}' in table '{}'", column, table),
    )
}

#[derive(Deserialize)]
struct SchemaDocument {
    columns: OrderedMap<ColumnDefinition>,
}

impl Serialize for Schema {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Borrowed<'a> {
            columns: &'a OrderedMap<ColumnDefinition>,
        }
        Borrowed { columns: &self.columns }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let document = SchemaDocument::deserialize(deserializer)?;
        // Names live in the map keys on disk
        let columns = document
            .columns
            .into_iter()
            .map(|(name, mut column)| {
                column.name = name.clone();
                (name, column)
            })
            .collect();
        Ok(Schema { columns })
    }
}
