use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::types::{Record, Value};
use crate::query::ast::Statement;
use crate::query::parser::SqlParser;
use crate::schema::schema::Schema;
use crate::storage::engine::StorageEngine;
use crate::storage::persistence::JsonFileStore;

/// Outcome of one statement, serialized untagged to the shapes
/// `{message}`, `{error}`, `{result, message}` and `{schema, message}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultEnvelope {
    Message { message: String },
    Error { error: String },
    Rows { result: Vec<Record>, message: String },
    Schema { schema: Schema, message: String },
}

impl ResultEnvelope {
    pub fn message(message: impl Into<String>) -> Self {
        ResultEnvelope::Message { message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultEnvelope::Error { .. })
    }
}

pub struct Database {
    config: Option<Config>,

    engine: Mutex<StorageEngine>, // single exclusive-access boundary

    parser: SqlParser,
}

impl Database {
    /// Open (or create on first write) the data file named by `config`
    pub fn open(config: Config) -> Result<Self> {
        let store = JsonFileStore::open(&config)?;
        let engine = StorageEngine::open(Box::new(store))?;

        Ok(Self {
            config: Some(config),
            engine: Mutex::new(engine),
            parser: SqlParser::new(),
        })
    }

    /// Database that keeps nothing on disk
    pub fn in_memory() -> Self {
        Self {
            config: None,
            engine: Mutex::new(StorageEngine::in_memory()),
            parser: SqlParser::new(),
        }
    }

    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    /// Parse and run one statement, folding any error into the envelope
    pub fn execute(&self, query: &str) -> ResultEnvelope {
        match self.query(query) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(
                    kind = ?err.kind,
                    category = ?err.kind.category(),
                    error = %err.context,
                    "statement rejected"
                );
                ResultEnvelope::Error { error: err.context }
            }
        }
    }

    pub fn query(&self, query: &str) -> Result<ResultEnvelope> {
        let statement = self.parser.parse(query)?;
        self.run(statement)
    }

    /// Run an already parsed statement. The engine lock is held for the
    /// whole operation including its flush.
    pub fn run(&self, statement: Statement) -> Result<ResultEnvelope> {
        debug!(mutation = statement.is_mutation(), "running statement");
        let mut engine = self.engine.lock();

        let envelope = match statement {
            Statement::CreateTable(create) => {
                engine.create_table(&create.table, create.schema)?;
                ResultEnvelope::message(format!("Table '{}' created successfully", create.table))
            }

            Statement::DropTable { table } => {
                let deleted = engine.drop_table(&table)?;
                ResultEnvelope::message(format!(
                    "Table '{}' dropped successfully ({} records deleted)",
                    table, deleted
                ))
            }

            Statement::RenameTable { from, to } => {
                engine.rename_table(&from, &to)?;
                ResultEnvelope::message(format!("Table '{}' renamed to '{}'", from, to))
            }

            Statement::Insert(insert) => {
                engine.insert_values(&insert.table, insert.columns.as_deref(), insert.values)?;
                ResultEnvelope::message(format!("Record inserted into '{}'", insert.table))
            }

            Statement::Select(select) => {
                let rows = engine.select(
                    &select.table,
                    select.filter.as_ref(),
                    select.order_by.as_ref(),
                    select.limit,
                )?;
                let message = format!("Found {} records in '{}'", rows.len(), select.table);
                ResultEnvelope::Rows { result: rows, message }
            }

            Statement::Update(update) => {
                let count = engine.update(&update.table, &update.assignments, Some(&update.filter))?;
                ResultEnvelope::message(no_match_or(count, &update.table, || {
                    format!("Updated {} records in '{}'", count, update.table)
                }))
            }

            Statement::Delete(delete) => {
                let count = engine.delete(&delete.table, Some(&delete.filter))?;
                ResultEnvelope::message(no_match_or(count, &delete.table, || {
                    format!("Deleted {} records from '{}'", count, delete.table)
                }))
            }

            Statement::Describe { table } => {
                let schema = engine.describe_table(&table)?.clone();
                ResultEnvelope::Schema {
                    schema,
                    message: format!("Schema for table '{}'", table),
                }
            }

            Statement::ShowTables => {
                let tables = engine.tables();
                if tables.is_empty() {
                    ResultEnvelope::message("No tables in database")
                } else {
                    let message = format!("Total: {} tables", tables.len());
                    let result = tables
                        .into_iter()
                        .map(|info| {
                            let mut row = Record::new();
                            row.insert("table", Value::Text(info.name));
                            row.insert("columns", Value::Integer(info.columns.len() as i64));
                            row.insert("records", Value::Integer(info.record_count as i64));
                            row
                        })
                        .collect();
                    ResultEnvelope::Rows { result, message }
                }
            }

            Statement::ShowTable { table } => {
                ResultEnvelope::message(engine.table_info(&table)?.summary())
            }

            Statement::CreateIndex { table, column } => {
                engine.create_index(&table, &column)?;
                ResultEnvelope::message(format!("Index created on '{}.{}'", table, column))
            }
        };

        Ok(envelope)
    }

    /// Read-only access to the engine under the lock
    pub fn with_engine<R>(&self, f: impl FnOnce(&StorageEngine) -> R) -> R {
        f(&self.engine.lock())
    }
}

fn no_match_or(count: usize, table: &str, matched: impl FnOnce() -> String) -> String {
    if count == 0 {
        format!("No records matched the conditions in '{}'", table)
    } else {
        matched()
    }
}
