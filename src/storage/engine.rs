use std::collections::HashSet;
use tracing::{debug, info, warn};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::TableInfo;
use crate::core::types::{Record, RecordId, Value};
use crate::index::column_index::ColumnIndex;
use crate::query::ast::{Assignment, OrderBy, Predicate, SortOrder};
use crate::query::matcher::RecordMatcher;
use crate::schema::schema::{unknown_column, Schema};
use crate::storage::persistence::{MemoryStore, Persistence};
use crate::storage::table::{Catalog, Table, TableIndexes};

/// A record staged by UPDATE, applied only once every record validates
struct StagedUpdate {
    old_id: RecordId,
    new_id: RecordId,
    old: Record,
    new: Record,
}

/// Owns the catalog and applies statements to it.
///
/// Every successful mutation is followed by a full save through the
/// persistence backend. Failed operations leave the catalog untouched.
pub struct StorageEngine {
    catalog: Catalog,
    store: Box<dyn Persistence>,
    matcher: RecordMatcher,
}

impl StorageEngine {
    /// Load whatever `store` holds, or start empty
    pub fn open(store: Box<dyn Persistence>) -> Result<Self> {
        let catalog = store.load()?.unwrap_or_default();
        info!(tables = catalog.tables.len(), "storage engine ready");
        Ok(StorageEngine {
            catalog,
            store,
            matcher: RecordMatcher::new(),
        })
    }

    pub fn in_memory() -> Self {
        StorageEngine {
            catalog: Catalog::new(),
            store: Box::new(MemoryStore),
            matcher: RecordMatcher::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.catalog.tables.contains_key(table)
    }

    /// Write the whole catalog out
    pub fn flush(&self) -> Result<()> {
        self.store.save(&self.catalog).inspect_err(|e| {
            warn!(error = %e, "failed to persist catalog");
        })
    }

    fn table(&self, table: &str) -> Result<&Table> {
        self.catalog
            .tables
            .get(table)
            .ok_or_else(|| Error::table_not_found(table))
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut Table> {
        self.catalog
            .tables
            .get_mut(table)
            .ok_or_else(|| Error::table_not_found(table))
    }

    // ---- DDL ----

    pub fn create_table(&mut self, table: &str, schema: Schema) -> Result<()> {
        if self.table_exists(table) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!(
                    "Table '{}' already exists! Use a different name or DROP TABLE first.",
                    table
                ),
            ));
        }

        self.catalog.tables.insert(table, Table::new(schema));
        info!(table, "created table");
        self.flush()
    }

    /// Remove a table with its records and indexes. Returns the record count.
    pub fn drop_table(&mut self, table: &str) -> Result<usize> {
        let removed = self
            .catalog
            .tables
            .remove(table)
            .ok_or_else(|| Error::table_not_found(table))?;
        self.catalog.indexes.remove(table);

        info!(table, records = removed.len(), "dropped table");
        self.flush()?;
        Ok(removed.len())
    }

    pub fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        if !self.table_exists(from) {
            return Err(Error::table_not_found(from));
        }
        if self.table_exists(to) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("Table '{}' already exists", to),
            ));
        }

        if let Some(moved) = self.catalog.tables.remove(from) {
            self.catalog.tables.insert(to, moved);
        }
        if let Some(indexes) = self.catalog.indexes.remove(from) {
            self.catalog.indexes.insert(to, indexes);
        }

        info!(from, to, "renamed table");
        self.flush()
    }

    /// Build an index over the current contents of `table.column`
    pub fn create_index(&mut self, table: &str, column: &str) -> Result<()> {
        let entry = self.table(table)?;
        if entry.schema.column(column).is_none() {
            return Err(unknown_column(column, table));
        }
        let exists = self
            .catalog
            .indexes
            .get(table)
            .is_some_and(|indexes| indexes.contains_key(column));
        if exists {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("Index on '{}.{}' already exists", table, column),
            ));
        }

        let index = ColumnIndex::build(column, entry.records.iter());
        let buckets = index.bucket_count();

        match self.catalog.indexes.get_mut(table) {
            Some(indexes) => {
                indexes.insert(column, index);
            }
            None => {
                let mut indexes = TableIndexes::new();
                indexes.insert(column, index);
                self.catalog.indexes.insert(table, indexes);
            }
        }

        info!(table, column, buckets, "created index");
        self.flush()
    }

    // ---- DML ----

    /// Validate and store one record. Returns its record id.
    pub fn insert(&mut self, table: &str, mut record: Record) -> Result<RecordId> {
        let entry = self.table(table)?;
        let schema = &entry.schema;

        schema.apply_defaults(&mut record);
        schema.validate_record(table, &record)?;
        let record = schema.conform_record(record);

        let pk = schema.primary_key().ok_or_else(|| {
            Error::new(ErrorKind::NoPrimaryKey, "No primary key defined in table schema")
        })?;
        let id = primary_key_value(&record, &pk.name)?;

        if entry.records.contains_key(&id) {
            return Err(duplicate_key(&id));
        }

        for column in schema.unique_columns() {
            if let Some(value) = record.get(&column.name) {
                let shown = value.to_string();
                let taken = entry
                    .records
                    .values()
                    .any(|other| other.get(&column.name).is_some_and(|v| v.to_string() == shown));
                if taken {
                    return Err(duplicate_value(&column.name, &shown));
                }
            }
        }

        self.catalog.index_record(table, &id, &record);
        self.table_mut(table)?.records.insert(id.clone(), record);

        debug!(table, id = %id, "inserted record");
        self.flush()?;
        Ok(id)
    }

    /// Bind INSERT values to columns (schema order unless a column list is
    /// given) and insert the resulting record.
    pub fn insert_values(
        &mut self,
        table: &str,
        columns: Option<&[String]>,
        values: Vec<Value>,
    ) -> Result<RecordId> {
        let schema = &self.table(table)?.schema;

        let names = match columns {
            Some(columns) => {
                if columns.len() != values.len() {
                    return Err(Error::new(
                        ErrorKind::ColumnCountMismatch,
                        format!(
                            "Column count mismatch. {} columns listed, but {} values provided",
                            columns.len(),
                            values.len()
                        ),
                    ));
                }
                if let Some(unknown) = columns.iter().find(|c| schema.column(c).is_none()) {
                    return Err(unknown_column(unknown, table));
                }
                columns.to_vec()
            }
            None => {
                if schema.len() != values.len() {
                    return Err(Error::new(
                        ErrorKind::ColumnCountMismatch,
                        format!(
                            "Column count mismatch. Table has {} columns, but {} values provided",
                            schema.len(),
                            values.len()
                        ),
                    ));
                }
                schema.column_names()
            }
        };

        let record: Record = names.into_iter().zip(values).collect();
        self.insert(table, record)
    }

    /// Matching records in insertion order, then sorted and limited.
    /// A limit of zero means no limit.
    pub fn select(
        &self,
        table: &str,
        filter: Option<&Predicate>,
        order_by: Option<&OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>> {
        let entry = self.table(table)?;

        let mut rows = Vec::new();
        for record in entry.records.values() {
            if self.matcher.accepts(record, filter)? {
                rows.push(record.clone());
            }
        }

        if let Some(order) = order_by {
            let empty = Value::text("");
            rows.sort_by(|a, b| {
                let left = a.get(&order.column).unwrap_or(&empty);
                let right = b.get(&order.column).unwrap_or(&empty);
                match order.order {
                    SortOrder::Asc => left.sort_cmp(right),
                    SortOrder::Desc => right.sort_cmp(left),
                }
            });
        }

        if let Some(limit) = limit.filter(|&n| n > 0) {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    /// Apply assignments to every matching record. Returns the match count.
    ///
    /// All matching records are staged and checked before any is written,
    /// so a rejected value, key or unique collision changes nothing.
    pub fn update(
        &mut self,
        table: &str,
        assignments: &[Assignment],
        filter: Option<&Predicate>,
    ) -> Result<usize> {
        let entry = self.table(table)?;
        let schema = &entry.schema;

        let mut changes = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let column = schema
                .column(&assignment.column)
                .ok_or_else(|| unknown_column(&assignment.column, table))?;
            assignment.value.validate_against(column)?;
            changes.push((
                column.name.clone(),
                assignment.value.clone().conform_to(column.column_type),
            ));
        }

        let pk = schema.primary_key().map(|c| c.name.clone());
        let mut staged = Vec::new();
        for (id, record) in entry.records.iter() {
            if !self.matcher.accepts(record, filter)? {
                continue;
            }
            let mut updated = record.clone();
            for (column, value) in &changes {
                updated.insert(column.clone(), value.clone());
            }
            let new_id = match &pk {
                Some(pk) => primary_key_value(&updated, pk)?,
                None => id.to_string(),
            };
            staged.push(StagedUpdate {
                old_id: id.to_string(),
                new_id,
                old: record.clone(),
                new: updated,
            });
        }

        if staged.is_empty() {
            debug!(table, "update matched no records");
            return Ok(0);
        }

        check_staged_keys(entry, &staged)?;
        check_staged_unique(entry, schema, &staged)?;

        let count = staged.len();
        for stage in &staged {
            self.catalog
                .reindex_record(table, &stage.old_id, &stage.old, &stage.new_id, &stage.new);
        }
        let records = &mut self.table_mut(table)?.records;
        for stage in staged {
            records.rekey(&stage.old_id, stage.new_id, stage.new);
        }

        debug!(table, count, "updated records");
        self.flush()?;
        Ok(count)
    }

    /// Remove matching records and their index entries. Returns the count.
    pub fn delete(&mut self, table: &str, filter: Option<&Predicate>) -> Result<usize> {
        let entry = self.table(table)?;

        let mut doomed = Vec::new();
        for (id, record) in entry.records.iter() {
            if self.matcher.accepts(record, filter)? {
                doomed.push((id.to_string(), record.clone()));
            }
        }

        if doomed.is_empty() {
            debug!(table, "delete matched no records");
            return Ok(0);
        }

        for (id, record) in &doomed {
            self.catalog.unindex_record(table, id, record);
        }
        let ids: HashSet<&str> = doomed.iter().map(|(id, _)| id.as_str()).collect();
        self.table_mut(table)?.records.retain(|id, _| !ids.contains(id));

        debug!(table, count = doomed.len(), "deleted records");
        self.flush()?;
        Ok(doomed.len())
    }

    // ---- Introspection ----

    pub fn describe_table(&self, table: &str) -> Result<&Schema> {
        Ok(&self.table(table)?.schema)
    }

    pub fn table_info(&self, table: &str) -> Result<TableInfo> {
        let entry = self.table(table)?;
        Ok(TableInfo {
            name: table.to_string(),
            columns: entry.schema.column_names(),
            record_count: entry.len(),
            indexes: self.catalog.indexed_columns(table),
        })
    }

    /// Every table in creation order
    pub fn tables(&self) -> Vec<TableInfo> {
        self.catalog
            .tables
            .keys()
            .filter_map(|name| self.table_info(name).ok())
            .collect()
    }

    pub fn index(&self, table: &str, column: &str) -> Option<&ColumnIndex> {
        self.catalog.indexes.get(table)?.get(column)
    }
}

/// Record id from the primary-key field; absent or falsy is rejected
fn primary_key_value(record: &Record, pk: &str) -> Result<RecordId> {
    match record.get(pk) {
        Some(value) if !value.is_falsy() => Ok(value.to_string()),
        _ => Err(Error::new(
            ErrorKind::MissingPrimaryKeyValue,
            format!("Primary key '{}' is required", pk),
        )),
    }
}

fn duplicate_key(id: &str) -> Error {
    Error::new(
        ErrorKind::DuplicateKey,
        format!("Duplicate primary key '{}' - record already exists", id),
    )
}

fn duplicate_value(column: &str, value: &str) -> Error {
    Error::new(
        ErrorKind::DuplicateValue,
        format!("Duplicate value '{}' for unique column '{}'", value, column),
    )
}

/// New ids must be distinct and must not land on any record other than
/// the one being moved.
fn check_staged_keys(entry: &Table, staged: &[StagedUpdate]) -> Result<()> {
    let mut seen = HashSet::new();
    for stage in staged {
        if !seen.insert(stage.new_id.as_str()) {
            return Err(duplicate_key(&stage.new_id));
        }
        if stage.new_id != stage.old_id && entry.records.contains_key(&stage.new_id) {
            return Err(duplicate_key(&stage.new_id));
        }
    }
    Ok(())
}

/// UNIQUE columns across the table as it would look after the update
fn check_staged_unique(entry: &Table, schema: &Schema, staged: &[StagedUpdate]) -> Result<()> {
    let moving: HashSet<&str> = staged.iter().map(|s| s.old_id.as_str()).collect();

    for column in schema.unique_columns() {
        let mut taken: HashSet<String> = entry
            .records
            .iter()
            .filter(|(id, _)| !moving.contains(id))
            .filter_map(|(_, record)| record.get(&column.name).map(Value::to_string))
            .collect();

        for stage in staged {
            if let Some(value) = stage.new.get(&column.name) {
                let shown = value.to_string();
                if !taken.insert(shown.clone()) {
                    return Err(duplicate_value(&column.name, &shown));
                }
            }
        }
    }
    Ok(())
}
