use crate::core::ordered_map::OrderedMap;
use crate::core::types::{Record, RecordId};
use crate::index::column_index::ColumnIndex;
use crate::schema::schema::Schema;

/// One table: its schema and its records keyed by record id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub schema: Schema,
    pub records: OrderedMap<Record>,
}

impl Table {
    pub fn new(schema: Schema) -> Self {
        Table {
            schema,
            records: OrderedMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Indexes of one table, keyed by column
pub type TableIndexes = OrderedMap<ColumnIndex>;

/// The whole in-memory state: tables plus their secondary indexes.
///
/// Owned by the storage engine and written to disk as one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub tables: OrderedMap<Table>,
    pub indexes: OrderedMap<TableIndexes>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_records(&self) -> usize {
        self.tables.values().map(Table::len).sum()
    }

    /// Column names with an index on `table`, in creation order
    pub fn indexed_columns(&self, table: &str) -> Vec<String> {
        self.indexes
            .get(table)
            .map(|indexes| indexes.keys().map(String::from).collect())
            .unwrap_or_default()
    }

    /// File a record under every index of its table
    pub fn index_record(&mut self, table: &str, id: &str, record: &Record) {
        if let Some(indexes) = self.indexes.get_mut(table) {
            for (column, index) in indexes.iter_mut() {
                if let Some(value) = record.get(column) {
                    index.add(value, id);
                }
            }
        }
    }

    /// Remove a record from every index of its table
    pub fn unindex_record(&mut self, table: &str, id: &str, record: &Record) {
        if let Some(indexes) = self.indexes.get_mut(table) {
            for (column, index) in indexes.iter_mut() {
                if let Some(value) = record.get(column) {
                    index.remove(value, id);
                }
            }
        }
    }

    /// Move a record between buckets after an update or re-key
    pub fn reindex_record(&mut self, table: &str, old_id: &str, old: &Record, new_id: &RecordId, new: &Record) {
        if let Some(indexes) = self.indexes.get_mut(table) {
            for (column, index) in indexes.iter_mut() {
                index.replace(old.get(column), old_id, new.get(column), new_id);
            }
        }
    }
}
