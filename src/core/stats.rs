use serde::{Deserialize, Serialize};

/// Table summary for SHOW TABLES / SHOW TABLE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub record_count: usize,
    pub indexes: Vec<String>,  // indexed columns, in creation order
}

impl TableInfo {
    /// Multi-line text used by SHOW TABLE
    pub fn summary(&self) -> String {
        let indexes = if self.indexes.is_empty() {
            "None".to_string()
        } else {
            self.indexes.join(", ")
        };
        format!(
            "Table: {}\nRecords: {}\nIndexes: {}",
            self.name, self.record_count, indexes
        )
    }
}
