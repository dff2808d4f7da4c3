use std::fs;
use std::io::{BufWriter, ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::ordered_map::OrderedMap;
use crate::core::types::Record;
use crate::schema::schema::Schema;
use crate::storage::file_lock::FileLock;
use crate::storage::table::{Catalog, Table, TableIndexes};

/// Where the catalog lives between runs
pub trait Persistence: Send {
    /// Read the stored catalog. `None` means nothing has been stored yet.
    fn load(&self) -> Result<Option<Catalog>>;

    /// Replace the stored catalog with `catalog`
    fn save(&self, catalog: &Catalog) -> Result<()>;
}

/// Written with every save, never read back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub last_updated: DateTime<Utc>,
    pub total_tables: usize,
}

/// On-disk document
#[derive(Debug, Default, Deserialize)]
struct DatabaseFile {
    #[serde(default)]
    tables: OrderedMap<OrderedMap<Record>>,
    #[serde(default)]
    schemas: OrderedMap<Schema>,
    #[serde(default)]
    indexes: OrderedMap<TableIndexes>,
}

#[derive(Serialize)]
struct DatabaseFileRef<'a> {
    tables: OrderedMap<&'a OrderedMap<Record>>,
    schemas: OrderedMap<&'a Schema>,
    indexes: &'a OrderedMap<TableIndexes>,
    metadata: Metadata,
}

impl DatabaseFile {
    fn into_catalog(self) -> Catalog {
        let DatabaseFile { mut tables, schemas, indexes } = self;
        let mut catalog = Catalog::new();

        for (name, schema) in schemas {
            let records = tables.remove(&name).unwrap_or_default();
            catalog.tables.insert(name, Table { schema, records });
        }
        // Records without a schema entry keep an empty schema
        for (name, records) in tables {
            catalog.tables.insert(name, Table { schema: Schema::new(), records });
        }
        for (name, table_indexes) in indexes {
            if catalog.tables.contains_key(&name) {
                catalog.indexes.insert(name, table_indexes);
            }
        }

        catalog
    }
}

impl<'a> DatabaseFileRef<'a> {
    fn from_catalog(catalog: &'a Catalog) -> Self {
        DatabaseFileRef {
            tables: catalog.tables.iter().map(|(name, table)| (name, &table.records)).collect(),
            schemas: catalog.tables.iter().map(|(name, table)| (name, &table.schema)).collect(),
            indexes: &catalog.indexes,
            metadata: Metadata {
                last_updated: Utc::now(),
                total_tables: catalog.tables.len(),
            },
        }
    }
}

/// JSON document on disk, rewritten whole after every mutation.
///
/// Saves go to a temporary file next to the target which is then renamed
/// over it, so a crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    pretty: bool,
    _lock: Option<FileLock>,
}

impl JsonFileStore {
    pub fn open(config: &Config) -> Result<Self> {
        let lock = if config.exclusive_lock {
            Some(FileLock::acquire(&config.lock_path())?)
        } else {
            None
        };

        Ok(JsonFileStore {
            path: config.data_file.clone(),
            pretty: config.pretty,
            _lock: lock,
        })
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Result<Option<Catalog>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no data file yet, starting empty");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let file: DatabaseFile = serde_json::from_slice(&data)?;
        let catalog = file.into_catalog();
        tracing::info!(
            path = %self.path.display(),
            tables = catalog.tables.len(),
            records = catalog.total_records(),
            "loaded data file"
        );
        Ok(Some(catalog))
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        let document = DatabaseFileRef::from_catalog(catalog);

        let temp = NamedTempFile::new_in(self.parent_dir())?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            if self.pretty {
                serde_json::to_writer_pretty(&mut writer, &document)?;
            } else {
                serde_json::to_writer(&mut writer, &document)?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;

        tracing::debug!(path = %self.path.display(), tables = catalog.tables.len(), "flushed data file");
        Ok(())
    }
}

/// Keeps nothing. Used for in-memory databases.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStore;

impl Persistence for MemoryStore {
    fn load(&self) -> Result<Option<Catalog>> {
        Ok(None)
    }

    fn save(&self, _catalog: &Catalog) -> Result<()> {
        Ok(())
    }
}
