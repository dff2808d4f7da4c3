pub mod core;
pub mod storage;
pub mod schema;
pub mod index;
pub mod query;
pub mod cli;

pub use crate::core::config::Config;
pub use crate::core::database::{Database, ResultEnvelope};
pub use crate::core::error::{Error, ErrorKind, Result};

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                          TABULA STRUCT ARCHITECTURE                      │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── CORE LAYER ──────────────────────────────┐
│  ┌────────────────────────────────────────────────────────────────────┐  │
│  │ struct Database                                                    │  │
│  │ config: Option<Config>           // None for in-memory databases   │  │
│  │ engine: Mutex<StorageEngine>     // single exclusive-access point  │  │
│  │ parser: SqlParser                // text -> Statement              │  │
│  └────────────────────────────────────────────────────────────────────┘  │
│  ┌──────────────────┐  ┌──────────────────┐  ┌───────────────────────┐   │
│  │ enum Value       │  │ OrderedMap<V>    │  │ enum ResultEnvelope   │   │
│  │ • Integer(i64)   │  │ insertion order  │  │ • Message             │   │
│  │ • Float(f64)     │  │ kept on disk     │  │ • Error               │   │
│  │ • Boolean(bool)  │  └──────────────────┘  │ • Rows                │   │
│  │ • Text(String)   │                        │ • Schema              │   │
│  └──────────────────┘                        └───────────────────────┘   │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── QUERY LAYER ─────────────────────────────┐
│  scanner (quote masking) -> parser (regex) -> Statement                  │
│  Predicate = Compare(Condition) | And(..) | Or(..)                       │
│  RecordMatcher: short-circuit tree walk, LIKE via regex                  │
└──────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────── STORAGE LAYER ────────────────────────────┐
│  ┌────────────────────────┐  ┌──────────────────────┐  ┌──────────────┐  │
│  │ struct StorageEngine   │  │ struct Catalog       │  │ ColumnIndex  │  │
│  │ • catalog: Catalog     │  │ • tables             │  │ value -> ids │  │
│  │ • store: Box<dyn       │  │ • indexes            │  └──────────────┘  │
│  │   Persistence>         │  └──────────────────────┘                    │
│  │ • matcher              │  ┌──────────────────────┐  ┌──────────────┐  │
│  └────────────────────────┘  │ JsonFileStore        │  │ FileLock     │  │
│                              │ temp file + rename   │  │ flock(2)     │  │
│                              └──────────────────────┘  └──────────────┘  │
└──────────────────────────────────────────────────────────────────────────┘
*/
