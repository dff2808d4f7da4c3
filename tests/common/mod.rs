use tabula::core::database::{Database, ResultEnvelope};
use tabula::core::types::Record;

pub const CREATE_USERS: &str =
    "CREATE TABLE users (id INT PRIMARY KEY, name TEXT NOT NULL, age INT, city TEXT)";

/// In-memory database with an empty `users` table
#[allow(dead_code)]
pub fn users_db() -> Database {
    let db = Database::in_memory();
    db.query(CREATE_USERS).unwrap();
    db
}

/// `users` with Alice (30), Bob (45), Carol (52) and Dave (no age)
#[allow(dead_code)]
pub fn seeded_users_db() -> Database {
    let db = users_db();
    for statement in [
        "INSERT INTO users VALUES (1, 'Alice', 30, 'Portland')",
        "INSERT INTO users VALUES (2, 'Bob', 45, 'Lisbon')",
        "INSERT INTO users VALUES (3, 'Carol', 52, 'Portland')",
        "INSERT INTO users (id, name, city) VALUES (4, 'Dave', 'Osaka')",
    ] {
        db.query(statement).unwrap();
    }
    db
}

#[allow(dead_code)]
pub fn rows(envelope: ResultEnvelope) -> Vec<Record> {
    match envelope {
        ResultEnvelope::Rows { result, .. } => result,
        other => panic!("expected rows, got {:?}", other),
    }
}

#[allow(dead_code)]
pub fn select(db: &Database, query: &str) -> Vec<Record> {
    rows(db.query(query).unwrap())
}

/// Display values of `column` across `records`, empty text when absent
#[allow(dead_code)]
pub fn column(records: &[Record], column: &str) -> Vec<String> {
    records
        .iter()
        .map(|record| record.get(column).map(|v| v.to_string()).unwrap_or_default())
        .collect()
}
