pub mod engine;
pub mod table;
pub mod persistence;
pub mod file_lock;
