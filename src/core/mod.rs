pub mod types;
pub mod ordered_map;
pub mod database;
pub mod config;
pub mod error;
pub mod stats;
