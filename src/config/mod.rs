/// Database connection and schema management
pub mod database;

/// Seed data (accounts and courses) loaded from a TOML file
pub mod seed;
