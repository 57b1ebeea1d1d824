//! SQLite storage implementation for Stocktracker.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the `BarStore` trait defined in `stocktracker-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - A single writer thread serializing all writes
//! - Database-specific model types (with Diesel derives)
//!
//! ```text
//! core (BarStore trait)
//!       │
//!       ▼
//! storage-sqlite (this crate)
//!       │
//!       ▼
//!   SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod market_data;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use market_data::BarRepository;

// Re-export from stocktracker-core for convenience
pub use stocktracker_core::errors::{DatabaseError, Error, Result};
