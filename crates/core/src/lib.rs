//! Stocktracker Core - acquisition service, response models, and storage traits.
//!
//! This crate orchestrates the `stocktracker-market-data` components into one
//! request pipeline. It is database-agnostic and defines the `BarStore` trait
//! implemented by the `storage-sqlite` crate.

pub mod errors;
pub mod market_data;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
