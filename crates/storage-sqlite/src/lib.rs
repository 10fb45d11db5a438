//! SQLite storage implementation for the royalty calculation engine.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `royalty-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for contracts, rules, mappings, blueprints and reports
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place where Diesel dependencies exist. The core
//! crate is database-agnostic and works with traits.
//!
//! ```text
//!          core (domain)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```
//!
//! Reads go through the connection pool. Every write is sent to a single
//! writer actor that runs it inside an immediate transaction.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod blueprints;
pub mod contracts;
pub mod mappings;
pub mod reporting;
pub mod rules;
pub mod settings;

pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use blueprints::BlueprintRepository;
pub use contracts::ContractRepository;
pub use mappings::TermMappingRepository;
pub use reporting::ReportingRepository;
pub use rules::RuleRepository;
pub use settings::CompanySettingsRepository;

// Re-export from royalty-core for convenience
pub use royalty_core::errors::{DatabaseError, Error, Result};
