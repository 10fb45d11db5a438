//! Royalty Core - Contract fee calculation engine.
//!
//! This crate holds the domain models, the blueprint materializer, the
//! rule matcher, fee strategies, audit trail and reporting services. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod blueprints;
pub mod calculation;
pub mod constants;
pub mod contracts;
pub mod errors;
pub mod mappings;
pub mod reporting;
pub mod rules;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
