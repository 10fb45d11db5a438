//! SQLite storage implementation for term mappings and ERP mapping rulesets.

mod model;
mod repository;

pub use model::{ErpMappingRuleSetDB, TermMappingDB};
pub use repository::TermMappingRepository;

pub use royalty_core::mappings::TermMappingRepositoryTrait;
