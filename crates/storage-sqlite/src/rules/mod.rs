//! SQLite storage implementation for calculation rules.

mod model;
mod repository;

pub use model::{CalculationRuleDB, NewCalculationRuleDB};
pub use repository::RuleRepository;

pub use royalty_core::rules::RuleRepositoryTrait;
