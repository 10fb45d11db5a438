//! Contracts - the owner of rules, mappings and blueprints.

mod contracts_model;
mod contracts_traits;

pub use contracts_model::{Contract, NewContract};
pub use contracts_traits::ContractRepositoryTrait;
