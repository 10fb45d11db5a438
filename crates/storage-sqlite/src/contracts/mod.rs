//! SQLite storage implementation for contracts.

mod model;
mod repository;

pub use model::{ContractDB, NewContractDB};
pub use repository::ContractRepository;

pub use royalty_core::contracts::ContractRepositoryTrait;
