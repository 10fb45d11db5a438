//! SQLite storage implementation for blueprints and their dimensions.

mod model;
mod repository;

pub use model::{BlueprintDB, BlueprintDimensionDB, BlueprintGenerationDB};
pub use repository::BlueprintRepository;

pub use royalty_core::blueprints::BlueprintRepositoryTrait;
