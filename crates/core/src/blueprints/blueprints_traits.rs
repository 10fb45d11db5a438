use async_trait::async_trait;

use super::{Blueprint, BlueprintGeneration, MaterializationSummary, NewBlueprint};
use crate::errors::Result;

/// Trait for blueprint repository operations
#[async_trait]
pub trait BlueprintRepositoryTrait: Send + Sync {
    /// Blueprints of the latest committed generation, with their dimensions.
    fn get_blueprints(&self, contract_id: &str) -> Result<Vec<Blueprint>>;

    fn get_latest_generation(&self, contract_id: &str) -> Result<Option<BlueprintGeneration>>;

    /// Atomically replaces every blueprint of the contract with `blueprints`
    /// as a new generation.
    async fn replace_blueprints(
        &self,
        contract_id: &str,
        blueprints: Vec<NewBlueprint>,
    ) -> Result<BlueprintGeneration>;
}

#[async_trait]
pub trait BlueprintMaterializerTrait: Send + Sync {
    async fn materialize_for_contract(&self, contract_id: &str) -> Result<MaterializationSummary>;

    /// Re-materialization hook for the mapping confirmation workflow. Errors
    /// are logged, never returned.
    async fn on_mappings_confirmed(&self, contract_id: &str);
}
