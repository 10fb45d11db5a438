//! Blueprints - rules pre-bound to ERP fields, materialized per contract.

mod blueprints_model;
mod blueprints_traits;
mod materializer;

pub use blueprints_model::{
    Blueprint, BlueprintDimension, BlueprintGeneration, MatchingCriteria, MaterializationSummary,
    NewBlueprint, NewBlueprintDimension,
};
pub use blueprints_traits::{BlueprintMaterializerTrait, BlueprintRepositoryTrait};
pub use materializer::{materialize_rule, BlueprintMaterializer};

#[cfg(test)]
mod materializer_tests;
