//! Calculation rules - models, tier parsing and dimension extraction.

mod dimension_extractor;
mod rules_model;
mod rules_traits;

pub use dimension_extractor::{
    extract_dimensions, infer_container_size, normalize_container_size, DimensionType,
    ExtractedDimension,
};
pub use rules_model::{
    CalculationRule, ContainerSizeRate, NewCalculationRule, RuleType, VolumeTier,
};
pub use rules_traits::RuleRepositoryTrait;
