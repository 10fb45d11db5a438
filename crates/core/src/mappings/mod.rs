//! Term-to-ERP-field mappings confirmed for a contract, and the company's
//! active ERP field-mapping ruleset.

mod mappings_model;
mod mappings_traits;

pub use mappings_model::{
    ErpFieldRule, ErpMappingRuleSet, MappingStatus, NewTermMapping, TermMapping,
};
pub use mappings_traits::TermMappingRepositoryTrait;
