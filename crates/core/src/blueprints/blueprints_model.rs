//! Blueprint domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::rules::{CalculationRule, DimensionType, RuleType};
use crate::settings::CalculationApproach;

/// One constraint of a blueprint, bound to an ERP field or left unmapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDimension {
    pub id: String,
    pub blueprint_id: String,
    pub dimension_type: DimensionType,
    pub contract_term: String,
    pub match_value: String,
    pub erp_field_name: Option<String>,
    /// Sales-data field the ERP field feeds, per the active ruleset.
    pub sales_field: Option<String>,
    pub is_mapped: bool,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlueprintDimension {
    pub dimension_type: DimensionType,
    pub contract_term: String,
    pub match_value: String,
    pub erp_field_name: Option<String>,
    pub sales_field: Option<String>,
    pub is_mapped: bool,
    pub confidence: Option<f64>,
}

/// Mapped values a transaction is checked against, grouped by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingCriteria {
    pub products: Vec<String>,
    pub territories: Vec<String>,
    pub container_sizes: Vec<String>,
}

/// A rule plus its resolved ERP bindings. Blueprints are never edited in
/// place: each materialization replaces the whole set for a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub id: String,
    pub contract_id: String,
    pub company_id: String,
    pub rule_id: String,
    pub name: String,
    pub rule_type: RuleType,
    pub generation: i64,
    /// Snapshot of the rule taken at materialization time.
    pub calculation_logic: CalculationRule,
    pub matching_criteria: MatchingCriteria,
    pub dimensions: Vec<BlueprintDimension>,
    pub is_fully_mapped: bool,
    pub unmapped_fields: Vec<String>,
    pub erp_rule_set_id: Option<String>,
    pub priority: i32,
    pub created_at: NaiveDateTime,
}

impl Blueprint {
    pub fn mapped_dimensions(&self) -> impl Iterator<Item = &BlueprintDimension> {
        self.dimensions.iter().filter(|d| d.is_mapped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlueprint {
    pub contract_id: String,
    pub company_id: String,
    pub rule_id: String,
    pub name: String,
    pub rule_type: RuleType,
    pub calculation_logic: CalculationRule,
    pub matching_criteria: MatchingCriteria,
    pub dimensions: Vec<NewBlueprintDimension>,
    pub is_fully_mapped: bool,
    pub unmapped_fields: Vec<String>,
    pub erp_rule_set_id: Option<String>,
    pub priority: i32,
}

/// The committed blueprint generation of a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintGeneration {
    pub contract_id: String,
    pub generation: i64,
    pub blueprint_count: usize,
    pub materialized_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializationSummary {
    pub contract_id: String,
    pub approach: CalculationApproach,
    /// True when the approach does not use blueprints and nothing was written.
    pub skipped: bool,
    pub generation: Option<i64>,
    pub rules_processed: usize,
    pub blueprints_created: usize,
    pub fully_mapped: usize,
    pub dimensions_total: usize,
    pub dimensions_mapped: usize,
    pub unmapped_fields: Vec<String>,
}

impl MaterializationSummary {
    pub fn skipped(contract_id: &str, approach: CalculationApproach) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            approach,
            skipped: true,
            generation: None,
            rules_processed: 0,
            blueprints_created: 0,
            fully_mapped: 0,
            dimensions_total: 0,
            dimensions_mapped: 0,
            unmapped_fields: Vec::new(),
        }
    }
}
