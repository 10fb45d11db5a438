//! Database models for blueprints.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::utils::{parse_json_or_default, to_json_text};
use royalty_core::blueprints::{
    Blueprint, BlueprintDimension, BlueprintGeneration, NewBlueprint, NewBlueprintDimension,
};
use royalty_core::rules::{CalculationRule, DimensionType, RuleType};

#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::blueprints)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDB {
    pub id: String,
    pub contract_id: String,
    pub company_id: String,
    pub rule_id: String,
    pub position: i32,
    pub name: String,
    pub rule_type: String,
    pub generation: i64,
    pub calculation_logic: String,
    pub matching_criteria: String,
    pub is_fully_mapped: bool,
    pub unmapped_fields: String,
    pub erp_rule_set_id: Option<String>,
    pub priority: i32,
    pub created_at: NaiveDateTime,
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Associations,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(belongs_to(BlueprintDB, foreign_key = blueprint_id))]
#[diesel(table_name = crate::schema::blueprint_dimensions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDimensionDB {
    pub id: String,
    pub blueprint_id: String,
    pub position: i32,
    pub dimension_type: String,
    pub contract_term: String,
    pub match_value: String,
    pub erp_field_name: Option<String>,
    pub sales_field: Option<String>,
    pub is_mapped: bool,
    pub confidence: Option<f64>,
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(primary_key(contract_id))]
#[diesel(table_name = crate::schema::blueprint_generations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct BlueprintGenerationDB {
    pub contract_id: String,
    pub generation: i64,
    pub blueprint_count: i32,
    pub materialized_at: NaiveDateTime,
}

impl From<BlueprintGenerationDB> for BlueprintGeneration {
    fn from(db: BlueprintGenerationDB) -> Self {
        Self {
            contract_id: db.contract_id,
            generation: db.generation,
            blueprint_count: usize::try_from(db.blueprint_count).unwrap_or_default(),
            materialized_at: db.materialized_at,
        }
    }
}

impl BlueprintDimensionDB {
    pub fn from_domain(
        domain: NewBlueprintDimension,
        id: String,
        blueprint_id: &str,
        position: i32,
    ) -> Self {
        Self {
            id,
            blueprint_id: blueprint_id.to_string(),
            position,
            dimension_type: domain.dimension_type.as_str().to_string(),
            contract_term: domain.contract_term,
            match_value: domain.match_value,
            erp_field_name: domain.erp_field_name,
            sales_field: domain.sales_field,
            is_mapped: domain.is_mapped,
            confidence: domain.confidence,
        }
    }

    /// Rows with an unknown dimension type are dropped.
    pub fn into_domain(self) -> Option<BlueprintDimension> {
        let Some(dimension_type) = DimensionType::parse(&self.dimension_type) else {
            warn!(
                "Skipping blueprint dimension {} with unknown type '{}'",
                self.id, self.dimension_type
            );
            return None;
        };
        Some(BlueprintDimension {
            id: self.id,
            blueprint_id: self.blueprint_id,
            dimension_type,
            contract_term: self.contract_term,
            match_value: self.match_value,
            erp_field_name: self.erp_field_name,
            sales_field: self.sales_field,
            is_mapped: self.is_mapped,
            confidence: self.confidence,
        })
    }
}

impl BlueprintDB {
    pub fn from_domain(
        domain: &NewBlueprint,
        id: String,
        generation: i64,
        position: i32,
        created_at: NaiveDateTime,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            id,
            contract_id: domain.contract_id.clone(),
            company_id: domain.company_id.clone(),
            rule_id: domain.rule_id.clone(),
            position,
            name: domain.name.clone(),
            rule_type: domain.rule_type.as_str().to_string(),
            generation,
            calculation_logic: to_json_text(&domain.calculation_logic)?,
            matching_criteria: to_json_text(&domain.matching_criteria)?,
            is_fully_mapped: domain.is_fully_mapped,
            unmapped_fields: to_json_text(&domain.unmapped_fields)?,
            erp_rule_set_id: domain.erp_rule_set_id.clone(),
            priority: domain.priority,
            created_at,
        })
    }

    /// Rebuilds the blueprint. A blueprint whose rule snapshot cannot be read
    /// is dropped, since it could not price anything.
    pub fn into_domain(self, dimensions: Vec<BlueprintDimension>) -> Option<Blueprint> {
        let calculation_logic: CalculationRule =
            match serde_json::from_str(&self.calculation_logic) {
                Ok(rule) => rule,
                Err(e) => {
                    warn!(
                        "Skipping blueprint {} with unreadable rule snapshot: {}",
                        self.id, e
                    );
                    return None;
                }
            };
        Some(Blueprint {
            matching_criteria: parse_json_or_default(&self.matching_criteria, "matching_criteria"),
            unmapped_fields: parse_json_or_default(&self.unmapped_fields, "unmapped_fields"),
            rule_type: RuleType::parse(&self.rule_type),
            id: self.id,
            contract_id: self.contract_id,
            company_id: self.company_id,
            rule_id: self.rule_id,
            name: self.name,
            generation: self.generation,
            calculation_logic,
            dimensions,
            is_fully_mapped: self.is_fully_mapped,
            erp_rule_set_id: self.erp_rule_set_id,
            priority: self.priority,
            created_at: self.created_at,
        })
    }
}
