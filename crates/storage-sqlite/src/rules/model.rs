//! Database models for calculation rules.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::StorageError;
use crate::utils::{
    decimal_to_text, optional_decimal_to_text, parse_json_or_default, parse_optional_decimal,
    to_json_text,
};
use royalty_core::rules::{CalculationRule, NewCalculationRule, RuleType};
use royalty_core::utils::decimal_from_json;

#[derive(Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::calculation_rules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CalculationRuleDB {
    pub id: String,
    pub contract_id: String,
    pub position: i32,
    pub name: String,
    pub rule_type: String,
    pub base_rate: Option<String>,
    pub tiers: String,
    pub product_categories: String,
    pub territories: String,
    pub seasonal_adjustments: String,
    pub territory_premiums: String,
    pub formula_definition: Option<String>,
    pub minimum_guarantee: Option<String>,
    pub priority: Option<i32>,
    pub is_active: bool,
    pub source_text: Option<String>,
    pub confidence: Option<f64>,
    pub is_ai_extracted: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::calculation_rules)]
#[serde(rename_all = "camelCase")]
pub struct NewCalculationRuleDB {
    pub id: String,
    pub contract_id: String,
    pub position: i32,
    pub name: String,
    pub rule_type: String,
    pub base_rate: Option<String>,
    pub tiers: String,
    pub product_categories: String,
    pub territories: String,
    pub seasonal_adjustments: String,
    pub territory_premiums: String,
    pub formula_definition: Option<String>,
    pub minimum_guarantee: Option<String>,
    pub priority: Option<i32>,
    pub is_active: bool,
    pub source_text: Option<String>,
    pub confidence: Option<f64>,
    pub is_ai_extracted: bool,
    pub created_at: NaiveDateTime,
}

/// Multiplier maps are stored with decimal strings as values. Older rows may
/// hold plain numbers, which are read too.
fn multipliers_to_text(map: &BTreeMap<String, Decimal>) -> Result<String, StorageError> {
    let as_text: BTreeMap<&str, String> = map
        .iter()
        .map(|(k, v)| (k.as_str(), decimal_to_text(*v)))
        .collect();
    to_json_text(&as_text)
}

fn multipliers_from_text(raw: &str, column: &str) -> BTreeMap<String, Decimal> {
    parse_json_or_default::<BTreeMap<String, Value>>(raw, column)
        .into_iter()
        .filter_map(|(k, v)| Some((k, decimal_from_json(&v)?)))
        .collect()
}

impl From<CalculationRuleDB> for CalculationRule {
    fn from(db: CalculationRuleDB) -> Self {
        let formula_definition = db
            .formula_definition
            .as_deref()
            .map(|raw| parse_json_or_default::<Value>(raw, "formula_definition"))
            .filter(|value| !value.is_null());
        Self {
            base_rate: parse_optional_decimal(db.base_rate.as_deref(), "base_rate"),
            tiers: parse_json_or_default(&db.tiers, "tiers"),
            product_categories: parse_json_or_default(&db.product_categories, "product_categories"),
            territories: parse_json_or_default(&db.territories, "territories"),
            seasonal_adjustments: multipliers_from_text(
                &db.seasonal_adjustments,
                "seasonal_adjustments",
            ),
            territory_premiums: multipliers_from_text(&db.territory_premiums, "territory_premiums"),
            formula_definition,
            minimum_guarantee: parse_optional_decimal(
                db.minimum_guarantee.as_deref(),
                "minimum_guarantee",
            ),
            rule_type: RuleType::parse(&db.rule_type),
            id: db.id,
            contract_id: db.contract_id,
            name: db.name,
            priority: db.priority,
            is_active: db.is_active,
            source_text: db.source_text,
            confidence: db.confidence,
            is_ai_extracted: db.is_ai_extracted,
            created_at: db.created_at,
        }
    }
}

impl NewCalculationRuleDB {
    pub fn from_domain(
        domain: NewCalculationRule,
        id: String,
        position: i32,
        created_at: NaiveDateTime,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            id: domain.id.unwrap_or(id),
            contract_id: domain.contract_id,
            position,
            name: domain.name,
            rule_type: domain.rule_type.as_str().to_string(),
            base_rate: optional_decimal_to_text(domain.base_rate),
            tiers: to_json_text(&domain.tiers)?,
            product_categories: to_json_text(&domain.product_categories)?,
            territories: to_json_text(&domain.territories)?,
            seasonal_adjustments: multipliers_to_text(&domain.seasonal_adjustments)?,
            territory_premiums: multipliers_to_text(&domain.territory_premiums)?,
            formula_definition: domain
                .formula_definition
                .as_ref()
                .map(to_json_text)
                .transpose()?,
            minimum_guarantee: optional_decimal_to_text(domain.minimum_guarantee),
            priority: domain.priority,
            is_active: domain.is_active,
            source_text: domain.source_text,
            confidence: domain.confidence,
            is_ai_extracted: domain.is_ai_extracted,
            created_at,
        })
    }
}
