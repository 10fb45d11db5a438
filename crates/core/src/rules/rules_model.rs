//! Calculation rule domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::normalize_container_size;
use crate::constants::DEFAULT_RULE_PRIORITY;
use crate::utils::{first_decimal, first_string};

/// Kind of pricing a rule describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Percentage,
    Tiered,
    ContainerSizeTiered,
    FormulaBased,
    MinimumGuarantee,
    Other,
}

impl RuleType {
    /// Parses the loosely-named types produced by extraction.
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match key.as_str() {
            "percentage" | "flat_percentage" | "royalty_rate" | "percentage_of_sales" => {
                RuleType::Percentage
            }
            "tiered" | "volume_tiered" | "tiered_pricing" | "tiered_rate" => RuleType::Tiered,
            "container_size_tiered" | "container_size" | "container_size_pricing" | "per_unit" => {
                RuleType::ContainerSizeTiered
            }
            "formula_based" | "formula" => RuleType::FormulaBased,
            "minimum_guarantee" | "minimum_annual_guarantee" | "minimum" => {
                RuleType::MinimumGuarantee
            }
            _ => RuleType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Percentage => "percentage",
            RuleType::Tiered => "tiered",
            RuleType::ContainerSizeTiered => "container_size_tiered",
            RuleType::FormulaBased => "formula_based",
            RuleType::MinimumGuarantee => "minimum_guarantee",
            RuleType::Other => "other",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One volume band. `max = None` means unbounded. `rate` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeTier {
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl VolumeTier {
    pub fn contains(&self, quantity: Decimal) -> bool {
        quantity >= self.min && self.max.map_or(true, |max| quantity <= max)
    }

    pub fn label(&self) -> String {
        match self.max {
            Some(max) => format!("{}-{}", self.min.normalize(), max.normalize()),
            None => format!("{}+", self.min.normalize()),
        }
    }
}

/// Per-unit price for one container size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSizeRate {
    pub size: String,
    pub normalized_size: String,
    pub base_rate: Decimal,
    pub volume_threshold: Option<Decimal>,
    pub discounted_rate: Option<Decimal>,
}

/// A single pricing rule attached to a contract. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRule {
    pub id: String,
    pub contract_id: String,
    pub name: String,
    pub rule_type: RuleType,
    pub base_rate: Option<Decimal>,
    /// Raw tier entries. Volume tiers or container-size rates depending on `rule_type`.
    pub tiers: Vec<Value>,
    pub product_categories: Vec<String>,
    pub territories: Vec<String>,
    pub seasonal_adjustments: BTreeMap<String, Decimal>,
    pub territory_premiums: BTreeMap<String, Decimal>,
    pub formula_definition: Option<Value>,
    pub minimum_guarantee: Option<Decimal>,
    pub priority: Option<i32>,
    pub is_active: bool,
    pub source_text: Option<String>,
    pub confidence: Option<f64>,
    pub is_ai_extracted: bool,
    pub created_at: NaiveDateTime,
}

impl CalculationRule {
    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_RULE_PRIORITY)
    }

    pub fn has_formula(&self) -> bool {
        match &self.formula_definition {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Categories with blank entries removed.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.product_categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    pub fn territory_filters(&self) -> impl Iterator<Item = &str> {
        self.territories
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
    }

    /// Volume tiers sorted by lower bound. Entries without a rate are dropped.
    pub fn volume_tiers(&self) -> Vec<VolumeTier> {
        let mut tiers: Vec<VolumeTier> = self
            .tiers
            .iter()
            .filter_map(|entry| {
                let object = entry.as_object()?;
                let rate = first_decimal(object, &["rate", "royaltyRate", "percentage"])?;
                let min = first_decimal(object, &["min", "minQuantity", "from", "minimum"])
                    .unwrap_or(Decimal::ZERO);
                let max = first_decimal(object, &["max", "maxQuantity", "to", "maximum"]);
                Some(VolumeTier { min, max, rate })
            })
            .collect();
        tiers.sort_by(|a, b| a.min.cmp(&b.min));
        tiers
    }

    /// Container rate entries in declaration order. Entries with a missing,
    /// unparseable or non-positive base rate are discarded.
    pub fn container_size_rates(&self) -> Vec<ContainerSizeRate> {
        self.tiers
            .iter()
            .filter_map(|entry| {
                let object = entry.as_object()?;
                let size = first_string(object, &["size", "containerSize", "container"])?;
                let base_rate = first_decimal(object, &["baseRate", "rate", "price", "perUnitRate"])?;
                if base_rate <= Decimal::ZERO {
                    return None;
                }
                let discounted_rate = first_decimal(object, &["discountedRate", "discountRate"])
                    .filter(|r| *r > Decimal::ZERO);
                Some(ContainerSizeRate {
                    normalized_size: normalize_container_size(&size),
                    size,
                    base_rate,
                    volume_threshold: first_decimal(object, &["volumeThreshold", "threshold"]),
                    discounted_rate,
                })
            })
            .collect()
    }
}

/// Input model for creating a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalculationRule {
    pub id: Option<String>,
    pub contract_id: String,
    pub name: String,
    pub rule_type: RuleType,
    pub base_rate: Option<Decimal>,
    pub tiers: Vec<Value>,
    pub product_categories: Vec<String>,
    pub territories: Vec<String>,
    pub seasonal_adjustments: BTreeMap<String, Decimal>,
    pub territory_premiums: BTreeMap<String, Decimal>,
    pub formula_definition: Option<Value>,
    pub minimum_guarantee: Option<Decimal>,
    pub priority: Option<i32>,
    pub is_active: bool,
    pub source_text: Option<String>,
    pub confidence: Option<f64>,
    pub is_ai_extracted: bool,
}
