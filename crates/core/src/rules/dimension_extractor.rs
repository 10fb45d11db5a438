//! Pulls the structural constraints out of a rule: product categories,
//! territories, container sizes and the fields its formula reads.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use super::{CalculationRule, RuleType};
use crate::utils::normalize_term;

static CONTAINER_SIZE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+(?:\.\d+)?)\s*-?\s*(gallons?|gal\.?|quarts?|qt\.?|liters?|litres?|ounces?|oz\.?|l)\b",
    )
    .expect("Invalid regex pattern")
});

/// Matches `{field}`, `${field}` and `{{field}}` placeholders in formula text.
static FORMULA_PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?\{\{?\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}?\}").expect("Invalid regex pattern")
});

const FORMULA_REFERENCE_KEYS: &[&str] = &["field", "variable", "var", "ref", "reference", "source"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionType {
    Product,
    Territory,
    ContainerSize,
    FormulaField,
}

impl DimensionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionType::Product => "product",
            DimensionType::Territory => "territory",
            DimensionType::ContainerSize => "container_size",
            DimensionType::FormulaField => "formula_field",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "product" | "category" => Some(DimensionType::Product),
            "territory" => Some(DimensionType::Territory),
            "container_size" => Some(DimensionType::ContainerSize),
            "formula_field" => Some(DimensionType::FormulaField),
            _ => None,
        }
    }
}

impl fmt::Display for DimensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constraint found on a rule, before any mapping is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDimension {
    pub dimension_type: DimensionType,
    /// The term as written on the rule.
    pub contract_term: String,
    /// The value transactions are compared against.
    pub match_value: String,
}

/// Extracts dimensions in a stable order: products, territories, container
/// sizes, formula fields. Duplicates (same type and value) are collapsed.
pub fn extract_dimensions(rule: &CalculationRule) -> Vec<ExtractedDimension> {
    let mut seen: HashSet<(DimensionType, String)> = HashSet::new();
    let mut dimensions = Vec::new();

    let mut push = |dimension_type: DimensionType, contract_term: &str, match_value: String| {
        if match_value.is_empty() {
            return;
        }
        if seen.insert((dimension_type, match_value.to_lowercase())) {
            dimensions.push(ExtractedDimension {
                dimension_type,
                contract_term: contract_term.to_string(),
                match_value,
            });
        }
    };

    for category in rule.categories() {
        push(DimensionType::Product, category, category.to_string());
    }

    for territory in rule.territory_filters() {
        push(DimensionType::Territory, territory, territory.to_string());
    }

    if rule.rule_type == RuleType::ContainerSizeTiered {
        for rate in rule.container_size_rates() {
            push(
                DimensionType::ContainerSize,
                &rate.size,
                rate.normalized_size.clone(),
            );
        }
    }

    if let Some(formula) = rule.formula_definition.as_ref() {
        let mut fields = Vec::new();
        collect_formula_references(formula, &mut fields);
        for field in fields {
            push(DimensionType::FormulaField, &field, field.clone());
        }
    }

    dimensions
}

fn collect_formula_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let is_reference_key = FORMULA_REFERENCE_KEYS
                    .iter()
                    .any(|k| k.eq_ignore_ascii_case(key));
                match child {
                    Value::String(name) if is_reference_key => {
                        let name = name.trim();
                        if !name.is_empty() {
                            out.push(name.to_string());
                        }
                    }
                    _ => collect_formula_references(child, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_formula_references(item, out);
            }
        }
        Value::String(text) => {
            for capture in FORMULA_PLACEHOLDER_REGEX.captures_iter(text) {
                if let Some(name) = capture.get(1) {
                    out.push(name.as_str().to_string());
                }
            }
        }
        _ => {}
    }
}

/// Canonical container size: `"5 Gallon"` and `"5-gal."` both become `"5gal"`.
pub fn normalize_container_size(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('.');
    if let Some(caps) = CONTAINER_SIZE_REGEX.captures(trimmed) {
        let whole = caps.get(0).map(|m| m.as_str().len()).unwrap_or(0);
        if whole == trimmed.len() {
            let amount = &caps[1];
            return format!("{}{}", amount, unit_abbreviation(&caps[2]));
        }
    }
    normalize_term(trimmed).replace(' ', "")
}

/// Finds a container size mentioned in free text such as a product name.
pub fn infer_container_size(text: &str) -> Option<String> {
    CONTAINER_SIZE_REGEX
        .captures(text)
        .map(|caps| format!("{}{}", &caps[1], unit_abbreviation(&caps[2])))
}

fn unit_abbreviation(unit: &str) -> &'static str {
    let unit = unit.trim_end_matches('.').to_lowercase();
    if unit.starts_with("gal") {
        "gal"
    } else if unit.starts_with("q") {
        "qt"
    } else if unit.starts_with("o") {
        "oz"
    } else {
        "l"
    }
}
