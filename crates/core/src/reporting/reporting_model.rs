//! Reporting domain models.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static CUSTOM_DIMENSION_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Invalid regex pattern"));

/// A dimension line items can be grouped by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKey {
    Vendor,
    Item,
    Category,
    Territory,
    Period,
    Rule,
    /// A key of the free-form per-transaction dimension map. Only ever
    /// constructed from a validated key.
    Custom(String),
}

impl DimensionKey {
    pub const FIRST_CLASS: [DimensionKey; 6] = [
        DimensionKey::Vendor,
        DimensionKey::Item,
        DimensionKey::Category,
        DimensionKey::Territory,
        DimensionKey::Period,
        DimensionKey::Rule,
    ];

    /// Resolves a requested key. Unknown keys become custom dimensions when
    /// they are plain identifiers; anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim();
        match key.to_lowercase().as_str() {
            "vendor" | "vendor_name" => Some(DimensionKey::Vendor),
            "item" | "product" | "item_name" | "product_name" => Some(DimensionKey::Item),
            "category" => Some(DimensionKey::Category),
            "territory" | "region" => Some(DimensionKey::Territory),
            "period" | "month" => Some(DimensionKey::Period),
            "rule" | "rule_name" => Some(DimensionKey::Rule),
            _ if Self::is_valid_custom_key(key) => Some(DimensionKey::Custom(key.to_string())),
            _ => None,
        }
    }

    pub fn is_valid_custom_key(key: &str) -> bool {
        CUSTOM_DIMENSION_KEY_REGEX.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DimensionKey::Vendor => "vendor",
            DimensionKey::Item => "item",
            DimensionKey::Category => "category",
            DimensionKey::Territory => "territory",
            DimensionKey::Period => "period",
            DimensionKey::Rule => "rule",
            DimensionKey::Custom(key) => key,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            DimensionKey::Vendor => "Vendor".to_string(),
            DimensionKey::Item => "Item".to_string(),
            DimensionKey::Category => "Category".to_string(),
            DimensionKey::Territory => "Territory".to_string(),
            DimensionKey::Period => "Period".to_string(),
            DimensionKey::Rule => "Rule".to_string(),
            DimensionKey::Custom(key) => key.clone(),
        }
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns an ERP field name into a custom dimension key ("Ship To" -> "Ship_To").
pub fn dimension_key_for_field(field_name: &str) -> Option<String> {
    let key: String = field_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let key = key.trim_matches('_').to_string();
    (!key.is_empty()).then_some(key)
}

/// Raw group sums as returned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemGroupRow {
    pub dimension_value: Option<String>,
    pub total_sales: Decimal,
    pub total_quantity: Decimal,
    pub total_fee: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionAggregate {
    pub dimension_value: String,
    pub total_sales: Decimal,
    pub total_quantity: Decimal,
    pub total_fee: Decimal,
    pub transaction_count: i64,
    /// `total_fee / total_sales` as a percentage.
    pub avg_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Standard,
    Custom,
}

impl DimensionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionKind::Standard => "standard",
            DimensionKind::Custom => "custom",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("standard") {
            DimensionKind::Standard
        } else {
            DimensionKind::Custom
        }
    }
}

/// Reporting taxonomy entry of a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionConfig {
    pub id: String,
    pub contract_id: String,
    pub dimension_key: String,
    pub display_name: String,
    pub dimension_type: DimensionKind,
    pub erp_field_name: Option<String>,
    pub is_groupable: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDimensionConfig {
    pub contract_id: String,
    pub dimension_key: String,
    pub display_name: String,
    pub dimension_type: DimensionKind,
    pub erp_field_name: Option<String>,
    pub is_groupable: bool,
    pub sort_order: i32,
}

/// A canonical vendor of a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub is_active: bool,
}

/// Stored header of one calculation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculation {
    pub id: String,
    pub contract_id: String,
    pub company_id: String,
    pub total_sales: Decimal,
    pub total_fee: Decimal,
    pub minimum_guarantee: Option<Decimal>,
    pub final_fee: Decimal,
    pub transaction_count: i64,
    /// Breakdown payload as first stored. Older rows hold it double encoded.
    pub breakdown_json: Option<String>,
    pub line_items_materialized: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeeCalculation {
    pub contract_id: String,
    pub company_id: String,
    pub total_sales: Decimal,
    pub total_fee: Decimal,
    pub minimum_guarantee: Option<Decimal>,
    pub final_fee: Decimal,
    pub transaction_count: i64,
    pub breakdown_json: Option<String>,
}

/// One priced transaction, flattened for grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationLineItem {
    pub id: String,
    pub calculation_id: String,
    pub transaction_id: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub territory: Option<String>,
    pub period: Option<String>,
    pub rule_id: Option<String>,
    pub rule_name: Option<String>,
    pub quantity: Decimal,
    pub sales_amount: Decimal,
    pub fee_amount: Decimal,
    pub rate: Option<Decimal>,
    pub dimensions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalculationLineItem {
    pub transaction_id: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub territory: Option<String>,
    pub period: Option<String>,
    pub rule_id: Option<String>,
    pub rule_name: Option<String>,
    pub quantity: Decimal,
    pub sales_amount: Decimal,
    pub fee_amount: Decimal,
    pub rate: Option<Decimal>,
    pub dimensions: BTreeMap<String, String>,
}
