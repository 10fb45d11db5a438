//! Reading breakdown payloads stored before structured line items existed.

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{dimension_key_for_field, NewCalculationLineItem};
use crate::calculation::BreakdownItem;
use crate::mappings::TermMapping;
use crate::utils::{first_decimal, first_field, first_string, period_key, string_from_json};

const TRANSACTION_ID_KEYS: &[&str] = &["transactionId", "saleId", "id"];
const DATE_KEYS: &[&str] = &["transactionDate", "saleDate", "date"];
const VENDOR_KEYS: &[&str] = &["vendorName", "vendor", "supplierName", "supplier"];
const ITEM_KEYS: &[&str] = &["productName", "itemName", "product", "item"];
const CATEGORY_KEYS: &[&str] = &["category", "productCategory"];
const TERRITORY_KEYS: &[&str] = &["territory", "region"];
const QUANTITY_KEYS: &[&str] = &["quantity", "units", "salesVolume"];
const SALES_KEYS: &[&str] = &["salesAmount", "saleAmount", "netAmount", "grossAmount"];
const FEE_KEYS: &[&str] = &[
    "computedFee",
    "calculatedRoyalty",
    "royaltyAmount",
    "feeAmount",
    "fee",
];
const RATE_KEYS: &[&str] = &["effectiveRate", "appliedRate", "rate", "baseRate"];
const RULE_NAME_KEYS: &[&str] = &["ruleName", "ruleApplied", "rule"];

/// Parses a stored breakdown payload into its entries.
///
/// Accepts an array, an object with a `breakdown` array, or either of those
/// encoded a second time as a JSON string. Anything else yields an empty
/// list.
pub fn parse_legacy_breakdown(raw: &str) -> Vec<Value> {
    let mut value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unreadable breakdown payload: {}", e);
            return Vec::new();
        }
    };

    // Older writers serialized the already-serialized string.
    for _ in 0..2 {
        let Value::String(inner) = &value else { break };
        value = match serde_json::from_str(inner) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Unreadable double-encoded breakdown payload: {}", e);
                return Vec::new();
            }
        };
    }

    match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("breakdown") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn dimension_map(object: &Map<String, Value>) -> BTreeMap<String, String> {
    first_field(object, &["dimensions"])
        .and_then(Value::as_object)
        .map(|dims| {
            dims.iter()
                .filter_map(|(k, v)| {
                    Some((dimension_key_for_field(k)?, string_from_json(v)?))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Adds a dimension for every confirmed mapping whose ERP field carries a
/// value on the entry.
fn attach_mapped_fields(
    object: &Map<String, Value>,
    mappings: &[TermMapping],
    dimensions: &mut BTreeMap<String, String>,
) {
    let nested = first_field(object, &["dimensions"]).and_then(Value::as_object);
    for mapping in mappings {
        let field = mapping.erp_field_name.as_str();
        let Some(key) = dimension_key_for_field(field) else {
            continue;
        };
        if dimensions.contains_key(&key) {
            continue;
        }
        let value = first_string(object, &[field])
            .or_else(|| nested.and_then(|dims| first_string(dims, &[field])));
        if let Some(value) = value {
            dimensions.insert(key, value);
        }
    }
}

/// Converts one legacy entry. Entries that are not objects are skipped.
pub fn line_item_from_legacy(entry: &Value, mappings: &[TermMapping]) -> Option<NewCalculationLineItem> {
    let object = entry.as_object()?;
    let rule = first_field(object, &["rule"]).and_then(Value::as_object);

    let transaction_date = first_string(object, DATE_KEYS).and_then(|d| parse_date(&d));
    let rule_name = rule
        .and_then(|r| first_string(r, &["name", "ruleName"]))
        .or_else(|| first_string(object, RULE_NAME_KEYS));
    let rule_id = first_string(object, &["ruleId"])
        .or_else(|| rule.and_then(|r| first_string(r, &["ruleId", "id"])));

    let mut dimensions = dimension_map(object);
    attach_mapped_fields(object, mappings, &mut dimensions);

    Some(NewCalculationLineItem {
        transaction_id: first_string(object, TRANSACTION_ID_KEYS),
        period: transaction_date.map(period_key),
        transaction_date,
        vendor_name: first_string(object, VENDOR_KEYS),
        item_name: first_string(object, ITEM_KEYS),
        category: first_string(object, CATEGORY_KEYS),
        territory: first_string(object, TERRITORY_KEYS),
        rule_id,
        rule_name,
        quantity: first_decimal(object, QUANTITY_KEYS).unwrap_or(Decimal::ZERO),
        sales_amount: first_decimal(object, SALES_KEYS).unwrap_or(Decimal::ZERO),
        fee_amount: first_decimal(object, FEE_KEYS).unwrap_or(Decimal::ZERO),
        rate: first_decimal(object, RATE_KEYS),
        dimensions,
    })
}

pub fn line_items_from_legacy(raw: &str, mappings: &[TermMapping]) -> Vec<NewCalculationLineItem> {
    parse_legacy_breakdown(raw)
        .iter()
        .filter_map(|entry| line_item_from_legacy(entry, mappings))
        .collect()
}

/// Line item for a freshly computed breakdown entry.
pub fn line_item_from_breakdown(item: &BreakdownItem) -> NewCalculationLineItem {
    let dimensions = item
        .dimensions
        .iter()
        .filter_map(|(k, v)| Some((dimension_key_for_field(k)?, v.clone())))
        .collect();
    NewCalculationLineItem {
        transaction_id: Some(item.transaction_id.clone()),
        transaction_date: Some(item.transaction_date),
        vendor_name: item.vendor_name.clone(),
        item_name: Some(item.product_name.clone()),
        category: item.category.clone(),
        territory: item.territory.clone(),
        period: Some(period_key(item.transaction_date)),
        rule_id: Some(item.rule.rule_id.clone()),
        rule_name: Some(item.rule.name.clone()),
        quantity: item.quantity,
        sales_amount: item.gross_amount,
        fee_amount: item.computed_fee,
        rate: Some(item.effective_rate),
        dimensions,
    }
}
