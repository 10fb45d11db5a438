use super::*;
use crate::calculation::{CalculationInput, FeeCalculator};
use crate::settings::CalculationApproach;
use crate::test_support::{confirmed_mapping, percentage_rule, sale};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn legacy_entries() -> Value {
    json!([
        {
            "transactionId": "tx-1",
            "transactionDate": "2024-03-05T00:00:00Z",
            "productName": "Japanese Maple",
            "saleAmount": "1,000.00",
            "calculatedRoyalty": 50,
            "ruleName": "Maple 5%",
            "SupplierName": "Acme Corp"
        },
        {
            "transactionId": "tx-2",
            "itemName": "Oak",
            "netAmount": 200,
            "royaltyAmount": "8.00",
            "dimensions": {"Ship To": "Portland", "skip": null}
        },
        "not an object"
    ])
}

#[test]
fn reads_plain_and_double_encoded_payloads() {
    let plain = legacy_entries().to_string();
    assert_eq!(parse_legacy_breakdown(&plain).len(), 3);

    let double = Value::String(plain.clone()).to_string();
    assert_eq!(parse_legacy_breakdown(&double).len(), 3);

    let wrapped = json!({"breakdown": legacy_entries()}).to_string();
    assert_eq!(parse_legacy_breakdown(&wrapped).len(), 3);
}

#[test]
fn malformed_payloads_yield_nothing() {
    assert!(parse_legacy_breakdown("{not json").is_empty());
    assert!(parse_legacy_breakdown("\"[broken\"").is_empty());
    assert!(parse_legacy_breakdown("42").is_empty());
    assert!(parse_legacy_breakdown("{\"total\": 5}").is_empty());
}

#[test]
fn field_synonyms_and_mapped_fields_are_resolved() {
    let mappings = vec![confirmed_mapping("m-1", "Acme Corp", "SupplierName")];
    let items = line_items_from_legacy(&legacy_entries().to_string(), &mappings);
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first.sales_amount, dec!(1000));
    assert_eq!(first.fee_amount, dec!(50));
    assert_eq!(first.rule_name.as_deref(), Some("Maple 5%"));
    assert_eq!(first.transaction_date, NaiveDate::from_ymd_opt(2024, 3, 5));
    assert_eq!(first.period.as_deref(), Some("2024-03"));
    assert_eq!(
        first.dimensions.get("SupplierName").map(String::as_str),
        Some("Acme Corp")
    );

    let second = &items[1];
    assert_eq!(second.item_name.as_deref(), Some("Oak"));
    assert_eq!(second.sales_amount, dec!(200));
    assert_eq!(second.fee_amount, dec!(8));
    assert_eq!(second.period, None);
    assert_eq!(
        second.dimensions.get("Ship_To").map(String::as_str),
        Some("Portland")
    );
    assert!(!second.dimensions.contains_key("skip"));
}

#[test]
fn current_breakdown_format_is_readable_as_legacy() {
    let rules = vec![percentage_rule("maple", dec!(5), &["Maple"])];
    let mut tx = sale("tx-1", "Maple", dec!(3), dec!(300));
    tx.vendor_name = Some("Green Farms".to_string());
    let result = FeeCalculator::default()
        .run(CalculationInput {
            contract_id: "contract-1",
            approach: CalculationApproach::Manual,
            rules: &rules,
            blueprints: &[],
            transactions: &[tx],
        })
        .unwrap();

    let payload = serde_json::to_string(&result.breakdown).unwrap();
    let items = line_items_from_legacy(&payload, &[]);

    assert_eq!(items, vec![line_item_from_breakdown(&result.breakdown[0])]);
}
