use super::*;
use crate::rules::RuleType;
use crate::test_support::{percentage_rule, rule, sale, with_tiers};
use rust_decimal_macros::dec;
use serde_json::json;

fn labels(item: &BreakdownItem) -> Vec<&str> {
    item.steps.iter().map(|s| s.label.as_str()).collect()
}

#[test]
fn container_breakdown_lists_lookup_discount_and_multiply() {
    let r = with_tiers(
        rule("containers", RuleType::ContainerSizeTiered),
        vec![json!({"size": "5gal", "baseRate": 5.00, "volumeThreshold": 100, "discountedRate": 4.00})],
    );
    let mut tx = sale("tx-1", "Boxwood", dec!(150), dec!(1500));
    tx.container_size = Some("5gal".to_string());

    let outcome = FeeStrategyExecutor::default().calculate(&tx, &r).unwrap();
    let item = BreakdownBuilder::build(&tx, &r, &outcome, Vec::new());

    assert_eq!(
        labels(&item),
        vec![
            "Container size lookup",
            "Rate lookup",
            "Volume discount check",
            "Multiply",
            "Total fee"
        ]
    );
    let numbers: Vec<u32> = item.steps.iter().map(|s| s.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(item.steps[2].value, Some(dec!(4)));
    assert_eq!(item.computed_fee, dec!(600));

    let threshold = item
        .condition_checks
        .iter()
        .find(|c| c.condition == "Volume threshold")
        .unwrap();
    assert!(threshold.passed);
}

#[test]
fn adjustment_steps_only_appear_for_non_unit_multipliers() {
    let mut r = percentage_rule("pct", dec!(10), &["Maple"]);
    let tx = sale("tx-1", "Maple", dec!(1), dec!(100));

    let outcome = FeeStrategyExecutor::default().calculate(&tx, &r).unwrap();
    let item = BreakdownBuilder::build(&tx, &r, &outcome, Vec::new());
    assert_eq!(labels(&item), vec!["Rate", "Multiply", "Total fee"]);

    r.seasonal_adjustments.insert("Summer".to_string(), dec!(1.1));
    let outcome = FeeStrategyExecutor::default().calculate(&tx, &r).unwrap();
    let item = BreakdownBuilder::build(&tx, &r, &outcome, Vec::new());
    assert_eq!(
        labels(&item),
        vec!["Rate", "Multiply", "Seasonal adjustment", "Total fee"]
    );
    assert_eq!(item.steps[2].value, Some(dec!(11.00)));
    assert_eq!(item.steps.last().unwrap().value, Some(dec!(11.00)));
}

#[test]
fn tiered_breakdown_starts_with_tier_match() {
    let r = with_tiers(
        rule("tiers", RuleType::Tiered),
        vec![json!({"min": 0, "max": null, "rate": 4})],
    );
    let tx = sale("tx-1", "Maple", dec!(20), dec!(500));

    let outcome = FeeStrategyExecutor::default().calculate(&tx, &r).unwrap();
    let item = BreakdownBuilder::build(&tx, &r, &outcome, Vec::new());
    assert_eq!(labels(&item), vec!["Tier match", "Rate", "Multiply", "Total fee"]);
    assert_eq!(item.steps[0].description, "20 units fall in tier 0+");
}

#[test]
fn breakdown_snapshots_the_rule() {
    let mut r = percentage_rule("pct", dec!(7.5), &["Maple", "Oak"]);
    r.source_text = Some("7.5% of net sales of Maple and Oak".to_string());
    r.confidence = Some(0.92);
    r.is_ai_extracted = true;
    let tx = sale("tx-1", "Maple", dec!(1), dec!(100));

    let outcome = FeeStrategyExecutor::default().calculate(&tx, &r).unwrap();
    let item = BreakdownBuilder::build(&tx, &r, &outcome, Vec::new());

    assert_eq!(item.rule.name, "Rule pct");
    assert_eq!(item.rule.base_rate, Some(dec!(7.5)));
    assert_eq!(item.rule.product_categories, vec!["Maple", "Oak"]);
    assert_eq!(item.rule.source_text, r.source_text);
    assert!(item.rule.is_ai_extracted);
    assert_eq!(item.calculation_type, CalculationStrategy::Percentage);
    assert_eq!(item.computed_fee, dec!(7.50));
}
