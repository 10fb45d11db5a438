//! Property-based integration tests for whole calculation runs.
//!
//! These tests drive `FeeCalculator` through the public API and check the
//! bookkeeping that must hold for any mix of rules and transactions.

use chrono::NaiveDate;
use proptest::prelude::*;
use royalty_core::calculation::{CalculationInput, FeeCalculator, SaleTransaction};
use royalty_core::rules::{CalculationRule, RuleType};
use royalty_core::settings::CalculationApproach;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

// =============================================================================
// Generators
// =============================================================================

fn base_rule(id: &str, rule_type: RuleType) -> CalculationRule {
    CalculationRule {
        id: id.to_string(),
        contract_id: "contract-1".to_string(),
        name: format!("Rule {}", id),
        rule_type,
        base_rate: None,
        tiers: Vec::new(),
        product_categories: Vec::new(),
        territories: Vec::new(),
        seasonal_adjustments: BTreeMap::new(),
        territory_premiums: BTreeMap::new(),
        formula_definition: None,
        minimum_guarantee: None,
        priority: None,
        is_active: true,
        source_text: None,
        confidence: None,
        is_ai_extracted: false,
        created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    }
}

/// A percentage rule restricted to one product category.
fn arb_category_rule() -> impl Strategy<Value = CalculationRule> {
    (
        prop_oneof![Just("Maple"), Just("Oak"), Just("Birch")],
        0u64..=2_000, // rate in hundredths of a percent
    )
        .prop_map(|(category, rate_bp)| {
            let mut rule = base_rule(&category.to_lowercase(), RuleType::Percentage);
            rule.base_rate = Some(Decimal::new(rate_bp as i64, 2));
            rule.product_categories = vec![category.to_string()];
            rule
        })
}

fn arb_transaction() -> impl Strategy<Value = SaleTransaction> {
    (
        prop_oneof![
            Just("Maple Syrup"),
            Just("Oak Table"),
            Just("Birch Chair"),
            Just("Pine Shelf"),
        ],
        1u64..1_000,         // quantity
        1u64..10_000_000,    // gross amount in cents
        1u32..=12,           // month
    )
        .prop_map(|(product, quantity, gross_cents, month)| SaleTransaction {
            id: format!("tx-{}-{}", product.len(), gross_cents),
            product_name: product.to_string(),
            category: None,
            territory: None,
            vendor_name: None,
            quantity: Decimal::from(quantity),
            gross_amount: Decimal::new(gross_cents as i64, 2),
            transaction_date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            container_size: None,
            dimensions: BTreeMap::new(),
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every transaction ends up either priced or unmatched, never both.
    #[test]
    fn prop_every_transaction_is_accounted_for(
        rules in prop::collection::vec(arb_category_rule(), 0..4),
        transactions in prop::collection::vec(arb_transaction(), 0..20),
    ) {
        let result = FeeCalculator::default()
            .run(CalculationInput {
                contract_id: "contract-1",
                approach: CalculationApproach::Manual,
                rules: &rules,
                blueprints: &[],
                transactions: &transactions,
            })
            .unwrap();

        prop_assert_eq!(result.transactions_processed, transactions.len());
        prop_assert_eq!(
            result.breakdown.len() + result.unmatched.len(),
            transactions.len()
        );
        for unmatched in &result.unmatched {
            prop_assert_eq!(unmatched.reason.as_str(), "No matching rule");
        }
    }

    /// The total is the sum of the audited fees and the floor only ever raises it.
    #[test]
    fn prop_final_fee_is_total_raised_to_floor(
        rules in prop::collection::vec(arb_category_rule(), 1..4),
        transactions in prop::collection::vec(arb_transaction(), 1..20),
        floor_cents in proptest::option::of(0u64..50_000_000),
    ) {
        let mut rules = rules;
        if let Some(cents) = floor_cents {
            let mut floor = base_rule("floor", RuleType::MinimumGuarantee);
            floor.minimum_guarantee = Some(Decimal::new(cents as i64, 2));
            rules.push(floor);
        }

        let result = FeeCalculator::default()
            .run(CalculationInput {
                contract_id: "contract-1",
                approach: CalculationApproach::Manual,
                rules: &rules,
                blueprints: &[],
                transactions: &transactions,
            })
            .unwrap();

        let audited: Decimal = result.breakdown.iter().map(|item| item.computed_fee).sum();
        prop_assert_eq!(result.total_fee, audited);
        prop_assert!(result.final_fee >= result.total_fee);
        match result.minimum_guarantee {
            Some(floor) => {
                prop_assert_eq!(result.final_fee, floor.max(result.total_fee));
                prop_assert_eq!(result.minimum_guarantee_applied, floor > result.total_fee);
            }
            None => {
                prop_assert_eq!(result.final_fee, result.total_fee);
                prop_assert!(!result.minimum_guarantee_applied);
            }
        }
        prop_assert!(!result.rules_applied.contains("Rule floor"));
    }
}
