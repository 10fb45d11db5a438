use super::*;
use crate::blueprints::Blueprint;
use crate::errors::{Error, FeeCalculationError};
use crate::rules::{CalculationRule, DimensionType, RuleType};
use crate::settings::CalculationApproach;
use crate::test_support::{blueprint, dimension, percentage_rule, rule, sale};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn run(
    approach: CalculationApproach,
    rules: &[CalculationRule],
    blueprints: &[Blueprint],
    transactions: &[SaleTransaction],
) -> crate::errors::Result<CalculationResult> {
    FeeCalculator::default().run(CalculationInput {
        contract_id: "contract-1",
        approach,
        rules,
        blueprints,
        transactions,
    })
}

fn floor_rule(id: &str, amount: Decimal) -> CalculationRule {
    let mut r = rule(id, RuleType::MinimumGuarantee);
    r.minimum_guarantee = Some(amount);
    r
}

#[test]
fn minimum_guarantee_raises_final_fee() {
    let rules = vec![
        percentage_rule("pct", dec!(8), &[]),
        floor_rule("floor", dec!(10000)),
    ];
    let transactions = vec![sale("tx-1", "Maple", dec!(100), dec!(100000))];

    let result = run(CalculationApproach::Manual, &rules, &[], &transactions).unwrap();
    assert_eq!(result.total_fee, dec!(8000));
    assert_eq!(result.minimum_guarantee, Some(dec!(10000)));
    assert_eq!(result.final_fee, dec!(10000));
    assert!(result.minimum_guarantee_applied);
    assert_eq!(result.rules_applied.len(), 1);
    assert!(result.rules_applied.contains("Rule pct"));
}

#[test]
fn highest_minimum_guarantee_wins_and_is_ignored_when_exceeded() {
    let rules = vec![
        percentage_rule("pct", dec!(8), &[]),
        floor_rule("low", dec!(1000)),
        floor_rule("high", dec!(5000)),
    ];
    let transactions = vec![sale("tx-1", "Maple", dec!(100), dec!(100000))];

    let result = run(CalculationApproach::Manual, &rules, &[], &transactions).unwrap();
    assert_eq!(result.minimum_guarantee, Some(dec!(5000)));
    assert_eq!(result.final_fee, dec!(8000));
    assert!(!result.minimum_guarantee_applied);
}

#[test]
fn fee_above_sale_amount_aborts_the_run() {
    let rules = vec![percentage_rule("broken", dec!(150), &[])];
    let transactions = vec![
        sale("tx-1", "Maple", dec!(1), dec!(100)),
        sale("tx-2", "Oak", dec!(1), dec!(100)),
    ];

    match run(CalculationApproach::Manual, &rules, &[], &transactions) {
        Err(Error::Calculation(FeeCalculationError::FeeExceedsSaleAmount {
            rule_name,
            transaction_id,
            computed_fee,
            gross_amount,
            ..
        })) => {
            assert_eq!(rule_name, "Rule broken");
            assert_eq!(transaction_id, "tx-1");
            assert_eq!(computed_fee, dec!(150));
            assert_eq!(gross_amount, dec!(100));
        }
        other => panic!("expected FeeExceedsSaleAmount, got {:?}", other),
    }
}

#[test]
fn one_percent_rounding_tolerance_is_allowed() {
    let rules = vec![percentage_rule("edge", dec!(101), &[])];
    let transactions = vec![sale("tx-1", "Maple", dec!(1), dec!(100))];

    let result = run(CalculationApproach::Manual, &rules, &[], &transactions).unwrap();
    assert_eq!(result.total_fee, dec!(101));
}

#[test]
fn unmatched_transactions_are_ledgered_not_fatal() {
    let rules = vec![percentage_rule("maple", dec!(5), &["Maple"])];
    let transactions = vec![
        sale("tx-1", "Maple", dec!(1), dec!(100)),
        sale("tx-2", "Granite Boulder", dec!(1), dec!(400)),
    ];

    let result = run(CalculationApproach::Manual, &rules, &[], &transactions).unwrap();
    assert_eq!(result.breakdown.len(), 1);
    assert_eq!(result.total_fee, dec!(5));
    assert_eq!(result.unmatched.len(), 1);
    assert_eq!(result.unmatched[0].transaction_id, "tx-2");
    assert_eq!(result.unmatched[0].reason, "No matching rule");
    assert_eq!(result.transactions_processed, 2);
}

#[test]
fn approach_gates_blueprints_and_raw_rules() {
    let raw = percentage_rule("raw", dec!(5), &[]);
    let bp = blueprint(
        "bp-1",
        percentage_rule("mapped", dec!(10), &["Maple"]),
        vec![dimension(DimensionType::Product, "Maple", Some("ItemName"))],
    );
    let rules = vec![raw];
    let blueprints = vec![bp];
    let transactions = vec![
        sale("tx-1", "Maple", dec!(1), dec!(100)),
        sale("tx-2", "Oak", dec!(1), dec!(100)),
    ];

    let manual = run(CalculationApproach::Manual, &rules, &blueprints, &transactions).unwrap();
    assert_eq!(manual.total_fee, dec!(10));
    assert!(manual.breakdown.iter().all(|b| b.blueprint_id.is_none()));

    let erp = run(CalculationApproach::ErpRules, &rules, &blueprints, &transactions).unwrap();
    assert_eq!(erp.total_fee, dec!(10));
    assert_eq!(erp.breakdown[0].blueprint_id.as_deref(), Some("bp-1"));
    assert_eq!(erp.unmatched.len(), 1);
    assert_eq!(erp.unmatched[0].reason, "No matching blueprint");

    let hybrid = run(CalculationApproach::Hybrid, &rules, &blueprints, &transactions).unwrap();
    assert_eq!(hybrid.total_fee, dec!(15));
    assert_eq!(hybrid.breakdown[0].blueprint_id.as_deref(), Some("bp-1"));
    assert_eq!(hybrid.breakdown[1].blueprint_id, None);
    assert!(hybrid.unmatched.is_empty());
    assert_eq!(
        hybrid.rules_applied.iter().cloned().collect::<Vec<_>>(),
        vec!["Rule mapped", "Rule raw"]
    );
}

#[test]
fn breakdown_keeps_transaction_order_and_match_decision() {
    let rules = vec![
        percentage_rule("maple", dec!(5), &["Maple"]),
        percentage_rule("any", dec!(2), &[]),
    ];
    let transactions = vec![
        sale("tx-1", "Oak", dec!(1), dec!(100)),
        sale("tx-2", "Maple", dec!(1), dec!(100)),
    ];

    let result = run(CalculationApproach::Manual, &rules, &[], &transactions).unwrap();
    let ids: Vec<&str> = result
        .breakdown
        .iter()
        .map(|b| b.transaction_id.as_str())
        .collect();
    assert_eq!(ids, vec!["tx-1", "tx-2"]);
    let decision = result.breakdown[1].match_decision.as_ref().unwrap();
    assert_eq!(decision.rule_id, "maple");
    assert_eq!(decision.candidate_count, 2);
}

fn cents(value: u64) -> Decimal {
    Decimal::new(value as i64, 2)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fee_never_exceeds_sale_amount_for_valid_rates(
        rate_bp in 0u64..=10_000,
        gross_cents in 1u64..100_000_000,
        quantity in 1u64..10_000,
    ) {
        let rules = vec![percentage_rule("pct", cents(rate_bp), &[])];
        let transactions = vec![sale("tx-1", "Maple", Decimal::from(quantity), cents(gross_cents))];

        let result = run(CalculationApproach::Manual, &rules, &[], &transactions).unwrap();
        for item in &result.breakdown {
            prop_assert!(item.computed_fee <= item.gross_amount * dec!(1.01));
        }
    }

    #[test]
    fn rates_above_tolerance_always_fail(
        rate_bp in 10_200u64..50_000,
        gross_cents in 100u64..100_000_000,
    ) {
        let rules = vec![percentage_rule("pct", cents(rate_bp), &[])];
        let transactions = vec![sale("tx-1", "Maple", dec!(1), cents(gross_cents))];

        let result = run(CalculationApproach::Manual, &rules, &[], &transactions);
        let is_fee_error = matches!(
            result,
            Err(Error::Calculation(FeeCalculationError::FeeExceedsSaleAmount { .. }))
        );
        prop_assert!(is_fee_error);
    }

    #[test]
    fn identical_inputs_give_identical_results(
        amounts in prop::collection::vec((1u64..1_000, 1u64..1_000_000), 1..20),
    ) {
        let rules = vec![
            percentage_rule("maple", dec!(5), &["Maple"]),
            percentage_rule("oak", dec!(4), &["Oak"]),
            percentage_rule("any", dec!(2), &[]),
            floor_rule("floor", dec!(500)),
        ];
        let products = ["Maple", "Red Oak", "Birch"];
        let transactions: Vec<SaleTransaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, (quantity, gross))| {
                sale(
                    &format!("tx-{}", i),
                    products[i % products.len()],
                    Decimal::from(*quantity),
                    cents(*gross),
                )
            })
            .collect();

        let first = run(CalculationApproach::Hybrid, &rules, &[], &transactions).unwrap();
        let second = run(CalculationApproach::Hybrid, &rules, &[], &transactions).unwrap();
        prop_assert_eq!(first, second);
    }
}
