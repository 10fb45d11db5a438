//! The per-run orchestration of matching, pricing and auditing. Pure: every
//! input, including the calculation approach, is passed in.

use log::{info, warn};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

use super::audit::BreakdownBuilder;
use super::matcher::{find_matching_blueprint, find_matching_rule};
use super::strategy::FeeStrategyExecutor;
use super::{
    CalculationResult, ConditionCheck, MatchDecision, SaleTransaction, UnmatchedTransaction,
};
use crate::blueprints::Blueprint;
use crate::constants::FEE_TOLERANCE_FACTOR;
use crate::errors::{FeeCalculationError, Result};
use crate::rules::{CalculationRule, RuleType};
use crate::settings::CalculationApproach;

/// Everything one run needs, already loaded.
#[derive(Debug, Clone, Copy)]
pub struct CalculationInput<'a> {
    pub contract_id: &'a str,
    pub approach: CalculationApproach,
    pub rules: &'a [CalculationRule],
    pub blueprints: &'a [Blueprint],
    pub transactions: &'a [SaleTransaction],
}

#[derive(Clone, Default)]
pub struct FeeCalculator {
    executor: FeeStrategyExecutor,
}

struct Selection<'a> {
    rule: &'a CalculationRule,
    decision: MatchDecision,
    checks: Vec<ConditionCheck>,
}

impl FeeCalculator {
    pub fn new(executor: FeeStrategyExecutor) -> Self {
        Self { executor }
    }

    pub fn run(&self, input: CalculationInput<'_>) -> Result<CalculationResult> {
        let mut total_fee = Decimal::ZERO;
        let mut breakdown = Vec::with_capacity(input.transactions.len());
        let mut rules_applied = BTreeSet::new();
        let mut unmatched = Vec::new();

        for transaction in input.transactions {
            let Some(selection) = select(&input, transaction) else {
                let reason = unmatched_reason(input.approach);
                warn!(
                    "Transaction {} ({}) skipped for contract {}: {}",
                    transaction.id, transaction.product_name, input.contract_id, reason
                );
                unmatched.push(UnmatchedTransaction {
                    transaction_id: transaction.id.clone(),
                    product_name: transaction.product_name.clone(),
                    gross_amount: transaction.gross_amount,
                    reason,
                });
                continue;
            };

            let outcome = self.executor.calculate(transaction, selection.rule)?;
            check_fee_within_sale_amount(
                selection.rule,
                transaction,
                outcome.computed_fee,
            )?;

            total_fee += outcome.computed_fee;
            rules_applied.insert(selection.rule.name.clone());
            breakdown.push(
                BreakdownBuilder::build(transaction, selection.rule, &outcome, selection.checks)
                    .with_match(selection.decision),
            );
        }

        let minimum_guarantee = minimum_guarantee(input.rules);
        let (final_fee, minimum_guarantee_applied) = match minimum_guarantee {
            Some(floor) if floor > total_fee => {
                info!(
                    "Minimum guarantee {} applied to contract {} (computed fees {})",
                    floor, input.contract_id, total_fee
                );
                (floor, true)
            }
            _ => (total_fee, false),
        };

        info!(
            "Calculated fees for contract {} ({}): {} of {} transactions priced, total {}, final {}",
            input.contract_id,
            input.approach,
            breakdown.len(),
            input.transactions.len(),
            total_fee,
            final_fee
        );

        Ok(CalculationResult {
            contract_id: input.contract_id.to_string(),
            approach: input.approach,
            total_fee,
            minimum_guarantee,
            minimum_guarantee_applied,
            final_fee,
            breakdown,
            rules_applied,
            unmatched,
            transactions_processed: input.transactions.len(),
        })
    }
}

fn select<'a>(input: &CalculationInput<'a>, transaction: &SaleTransaction) -> Option<Selection<'a>> {
    if input.approach.uses_blueprints() {
        if let Some(found) = find_matching_blueprint(transaction, input.blueprints) {
            return Some(Selection {
                rule: &found.blueprint.calculation_logic,
                decision: found.decision,
                checks: found.condition_checks,
            });
        }
    }
    if input.approach.allows_rule_fallback() {
        if let Some(found) = find_matching_rule(transaction, input.rules) {
            return Some(Selection {
                rule: found.rule,
                decision: found.decision,
                checks: found.condition_checks,
            });
        }
    }
    None
}

fn unmatched_reason(approach: CalculationApproach) -> String {
    match approach {
        CalculationApproach::Manual => "No matching rule".to_string(),
        CalculationApproach::Hybrid => "No matching blueprint or rule".to_string(),
        CalculationApproach::ErpRules | CalculationApproach::ErpMappingRules => {
            "No matching blueprint".to_string()
        }
    }
}

/// A fee may exceed its sale amount by at most 1%. Compared on magnitudes so
/// returns (negative amounts) follow the same bound.
pub fn check_fee_within_sale_amount(
    rule: &CalculationRule,
    transaction: &SaleTransaction,
    computed_fee: Decimal,
) -> Result<()> {
    if computed_fee.abs() > transaction.gross_amount.abs() * FEE_TOLERANCE_FACTOR {
        return Err(FeeCalculationError::FeeExceedsSaleAmount {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            transaction_id: transaction.id.clone(),
            computed_fee,
            gross_amount: transaction.gross_amount,
        }
        .into());
    }
    Ok(())
}

/// Highest floor among the contract's active minimum-guarantee rules.
pub fn minimum_guarantee(rules: &[CalculationRule]) -> Option<Decimal> {
    rules
        .iter()
        .filter(|r| r.is_active && r.rule_type == RuleType::MinimumGuarantee)
        .filter_map(|r| r.minimum_guarantee.or(r.base_rate))
        .max()
}
