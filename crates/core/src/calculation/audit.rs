//! Turns a strategy outcome into a self-contained audit record.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::strategy::{money, percent, round_currency};
use super::{
    BreakdownItem, CalculationStep, ConditionCheck, ContainerSizeSource, RuleSnapshot,
    SaleTransaction, StrategyDetail, StrategyOutcome,
};
use crate::constants::RATE_DISPLAY_PRECISION;
use crate::rules::CalculationRule;

#[derive(Default)]
struct StepList {
    steps: Vec<CalculationStep>,
}

impl StepList {
    fn push(
        &mut self,
        label: &str,
        description: impl Into<String>,
        formula: Option<String>,
        value: Option<Decimal>,
    ) {
        self.steps.push(CalculationStep {
            step_number: self.steps.len() as u32 + 1,
            label: label.to_string(),
            description: description.into(),
            formula,
            value,
        });
    }
}

pub struct BreakdownBuilder;

impl BreakdownBuilder {
    pub fn build(
        transaction: &SaleTransaction,
        rule: &CalculationRule,
        outcome: &StrategyOutcome,
        mut condition_checks: Vec<ConditionCheck>,
    ) -> BreakdownItem {
        let mut steps = StepList::default();
        strategy_steps(&mut steps, transaction, outcome, &mut condition_checks);
        adjustment_steps(&mut steps, outcome);
        steps.push(
            "Total fee",
            outcome.explanation.clone(),
            None,
            Some(outcome.computed_fee),
        );

        BreakdownItem {
            transaction_id: transaction.id.clone(),
            transaction_date: transaction.transaction_date,
            product_name: transaction.product_name.clone(),
            category: transaction.category.clone(),
            territory: transaction.territory.clone(),
            vendor_name: transaction.vendor_name.clone(),
            container_size: transaction.container_size.clone(),
            quantity: transaction.quantity,
            gross_amount: transaction.gross_amount,
            dimensions: transaction.dimensions.clone(),
            rule: RuleSnapshot::from(rule),
            blueprint_id: None,
            match_decision: None,
            calculation_type: outcome.strategy,
            steps: steps.steps,
            condition_checks,
            base_rate: outcome.base_rate,
            effective_rate: outcome.effective_rate.round_dp(RATE_DISPLAY_PRECISION),
            season: outcome.season,
            seasonal_multiplier: outcome.seasonal_multiplier,
            territory_multiplier: outcome.territory_multiplier,
            volume_discount_applied: outcome.volume_discount_applied,
            computed_fee: outcome.computed_fee,
            explanation: outcome.explanation.clone(),
            flag: outcome.flag.clone(),
        }
    }
}

fn strategy_steps(
    steps: &mut StepList,
    transaction: &SaleTransaction,
    outcome: &StrategyOutcome,
    checks: &mut Vec<ConditionCheck>,
) {
    let quantity = transaction.quantity.normalize();
    match &outcome.detail {
        StrategyDetail::Formula { debug_log, .. } => {
            let description = if debug_log.is_empty() {
                "Evaluated contract formula".to_string()
            } else {
                debug_log.join("; ")
            };
            steps.push(
                "Formula evaluation",
                description,
                None,
                Some(outcome.base_amount),
            );
            steps.push(
                "Effective rate",
                format!("{} / {} units", money(outcome.computed_fee), quantity),
                Some("fee / quantity".to_string()),
                Some(outcome.effective_rate.round_dp(RATE_DISPLAY_PRECISION)),
            );
        }
        StrategyDetail::NoContainerRates => {
            steps.push(
                "Container size lookup",
                "No valid container-size rates configured",
                None,
                Some(Decimal::ZERO),
            );
        }
        StrategyDetail::ContainerSize {
            rate_entry,
            source,
            transaction_size,
        } => {
            let size = transaction_size.as_deref().unwrap_or("unknown");
            let lookup = match source {
                ContainerSizeSource::Declared => {
                    format!("Declared size {} matched rate entry {}", size, rate_entry.size)
                }
                ContainerSizeSource::InferredFromProduct => format!(
                    "Size {} inferred from product '{}' matched rate entry {}",
                    size, transaction.product_name, rate_entry.size
                ),
                ContainerSizeSource::FirstEntryFallback => format!(
                    "Size {} not in rate table; using first entry {}",
                    size, rate_entry.size
                ),
            };
            steps.push("Container size lookup", lookup, None, None);
            steps.push(
                "Rate lookup",
                format!("Base rate {} per unit", money(rate_entry.base_rate)),
                None,
                Some(rate_entry.base_rate),
            );

            let rate_used = outcome.base_amount_rate(transaction.quantity);
            match (rate_entry.volume_threshold, rate_entry.discounted_rate) {
                (Some(threshold), Some(discounted)) => {
                    let qualifies = outcome.volume_discount_applied;
                    steps.push(
                        "Volume discount check",
                        format!(
                            "{} units {} threshold of {}; rate {}",
                            quantity,
                            if qualifies { "meets" } else { "is below" },
                            threshold.normalize(),
                            if qualifies {
                                format!("discounted to {}", money(discounted))
                            } else {
                                format!("stays at {}", money(rate_entry.base_rate))
                            }
                        ),
                        Some("quantity >= volumeThreshold".to_string()),
                        Some(rate_used),
                    );
                    checks.push(ConditionCheck {
                        condition: "Volume threshold".to_string(),
                        expected: format!(">= {}", threshold.normalize()),
                        actual: quantity.to_string(),
                        passed: qualifies,
                    });
                }
                _ => steps.push(
                    "Volume discount check",
                    "No volume discount configured for this size",
                    None,
                    Some(rate_used),
                ),
            }
            steps.push(
                "Multiply",
                format!("{} x {} units", money(rate_used), quantity),
                Some("rate x quantity".to_string()),
                Some(round_currency(outcome.base_amount)),
            );
        }
        StrategyDetail::VolumeTier { tier } => {
            let description = match tier {
                Some(tier) => format!("{} units fall in tier {}", quantity, tier.label()),
                None => format!("{} units fall outside every tier; using base rate", quantity),
            };
            steps.push("Tier match", description, None, None);
            rate_steps(steps, transaction, outcome);
        }
        StrategyDetail::Percentage => rate_steps(steps, transaction, outcome),
    }
}

fn rate_steps(steps: &mut StepList, transaction: &SaleTransaction, outcome: &StrategyOutcome) {
    steps.push(
        "Rate",
        format!(
            "{} / 100 = {}",
            percent(outcome.base_rate),
            (outcome.base_rate / dec!(100)).normalize()
        ),
        Some("rate / 100".to_string()),
        Some(outcome.base_rate / dec!(100)),
    );
    steps.push(
        "Multiply",
        format!(
            "{} x {}",
            money(transaction.gross_amount),
            percent(outcome.base_rate)
        ),
        Some("grossAmount x rate / 100".to_string()),
        Some(round_currency(outcome.base_amount)),
    );
}

fn adjustment_steps(steps: &mut StepList, outcome: &StrategyOutcome) {
    let mut running = outcome.base_amount;
    if outcome.seasonal_multiplier != Decimal::ONE {
        running *= outcome.seasonal_multiplier;
        steps.push(
            "Seasonal adjustment",
            format!(
                "{} season multiplier x{}",
                outcome.season,
                outcome.seasonal_multiplier.normalize()
            ),
            Some("amount x seasonalMultiplier".to_string()),
            Some(round_currency(running)),
        );
    }
    if outcome.territory_multiplier != Decimal::ONE {
        running *= outcome.territory_multiplier;
        steps.push(
            "Territory adjustment",
            format!(
                "Territory premium x{}",
                outcome.territory_multiplier.normalize()
            ),
            Some("amount x territoryMultiplier".to_string()),
            Some(round_currency(running)),
        );
    }
}

impl StrategyOutcome {
    /// Per-unit rate actually charged before multipliers.
    fn base_amount_rate(&self, quantity: Decimal) -> Decimal {
        if quantity.is_zero() {
            self.base_rate
        } else {
            self.base_amount / quantity
        }
    }
}
