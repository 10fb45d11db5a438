//! Fee strategies: formula, container size, volume tiers and flat percentage.

use log::{debug, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::formula::{build_formula_context, FormulaEvaluatorTrait};
use super::{
    CalculationStrategy, ContainerSizeSource, SaleTransaction, StrategyDetail, StrategyOutcome,
};
use crate::constants::CURRENCY_PRECISION;
use crate::errors::{FeeCalculationError, Result};
use crate::rules::{CalculationRule, ContainerSizeRate, RuleType};
use crate::utils::{terms_overlap, tokenize, Season};

pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn money(value: Decimal) -> String {
    format!("${:.2}", round_currency(value))
}

pub(crate) fn percent(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}

/// Runs the one strategy that applies to a rule.
///
/// Strategies are checked in order: formula, container size, volume tiers,
/// then flat percentage. Per-unit size entries select container-size pricing
/// for any rule not explicitly typed as percentage or tiered. Rates are percentages except for formulas and
/// container sizes, which price per unit.
#[derive(Clone, Default)]
pub struct FeeStrategyExecutor {
    formula_evaluator: Option<Arc<dyn FormulaEvaluatorTrait>>,
}

impl FeeStrategyExecutor {
    pub fn new(formula_evaluator: Option<Arc<dyn FormulaEvaluatorTrait>>) -> Self {
        Self { formula_evaluator }
    }

    pub fn select_strategy(rule: &CalculationRule) -> CalculationStrategy {
        if rule.has_formula() {
            CalculationStrategy::Formula
        } else if rule.rule_type == RuleType::ContainerSizeTiered
            || (!matches!(rule.rule_type, RuleType::Percentage | RuleType::Tiered)
                && !rule.container_size_rates().is_empty())
        {
            CalculationStrategy::ContainerSize
        } else if rule.rule_type == RuleType::Tiered
            || (rule.rule_type != RuleType::Percentage && !rule.volume_tiers().is_empty())
        {
            CalculationStrategy::VolumeTier
        } else {
            CalculationStrategy::Percentage
        }
    }

    pub fn calculate(
        &self,
        transaction: &SaleTransaction,
        rule: &CalculationRule,
    ) -> Result<StrategyOutcome> {
        let season = Season::for_date(transaction.transaction_date);
        match Self::select_strategy(rule) {
            CalculationStrategy::Formula => self.formula(transaction, rule, season),
            CalculationStrategy::ContainerSize => Ok(container_size(transaction, rule, season)),
            CalculationStrategy::VolumeTier => Ok(volume_tier(transaction, rule, season)),
            CalculationStrategy::Percentage => Ok(flat_percentage(transaction, rule, season)),
        }
    }

    fn formula(
        &self,
        transaction: &SaleTransaction,
        rule: &CalculationRule,
        season: Season,
    ) -> Result<StrategyOutcome> {
        let evaluator = self.formula_evaluator.as_ref().ok_or_else(|| {
            FeeCalculationError::FormulaEvaluatorMissing {
                rule_name: rule.name.clone(),
            }
        })?;
        let formula = rule
            .formula_definition
            .as_ref()
            .ok_or_else(|| FeeCalculationError::FormulaEvaluation {
                rule_name: rule.name.clone(),
                message: "formula definition is empty".to_string(),
            })?;

        let context = build_formula_context(transaction, season);
        let evaluation = evaluator.evaluate(formula, &context).map_err(|e| {
            FeeCalculationError::FormulaEvaluation {
                rule_name: rule.name.clone(),
                message: e.to_string(),
            }
        })?;
        if evaluation.value.is_sign_negative() && !evaluation.value.is_zero() {
            return Err(FeeCalculationError::FormulaEvaluation {
                rule_name: rule.name.clone(),
                message: format!("formula produced a negative fee ({})", evaluation.value),
            }
            .into());
        }

        let fee = round_currency(evaluation.value);
        // Display only.
        let effective_rate = if transaction.quantity.is_zero() {
            Decimal::ZERO
        } else {
            fee / transaction.quantity
        };
        debug!(
            "Formula for rule '{}' on transaction {} evaluated to {}",
            rule.name, transaction.id, fee
        );

        Ok(StrategyOutcome {
            strategy: CalculationStrategy::Formula,
            base_rate: effective_rate,
            effective_rate,
            season,
            seasonal_multiplier: Decimal::ONE,
            territory_multiplier: Decimal::ONE,
            base_amount: fee,
            computed_fee: fee,
            volume_discount_applied: false,
            explanation: format!(
                "Formula '{}' evaluated for {} units = {}",
                rule.name,
                transaction.quantity.normalize(),
                money(fee)
            ),
            detail: StrategyDetail::Formula {
                context,
                debug_log: evaluation.debug_log,
            },
            flag: None,
        })
    }
}

/// Multiplier for the transaction's season, 1 when the rule has none.
/// Holiday sales fall back to a "Winter" adjustment when no holiday entry
/// exists.
pub fn seasonal_multiplier(rule: &CalculationRule, season: Season) -> Decimal {
    let lookup = |name: &str| {
        rule.seasonal_adjustments
            .iter()
            .find(|(key, _)| tokenize(key).iter().any(|t| t == name))
            .map(|(_, value)| *value)
            .filter(|value| *value > Decimal::ZERO)
    };
    let name = season.as_str().to_lowercase();
    lookup(&name)
        .or_else(|| (season == Season::Holiday).then(|| lookup("winter")).flatten())
        .unwrap_or(Decimal::ONE)
}

/// Multiplier of the first premium whose territory overlaps the
/// transaction's, 1 otherwise.
pub fn territory_multiplier(rule: &CalculationRule, territory: Option<&str>) -> Decimal {
    let Some(territory) = territory.map(str::trim).filter(|t| !t.is_empty()) else {
        return Decimal::ONE;
    };
    rule.territory_premiums
        .iter()
        .find(|(key, _)| terms_overlap(key, territory))
        .map(|(_, value)| *value)
        .filter(|value| *value > Decimal::ZERO)
        .unwrap_or(Decimal::ONE)
}

fn find_size<'a>(rates: &'a [ContainerSizeRate], size: &str) -> Option<&'a ContainerSizeRate> {
    rates
        .iter()
        .find(|r| r.normalized_size == size)
        .or_else(|| rates.iter().find(|r| terms_overlap(&r.size, size)))
}

fn container_size(
    transaction: &SaleTransaction,
    rule: &CalculationRule,
    season: Season,
) -> StrategyOutcome {
    let seasonal = seasonal_multiplier(rule, season);
    let territorial = territory_multiplier(rule, transaction.territory.as_deref());
    let rates = rule.container_size_rates();

    if rates.is_empty() {
        warn!(
            "Rule '{}' has no valid container-size rates; transaction {} priced at zero",
            rule.name, transaction.id
        );
        return StrategyOutcome {
            strategy: CalculationStrategy::ContainerSize,
            base_rate: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            season,
            seasonal_multiplier: seasonal,
            territory_multiplier: territorial,
            base_amount: Decimal::ZERO,
            computed_fee: Decimal::ZERO,
            volume_discount_applied: false,
            explanation: format!(
                "Rule '{}' has no container-size rates configured; no fee charged",
                rule.name
            ),
            detail: StrategyDetail::NoContainerRates,
            flag: Some("No valid container-size rates configured".to_string()),
        };
    }

    let declared = transaction.declared_container_size();
    let inferred = transaction.inferred_container_size();
    let (entry, source, transaction_size) = if let Some(entry) =
        declared.as_deref().and_then(|size| find_size(&rates, size))
    {
        (entry, ContainerSizeSource::Declared, declared.clone())
    } else if let Some(entry) = inferred.as_deref().and_then(|size| find_size(&rates, size)) {
        (entry, ContainerSizeSource::InferredFromProduct, inferred.clone())
    } else {
        (
            &rates[0],
            ContainerSizeSource::FirstEntryFallback,
            declared.clone().or_else(|| inferred.clone()),
        )
    };

    let flag = (source == ContainerSizeSource::FirstEntryFallback).then(|| {
        format!(
            "Container size {} not found in rate table; used first configured size ({})",
            transaction_size.as_deref().unwrap_or("unknown"),
            entry.size
        )
    });

    let discount_rate = match (entry.volume_threshold, entry.discounted_rate) {
        (Some(threshold), Some(discounted)) if transaction.quantity >= threshold => {
            Some(discounted)
        }
        _ => None,
    };
    let rate = discount_rate.unwrap_or(entry.base_rate);
    let base_amount = rate * transaction.quantity;
    let fee = round_currency(base_amount * seasonal * territorial);

    StrategyOutcome {
        strategy: CalculationStrategy::ContainerSize,
        base_rate: entry.base_rate,
        effective_rate: rate * seasonal * territorial,
        season,
        seasonal_multiplier: seasonal,
        territory_multiplier: territorial,
        base_amount,
        computed_fee: fee,
        volume_discount_applied: discount_rate.is_some(),
        explanation: format!(
            "{} units of {} x {} per unit{} = {}",
            transaction.quantity.normalize(),
            entry.size,
            money(rate),
            if discount_rate.is_some() {
                " (volume discount)"
            } else {
                ""
            },
            money(fee)
        ),
        detail: StrategyDetail::ContainerSize {
            rate_entry: entry.clone(),
            source,
            transaction_size,
        },
        flag,
    }
}

fn percentage_of_gross(
    transaction: &SaleTransaction,
    rate: Decimal,
    seasonal: Decimal,
    territorial: Decimal,
) -> (Decimal, Decimal) {
    let base_amount = transaction.gross_amount * rate / dec!(100);
    (base_amount, round_currency(base_amount * seasonal * territorial))
}

fn volume_tier(transaction: &SaleTransaction, rule: &CalculationRule, season: Season) -> StrategyOutcome {
    let seasonal = seasonal_multiplier(rule, season);
    let territorial = territory_multiplier(rule, transaction.territory.as_deref());
    let tiers = rule.volume_tiers();
    let matched = tiers.iter().position(|t| t.contains(transaction.quantity));

    let (rate, tier, flag) = match matched {
        Some(index) => (tiers[index].rate, Some(tiers[index].clone()), None),
        None => {
            let rate = rule.base_rate.unwrap_or(Decimal::ZERO);
            let flag = format!(
                "Quantity {} outside all volume tiers; used base rate {}",
                transaction.quantity.normalize(),
                percent(rate)
            );
            (rate, None, Some(flag))
        }
    };
    let volume_discount_applied = match (matched, tiers.first()) {
        (Some(index), Some(first)) => index > 0 && tiers[index].rate < first.rate,
        _ => false,
    };
    let (base_amount, fee) = percentage_of_gross(transaction, rate, seasonal, territorial);

    StrategyOutcome {
        strategy: CalculationStrategy::VolumeTier,
        base_rate: rate,
        effective_rate: rate * seasonal * territorial,
        season,
        seasonal_multiplier: seasonal,
        territory_multiplier: territorial,
        base_amount,
        computed_fee: fee,
        volume_discount_applied,
        explanation: format!(
            "{} x {}{} = {}",
            money(transaction.gross_amount),
            percent(rate),
            tier.as_ref()
                .map(|t| format!(" (tier {} units)", t.label()))
                .unwrap_or_default(),
            money(fee)
        ),
        detail: StrategyDetail::VolumeTier { tier },
        flag,
    }
}

fn flat_percentage(
    transaction: &SaleTransaction,
    rule: &CalculationRule,
    season: Season,
) -> StrategyOutcome {
    let seasonal = seasonal_multiplier(rule, season);
    let territorial = territory_multiplier(rule, transaction.territory.as_deref());
    let rate = rule.base_rate.unwrap_or(Decimal::ZERO);
    let (base_amount, fee) = percentage_of_gross(transaction, rate, seasonal, territorial);
    let flag = rule
        .base_rate
        .is_none()
        .then(|| format!("Rule '{}' has no base rate", rule.name));

    StrategyOutcome {
        strategy: CalculationStrategy::Percentage,
        base_rate: rate,
        effective_rate: rate * seasonal * territorial,
        season,
        seasonal_multiplier: seasonal,
        territory_multiplier: territorial,
        base_amount,
        computed_fee: fee,
        volume_discount_applied: false,
        explanation: format!(
            "{} x {} = {}",
            money(transaction.gross_amount),
            percent(rate),
            money(fee)
        ),
        detail: StrategyDetail::Percentage,
        flag,
    }
}
