//! Fee calculation - matching, strategies, audit trail and orchestration.

mod audit;
mod calculation_model;
mod calculation_service;
mod calculation_traits;
mod fee_calculator;
mod formula;
mod matcher;
mod strategy;

pub use audit::BreakdownBuilder;
pub use calculation_model::*;
pub use calculation_service::FeeCalculationService;
pub use calculation_traits::FeeCalculationServiceTrait;
pub use fee_calculator::{
    check_fee_within_sale_amount, minimum_guarantee, CalculationInput, FeeCalculator,
};
pub use formula::{build_formula_context, FormulaEvaluation, FormulaEvaluatorTrait};
pub use matcher::{
    category_matches, condition_checks, find_matching_blueprint, find_matching_rule,
    is_abstract_territory, match_transaction_to_blueprint, product_match_quality,
    specificity_score, territory_filter_passes, BlueprintMatch, RuleMatch,
};
pub use strategy::{round_currency, seasonal_multiplier, territory_multiplier, FeeStrategyExecutor};

#[cfg(test)]
mod audit_tests;
#[cfg(test)]
mod fee_calculator_tests;
#[cfg(test)]
mod matcher_tests;
