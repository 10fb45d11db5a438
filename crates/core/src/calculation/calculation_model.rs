//! Fee calculation domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::rules::{
    infer_container_size, normalize_container_size, CalculationRule, ContainerSizeRate, RuleType,
    VolumeTier,
};
use crate::settings::CalculationApproach;
use crate::utils::Season;

/// One sale to be priced. Immutable input to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTransaction {
    pub id: String,
    pub product_name: String,
    pub category: Option<String>,
    pub territory: Option<String>,
    pub vendor_name: Option<String>,
    pub quantity: Decimal,
    pub gross_amount: Decimal,
    pub transaction_date: NaiveDate,
    pub container_size: Option<String>,
    /// Free-form ERP fields carried through to reporting.
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

impl SaleTransaction {
    pub fn declared_container_size(&self) -> Option<String> {
        self.container_size
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(normalize_container_size)
    }

    pub fn inferred_container_size(&self) -> Option<String> {
        infer_container_size(&self.product_name)
    }
}

/// How well a rule's product filter matched a transaction. Ordered weakest
/// to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    /// The rule has no product categories at all.
    Fallback,
    /// A category matched the transaction's category by word overlap.
    Category,
    /// A category and the product name contain one another.
    Contains,
    /// The product name equals a category.
    StrictExact,
}

impl MatchQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchQuality::Fallback => "fallback",
            MatchQuality::Category => "category",
            MatchQuality::Contains => "contains",
            MatchQuality::StrictExact => "strict_exact",
        }
    }
}

impl fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MatchSource {
    Blueprint { blueprint_id: String },
    Rule,
}

/// Why a rule or blueprint was selected for a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDecision {
    pub rule_id: String,
    pub rule_name: String,
    pub source: MatchSource,
    pub match_quality: MatchQuality,
    pub specificity_score: f64,
    pub priority: i32,
    pub candidate_count: usize,
    pub top_candidates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStrategy {
    Formula,
    ContainerSize,
    VolumeTier,
    Percentage,
}

impl CalculationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationStrategy::Formula => "formula",
            CalculationStrategy::ContainerSize => "container_size",
            CalculationStrategy::VolumeTier => "volume_tier",
            CalculationStrategy::Percentage => "percentage",
        }
    }
}

impl fmt::Display for CalculationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerSizeSource {
    Declared,
    InferredFromProduct,
    FirstEntryFallback,
}

/// Strategy-specific intermediate values, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum StrategyDetail {
    Formula {
        context: BTreeMap<String, Value>,
        debug_log: Vec<String>,
    },
    ContainerSize {
        rate_entry: ContainerSizeRate,
        source: ContainerSizeSource,
        transaction_size: Option<String>,
    },
    NoContainerRates,
    VolumeTier {
        tier: Option<VolumeTier>,
    },
    Percentage,
}

/// Result of running one strategy for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutcome {
    pub strategy: CalculationStrategy,
    /// Rate before adjustments. Percent, or per-unit for container sizes.
    pub base_rate: Decimal,
    /// Rate actually charged after discounts and multipliers.
    pub effective_rate: Decimal,
    pub season: Season,
    pub seasonal_multiplier: Decimal,
    pub territory_multiplier: Decimal,
    /// Fee before seasonal and territory multipliers.
    pub base_amount: Decimal,
    pub computed_fee: Decimal,
    pub volume_discount_applied: bool,
    pub explanation: String,
    pub detail: StrategyDetail,
    /// Set when the outcome needs human attention (e.g. zero-fee fallbacks).
    pub flag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationStep {
    pub step_number: u32,
    pub label: String,
    pub description: String,
    pub formula: Option<String>,
    pub value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionCheck {
    pub condition: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// The rule as it was when the fee was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSnapshot {
    pub rule_id: String,
    pub name: String,
    pub rule_type: RuleType,
    pub base_rate: Option<Decimal>,
    pub tiers: Vec<Value>,
    pub product_categories: Vec<String>,
    pub territories: Vec<String>,
    pub source_text: Option<String>,
    pub confidence: Option<f64>,
    pub is_ai_extracted: bool,
}

impl From<&CalculationRule> for RuleSnapshot {
    fn from(rule: &CalculationRule) -> Self {
        Self {
            rule_id: rule.id.clone(),
            name: rule.name.clone(),
            rule_type: rule.rule_type,
            base_rate: rule.base_rate,
            tiers: rule.tiers.clone(),
            product_categories: rule.product_categories.clone(),
            territories: rule.territories.clone(),
            source_text: rule.source_text.clone(),
            confidence: rule.confidence,
            is_ai_extracted: rule.is_ai_extracted,
        }
    }
}

/// Full audit record of one transaction's fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownItem {
    pub transaction_id: String,
    pub transaction_date: NaiveDate,
    pub product_name: String,
    pub category: Option<String>,
    pub territory: Option<String>,
    pub vendor_name: Option<String>,
    pub container_size: Option<String>,
    pub quantity: Decimal,
    pub gross_amount: Decimal,
    pub dimensions: BTreeMap<String, String>,
    pub rule: RuleSnapshot,
    pub blueprint_id: Option<String>,
    pub match_decision: Option<MatchDecision>,
    pub calculation_type: CalculationStrategy,
    pub steps: Vec<CalculationStep>,
    pub condition_checks: Vec<ConditionCheck>,
    pub base_rate: Decimal,
    pub effective_rate: Decimal,
    pub season: Season,
    pub seasonal_multiplier: Decimal,
    pub territory_multiplier: Decimal,
    pub volume_discount_applied: bool,
    pub computed_fee: Decimal,
    pub explanation: String,
    pub flag: Option<String>,
}

impl BreakdownItem {
    pub fn with_match(mut self, decision: MatchDecision) -> Self {
        if let MatchSource::Blueprint { blueprint_id } = &decision.source {
            self.blueprint_id = Some(blueprint_id.clone());
        }
        self.match_decision = Some(decision);
        self
    }
}

/// A transaction left out of the totals, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedTransaction {
    pub transaction_id: String,
    pub product_name: String,
    pub gross_amount: Decimal,
    pub reason: String,
}

/// Output of one calculation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub contract_id: String,
    pub approach: CalculationApproach,
    pub total_fee: Decimal,
    pub minimum_guarantee: Option<Decimal>,
    pub minimum_guarantee_applied: bool,
    /// `max(total_fee, minimum_guarantee)`.
    pub final_fee: Decimal,
    pub breakdown: Vec<BreakdownItem>,
    pub rules_applied: BTreeSet<String>,
    pub unmatched: Vec<UnmatchedTransaction>,
    pub transactions_processed: usize,
}

impl CalculationResult {
    pub fn total_sales(&self) -> Decimal {
        self.breakdown.iter().map(|item| item.gross_amount).sum()
    }
}
