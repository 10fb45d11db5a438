//! Picks the rule or blueprint that prices a transaction.

use log::debug;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::{ConditionCheck, MatchDecision, MatchQuality, MatchSource, SaleTransaction};
use crate::blueprints::{Blueprint, BlueprintDimension};
use crate::constants::{
    ABSTRACT_TERRITORIES, GENERIC_CATEGORY_WORDS, MATCH_DECISION_TOP_CANDIDATES,
    SPECIFICITY_NUMERATOR, TERRITORY_FILLER_WORDS,
};
use crate::rules::{CalculationRule, DimensionType, RuleType};
use crate::utils::{terms_equal, terms_overlap, tokenize};

static TIER_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:tier|grade|level|class|zone|group)\s*[-#]?\s*(\d+)\b")
        .expect("Invalid tier token regex")
});

/// A selected rule with the rationale and filter checks behind it.
#[derive(Debug, Clone)]
pub struct RuleMatch<'a> {
    pub rule: &'a CalculationRule,
    pub decision: MatchDecision,
    pub condition_checks: Vec<ConditionCheck>,
}

/// A selected blueprint. The blueprint's embedded rule does the pricing.
#[derive(Debug, Clone)]
pub struct BlueprintMatch<'a> {
    pub blueprint: &'a Blueprint,
    pub decision: MatchDecision,
    pub condition_checks: Vec<ConditionCheck>,
}

struct Candidate<'a, T> {
    index: usize,
    item: &'a T,
    rule: &'a CalculationRule,
    strict_exact: bool,
    quality: MatchQuality,
    checks: Vec<ConditionCheck>,
}

impl<T> Candidate<'_, T> {
    fn specificity(&self) -> f64 {
        specificity_score(self.rule)
    }

    fn rank(&self, other: &Self) -> Ordering {
        other
            .strict_exact
            .cmp(&self.strict_exact)
            .then_with(|| other.quality.cmp(&self.quality))
            .then_with(|| other.specificity().total_cmp(&self.specificity()))
            .then_with(|| {
                self.rule
                    .effective_priority()
                    .cmp(&other.rule.effective_priority())
            })
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// `SPECIFICITY_NUMERATOR / category count`, or zero for catch-all rules.
pub fn specificity_score(rule: &CalculationRule) -> f64 {
    let count = rule.categories().count();
    if count == 0 {
        0.0
    } else {
        SPECIFICITY_NUMERATOR / count as f64
    }
}

/// Selects the best rule for a transaction among the contract's rules.
///
/// Minimum-guarantee and inactive rules never price a transaction. Among the
/// rules whose category and territory filters pass, the winner is decided by
/// strict exact product match, then match quality, then specificity, then
/// priority (lower wins), then declaration order.
pub fn find_matching_rule<'a>(
    transaction: &SaleTransaction,
    rules: &'a [CalculationRule],
) -> Option<RuleMatch<'a>> {
    let candidates: Vec<Candidate<'a, CalculationRule>> = rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.is_active && rule.rule_type != RuleType::MinimumGuarantee)
        .filter_map(|(index, rule)| {
            let (quality, checks) = evaluate_rule(transaction, rule)?;
            Some(Candidate {
                index,
                item: rule,
                rule,
                strict_exact: is_strict_exact(transaction, rule),
                quality,
                checks,
            })
        })
        .collect();

    select(transaction, candidates, |_| MatchSource::Rule).map(|(candidate, decision)| RuleMatch {
        rule: candidate.item,
        decision,
        condition_checks: candidate.checks,
    })
}

/// Selects the best matching blueprint, ranked the same way as raw rules
/// using each blueprint's embedded rule.
pub fn find_matching_blueprint<'a>(
    transaction: &SaleTransaction,
    blueprints: &'a [Blueprint],
) -> Option<BlueprintMatch<'a>> {
    let candidates: Vec<Candidate<'a, Blueprint>> = blueprints
        .iter()
        .enumerate()
        .filter(|(_, blueprint)| blueprint.rule_type != RuleType::MinimumGuarantee)
        .filter(|(_, blueprint)| match_transaction_to_blueprint(transaction, blueprint))
        .map(|(index, blueprint)| {
            let rule = &blueprint.calculation_logic;
            Candidate {
                index,
                item: blueprint,
                rule,
                strict_exact: is_strict_exact(transaction, rule),
                quality: product_match_quality(transaction, rule).unwrap_or(MatchQuality::Fallback),
                checks: blueprint_condition_checks(transaction, blueprint),
            }
        })
        .collect();

    select(transaction, candidates, |blueprint: &Blueprint| MatchSource::Blueprint {
        blueprint_id: blueprint.id.clone(),
    })
    .map(|(candidate, decision)| BlueprintMatch {
        blueprint: candidate.item,
        decision,
        condition_checks: candidate.checks,
    })
}

fn select<'a, T>(
    transaction: &SaleTransaction,
    mut candidates: Vec<Candidate<'a, T>>,
    source: impl Fn(&T) -> MatchSource,
) -> Option<(Candidate<'a, T>, MatchDecision)> {
    candidates.sort_by(|a, b| a.rank(b));

    let candidate_count = candidates.len();
    let top_candidates: Vec<String> = candidates
        .iter()
        .take(MATCH_DECISION_TOP_CANDIDATES)
        .map(|c| c.rule.name.clone())
        .collect();
    if candidate_count > 1 {
        debug!(
            "Transaction {} matched {} candidates; top: {:?}",
            transaction.id, candidate_count, top_candidates
        );
    }

    let winner = candidates.into_iter().next()?;
    let decision = MatchDecision {
        rule_id: winner.rule.id.clone(),
        rule_name: winner.rule.name.clone(),
        source: source(winner.item),
        match_quality: winner.quality,
        specificity_score: winner.specificity(),
        priority: winner.rule.effective_priority(),
        candidate_count,
        top_candidates,
    };
    debug!(
        "Transaction {} -> '{}' ({}, specificity {:.1}, priority {})",
        transaction.id,
        decision.rule_name,
        decision.match_quality,
        decision.specificity_score,
        decision.priority
    );
    Some((winner, decision))
}

fn is_strict_exact(transaction: &SaleTransaction, rule: &CalculationRule) -> bool {
    rule.categories()
        .any(|category| terms_equal(category, &transaction.product_name))
}

/// Runs the coarse category and territory filters. Returns the product match
/// quality when both pass.
fn evaluate_rule(
    transaction: &SaleTransaction,
    rule: &CalculationRule,
) -> Option<(MatchQuality, Vec<ConditionCheck>)> {
    let quality = product_match_quality(transaction, rule)?;
    if !territory_filter_passes(transaction, rule) {
        return None;
    }
    Some((quality, condition_checks(transaction, rule)))
}

/// How the rule's product categories match the transaction, or `None` when
/// they exclude it.
pub fn product_match_quality(
    transaction: &SaleTransaction,
    rule: &CalculationRule,
) -> Option<MatchQuality> {
    let categories: Vec<&str> = rule.categories().collect();
    if categories.is_empty() {
        return Some(MatchQuality::Fallback);
    }
    let product = transaction.product_name.as_str();

    if categories.iter().any(|c| terms_equal(c, product)) {
        return Some(MatchQuality::StrictExact);
    }
    if categories
        .iter()
        .any(|c| tiers_compatible(c, product) && terms_overlap(c, product))
    {
        return Some(MatchQuality::Contains);
    }
    let category_hit = categories.iter().any(|c| {
        transaction
            .category
            .as_deref()
            .is_some_and(|tx_category| category_matches(c, tx_category))
            || category_matches(c, product)
    });
    category_hit.then_some(MatchQuality::Category)
}

/// Word-overlap comparison of two category labels with tier conflict
/// detection.
///
/// "Tier 2 Shrubs" never matches "Shrubs": when only one side names a tier
/// they cannot match, and when both do every number must agree. Labels with a
/// single meaningful word must be equal; longer labels need two shared words
/// or full overlap of the shorter one.
pub fn category_matches(a: &str, b: &str) -> bool {
    if !tiers_compatible(a, b) {
        return false;
    }

    let words_a = meaningful_words(a);
    let words_b = meaningful_words(b);
    if words_a.is_empty() || words_b.is_empty() {
        return terms_equal(a, b);
    }
    if words_a.len() == 1 || words_b.len() == 1 {
        return words_a == words_b;
    }

    let shared = words_a.intersection(&words_b).count();
    shared >= 2 || shared == words_a.len().min(words_b.len())
}

fn tier_tokens(text: &str) -> BTreeSet<String> {
    TIER_TOKEN_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_start_matches('0').to_string())
        .collect()
}

fn numeric_tokens(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().all(|c| c.is_ascii_digit()))
        .map(|t| t.trim_start_matches('0').to_string())
        .collect()
}

fn tiers_compatible(a: &str, b: &str) -> bool {
    let tiers_a = tier_tokens(a);
    let tiers_b = tier_tokens(b);
    match (tiers_a.is_empty(), tiers_b.is_empty()) {
        (true, true) => true,
        (false, false) => numeric_tokens(a) == numeric_tokens(b),
        _ => false,
    }
}

fn meaningful_words(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !GENERIC_CATEGORY_WORDS.contains(&t.as_str()))
        .map(|t| singular(&t))
        .collect()
}

fn singular(word: &str) -> String {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// True when every word of the label is an abstract placeholder such as
/// "Primary Territory" or "North".
pub fn is_abstract_territory(label: &str) -> bool {
    let tokens = tokenize(label);
    !tokens.is_empty()
        && tokens.iter().all(|t| {
            ABSTRACT_TERRITORIES.contains(&t.as_str())
                || TERRITORY_FILLER_WORDS.contains(&t.as_str())
        })
}

fn concrete_territories(rule: &CalculationRule) -> Vec<&str> {
    rule.territory_filters()
        .filter(|t| !is_abstract_territory(t))
        .collect()
}

/// Rules without concrete territories, and transactions without a
/// territory, always pass.
pub fn territory_filter_passes(transaction: &SaleTransaction, rule: &CalculationRule) -> bool {
    let concrete = concrete_territories(rule);
    if concrete.is_empty() {
        return true;
    }
    match transaction.territory.as_deref().map(str::trim) {
        Some(territory) if !territory.is_empty() => {
            concrete.iter().any(|t| terms_overlap(t, territory))
        }
        _ => true,
    }
}

/// Filter checks recorded on the audit trail of a raw-rule match.
pub fn condition_checks(transaction: &SaleTransaction, rule: &CalculationRule) -> Vec<ConditionCheck> {
    let categories: Vec<&str> = rule.categories().collect();
    let product_quality = product_match_quality(transaction, rule);
    let product_actual = match transaction.category.as_deref() {
        Some(category) => format!("{} ({})", transaction.product_name, category),
        None => transaction.product_name.clone(),
    };

    let concrete = concrete_territories(rule);
    let territory_passed = territory_filter_passes(transaction, rule);

    vec![
        ConditionCheck {
            condition: "Product category".to_string(),
            expected: if categories.is_empty() {
                "any product".to_string()
            } else {
                categories.join(", ")
            },
            actual: product_actual,
            passed: product_quality.is_some(),
        },
        ConditionCheck {
            condition: "Territory".to_string(),
            expected: if concrete.is_empty() {
                "any territory".to_string()
            } else {
                concrete.join(", ")
            },
            actual: transaction
                .territory
                .clone()
                .unwrap_or_else(|| "unspecified".to_string()),
            passed: territory_passed,
        },
        ConditionCheck {
            condition: "Match quality".to_string(),
            expected: "category or territory filter passes".to_string(),
            actual: product_quality
                .map(|q| q.to_string())
                .unwrap_or_else(|| "no match".to_string()),
            passed: product_quality.is_some() && territory_passed,
        },
    ]
}

fn transaction_values(
    transaction: &SaleTransaction,
    dimension_type: DimensionType,
) -> Vec<&str> {
    match dimension_type {
        DimensionType::Product => std::iter::once(transaction.product_name.as_str())
            .chain(transaction.category.as_deref())
            .collect(),
        DimensionType::Territory => transaction.territory.as_deref().into_iter().collect(),
        DimensionType::ContainerSize | DimensionType::FormulaField => Vec::new(),
    }
}

/// Product and territory dimensions filter transactions; container sizes and
/// formula fields only bind data.
fn constrains(dimension: &BlueprintDimension) -> bool {
    dimension.is_mapped
        && match dimension.dimension_type {
            DimensionType::Product => true,
            DimensionType::Territory => !is_abstract_territory(&dimension.match_value),
            DimensionType::ContainerSize | DimensionType::FormulaField => false,
        }
}

fn dimension_matches(transaction: &SaleTransaction, dimension: &BlueprintDimension) -> bool {
    transaction_values(transaction, dimension.dimension_type)
        .into_iter()
        .any(|value| {
            tiers_compatible(&dimension.match_value, value)
                && terms_overlap(&dimension.match_value, value)
        })
}

/// Whether a transaction satisfies a blueprint's mapped dimensions.
///
/// Every mapped product and territory dimension must match the transaction.
/// Unmapped dimensions are ignored. A blueprint without any mapped dimension
/// never matches.
pub fn match_transaction_to_blueprint(transaction: &SaleTransaction, blueprint: &Blueprint) -> bool {
    if blueprint.mapped_dimensions().next().is_none() {
        return false;
    }

    blueprint
        .dimensions
        .iter()
        .filter(|d| constrains(d))
        .all(|d| dimension_matches(transaction, d))
}

fn blueprint_condition_checks(
    transaction: &SaleTransaction,
    blueprint: &Blueprint,
) -> Vec<ConditionCheck> {
    blueprint
        .dimensions
        .iter()
        .filter(|d| constrains(d))
        .map(|d| {
            let actual = transaction_values(transaction, d.dimension_type).join(" / ");
            ConditionCheck {
                condition: format!(
                    "{} via {}",
                    d.dimension_type,
                    d.erp_field_name.as_deref().unwrap_or("unbound field")
                ),
                expected: d.match_value.clone(),
                actual: if actual.is_empty() {
                    "unspecified".to_string()
                } else {
                    actual
                },
                passed: dimension_matches(transaction, d),
            }
        })
        .collect()
}
