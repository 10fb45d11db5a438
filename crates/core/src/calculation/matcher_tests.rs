use super::*;
use crate::rules::{DimensionType, RuleType};
use crate::test_support::{blueprint, dimension, percentage_rule, rule, sale};
use rust_decimal_macros::dec;

fn maple_sale() -> SaleTransaction {
    sale("tx-1", "Japanese Maple", dec!(10), dec!(1000))
}

#[test]
fn specific_rule_beats_catch_all_regardless_of_order_and_priority() {
    let mut catch_all = percentage_rule("all", dec!(3), &[]);
    catch_all.priority = Some(1);
    let mut maple = percentage_rule("maple", dec!(5), &["Maple"]);
    maple.priority = Some(99);

    for rules in [
        vec![catch_all.clone(), maple.clone()],
        vec![maple.clone(), catch_all.clone()],
    ] {
        let found = find_matching_rule(&maple_sale(), &rules).unwrap();
        assert_eq!(found.rule.id, "maple");
        assert_eq!(found.decision.match_quality, MatchQuality::Contains);
        assert_eq!(found.decision.specificity_score, 1000.0);
        assert_eq!(found.decision.candidate_count, 2);
    }
}

#[test]
fn strict_exact_match_wins_over_specificity() {
    let broad = percentage_rule("broad", dec!(4), &["Japanese Maple", "Oak"]);
    let narrow = percentage_rule("narrow", dec!(6), &["Maple"]);
    let rules = vec![narrow, broad];

    let found = find_matching_rule(&maple_sale(), &rules).unwrap();
    assert_eq!(found.rule.id, "broad");
    assert_eq!(found.decision.match_quality, MatchQuality::StrictExact);
    assert_eq!(found.decision.specificity_score, 500.0);
}

#[test]
fn priority_then_declaration_order_break_ties() {
    let mut first = percentage_rule("first", dec!(5), &["Maple"]);
    first.priority = Some(60);
    let mut second = percentage_rule("second", dec!(5), &["Maple"]);
    second.priority = Some(10);
    let third = percentage_rule("third", dec!(5), &["Maple"]);
    let rules = vec![first, second, third];

    let found = find_matching_rule(&maple_sale(), &rules).unwrap();
    assert_eq!(found.rule.id, "second");
    assert_eq!(
        found.decision.top_candidates,
        vec!["Rule second", "Rule third", "Rule first"]
    );

    let a = percentage_rule("a", dec!(5), &["Maple"]);
    let b = percentage_rule("b", dec!(5), &["Maple"]);
    let rules = vec![a, b];
    assert_eq!(find_matching_rule(&maple_sale(), &rules).unwrap().rule.id, "a");
}

#[test]
fn tier_numbers_never_match_untiered_categories() {
    assert!(!category_matches("Tier 2 Shrubs", "Shrubs"));
    assert!(!category_matches("Shrubs", "Tier 2 Shrubs"));
    assert!(!category_matches("Tier 2 Shrubs", "Tier 3 Shrubs"));
    assert!(category_matches("Tier 2 Shrubs", "tier 2 shrubs"));

    let tiered = percentage_rule("tiered", dec!(5), &["Tier 2 Shrubs"]);
    let mut tx = sale("tx-1", "Boxwood", dec!(1), dec!(100));
    tx.category = Some("Shrubs".to_string());
    assert!(find_matching_rule(&tx, &[tiered]).is_none());

    let plain = percentage_rule("plain", dec!(5), &["Shrubs"]);
    tx.category = Some("Tier 2 Shrubs".to_string());
    assert!(find_matching_rule(&tx, &[plain]).is_none());
}

#[test]
fn category_word_overlap_rules() {
    assert!(category_matches("Ornamental Trees", "ornamental tree"));
    assert!(category_matches("Flowering Shrubs and Perennials", "Flowering Shrubs"));
    assert!(!category_matches("Maple", "Red Maple"));
    assert!(!category_matches("Ornamental Trees", "Fruit Trees"));
}

#[test]
fn category_level_match_uses_transaction_category() {
    let r = percentage_rule("shrubs", dec!(5), &["Flowering Shrubs"]);
    let mut tx = sale("tx-1", "Azalea Pink", dec!(1), dec!(100));
    tx.category = Some("flowering shrub".to_string());

    let rules = vec![r];
    let found = find_matching_rule(&tx, &rules).unwrap();
    assert_eq!(found.decision.match_quality, MatchQuality::Category);
    assert!(found.condition_checks.iter().all(|c| c.passed));
}

#[test]
fn concrete_territories_filter_but_abstract_ones_do_not() {
    let mut california = percentage_rule("ca", dec!(5), &[]);
    california.territories = vec!["California".to_string()];

    let mut tx = maple_sale();
    tx.territory = Some("Oregon".to_string());
    assert!(find_matching_rule(&tx, std::slice::from_ref(&california)).is_none());

    tx.territory = Some("Northern California".to_string());
    assert!(find_matching_rule(&tx, std::slice::from_ref(&california)).is_some());

    tx.territory = None;
    assert!(find_matching_rule(&tx, std::slice::from_ref(&california)).is_some());

    let mut primary = percentage_rule("primary", dec!(5), &[]);
    primary.territories = vec!["Primary Territory".to_string(), "North".to_string()];
    tx.territory = Some("Texas".to_string());
    assert!(find_matching_rule(&tx, &[primary]).is_some());

    assert!(is_abstract_territory("Secondary Market"));
    assert!(!is_abstract_territory("East Coast"));
}

#[test]
fn minimum_guarantee_and_inactive_rules_never_price() {
    let mut floor = rule("floor", RuleType::MinimumGuarantee);
    floor.minimum_guarantee = Some(dec!(10000));
    let mut inactive = percentage_rule("inactive", dec!(5), &[]);
    inactive.is_active = false;

    assert!(find_matching_rule(&maple_sale(), &[floor, inactive]).is_none());
}

#[test]
fn blueprint_without_dimensions_never_matches() {
    let bp = blueprint("bp-1", percentage_rule("r", dec!(5), &[]), Vec::new());
    assert!(!match_transaction_to_blueprint(&maple_sale(), &bp));
}

#[test]
fn blueprint_matches_on_mapped_dimensions_only() {
    let bp = blueprint(
        "bp-1",
        percentage_rule("r", dec!(5), &["Acme Corp", "Tier 2 Mulch"]),
        vec![
            dimension(DimensionType::Product, "Acme Corp", Some("SupplierName")),
            dimension(DimensionType::Product, "Tier 2 Mulch", None),
            dimension(DimensionType::Territory, "Canada", None),
        ],
    );

    let tx = sale("tx-1", "Acme Corp Cedar Mulch", dec!(5), dec!(250));
    assert!(match_transaction_to_blueprint(&tx, &bp));

    let other = sale("tx-2", "Generic Mulch", dec!(5), dec!(250));
    assert!(!match_transaction_to_blueprint(&other, &bp));
}

#[test]
fn blueprint_requires_every_mapped_dimension() {
    let bp = blueprint(
        "bp-1",
        percentage_rule("r", dec!(5), &["Maple", "Oak"]),
        vec![
            dimension(DimensionType::Product, "Maple", Some("ItemName")),
            dimension(DimensionType::Product, "Oak", Some("ItemName")),
        ],
    );
    assert!(!match_transaction_to_blueprint(&maple_sale(), &bp));

    let both = sale("tx-2", "Maple Oak Blend", dec!(10), dec!(1000));
    assert!(match_transaction_to_blueprint(&both, &bp));
}

#[test]
fn blueprint_territory_must_match_as_well_as_product() {
    let bp = blueprint(
        "bp-1",
        percentage_rule("r", dec!(5), &["Maple"]),
        vec![
            dimension(DimensionType::Product, "Maple", Some("ItemName")),
            dimension(DimensionType::Territory, "Oregon", Some("Region")),
            dimension(DimensionType::Territory, "Domestic", Some("Region")),
            dimension(DimensionType::ContainerSize, "5gal", Some("PackSize")),
        ],
    );

    let mut tx = maple_sale();
    tx.territory = Some("Oregon".to_string());
    assert!(match_transaction_to_blueprint(&tx, &bp));

    tx.territory = Some("Texas".to_string());
    assert!(!match_transaction_to_blueprint(&tx, &bp));

    tx.territory = None;
    assert!(!match_transaction_to_blueprint(&tx, &bp));
}

#[test]
fn best_blueprint_is_selected_with_its_id() {
    let general = blueprint(
        "bp-general",
        percentage_rule("general", dec!(3), &["Maple", "Oak", "Birch"]),
        vec![
            dimension(DimensionType::Product, "Maple", Some("ItemName")),
            dimension(DimensionType::Product, "Oak", Some("ItemName")),
            dimension(DimensionType::Product, "Birch", Some("ItemName")),
        ],
    );
    let specific = blueprint(
        "bp-specific",
        percentage_rule("specific", dec!(6), &["Maple"]),
        vec![dimension(DimensionType::Product, "Maple", Some("ItemName"))],
    );
    let blueprints = vec![general, specific];

    let found = find_matching_blueprint(&maple_sale(), &blueprints).unwrap();
    assert_eq!(found.blueprint.id, "bp-specific");
    assert_eq!(
        found.decision.source,
        MatchSource::Blueprint {
            blueprint_id: "bp-specific".to_string()
        }
    );
    assert_eq!(found.condition_checks.len(), 1);
}
