use super::*;
use crate::errors::{Error, FeeCalculationError};
use crate::mappings::{ErpFieldRule, ErpMappingRuleSet};
use crate::rules::{DimensionType, RuleType};
use crate::settings::CalculationApproach;
use crate::test_support::{
    confirmed_mapping, contract, percentage_rule, rule, FixedApproach, MockBlueprintRepository,
    MockContractRepository, MockMappingRepository, MockRuleRepository,
};
use rust_decimal_macros::dec;
use std::sync::Arc;

struct Fixture {
    mappings: Arc<MockMappingRepository>,
    blueprints: Arc<MockBlueprintRepository>,
    materializer: BlueprintMaterializer,
}

fn fixture(approach: CalculationApproach) -> Fixture {
    let mut acme = percentage_rule("acme", dec!(5), &["Acme Corp"]);
    acme.territories = vec!["Canada".to_string()];
    let catch_all = percentage_rule("catch-all", dec!(2), &[]);

    let mappings = Arc::new(MockMappingRepository::with(vec![confirmed_mapping(
        "m-1",
        "Acme Corp",
        "SupplierName",
    )]));
    let blueprints = Arc::new(MockBlueprintRepository::default());
    let materializer = BlueprintMaterializer::new(
        Arc::new(MockContractRepository::with(vec![
            contract("contract-1", Some("company-1")),
            contract("orphan", None),
        ])),
        Arc::new(FixedApproach(approach)),
        Arc::new(MockRuleRepository::with(vec![acme, catch_all])),
        mappings.clone(),
        blueprints.clone(),
    );
    Fixture {
        mappings,
        blueprints,
        materializer,
    }
}

#[tokio::test]
async fn confirmed_mapping_binds_matching_dimension() {
    let f = fixture(CalculationApproach::ErpMappingRules);
    let summary = f.materializer.materialize_for_contract("contract-1").await.unwrap();

    assert!(!summary.skipped);
    assert_eq!(summary.generation, Some(1));
    assert_eq!(summary.blueprints_created, 2);
    assert_eq!(summary.dimensions_total, 2);
    assert_eq!(summary.dimensions_mapped, 1);
    assert_eq!(summary.unmapped_fields, vec!["territory:Canada"]);

    let stored = f.blueprints.get_blueprints("contract-1").unwrap();
    let acme = stored.iter().find(|b| b.rule_id == "acme").unwrap();
    let product = acme
        .dimensions
        .iter()
        .find(|d| d.dimension_type == DimensionType::Product)
        .unwrap();
    assert!(product.is_mapped);
    assert_eq!(product.erp_field_name.as_deref(), Some("SupplierName"));
    assert_eq!(product.confidence, Some(0.95));
    assert_eq!(acme.matching_criteria.products, vec!["Acme Corp"]);
    assert!(!acme.is_fully_mapped);

    let catch_all = stored.iter().find(|b| b.rule_id == "catch-all").unwrap();
    assert!(catch_all.dimensions.is_empty());
    assert!(!catch_all.is_fully_mapped);
}

#[tokio::test]
async fn rematerialization_is_idempotent() {
    let f = fixture(CalculationApproach::Hybrid);
    f.materializer.materialize_for_contract("contract-1").await.unwrap();
    let first = f.blueprints.get_blueprints("contract-1").unwrap();

    let summary = f.materializer.materialize_for_contract("contract-1").await.unwrap();
    let second = f.blueprints.get_blueprints("contract-1").unwrap();

    assert_eq!(summary.generation, Some(2));
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.rule_id, b.rule_id);
        assert_eq!(a.dimensions, b.dimensions);
        assert_eq!(a.is_fully_mapped, b.is_fully_mapped);
        assert_eq!(a.matching_criteria, b.matching_criteria);
    }
}

#[tokio::test]
async fn concurrent_runs_serialize_and_release_their_lock() {
    let f = fixture(CalculationApproach::Hybrid);
    let (a, b) = tokio::join!(
        f.materializer.materialize_for_contract("contract-1"),
        f.materializer.materialize_for_contract("contract-1"),
    );

    let mut generations = vec![a.unwrap().generation, b.unwrap().generation];
    generations.sort();
    assert_eq!(generations, vec![Some(1), Some(2)]);
    assert_eq!(f.materializer.tracked_contract_locks(), 0);

    assert!(f.materializer.materialize_for_contract("missing").await.is_err());
    assert_eq!(f.materializer.tracked_contract_locks(), 0);
}

#[tokio::test]
async fn manual_companies_skip_materialization() {
    let f = fixture(CalculationApproach::Manual);
    let summary = f.materializer.materialize_for_contract("contract-1").await.unwrap();

    assert!(summary.skipped);
    assert_eq!(summary.generation, None);
    assert!(f.blueprints.get_latest_generation("contract-1").unwrap().is_none());
}

#[tokio::test]
async fn missing_contract_or_company_is_fatal() {
    let f = fixture(CalculationApproach::Hybrid);
    assert!(matches!(
        f.materializer.materialize_for_contract("missing").await,
        Err(Error::Calculation(FeeCalculationError::ContractNotFound(_)))
    ));
    assert!(matches!(
        f.materializer.materialize_for_contract("orphan").await,
        Err(Error::Calculation(FeeCalculationError::MissingCompany(_)))
    ));
}

#[tokio::test]
async fn mapping_confirmation_refreshes_bindings() {
    let f = fixture(CalculationApproach::ErpRules);
    f.materializer.materialize_for_contract("contract-1").await.unwrap();

    f.mappings
        .mappings
        .write()
        .unwrap()
        .push(confirmed_mapping("m-2", "Canada", "ShipToCountry"));
    f.materializer.on_mappings_confirmed("contract-1").await;

    let stored = f.blueprints.get_blueprints("contract-1").unwrap();
    let acme = stored.iter().find(|b| b.rule_id == "acme").unwrap();
    assert!(acme.is_fully_mapped);
    assert!(acme.unmapped_fields.is_empty());
    assert_eq!(acme.matching_criteria.territories, vec!["Canada"]);
    assert_eq!(acme.generation, 2);
}

#[test]
fn ruleset_resolves_sales_field() {
    let r = percentage_rule("acme", dec!(5), &["Acme"]);
    let rule_set = ErpMappingRuleSet {
        id: "rs-1".to_string(),
        company_id: "company-1".to_string(),
        name: "Default".to_string(),
        is_active: true,
        field_rules: vec![ErpFieldRule {
            erp_field_name: "SupplierName".to_string(),
            sales_field: "vendorName".to_string(),
            transformation: None,
        }],
    };
    let mappings = vec![confirmed_mapping("m-1", "Acme Corp", "SupplierName")];

    let built = materialize_rule(&r, "company-1", &mappings, Some(&rule_set));
    assert_eq!(built.erp_rule_set_id.as_deref(), Some("rs-1"));
    assert_eq!(built.dimensions[0].sales_field.as_deref(), Some("vendorName"));
    assert!(built.is_fully_mapped);
}

#[test]
fn exact_mapping_beats_earlier_partial_one() {
    let r = percentage_rule("maple", dec!(5), &["Maple"]);
    let mappings = vec![
        confirmed_mapping("m-1", "Red Maple", "ItemGroup"),
        confirmed_mapping("m-2", "maple", "ItemName"),
    ];

    let built = materialize_rule(&r, "company-1", &mappings, None);
    assert_eq!(built.dimensions[0].erp_field_name.as_deref(), Some("ItemName"));
}

#[test]
fn container_sizes_become_dimensions() {
    let mut r = rule("sizes", RuleType::ContainerSizeTiered);
    r.tiers = vec![
        serde_json::json!({"size": "1 Gallon", "baseRate": 2}),
        serde_json::json!({"size": "5 gal", "baseRate": 5}),
    ];
    let built = materialize_rule(&r, "company-1", &[], None);

    let sizes: Vec<&str> = built
        .dimensions
        .iter()
        .filter(|d| d.dimension_type == DimensionType::ContainerSize)
        .map(|d| d.match_value.as_str())
        .collect();
    assert_eq!(sizes.len(), 2);
    assert!(!built.is_fully_mapped);
}
