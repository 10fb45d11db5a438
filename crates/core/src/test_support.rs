//! Shared fixtures for unit tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::blueprints::{
    Blueprint, BlueprintDimension, BlueprintGeneration, BlueprintRepositoryTrait,
    MatchingCriteria, NewBlueprint,
};
use crate::calculation::SaleTransaction;
use crate::contracts::{Contract, ContractRepositoryTrait, NewContract};
use crate::errors::Result;
use crate::mappings::{
    ErpMappingRuleSet, MappingStatus, NewTermMapping, TermMapping, TermMappingRepositoryTrait,
};
use crate::rules::{CalculationRule, DimensionType, NewCalculationRule, RuleRepositoryTrait, RuleType};
use crate::settings::{CalculationApproach, CompanySettingsServiceTrait};

pub fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn rule(id: &str, rule_type: RuleType) -> CalculationRule {
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
        created_at: timestamp(),
    }
}

pub fn percentage_rule(id: &str, rate: Decimal, categories: &[&str]) -> CalculationRule {
    let mut r = rule(id, RuleType::Percentage);
    r.base_rate = Some(rate);
    r.product_categories = categories.iter().map(|c| c.to_string()).collect();
    r
}

pub fn with_tiers(mut r: CalculationRule, tiers: Vec<Value>) -> CalculationRule {
    r.tiers = tiers;
    r
}

pub fn sale(id: &str, product: &str, quantity: Decimal, gross: Decimal) -> SaleTransaction {
    SaleTransaction {
        id: id.to_string(),
        product_name: product.to_string(),
        category: None,
        territory: None,
        vendor_name: None,
        quantity,
        gross_amount: gross,
        transaction_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        container_size: None,
        dimensions: BTreeMap::new(),
    }
}

pub fn dimension(
    dimension_type: DimensionType,
    value: &str,
    erp_field_name: Option<&str>,
) -> BlueprintDimension {
    BlueprintDimension {
        id: format!("dim-{}", value),
        blueprint_id: String::new(),
        dimension_type,
        contract_term: value.to_string(),
        match_value: value.to_string(),
        erp_field_name: erp_field_name.map(str::to_string),
        sales_field: None,
        is_mapped: erp_field_name.is_some(),
        confidence: erp_field_name.map(|_| 0.9),
    }
}

pub fn blueprint(id: &str, rule: CalculationRule, dimensions: Vec<BlueprintDimension>) -> Blueprint {
    let unmapped_fields: Vec<String> = dimensions
        .iter()
        .filter(|d| !d.is_mapped)
        .map(|d| format!("{}:{}", d.dimension_type, d.contract_term))
        .collect();
    Blueprint {
        id: id.to_string(),
        contract_id: rule.contract_id.clone(),
        company_id: "company-1".to_string(),
        rule_id: rule.id.clone(),
        name: rule.name.clone(),
        rule_type: rule.rule_type,
        generation: 1,
        matching_criteria: MatchingCriteria::default(),
        is_fully_mapped: !dimensions.is_empty() && unmapped_fields.is_empty(),
        unmapped_fields,
        dimensions,
        erp_rule_set_id: None,
        priority: rule.effective_priority(),
        calculation_logic: rule,
        created_at: timestamp(),
    }
}

pub fn contract(id: &str, company_id: Option<&str>) -> Contract {
    Contract {
        id: id.to_string(),
        company_id: company_id.map(str::to_string),
        name: format!("Contract {}", id),
        created_at: timestamp(),
    }
}

pub fn confirmed_mapping(id: &str, original_term: &str, erp_field_name: &str) -> TermMapping {
    TermMapping {
        id: id.to_string(),
        contract_id: "contract-1".to_string(),
        original_term: original_term.to_string(),
        original_value: None,
        erp_field_name: erp_field_name.to_string(),
        erp_entity_name: None,
        confidence: 0.95,
        status: MappingStatus::Confirmed,
    }
}

// --- In-memory repositories ---

#[derive(Default)]
pub struct MockContractRepository {
    pub contracts: RwLock<Vec<Contract>>,
}

impl MockContractRepository {
    pub fn with(contracts: Vec<Contract>) -> Self {
        Self {
            contracts: RwLock::new(contracts),
        }
    }
}

#[async_trait]
impl ContractRepositoryTrait for MockContractRepository {
    fn get_contract(&self, contract_id: &str) -> Result<Option<Contract>> {
        Ok(self
            .contracts
            .read()
            .unwrap()
            .iter()
            .find(|c| c.id == contract_id)
            .cloned())
    }

    async fn create_contract(&self, new_contract: NewContract) -> Result<Contract> {
        let created = Contract {
            id: new_contract.id.unwrap_or_else(|| "generated".to_string()),
            company_id: new_contract.company_id,
            name: new_contract.name,
            created_at: timestamp(),
        };
        self.contracts.write().unwrap().push(created.clone());
        Ok(created)
    }
}

pub struct FixedApproach(pub CalculationApproach);

#[async_trait]
impl CompanySettingsServiceTrait for FixedApproach {
    fn get_calculation_approach(&self, _company_id: &str) -> Result<CalculationApproach> {
        Ok(self.0)
    }

    async fn update_calculation_approach(
        &self,
        _company_id: &str,
        _approach: CalculationApproach,
    ) -> Result<()> {
        unimplemented!()
    }
}

#[derive(Default)]
pub struct MockRuleRepository {
    pub rules: RwLock<Vec<CalculationRule>>,
}

impl MockRuleRepository {
    pub fn with(rules: Vec<CalculationRule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }
}

#[async_trait]
impl RuleRepositoryTrait for MockRuleRepository {
    fn get_active_rules(&self, contract_id: &str) -> Result<Vec<CalculationRule>> {
        Ok(self
            .rules
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.contract_id == contract_id && r.is_active)
            .cloned()
            .collect())
    }

    async fn create_rule(&self, _new_rule: NewCalculationRule) -> Result<CalculationRule> {
        unimplemented!()
    }
}

#[derive(Default)]
pub struct MockMappingRepository {
    pub mappings: RwLock<Vec<TermMapping>>,
    pub rule_set: RwLock<Option<ErpMappingRuleSet>>,
}

impl MockMappingRepository {
    pub fn with(mappings: Vec<TermMapping>) -> Self {
        Self {
            mappings: RwLock::new(mappings),
            rule_set: RwLock::new(None),
        }
    }
}

#[async_trait]
impl TermMappingRepositoryTrait for MockMappingRepository {
    fn get_confirmed_mappings(&self, contract_id: &str) -> Result<Vec<TermMapping>> {
        Ok(self
            .mappings
            .read()
            .unwrap()
            .iter()
            .filter(|m| m.contract_id == contract_id && m.status == MappingStatus::Confirmed)
            .cloned()
            .collect())
    }

    fn get_active_rule_set(&self, _company_id: &str) -> Result<Option<ErpMappingRuleSet>> {
        Ok(self.rule_set.read().unwrap().clone())
    }

    async fn create_mapping(&self, _new_mapping: NewTermMapping) -> Result<TermMapping> {
        unimplemented!()
    }

    async fn update_mapping_status(&self, _mapping_id: &str, _status: MappingStatus) -> Result<()> {
        unimplemented!()
    }

    async fn save_rule_set(&self, rule_set: ErpMappingRuleSet) -> Result<ErpMappingRuleSet> {
        *self.rule_set.write().unwrap() = Some(rule_set.clone());
        Ok(rule_set)
    }
}

/// Keeps only the latest generation, like the real store.
#[derive(Default)]
pub struct MockBlueprintRepository {
    pub blueprints: RwLock<Vec<Blueprint>>,
    pub generation: RwLock<i64>,
    pub reads: AtomicUsize,
}

impl MockBlueprintRepository {
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlueprintRepositoryTrait for MockBlueprintRepository {
    fn get_blueprints(&self, contract_id: &str) -> Result<Vec<Blueprint>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .blueprints
            .read()
            .unwrap()
            .iter()
            .filter(|b| b.contract_id == contract_id)
            .cloned()
            .collect())
    }

    fn get_latest_generation(&self, contract_id: &str) -> Result<Option<BlueprintGeneration>> {
        let generation = *self.generation.read().unwrap();
        Ok((generation > 0).then(|| BlueprintGeneration {
            contract_id: contract_id.to_string(),
            generation,
            blueprint_count: self.blueprints.read().unwrap().len(),
            materialized_at: timestamp(),
        }))
    }

    async fn replace_blueprints(
        &self,
        contract_id: &str,
        blueprints: Vec<NewBlueprint>,
    ) -> Result<BlueprintGeneration> {
        let mut generation = self.generation.write().unwrap();
        *generation += 1;
        let stored: Vec<Blueprint> = blueprints
            .into_iter()
            .map(|new| {
                let id = format!("bp-{}", new.rule_id);
                Blueprint {
                    dimensions: new
                        .dimensions
                        .into_iter()
                        .enumerate()
                        .map(|(i, d)| BlueprintDimension {
                            id: format!("{}-dim-{}", id, i),
                            blueprint_id: id.clone(),
                            dimension_type: d.dimension_type,
                            contract_term: d.contract_term,
                            match_value: d.match_value,
                            erp_field_name: d.erp_field_name,
                            sales_field: d.sales_field,
                            is_mapped: d.is_mapped,
                            confidence: d.confidence,
                        })
                        .collect(),
                    id,
                    contract_id: new.contract_id,
                    company_id: new.company_id,
                    rule_id: new.rule_id,
                    name: new.name,
                    rule_type: new.rule_type,
                    generation: *generation,
                    calculation_logic: new.calculation_logic,
                    matching_criteria: new.matching_criteria,
                    is_fully_mapped: new.is_fully_mapped,
                    unmapped_fields: new.unmapped_fields,
                    erp_rule_set_id: new.erp_rule_set_id,
                    priority: new.priority,
                    created_at: timestamp(),
                }
            })
            .collect();
        let count = stored.len();
        *self.blueprints.write().unwrap() = stored;
        Ok(BlueprintGeneration {
            contract_id: contract_id.to_string(),
            generation: *generation,
            blueprint_count: count,
            materialized_at: timestamp(),
        })
    }
}
