//! Merges a contract's active rules with its confirmed term mappings into a
//! fresh blueprint generation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use super::{
    BlueprintMaterializerTrait, BlueprintRepositoryTrait, MatchingCriteria,
    MaterializationSummary, NewBlueprint, NewBlueprintDimension,
};
use crate::contracts::ContractRepositoryTrait;
use crate::errors::{FeeCalculationError, Result};
use crate::mappings::{ErpMappingRuleSet, TermMapping, TermMappingRepositoryTrait};
use crate::rules::{extract_dimensions, CalculationRule, DimensionType, RuleRepositoryTrait};
use crate::settings::CompanySettingsServiceTrait;
use crate::utils::{terms_equal, terms_overlap};

pub struct BlueprintMaterializer {
    contract_repository: Arc<dyn ContractRepositoryTrait>,
    settings_service: Arc<dyn CompanySettingsServiceTrait>,
    rule_repository: Arc<dyn RuleRepositoryTrait>,
    mapping_repository: Arc<dyn TermMappingRepositoryTrait>,
    blueprint_repository: Arc<dyn BlueprintRepositoryTrait>,
    /// One async lock per contract so concurrent materializations of the
    /// same contract run one after the other.
    contract_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl BlueprintMaterializer {
    pub fn new(
        contract_repository: Arc<dyn ContractRepositoryTrait>,
        settings_service: Arc<dyn CompanySettingsServiceTrait>,
        rule_repository: Arc<dyn RuleRepositoryTrait>,
        mapping_repository: Arc<dyn TermMappingRepositoryTrait>,
        blueprint_repository: Arc<dyn BlueprintRepositoryTrait>,
    ) -> Self {
        Self {
            contract_repository,
            settings_service,
            rule_repository,
            mapping_repository,
            blueprint_repository,
            contract_locks: DashMap::new(),
        }
    }

    fn contract_lock(&self, contract_id: &str) -> Arc<Mutex<()>> {
        self.contract_locks
            .entry(contract_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the contract's lock once no caller holds or waits on it.
    fn release_contract_lock(&self, contract_id: &str) {
        self.contract_locks
            .remove_if(contract_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    pub(crate) fn tracked_contract_locks(&self) -> usize {
        self.contract_locks.len()
    }

    async fn materialize_locked(&self, contract_id: &str) -> Result<MaterializationSummary> {
        let contract = self
            .contract_repository
            .get_contract(contract_id)?
            .ok_or_else(|| FeeCalculationError::ContractNotFound(contract_id.to_string()))?;
        let company_id = contract
            .company()
            .ok_or_else(|| FeeCalculationError::MissingCompany(contract_id.to_string()))?
            .to_string();

        let approach = self.settings_service.get_calculation_approach(&company_id)?;
        if !approach.uses_blueprints() {
            debug!(
                "Skipping blueprint materialization for contract {}: company {} uses the {} approach",
                contract_id, company_id, approach
            );
            return Ok(MaterializationSummary::skipped(contract_id, approach));
        }

        let rules = self.rule_repository.get_active_rules(contract_id)?;
        let mappings = self.mapping_repository.get_confirmed_mappings(contract_id)?;
        let rule_set = self.mapping_repository.get_active_rule_set(&company_id)?;

        info!(
            "Materializing blueprints for contract {}: {} active rules, {} confirmed mappings, ruleset {}",
            contract_id,
            rules.len(),
            mappings.len(),
            rule_set.as_ref().map(|r| r.name.as_str()).unwrap_or("none")
        );

        let blueprints: Vec<NewBlueprint> = rules
            .iter()
            .map(|rule| materialize_rule(rule, &company_id, &mappings, rule_set.as_ref()))
            .collect();

        let mut summary = MaterializationSummary {
            contract_id: contract_id.to_string(),
            approach,
            skipped: false,
            generation: None,
            rules_processed: rules.len(),
            blueprints_created: blueprints.len(),
            fully_mapped: blueprints.iter().filter(|b| b.is_fully_mapped).count(),
            dimensions_total: blueprints.iter().map(|b| b.dimensions.len()).sum(),
            dimensions_mapped: blueprints
                .iter()
                .flat_map(|b| b.dimensions.iter())
                .filter(|d| d.is_mapped)
                .count(),
            unmapped_fields: Vec::new(),
        };
        for blueprint in &blueprints {
            for field in &blueprint.unmapped_fields {
                if !summary.unmapped_fields.contains(field) {
                    summary.unmapped_fields.push(field.clone());
                }
            }
        }

        let generation = self
            .blueprint_repository
            .replace_blueprints(contract_id, blueprints)
            .await?;
        summary.generation = Some(generation.generation);

        if !summary.unmapped_fields.is_empty() {
            warn!(
                "Contract {} has {} unmapped blueprint dimensions: {:?}",
                contract_id,
                summary.dimensions_total - summary.dimensions_mapped,
                summary.unmapped_fields
            );
        }
        info!(
            "Committed blueprint generation {} for contract {} ({} blueprints, {} fully mapped)",
            generation.generation, contract_id, summary.blueprints_created, summary.fully_mapped
        );

        Ok(summary)
    }
}

#[async_trait]
impl BlueprintMaterializerTrait for BlueprintMaterializer {
    async fn materialize_for_contract(&self, contract_id: &str) -> Result<MaterializationSummary> {
        let lock = self.contract_lock(contract_id);
        let result = {
            let _guard = lock.lock().await;
            self.materialize_locked(contract_id).await
        };
        drop(lock);
        self.release_contract_lock(contract_id);
        result
    }

    async fn on_mappings_confirmed(&self, contract_id: &str) {
        if let Err(e) = self.materialize_for_contract(contract_id).await {
            error!(
                "Re-materialization after mapping confirmation failed for contract {}: {}",
                contract_id, e
            );
        }
    }
}

/// Builds the blueprint for one rule. Pure: the same inputs always give the
/// same blueprint.
pub fn materialize_rule(
    rule: &CalculationRule,
    company_id: &str,
    mappings: &[TermMapping],
    rule_set: Option<&ErpMappingRuleSet>,
) -> NewBlueprint {
    let mut dimensions = Vec::new();
    let mut unmapped_fields = Vec::new();
    let mut criteria = MatchingCriteria::default();

    for extracted in extract_dimensions(rule) {
        match find_mapping(&extracted.match_value, mappings) {
            Some(mapping) => {
                let sales_field = rule_set
                    .and_then(|set| set.sales_field_for(&mapping.erp_field_name))
                    .map(str::to_string);
                match extracted.dimension_type {
                    DimensionType::Product => criteria.products.push(extracted.match_value.clone()),
                    DimensionType::Territory => {
                        criteria.territories.push(extracted.match_value.clone())
                    }
                    DimensionType::ContainerSize => {
                        criteria.container_sizes.push(extracted.match_value.clone())
                    }
                    DimensionType::FormulaField => {}
                }
                dimensions.push(NewBlueprintDimension {
                    dimension_type: extracted.dimension_type,
                    contract_term: extracted.contract_term,
                    match_value: extracted.match_value,
                    erp_field_name: Some(mapping.erp_field_name.clone()),
                    sales_field,
                    is_mapped: true,
                    confidence: Some(mapping.confidence),
                });
            }
            None => {
                unmapped_fields.push(format!(
                    "{}:{}",
                    extracted.dimension_type, extracted.contract_term
                ));
                dimensions.push(NewBlueprintDimension {
                    dimension_type: extracted.dimension_type,
                    contract_term: extracted.contract_term,
                    match_value: extracted.match_value,
                    erp_field_name: None,
                    sales_field: None,
                    is_mapped: false,
                    confidence: None,
                });
            }
        }
    }

    let is_fully_mapped = !dimensions.is_empty() && unmapped_fields.is_empty();

    NewBlueprint {
        contract_id: rule.contract_id.clone(),
        company_id: company_id.to_string(),
        rule_id: rule.id.clone(),
        name: rule.name.clone(),
        rule_type: rule.rule_type,
        calculation_logic: rule.clone(),
        matching_criteria: criteria,
        dimensions,
        is_fully_mapped,
        unmapped_fields,
        erp_rule_set_id: rule_set.map(|set| set.id.clone()),
        priority: rule.effective_priority(),
    }
}

/// Exact term or value matches win over partial ones; ties go to the
/// earliest confirmed mapping.
fn find_mapping<'a>(value: &str, mappings: &'a [TermMapping]) -> Option<&'a TermMapping> {
    mappings
        .iter()
        .find(|m| mapping_terms(m).any(|term| terms_equal(term, value)))
        .or_else(|| {
            mappings
                .iter()
                .find(|m| mapping_terms(m).any(|term| terms_overlap(term, value)))
        })
}

fn mapping_terms(mapping: &TermMapping) -> impl Iterator<Item = &str> {
    std::iter::once(mapping.original_term.as_str()).chain(mapping.original_value.as_deref())
}
