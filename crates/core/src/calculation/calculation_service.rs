use log::debug;
use std::sync::Arc;

use super::fee_calculator::{CalculationInput, FeeCalculator};
use super::{CalculationResult, FeeCalculationServiceTrait, SaleTransaction};
use crate::blueprints::BlueprintRepositoryTrait;
use crate::contracts::ContractRepositoryTrait;
use crate::errors::{FeeCalculationError, Result};
use crate::rules::RuleRepositoryTrait;
use crate::settings::CompanySettingsServiceTrait;

/// Loads a contract's configuration and hands it to the pure calculator.
pub struct FeeCalculationService {
    contract_repository: Arc<dyn ContractRepositoryTrait>,
    settings_service: Arc<dyn CompanySettingsServiceTrait>,
    rule_repository: Arc<dyn RuleRepositoryTrait>,
    blueprint_repository: Arc<dyn BlueprintRepositoryTrait>,
    calculator: FeeCalculator,
}

impl FeeCalculationService {
    pub fn new(
        contract_repository: Arc<dyn ContractRepositoryTrait>,
        settings_service: Arc<dyn CompanySettingsServiceTrait>,
        rule_repository: Arc<dyn RuleRepositoryTrait>,
        blueprint_repository: Arc<dyn BlueprintRepositoryTrait>,
        calculator: FeeCalculator,
    ) -> Self {
        Self {
            contract_repository,
            settings_service,
            rule_repository,
            blueprint_repository,
            calculator,
        }
    }
}

impl FeeCalculationServiceTrait for FeeCalculationService {
    fn calculate_fees(
        &self,
        contract_id: &str,
        transactions: &[SaleTransaction],
    ) -> Result<CalculationResult> {
        let contract = self
            .contract_repository
            .get_contract(contract_id)?
            .ok_or_else(|| FeeCalculationError::ContractNotFound(contract_id.to_string()))?;
        let company_id = contract
            .company()
            .ok_or_else(|| FeeCalculationError::MissingCompany(contract_id.to_string()))?;

        let approach = self.settings_service.get_calculation_approach(company_id)?;
        let rules = self.rule_repository.get_active_rules(contract_id)?;
        let blueprints = if approach.uses_blueprints() {
            self.blueprint_repository.get_blueprints(contract_id)?
        } else {
            Vec::new()
        };
        debug!(
            "Calculating {} transactions for contract {} with {} rules and {} blueprints ({})",
            transactions.len(),
            contract_id,
            rules.len(),
            blueprints.len(),
            approach
        );

        self.calculator.run(CalculationInput {
            contract_id,
            approach,
            rules: &rules,
            blueprints: &blueprints,
            transactions,
        })
    }
}
