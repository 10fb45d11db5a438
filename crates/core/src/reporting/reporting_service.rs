use async_trait::async_trait;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::legacy_breakdown::{line_item_from_breakdown, line_items_from_legacy};
use super::{
    dimension_key_for_field, DimensionAggregate, DimensionConfig, DimensionKey, DimensionKind,
    FeeCalculation, LineItemGroupRow, NewDimensionConfig, NewFeeCalculation,
    ReportingRepositoryTrait, ReportingServiceTrait,
};
use crate::calculation::CalculationResult;
use crate::constants::{RATE_DISPLAY_PRECISION, UNASSIGNED_DIMENSION_VALUE};
use crate::contracts::ContractRepositoryTrait;
use crate::errors::{DatabaseError, Error, FeeCalculationError, Result};
use crate::mappings::TermMappingRepositoryTrait;

pub struct ReportingService {
    reporting_repository: Arc<dyn ReportingRepositoryTrait>,
    mapping_repository: Arc<dyn TermMappingRepositoryTrait>,
    contract_repository: Arc<dyn ContractRepositoryTrait>,
}

impl ReportingService {
    pub fn new(
        reporting_repository: Arc<dyn ReportingRepositoryTrait>,
        mapping_repository: Arc<dyn TermMappingRepositoryTrait>,
        contract_repository: Arc<dyn ContractRepositoryTrait>,
    ) -> Self {
        Self {
            reporting_repository,
            mapping_repository,
            contract_repository,
        }
    }

    fn load_calculation(&self, calculation_id: &str) -> Result<FeeCalculation> {
        self.reporting_repository
            .get_calculation(calculation_id)?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!(
                    "Calculation {} not found",
                    calculation_id
                )))
            })
    }

    /// Every active vendor of the company, each carrying the calculation's
    /// overall totals. Returns `None` when the company has no vendor
    /// registry.
    fn vendor_registry_aggregates(
        &self,
        calculation: &FeeCalculation,
        rows: &[LineItemGroupRow],
    ) -> Result<Option<Vec<DimensionAggregate>>> {
        let vendors = self
            .reporting_repository
            .get_active_vendors(&calculation.company_id)?;
        if vendors.is_empty() {
            return Ok(None);
        }

        let totals = rows.iter().fold(
            LineItemGroupRow {
                dimension_value: None,
                total_sales: Decimal::ZERO,
                total_quantity: Decimal::ZERO,
                total_fee: Decimal::ZERO,
                transaction_count: 0,
            },
            |mut acc, row| {
                acc.total_sales += row.total_sales;
                acc.total_quantity += row.total_quantity;
                acc.total_fee += row.total_fee;
                acc.transaction_count += row.transaction_count;
                acc
            },
        );
        debug!(
            "Listing {} registered vendors for calculation {}",
            vendors.len(),
            calculation.id
        );

        Ok(Some(
            vendors
                .into_iter()
                .map(|vendor| {
                    to_aggregate(LineItemGroupRow {
                        dimension_value: Some(vendor.name),
                        ..totals.clone()
                    })
                })
                .collect(),
        ))
    }
}

fn average_rate(total_fee: Decimal, total_sales: Decimal) -> Decimal {
    if total_sales.is_zero() {
        Decimal::ZERO
    } else {
        (total_fee / total_sales * dec!(100)).round_dp(RATE_DISPLAY_PRECISION)
    }
}

fn to_aggregate(row: LineItemGroupRow) -> DimensionAggregate {
    DimensionAggregate {
        dimension_value: row
            .dimension_value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNASSIGNED_DIMENSION_VALUE.to_string()),
        avg_rate: average_rate(row.total_fee, row.total_sales),
        total_sales: row.total_sales,
        total_quantity: row.total_quantity,
        total_fee: row.total_fee,
        transaction_count: row.transaction_count,
    }
}

/// Largest fee first, then by name.
fn sort_aggregates(aggregates: &mut [DimensionAggregate]) {
    aggregates.sort_by(|a, b| {
        b.total_fee
            .cmp(&a.total_fee)
            .then_with(|| a.dimension_value.cmp(&b.dimension_value))
    });
}

fn standard_configs(contract_id: &str) -> Vec<NewDimensionConfig> {
    DimensionKey::FIRST_CLASS
        .iter()
        .enumerate()
        .map(|(i, key)| NewDimensionConfig {
            contract_id: contract_id.to_string(),
            dimension_key: key.as_str().to_string(),
            display_name: key.display_name(),
            dimension_type: DimensionKind::Standard,
            erp_field_name: None,
            is_groupable: true,
            sort_order: i as i32,
        })
        .collect()
}

#[async_trait]
impl ReportingServiceTrait for ReportingService {
    async fn get_aggregated_by_dimension(
        &self,
        calculation_id: &str,
        dimension_key: &str,
    ) -> Result<Vec<DimensionAggregate>> {
        let Some(dimension) = DimensionKey::parse(dimension_key) else {
            warn!(
                "Rejected dimension key '{}' for calculation {}",
                dimension_key, calculation_id
            );
            return Ok(Vec::new());
        };

        let calculation = self.load_calculation(calculation_id)?;
        self.ensure_line_items(calculation_id).await?;

        let rows = self
            .reporting_repository
            .group_line_items(calculation_id, &dimension)?;

        if dimension == DimensionKey::Vendor {
            if let Some(mut registry) = self.vendor_registry_aggregates(&calculation, &rows)? {
                registry.sort_by(|a, b| a.dimension_value.cmp(&b.dimension_value));
                return Ok(registry);
            }
        }

        let mut aggregates: Vec<DimensionAggregate> = rows.into_iter().map(to_aggregate).collect();
        sort_aggregates(&mut aggregates);
        Ok(aggregates)
    }

    async fn ensure_line_items(&self, calculation_id: &str) -> Result<usize> {
        let calculation = self.load_calculation(calculation_id)?;
        if calculation.line_items_materialized
            || self.reporting_repository.count_line_items(calculation_id)? > 0
        {
            return Ok(0);
        }
        let Some(raw) = calculation.breakdown_json.as_deref() else {
            return Ok(0);
        };

        let mappings = self
            .mapping_repository
            .get_confirmed_mappings(&calculation.contract_id)?;
        let line_items = line_items_from_legacy(raw, &mappings);
        if line_items.is_empty() {
            warn!(
                "Calculation {} has a breakdown payload but no readable entries",
                calculation_id
            );
        }

        let inserted = self
            .reporting_repository
            .backfill_line_items(calculation_id, line_items)
            .await?;
        info!(
            "Back-filled {} line items for calculation {} from its stored breakdown",
            inserted, calculation_id
        );
        Ok(inserted)
    }

    async fn get_dimension_configs(&self, contract_id: &str) -> Result<Vec<DimensionConfig>> {
        let existing = self.reporting_repository.get_dimension_configs(contract_id)?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let mut configs = standard_configs(contract_id);
        for mapping in self.mapping_repository.get_confirmed_mappings(contract_id)? {
            let Some(key) = dimension_key_for_field(&mapping.erp_field_name) else {
                continue;
            };
            let taken = configs
                .iter()
                .any(|c| c.dimension_key.eq_ignore_ascii_case(&key))
                || DimensionKey::parse(&key).is_some_and(|k| !matches!(k, DimensionKey::Custom(_)));
            if taken {
                continue;
            }
            let sort_order = configs.len() as i32;
            configs.push(NewDimensionConfig {
                contract_id: contract_id.to_string(),
                dimension_key: key,
                display_name: mapping.erp_field_name.clone(),
                dimension_type: DimensionKind::Custom,
                erp_field_name: Some(mapping.erp_field_name.clone()),
                is_groupable: true,
                sort_order,
            });
        }

        info!(
            "Seeding {} dimension configs for contract {}",
            configs.len(),
            contract_id
        );
        self.reporting_repository
            .create_dimension_configs(configs)
            .await
    }

    async fn record_calculation(&self, result: &CalculationResult) -> Result<FeeCalculation> {
        let contract = self
            .contract_repository
            .get_contract(&result.contract_id)?
            .ok_or_else(|| FeeCalculationError::ContractNotFound(result.contract_id.clone()))?;
        let company_id = contract
            .company()
            .ok_or_else(|| FeeCalculationError::MissingCompany(result.contract_id.clone()))?
            .to_string();

        let line_items = result.breakdown.iter().map(line_item_from_breakdown).collect();
        let calculation = NewFeeCalculation {
            contract_id: result.contract_id.clone(),
            company_id,
            total_sales: result.total_sales(),
            total_fee: result.total_fee,
            minimum_guarantee: result.minimum_guarantee,
            final_fee: result.final_fee,
            transaction_count: result.breakdown.len() as i64,
            breakdown_json: Some(serde_json::to_string(&result.breakdown)?),
        };

        let stored = self
            .reporting_repository
            .create_calculation(calculation, line_items)
            .await?;
        info!(
            "Recorded calculation {} for contract {} (final fee {})",
            stored.id, stored.contract_id, stored.final_fee
        );
        Ok(stored)
    }
}
