use async_trait::async_trait;

use super::{
    CalculationLineItem, DimensionAggregate, DimensionConfig, DimensionKey, FeeCalculation,
    LineItemGroupRow, NewCalculationLineItem, NewDimensionConfig, NewFeeCalculation, Vendor,
};
use crate::calculation::CalculationResult;
use crate::errors::Result;

/// Trait for reporting repository operations
#[async_trait]
pub trait ReportingRepositoryTrait: Send + Sync {
    fn get_calculation(&self, calculation_id: &str) -> Result<Option<FeeCalculation>>;

    fn count_line_items(&self, calculation_id: &str) -> Result<i64>;

    fn get_line_items(&self, calculation_id: &str) -> Result<Vec<CalculationLineItem>>;

    /// Group sums of a calculation's line items. Items without a value on
    /// the dimension form one group with `dimension_value = None`.
    fn group_line_items(
        &self,
        calculation_id: &str,
        dimension: &DimensionKey,
    ) -> Result<Vec<LineItemGroupRow>>;

    fn get_active_vendors(&self, company_id: &str) -> Result<Vec<Vendor>>;

    fn get_dimension_configs(&self, contract_id: &str) -> Result<Vec<DimensionConfig>>;

    async fn create_calculation(
        &self,
        calculation: NewFeeCalculation,
        line_items: Vec<NewCalculationLineItem>,
    ) -> Result<FeeCalculation>;

    /// Inserts line items for a calculation that has none yet and marks it
    /// materialized. Returns the number inserted; a calculation that already
    /// has items is left untouched.
    async fn backfill_line_items(
        &self,
        calculation_id: &str,
        line_items: Vec<NewCalculationLineItem>,
    ) -> Result<usize>;

    async fn create_dimension_configs(
        &self,
        configs: Vec<NewDimensionConfig>,
    ) -> Result<Vec<DimensionConfig>>;
}

/// Trait for reporting service operations
#[async_trait]
pub trait ReportingServiceTrait: Send + Sync {
    /// Totals of a calculation grouped by `dimension_key`. Invalid custom
    /// keys return an empty list.
    async fn get_aggregated_by_dimension(
        &self,
        calculation_id: &str,
        dimension_key: &str,
    ) -> Result<Vec<DimensionAggregate>>;

    /// Materializes structured line items from the stored breakdown if the
    /// calculation has none. Returns how many were created.
    async fn ensure_line_items(&self, calculation_id: &str) -> Result<usize>;

    async fn get_dimension_configs(&self, contract_id: &str) -> Result<Vec<DimensionConfig>>;

    async fn record_calculation(&self, result: &CalculationResult) -> Result<FeeCalculation>;
}
