use super::{CalculationResult, SaleTransaction};
use crate::errors::Result;

/// Service trait for running fee calculations
pub trait FeeCalculationServiceTrait: Send + Sync {
    /// Prices `transactions` against the contract's rules and blueprints.
    ///
    /// A missing contract, a contract without a company, a failing formula or
    /// a fee above its sale amount aborts the whole run.
    fn calculate_fees(
        &self,
        contract_id: &str,
        transactions: &[SaleTransaction],
    ) -> Result<CalculationResult>;
}
