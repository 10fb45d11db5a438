use async_trait::async_trait;

use super::{CalculationRule, NewCalculationRule};
use crate::errors::Result;

/// Trait for calculation rule repository operations
#[async_trait]
pub trait RuleRepositoryTrait: Send + Sync {
    /// Active rules for a contract, ordered by effective priority then
    /// declaration order.
    fn get_active_rules(&self, contract_id: &str) -> Result<Vec<CalculationRule>>;

    async fn create_rule(&self, new_rule: NewCalculationRule) -> Result<CalculationRule>;
}
