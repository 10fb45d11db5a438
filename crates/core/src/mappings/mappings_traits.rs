use async_trait::async_trait;

use super::{ErpMappingRuleSet, MappingStatus, NewTermMapping, TermMapping};
use crate::errors::Result;

#[async_trait]
pub trait TermMappingRepositoryTrait: Send + Sync {
    /// Confirmed mappings for a contract in creation order.
    fn get_confirmed_mappings(&self, contract_id: &str) -> Result<Vec<TermMapping>>;

    /// The company's active ERP field-mapping ruleset, if any.
    fn get_active_rule_set(&self, company_id: &str) -> Result<Option<ErpMappingRuleSet>>;

    async fn create_mapping(&self, new_mapping: NewTermMapping) -> Result<TermMapping>;

    async fn update_mapping_status(&self, mapping_id: &str, status: MappingStatus) -> Result<()>;

    async fn save_rule_set(&self, rule_set: ErpMappingRuleSet) -> Result<ErpMappingRuleSet>;
}
