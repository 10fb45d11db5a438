use async_trait::async_trait;

use super::{Contract, NewContract};
use crate::errors::Result;

#[async_trait]
pub trait ContractRepositoryTrait: Send + Sync {
    fn get_contract(&self, contract_id: &str) -> Result<Option<Contract>>;
    async fn create_contract(&self, new_contract: NewContract) -> Result<Contract>;
}
