use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{ContractDB, NewContractDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::contracts;
use royalty_core::contracts::{Contract, ContractRepositoryTrait, NewContract};
use royalty_core::errors::Result;

pub struct ContractRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ContractRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ContractRepository { pool, writer }
    }
}

#[async_trait]
impl ContractRepositoryTrait for ContractRepository {
    fn get_contract(&self, contract_id: &str) -> Result<Option<Contract>> {
        let mut conn = get_connection(&self.pool)?;
        let row = contracts::table
            .find(contract_id)
            .select(ContractDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Contract::from))
    }

    async fn create_contract(&self, new_contract: NewContract) -> Result<Contract> {
        self.writer
            .exec(move |conn| {
                let row = NewContractDB::from_domain(
                    new_contract,
                    Uuid::new_v4().to_string(),
                    Utc::now().naive_utc(),
                );
                let stored = diesel::insert_into(contracts::table)
                    .values(&row)
                    .returning(ContractDB::as_returning())
                    .get_result(conn)
                    .into_core()?;
                Ok(Contract::from(stored))
            })
            .await
    }
}
