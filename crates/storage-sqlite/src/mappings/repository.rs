use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{ErpMappingRuleSetDB, TermMappingDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{erp_mapping_rule_sets, term_mappings};
use royalty_core::errors::{DatabaseError, Error, Result};
use royalty_core::mappings::{
    ErpMappingRuleSet, MappingStatus, NewTermMapping, TermMapping, TermMappingRepositoryTrait,
};

pub struct TermMappingRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TermMappingRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        TermMappingRepository { pool, writer }
    }
}

#[async_trait]
impl TermMappingRepositoryTrait for TermMappingRepository {
    fn get_confirmed_mappings(&self, contract_id: &str) -> Result<Vec<TermMapping>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = term_mappings::table
            .filter(term_mappings::contract_id.eq(contract_id))
            .filter(term_mappings::status.eq(MappingStatus::Confirmed.as_str()))
            .order((term_mappings::created_at.asc(), term_mappings::id.asc()))
            .select(TermMappingDB::as_select())
            .load::<TermMappingDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(TermMapping::from).collect())
    }

    fn get_active_rule_set(&self, company_id: &str) -> Result<Option<ErpMappingRuleSet>> {
        let mut conn = get_connection(&self.pool)?;
        let row = erp_mapping_rule_sets::table
            .filter(erp_mapping_rule_sets::company_id.eq(company_id))
            .filter(erp_mapping_rule_sets::is_active.eq(true))
            .order(erp_mapping_rule_sets::updated_at.desc())
            .select(ErpMappingRuleSetDB::as_select())
            .first::<ErpMappingRuleSetDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(ErpMappingRuleSet::from))
    }

    async fn create_mapping(&self, new_mapping: NewTermMapping) -> Result<TermMapping> {
        self.writer
            .exec(move |conn| {
                let row = TermMappingDB::from_domain(
                    new_mapping,
                    Uuid::new_v4().to_string(),
                    Utc::now().naive_utc(),
                );
                let stored = diesel::insert_into(term_mappings::table)
                    .values(&row)
                    .returning(TermMappingDB::as_returning())
                    .get_result(conn)
                    .into_core()?;
                Ok(TermMapping::from(stored))
            })
            .await
    }

    async fn update_mapping_status(&self, mapping_id: &str, status: MappingStatus) -> Result<()> {
        let mapping_id = mapping_id.to_string();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(term_mappings::table.find(&mapping_id))
                    .set(term_mappings::status.eq(status.as_str()))
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "Mapping {} not found",
                        mapping_id
                    ))));
                }
                Ok(())
            })
            .await
    }

    /// Saving an active ruleset deactivates the company's other rulesets.
    async fn save_rule_set(&self, rule_set: ErpMappingRuleSet) -> Result<ErpMappingRuleSet> {
        self.writer
            .exec(move |conn| {
                let row = ErpMappingRuleSetDB::from_domain(&rule_set, Utc::now().naive_utc())?;
                if row.is_active {
                    diesel::update(
                        erp_mapping_rule_sets::table
                            .filter(erp_mapping_rule_sets::company_id.eq(&row.company_id))
                            .filter(erp_mapping_rule_sets::id.ne(&row.id)),
                    )
                    .set(erp_mapping_rule_sets::is_active.eq(false))
                    .execute(conn)
                    .into_core()?;
                }
                diesel::replace_into(erp_mapping_rule_sets::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(rule_set)
            })
            .await
    }
}
