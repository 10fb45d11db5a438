use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::max;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{CalculationRuleDB, NewCalculationRuleDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::calculation_rules;
use royalty_core::errors::Result;
use royalty_core::rules::{CalculationRule, NewCalculationRule, RuleRepositoryTrait};

pub struct RuleRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RuleRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        RuleRepository { pool, writer }
    }
}

#[async_trait]
impl RuleRepositoryTrait for RuleRepository {
    fn get_active_rules(&self, contract_id: &str) -> Result<Vec<CalculationRule>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = calculation_rules::table
            .filter(calculation_rules::contract_id.eq(contract_id))
            .filter(calculation_rules::is_active.eq(true))
            .order(calculation_rules::position.asc())
            .select(CalculationRuleDB::as_select())
            .load::<CalculationRuleDB>(&mut conn)
            .into_core()?;

        let mut rules: Vec<CalculationRule> = rows.into_iter().map(CalculationRule::from).collect();
        // Stable: equal priorities keep declaration order.
        rules.sort_by_key(|rule| rule.effective_priority());
        Ok(rules)
    }

    async fn create_rule(&self, new_rule: NewCalculationRule) -> Result<CalculationRule> {
        self.writer
            .exec(move |conn| {
                let last_position: Option<i32> = calculation_rules::table
                    .filter(calculation_rules::contract_id.eq(&new_rule.contract_id))
                    .select(max(calculation_rules::position))
                    .get_result(conn)
                    .into_core()?;
                let row = NewCalculationRuleDB::from_domain(
                    new_rule,
                    Uuid::new_v4().to_string(),
                    last_position.map_or(0, |p| p + 1),
                    Utc::now().naive_utc(),
                )?;

                let stored = diesel::insert_into(calculation_rules::table)
                    .values(&row)
                    .returning(CalculationRuleDB::as_returning())
                    .get_result(conn)
                    .into_core()?;
                Ok(CalculationRule::from(stored))
            })
            .await
    }
}
