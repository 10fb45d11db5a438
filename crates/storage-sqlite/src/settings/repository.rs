use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::CompanySettingDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::company_settings::dsl::*;
use royalty_core::errors::Result;
use royalty_core::settings::{CalculationApproach, CompanySettingsRepositoryTrait};

pub struct CompanySettingsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CompanySettingsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        CompanySettingsRepository { pool, writer }
    }
}

#[async_trait]
impl CompanySettingsRepositoryTrait for CompanySettingsRepository {
    fn get_calculation_approach(&self, for_company: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        company_settings
            .filter(company_id.eq(for_company))
            .select(calculation_approach)
            .first::<String>(&mut conn)
            .optional()
            .into_core()
    }

    async fn set_calculation_approach(
        &self,
        for_company: &str,
        approach: CalculationApproach,
    ) -> Result<()> {
        let row = CompanySettingDB {
            company_id: for_company.to_string(),
            calculation_approach: approach.as_str().to_string(),
            updated_at: Utc::now().naive_utc(),
        };
        self.writer
            .exec(move |conn| {
                diesel::replace_into(company_settings)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }
}
