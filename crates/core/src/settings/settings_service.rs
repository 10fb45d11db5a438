use super::{CalculationApproach, CompanySettingsRepositoryTrait};
use crate::errors::Result;
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

#[async_trait]
pub trait CompanySettingsServiceTrait: Send + Sync {
    /// The company's approach, `Manual` when unset or unreadable.
    fn get_calculation_approach(&self, company_id: &str) -> Result<CalculationApproach>;

    async fn update_calculation_approach(
        &self,
        company_id: &str,
        approach: CalculationApproach,
    ) -> Result<()>;
}

pub struct CompanySettingsService {
    settings_repository: Arc<dyn CompanySettingsRepositoryTrait>,
}

impl CompanySettingsService {
    pub fn new(settings_repository: Arc<dyn CompanySettingsRepositoryTrait>) -> Self {
        Self {
            settings_repository,
        }
    }
}

#[async_trait]
impl CompanySettingsServiceTrait for CompanySettingsService {
    fn get_calculation_approach(&self, company_id: &str) -> Result<CalculationApproach> {
        match self.settings_repository.get_calculation_approach(company_id)? {
            Some(raw) => match raw.parse::<CalculationApproach>() {
                Ok(approach) => Ok(approach),
                Err(e) => {
                    warn!(
                        "Company {} has an unreadable calculation approach: {}. Using manual.",
                        company_id, e
                    );
                    Ok(CalculationApproach::Manual)
                }
            },
            None => {
                debug!(
                    "Company {} has no calculation approach set, using manual",
                    company_id
                );
                Ok(CalculationApproach::Manual)
            }
        }
    }

    async fn update_calculation_approach(
        &self,
        company_id: &str,
        approach: CalculationApproach,
    ) -> Result<()> {
        self.settings_repository
            .set_calculation_approach(company_id, approach)
            .await
    }
}
