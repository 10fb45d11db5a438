//! Repository traits for settings.

use async_trait::async_trait;

use super::CalculationApproach;
use crate::errors::Result;

/// Repository trait for per-company calculation settings.
#[async_trait]
pub trait CompanySettingsRepositoryTrait: Send + Sync {
    /// Raw stored approach, or `None` when the company never chose one.
    fn get_calculation_approach(&self, company_id: &str) -> Result<Option<String>>;

    async fn set_calculation_approach(
        &self,
        company_id: &str,
        approach: CalculationApproach,
    ) -> Result<()>;
}
