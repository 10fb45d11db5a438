//! Organization-level calculation settings.

mod settings_model;
mod settings_service;
mod settings_traits;

pub use settings_model::CalculationApproach;
pub use settings_service::{CompanySettingsService, CompanySettingsServiceTrait};
pub use settings_traits::CompanySettingsRepositoryTrait;
