//! SQLite storage implementation for company settings.

mod model;
mod repository;

pub use model::CompanySettingDB;
pub use repository::CompanySettingsRepository;

// Re-export trait from core for convenience
pub use royalty_core::settings::CompanySettingsRepositoryTrait;
