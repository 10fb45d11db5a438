//! SQLite storage implementation for stored calculations, their line items,
//! vendors and dimension configs.

mod model;
mod repository;

pub use model::{
    CalculationLineItemDB, DimensionConfigDB, FeeCalculationDB, GroupedLineItemDB, VendorDB,
};
pub use repository::ReportingRepository;

pub use royalty_core::reporting::ReportingRepositoryTrait;
