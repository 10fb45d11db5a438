//! Reporting - calculation records, structured line items and dimension
//! aggregation.

mod legacy_breakdown;
mod reporting_model;
mod reporting_service;
mod reporting_traits;

pub use legacy_breakdown::{
    line_item_from_breakdown, line_item_from_legacy, line_items_from_legacy,
    parse_legacy_breakdown,
};
pub use reporting_model::*;
pub use reporting_service::ReportingService;
pub use reporting_traits::{ReportingRepositoryTrait, ReportingServiceTrait};

#[cfg(test)]
mod legacy_breakdown_tests;
