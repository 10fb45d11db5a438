//! Settings domain models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// How an organization wants its fees calculated.
///
/// `Manual` prices with hand-authored rules only. The ERP approaches price
/// with materialized blueprints only. `Hybrid` tries blueprints first and
/// falls back to the raw rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationApproach {
    #[default]
    Manual,
    ErpRules,
    ErpMappingRules,
    Hybrid,
}

impl CalculationApproach {
    /// Whether blueprints are materialized and consulted.
    pub fn uses_blueprints(&self) -> bool {
        !matches!(self, CalculationApproach::Manual)
    }

    /// Whether raw rules are consulted when no blueprint matches.
    pub fn allows_rule_fallback(&self) -> bool {
        matches!(
            self,
            CalculationApproach::Manual | CalculationApproach::Hybrid
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationApproach::Manual => "manual",
            CalculationApproach::ErpRules => "erp_rules",
            CalculationApproach::ErpMappingRules => "erp_mapping_rules",
            CalculationApproach::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for CalculationApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalculationApproach {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(CalculationApproach::Manual),
            "erp_rules" => Ok(CalculationApproach::ErpRules),
            "erp_mapping_rules" => Ok(CalculationApproach::ErpMappingRules),
            "hybrid" => Ok(CalculationApproach::Hybrid),
            other => Err(Error::InvalidConfigValue(format!(
                "Unknown calculation approach '{}'",
                other
            ))),
        }
    }
}
