use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{Error, ValidationError};
use crate::utils::terms_equal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Pending => "pending",
            MappingStatus::Confirmed => "confirmed",
            MappingStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for MappingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(MappingStatus::Pending),
            "confirmed" => Ok(MappingStatus::Confirmed),
            "rejected" => Ok(MappingStatus::Rejected),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown mapping status '{}'",
                other
            )))),
        }
    }
}

/// A contract term bound to an external (ERP) field by the mapping service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermMapping {
    pub id: String,
    pub contract_id: String,
    pub original_term: String,
    pub original_value: Option<String>,
    pub erp_field_name: String,
    pub erp_entity_name: Option<String>,
    pub confidence: f64,
    pub status: MappingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTermMapping {
    pub id: Option<String>,
    pub contract_id: String,
    pub original_term: String,
    pub original_value: Option<String>,
    pub erp_field_name: String,
    pub erp_entity_name: Option<String>,
    pub confidence: f64,
    pub status: MappingStatus,
}

/// Routes one ERP field to the sales-data field it populates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErpFieldRule {
    pub erp_field_name: String,
    pub sales_field: String,
    pub transformation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErpMappingRuleSet {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub is_active: bool,
    pub field_rules: Vec<ErpFieldRule>,
}

impl ErpMappingRuleSet {
    pub fn sales_field_for(&self, erp_field_name: &str) -> Option<&str> {
        self.field_rules
            .iter()
            .find(|rule| terms_equal(&rule.erp_field_name, erp_field_name))
            .map(|rule| rule.sales_field.as_str())
    }
}
