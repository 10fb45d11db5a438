//! Database models for term mappings and ERP mapping rulesets.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::utils::{parse_json_or_default, to_json_text};
use royalty_core::mappings::{ErpMappingRuleSet, MappingStatus, NewTermMapping, TermMapping};

#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::term_mappings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct TermMappingDB {
    pub id: String,
    pub contract_id: String,
    pub original_term: String,
    pub original_value: Option<String>,
    pub erp_field_name: String,
    pub erp_entity_name: Option<String>,
    pub confidence: f64,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::erp_mapping_rule_sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ErpMappingRuleSetDB {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub is_active: bool,
    pub field_rules: String,
    pub updated_at: NaiveDateTime,
}

impl From<TermMappingDB> for TermMapping {
    fn from(db: TermMappingDB) -> Self {
        let status = db.status.parse().unwrap_or_else(|_| {
            warn!(
                "Mapping {} has unknown status '{}', treating it as pending",
                db.id, db.status
            );
            MappingStatus::Pending
        });
        Self {
            id: db.id,
            contract_id: db.contract_id,
            original_term: db.original_term,
            original_value: db.original_value,
            erp_field_name: db.erp_field_name,
            erp_entity_name: db.erp_entity_name,
            confidence: db.confidence,
            status,
        }
    }
}

impl TermMappingDB {
    pub fn from_domain(domain: NewTermMapping, id: String, created_at: NaiveDateTime) -> Self {
        Self {
            id: domain.id.unwrap_or(id),
            contract_id: domain.contract_id,
            original_term: domain.original_term,
            original_value: domain.original_value,
            erp_field_name: domain.erp_field_name,
            erp_entity_name: domain.erp_entity_name,
            confidence: domain.confidence,
            status: domain.status.as_str().to_string(),
            created_at,
        }
    }
}

impl From<ErpMappingRuleSetDB> for ErpMappingRuleSet {
    fn from(db: ErpMappingRuleSetDB) -> Self {
        Self {
            field_rules: parse_json_or_default(&db.field_rules, "field_rules"),
            id: db.id,
            company_id: db.company_id,
            name: db.name,
            is_active: db.is_active,
        }
    }
}

impl ErpMappingRuleSetDB {
    pub fn from_domain(
        domain: &ErpMappingRuleSet,
        updated_at: NaiveDateTime,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            id: domain.id.clone(),
            company_id: domain.company_id.clone(),
            name: domain.name.clone(),
            is_active: domain.is_active,
            field_rules: to_json_text(&domain.field_rules)?,
            updated_at,
        })
    }
}
