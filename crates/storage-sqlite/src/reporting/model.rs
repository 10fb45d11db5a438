//! Database models for reporting.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::StorageError;
use crate::utils::{
    decimal_to_text, optional_decimal_to_text, parse_decimal, parse_json_or_default,
    parse_optional_decimal, to_json_text,
};
use royalty_core::reporting::{
    CalculationLineItem, DimensionConfig, DimensionKind, FeeCalculation, NewCalculationLineItem,
    NewDimensionConfig, NewFeeCalculation, Vendor,
};

#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::fee_calculations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculationDB {
    pub id: String,
    pub contract_id: String,
    pub company_id: String,
    pub total_sales: String,
    pub total_fee: String,
    pub minimum_guarantee: Option<String>,
    pub final_fee: String,
    pub transaction_count: i64,
    pub breakdown_json: Option<String>,
    pub line_items_materialized: bool,
    pub created_at: NaiveDateTime,
}

#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::calculation_line_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CalculationLineItemDB {
    pub id: String,
    pub calculation_id: String,
    pub position: i32,
    pub transaction_id: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub vendor_name: Option<String>,
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub territory: Option<String>,
    pub period: Option<String>,
    pub rule_id: Option<String>,
    pub rule_name: Option<String>,
    pub quantity: String,
    pub sales_amount: String,
    pub fee_amount: String,
    pub rate: Option<String>,
    pub dimensions: String,
}

/// One line item projected onto the requested dimension.
#[derive(QueryableByName, Debug, Clone)]
pub struct GroupedLineItemDB {
    #[diesel(sql_type = Nullable<Text>)]
    pub dimension_value: Option<String>,
    #[diesel(sql_type = Text)]
    pub quantity: String,
    #[diesel(sql_type = Text)]
    pub sales_amount: String,
    #[diesel(sql_type = Text)]
    pub fee_amount: String,
}

#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::vendors)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct VendorDB {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::dimension_configs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct DimensionConfigDB {
    pub id: String,
    pub contract_id: String,
    pub dimension_key: String,
    pub display_name: String,
    pub dimension_type: String,
    pub erp_field_name: Option<String>,
    pub is_groupable: bool,
    pub sort_order: i32,
}

impl TryFrom<FeeCalculationDB> for FeeCalculation {
    type Error = StorageError;

    fn try_from(db: FeeCalculationDB) -> Result<Self, StorageError> {
        Ok(Self {
            total_sales: parse_decimal(&db.total_sales, "total_sales")?,
            total_fee: parse_decimal(&db.total_fee, "total_fee")?,
            minimum_guarantee: db
                .minimum_guarantee
                .as_deref()
                .map(|raw| parse_decimal(raw, "minimum_guarantee"))
                .transpose()?,
            final_fee: parse_decimal(&db.final_fee, "final_fee")?,
            id: db.id,
            contract_id: db.contract_id,
            company_id: db.company_id,
            transaction_count: db.transaction_count,
            breakdown_json: db.breakdown_json,
            line_items_materialized: db.line_items_materialized,
            created_at: db.created_at,
        })
    }
}

impl FeeCalculationDB {
    pub fn from_domain(domain: NewFeeCalculation, id: String, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            contract_id: domain.contract_id,
            company_id: domain.company_id,
            total_sales: decimal_to_text(domain.total_sales),
            total_fee: decimal_to_text(domain.total_fee),
            minimum_guarantee: optional_decimal_to_text(domain.minimum_guarantee),
            final_fee: decimal_to_text(domain.final_fee),
            transaction_count: domain.transaction_count,
            breakdown_json: domain.breakdown_json,
            line_items_materialized: true,
            created_at,
        }
    }
}

impl TryFrom<CalculationLineItemDB> for CalculationLineItem {
    type Error = StorageError;

    fn try_from(db: CalculationLineItemDB) -> Result<Self, StorageError> {
        Ok(Self {
            quantity: parse_decimal(&db.quantity, "quantity")?,
            sales_amount: parse_decimal(&db.sales_amount, "sales_amount")?,
            fee_amount: parse_decimal(&db.fee_amount, "fee_amount")?,
            rate: parse_optional_decimal(db.rate.as_deref(), "rate"),
            dimensions: parse_json_or_default::<BTreeMap<String, String>>(
                &db.dimensions,
                "dimensions",
            ),
            id: db.id,
            calculation_id: db.calculation_id,
            transaction_id: db.transaction_id,
            transaction_date: db.transaction_date,
            vendor_name: db.vendor_name,
            item_name: db.item_name,
            category: db.category,
            territory: db.territory,
            period: db.period,
            rule_id: db.rule_id,
            rule_name: db.rule_name,
        })
    }
}

impl CalculationLineItemDB {
    pub fn from_domain(
        domain: NewCalculationLineItem,
        id: String,
        calculation_id: &str,
        position: i32,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            id,
            calculation_id: calculation_id.to_string(),
            position,
            transaction_id: domain.transaction_id,
            transaction_date: domain.transaction_date,
            vendor_name: domain.vendor_name,
            item_name: domain.item_name,
            category: domain.category,
            territory: domain.territory,
            period: domain.period,
            rule_id: domain.rule_id,
            rule_name: domain.rule_name,
            quantity: decimal_to_text(domain.quantity),
            sales_amount: decimal_to_text(domain.sales_amount),
            fee_amount: decimal_to_text(domain.fee_amount),
            rate: optional_decimal_to_text(domain.rate),
            dimensions: to_json_text(&domain.dimensions)?,
        })
    }
}

impl From<VendorDB> for Vendor {
    fn from(db: VendorDB) -> Self {
        Self {
            id: db.id,
            company_id: db.company_id,
            name: db.name,
            is_active: db.is_active,
        }
    }
}

impl From<DimensionConfigDB> for DimensionConfig {
    fn from(db: DimensionConfigDB) -> Self {
        Self {
            dimension_type: DimensionKind::parse(&db.dimension_type),
            id: db.id,
            contract_id: db.contract_id,
            dimension_key: db.dimension_key,
            display_name: db.display_name,
            erp_field_name: db.erp_field_name,
            is_groupable: db.is_groupable,
            sort_order: db.sort_order,
        }
    }
}

impl DimensionConfigDB {
    pub fn from_domain(domain: NewDimensionConfig, id: String) -> Self {
        Self {
            id,
            contract_id: domain.contract_id,
            dimension_key: domain.dimension_key,
            display_name: domain.display_name,
            dimension_type: domain.dimension_type.as_str().to_string(),
            erp_field_name: domain.erp_field_name,
            is_groupable: domain.is_groupable,
            sort_order: domain.sort_order,
        }
    }
}
