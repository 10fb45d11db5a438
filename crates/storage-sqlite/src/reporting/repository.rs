use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use uuid::Uuid;

use super::model::{
    CalculationLineItemDB, DimensionConfigDB, FeeCalculationDB, GroupedLineItemDB, VendorDB,
};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{calculation_line_items, dimension_configs, fee_calculations, vendors};
use crate::utils::parse_decimal;
use royalty_core::errors::{DatabaseError, Error, Result};
use royalty_core::reporting::{
    CalculationLineItem, DimensionConfig, DimensionKey, FeeCalculation, LineItemGroupRow,
    NewCalculationLineItem, NewDimensionConfig, NewFeeCalculation, ReportingRepositoryTrait,
    Vendor,
};

pub struct ReportingRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ReportingRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ReportingRepository { pool, writer }
    }

    fn insert_line_items(
        conn: &mut SqliteConnection,
        calculation_id: &str,
        line_items: Vec<NewCalculationLineItem>,
    ) -> Result<usize> {
        let mut inserted = 0;
        for (position, item) in line_items.into_iter().enumerate() {
            let row = CalculationLineItemDB::from_domain(
                item,
                Uuid::new_v4().to_string(),
                calculation_id,
                position as i32,
            )?;
            inserted += diesel::insert_into(calculation_line_items::table)
                .values(&row)
                .execute(conn)
                .into_core()?;
        }
        Ok(inserted)
    }
}

/// Column expression a dimension groups on. Custom keys read the line item's
/// dimension map through a bound JSON path, never through the SQL text.
fn dimension_expression(dimension: &DimensionKey) -> &'static str {
    match dimension {
        DimensionKey::Vendor => "vendor_name",
        DimensionKey::Item => "item_name",
        DimensionKey::Category => "category",
        DimensionKey::Territory => "territory",
        DimensionKey::Period => "period",
        DimensionKey::Rule => "rule_name",
        DimensionKey::Custom(_) => "json_extract(dimensions, ?)",
    }
}

fn json_path(key: &str) -> String {
    format!("$.\"{}\"", key)
}

/// Sums projected line items per trimmed dimension value. Blank values join
/// the `None` group.
fn fold_groups(
    projected: Vec<GroupedLineItemDB>,
) -> std::result::Result<Vec<LineItemGroupRow>, StorageError> {
    let mut groups: BTreeMap<Option<String>, LineItemGroupRow> = BTreeMap::new();
    for item in projected {
        let value = item
            .dimension_value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let group = groups
            .entry(value.clone())
            .or_insert_with(|| LineItemGroupRow {
                dimension_value: value,
                total_sales: Decimal::ZERO,
                total_quantity: Decimal::ZERO,
                total_fee: Decimal::ZERO,
                transaction_count: 0,
            });
        group.total_sales += parse_decimal(&item.sales_amount, "sales_amount")?;
        group.total_quantity += parse_decimal(&item.quantity, "quantity")?;
        group.total_fee += parse_decimal(&item.fee_amount, "fee_amount")?;
        group.transaction_count += 1;
    }
    Ok(groups.into_values().collect())
}

#[async_trait]
impl ReportingRepositoryTrait for ReportingRepository {
    fn get_calculation(&self, calculation_id: &str) -> Result<Option<FeeCalculation>> {
        let mut conn = get_connection(&self.pool)?;
        let row = fee_calculations::table
            .find(calculation_id)
            .select(FeeCalculationDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(FeeCalculation::try_from).transpose()?)
    }

    fn count_line_items(&self, calculation_id: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        calculation_line_items::table
            .filter(calculation_line_items::calculation_id.eq(calculation_id))
            .count()
            .get_result(&mut conn)
            .into_core()
    }

    fn get_line_items(&self, calculation_id: &str) -> Result<Vec<CalculationLineItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = calculation_line_items::table
            .filter(calculation_line_items::calculation_id.eq(calculation_id))
            .order(calculation_line_items::position.asc())
            .select(CalculationLineItemDB::as_select())
            .load::<CalculationLineItemDB>(&mut conn)
            .into_core()?;
        rows.into_iter()
            .map(|row| CalculationLineItem::try_from(row).map_err(Error::from))
            .collect()
    }

    fn group_line_items(
        &self,
        calculation_id: &str,
        dimension: &DimensionKey,
    ) -> Result<Vec<LineItemGroupRow>> {
        let mut conn = get_connection(&self.pool)?;
        let sql = format!(
            "SELECT {} AS dimension_value, quantity, sales_amount, fee_amount \
             FROM calculation_line_items \
             WHERE calculation_id = ? \
             ORDER BY position",
            dimension_expression(dimension)
        );

        let mut query_builder = sql_query(sql).into_boxed::<Sqlite>();
        if let DimensionKey::Custom(key) = dimension {
            query_builder = query_builder.bind::<Text, _>(json_path(key));
        }
        query_builder = query_builder.bind::<Text, _>(calculation_id.to_string());

        let projected = query_builder
            .load::<GroupedLineItemDB>(&mut conn)
            .into_core()?;
        Ok(fold_groups(projected)?)
    }

    fn get_active_vendors(&self, company_id: &str) -> Result<Vec<Vendor>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = vendors::table
            .filter(vendors::company_id.eq(company_id))
            .filter(vendors::is_active.eq(true))
            .order(vendors::name.asc())
            .select(VendorDB::as_select())
            .load::<VendorDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Vendor::from).collect())
    }

    fn get_dimension_configs(&self, contract_id: &str) -> Result<Vec<DimensionConfig>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = dimension_configs::table
            .filter(dimension_configs::contract_id.eq(contract_id))
            .order((
                dimension_configs::sort_order.asc(),
                dimension_configs::dimension_key.asc(),
            ))
            .select(DimensionConfigDB::as_select())
            .load::<DimensionConfigDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(DimensionConfig::from).collect())
    }

    async fn create_calculation(
        &self,
        calculation: NewFeeCalculation,
        line_items: Vec<NewCalculationLineItem>,
    ) -> Result<FeeCalculation> {
        self.writer
            .exec(move |conn| {
                let row = FeeCalculationDB::from_domain(
                    calculation,
                    Uuid::new_v4().to_string(),
                    Utc::now().naive_utc(),
                );
                let stored = diesel::insert_into(fee_calculations::table)
                    .values(&row)
                    .returning(FeeCalculationDB::as_returning())
                    .get_result(conn)
                    .into_core()?;
                let inserted = Self::insert_line_items(conn, &stored.id, line_items)?;
                debug!("Stored calculation {} with {} line items", stored.id, inserted);
                Ok(FeeCalculation::try_from(stored)?)
            })
            .await
    }

    async fn backfill_line_items(
        &self,
        calculation_id: &str,
        line_items: Vec<NewCalculationLineItem>,
    ) -> Result<usize> {
        let calculation_id = calculation_id.to_string();
        self.writer
            .exec(move |conn| {
                let existing: i64 = calculation_line_items::table
                    .filter(calculation_line_items::calculation_id.eq(&calculation_id))
                    .count()
                    .get_result(conn)
                    .into_core()?;

                let inserted = if existing > 0 {
                    0
                } else {
                    Self::insert_line_items(conn, &calculation_id, line_items)?
                };

                let marked = diesel::update(fee_calculations::table.find(&calculation_id))
                    .set(fee_calculations::line_items_materialized.eq(true))
                    .execute(conn)
                    .into_core()?;
                if marked == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "Calculation {} not found",
                        calculation_id
                    ))));
                }
                Ok(inserted)
            })
            .await
    }

    /// Configs whose key already exists for the contract are skipped.
    async fn create_dimension_configs(
        &self,
        configs: Vec<NewDimensionConfig>,
    ) -> Result<Vec<DimensionConfig>> {
        self.writer
            .exec(move |conn| {
                let contract_ids: BTreeSet<String> =
                    configs.iter().map(|c| c.contract_id.clone()).collect();
                for config in configs {
                    let row = DimensionConfigDB::from_domain(config, Uuid::new_v4().to_string());
                    diesel::insert_into(dimension_configs::table)
                        .values(&row)
                        .on_conflict((
                            dimension_configs::contract_id,
                            dimension_configs::dimension_key,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .into_core()?;
                }

                let rows = dimension_configs::table
                    .filter(dimension_configs::contract_id.eq_any(contract_ids))
                    .order((
                        dimension_configs::contract_id.asc(),
                        dimension_configs::sort_order.asc(),
                    ))
                    .select(DimensionConfigDB::as_select())
                    .load::<DimensionConfigDB>(conn)
                    .into_core()?;
                Ok(rows.into_iter().map(DimensionConfig::from).collect())
            })
            .await
    }
}
