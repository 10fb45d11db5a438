use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{BlueprintDB, BlueprintDimensionDB, BlueprintGenerationDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{blueprint_dimensions, blueprint_generations, blueprints};
use crate::utils::chunk_for_sqlite;
use royalty_core::blueprints::{
    Blueprint, BlueprintGeneration, BlueprintRepositoryTrait, NewBlueprint,
};
use royalty_core::errors::Result;

pub struct BlueprintRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BlueprintRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        BlueprintRepository { pool, writer }
    }

    fn load_generation(
        conn: &mut SqliteConnection,
        contract_id: &str,
    ) -> Result<Option<BlueprintGenerationDB>> {
        blueprint_generations::table
            .find(contract_id)
            .select(BlueprintGenerationDB::as_select())
            .first(conn)
            .optional()
            .into_core()
    }
}

#[async_trait]
impl BlueprintRepositoryTrait for BlueprintRepository {
    fn get_blueprints(&self, contract_id: &str) -> Result<Vec<Blueprint>> {
        let mut conn = get_connection(&self.pool)?;
        let Some(current) = Self::load_generation(&mut conn, contract_id)? else {
            return Ok(Vec::new());
        };

        let rows = blueprints::table
            .filter(blueprints::contract_id.eq(contract_id))
            .filter(blueprints::generation.eq(current.generation))
            .order(blueprints::position.asc())
            .select(BlueprintDB::as_select())
            .load::<BlueprintDB>(&mut conn)
            .into_core()?;

        let mut dimension_rows = Vec::new();
        for chunk in chunk_for_sqlite(&rows) {
            let loaded = BlueprintDimensionDB::belonging_to(chunk)
                .order(blueprint_dimensions::position.asc())
                .select(BlueprintDimensionDB::as_select())
                .load::<BlueprintDimensionDB>(&mut conn)
                .into_core()?;
            dimension_rows.extend(loaded);
        }
        let grouped = dimension_rows.grouped_by(&rows);

        Ok(rows
            .into_iter()
            .zip(grouped)
            .filter_map(|(row, dims)| {
                let dimensions = dims
                    .into_iter()
                    .filter_map(BlueprintDimensionDB::into_domain)
                    .collect();
                row.into_domain(dimensions)
            })
            .collect())
    }

    fn get_latest_generation(&self, contract_id: &str) -> Result<Option<BlueprintGeneration>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(Self::load_generation(&mut conn, contract_id)?.map(BlueprintGeneration::from))
    }

    async fn replace_blueprints(
        &self,
        contract_id: &str,
        new_blueprints: Vec<NewBlueprint>,
    ) -> Result<BlueprintGeneration> {
        let contract_id = contract_id.to_string();
        self.writer
            .exec(move |conn| {
                let generation = Self::load_generation(conn, &contract_id)?
                    .map_or(1, |current| current.generation + 1);
                let now = Utc::now().naive_utc();

                let previous_ids = blueprints::table
                    .filter(blueprints::contract_id.eq(&contract_id))
                    .select(blueprints::id);
                diesel::delete(
                    blueprint_dimensions::table
                        .filter(blueprint_dimensions::blueprint_id.eq_any(previous_ids)),
                )
                .execute(conn)
                .into_core()?;
                let removed = diesel::delete(
                    blueprints::table.filter(blueprints::contract_id.eq(&contract_id)),
                )
                .execute(conn)
                .into_core()?;

                for (position, new_blueprint) in new_blueprints.iter().enumerate() {
                    let row = BlueprintDB::from_domain(
                        new_blueprint,
                        Uuid::new_v4().to_string(),
                        generation,
                        position as i32,
                        now,
                    )?;
                    diesel::insert_into(blueprints::table)
                        .values(&row)
                        .execute(conn)
                        .into_core()?;

                    for (i, dimension) in new_blueprint.dimensions.iter().cloned().enumerate() {
                        let dimension_row = BlueprintDimensionDB::from_domain(
                            dimension,
                            Uuid::new_v4().to_string(),
                            &row.id,
                            i as i32,
                        );
                        diesel::insert_into(blueprint_dimensions::table)
                            .values(&dimension_row)
                            .execute(conn)
                            .into_core()?;
                    }
                }

                let generation_row = BlueprintGenerationDB {
                    contract_id: contract_id.clone(),
                    generation,
                    blueprint_count: new_blueprints.len() as i32,
                    materialized_at: now,
                };
                diesel::replace_into(blueprint_generations::table)
                    .values(&generation_row)
                    .execute(conn)
                    .into_core()?;

                debug!(
                    "Replaced {} blueprints of contract {} with {} (generation {})",
                    removed,
                    contract_id,
                    new_blueprints.len(),
                    generation
                );
                Ok(BlueprintGeneration::from(generation_row))
            })
            .await
    }
}
