//! Database model for company calculation settings.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::company_settings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CompanySettingDB {
    pub company_id: String,
    pub calculation_approach: String,
    pub updated_at: NaiveDateTime,
}
