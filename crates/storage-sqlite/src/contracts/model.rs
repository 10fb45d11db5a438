//! Database models for contracts.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use royalty_core::contracts::{Contract, NewContract};

#[derive(Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ContractDB {
    pub id: String,
    pub company_id: Option<String>,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::contracts)]
#[serde(rename_all = "camelCase")]
pub struct NewContractDB {
    pub id: String,
    pub company_id: Option<String>,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl From<ContractDB> for Contract {
    fn from(db: ContractDB) -> Self {
        Self {
            id: db.id,
            company_id: db.company_id,
            name: db.name,
            created_at: db.created_at,
        }
    }
}

impl NewContractDB {
    pub fn from_domain(domain: NewContract, id: String, created_at: NaiveDateTime) -> Self {
        Self {
            id: domain.id.unwrap_or(id),
            company_id: domain.company_id,
            name: domain.name,
            created_at,
        }
    }
}
