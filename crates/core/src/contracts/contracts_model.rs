use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A licensing contract. Only the fields the engine needs are modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub company_id: Option<String>,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl Contract {
    /// Owning company id, ignoring blank values.
    pub fn company(&self) -> Option<&str> {
        self.company_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub id: Option<String>,
    pub company_id: Option<String>,
    pub name: String,
}
