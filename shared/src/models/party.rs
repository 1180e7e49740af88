//! Counterparty models: suppliers feed inbound movements, clients receive
//! outbound ones

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input shared by supplier and client creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParty {
    pub name: String,
    pub phone: String,
    pub contact: Option<String>,
}

/// Validated partial update shared by suppliers and clients
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub contact: Option<String>,
}

impl PartyChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.contact.is_none()
    }
}
