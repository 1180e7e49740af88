//! Geolocation audit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coordinates recorded for an audited user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub id: i32,
    pub user_id: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub action: String,
    pub recorded_at: DateTime<Utc>,
}
