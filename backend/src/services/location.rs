//! Geolocation audit trail for sign-in and password recovery
//!
//! Recording never blocks or fails the request that triggered it.

use axum::http::HeaderMap;
use shared::{LocationAction, UserLocation};
use sqlx::PgPool;
use std::net::IpAddr;

use crate::error::{AppError, AppResult};
use crate::external::GeoLocationClient;

#[derive(Clone)]
pub struct LocationRecorder {
    db: PgPool,
    geo: GeoLocationClient,
    fallback_ip: String,
}

/// Client address from the first `X-Forwarded-For` entry, else the peer
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

/// Address to look up; local and unknown clients use the probe address
fn lookup_target(ip: Option<IpAddr>, fallback_ip: &str) -> String {
    match ip {
        Some(ip) if !ip.is_loopback() && !ip.is_unspecified() => ip.to_string(),
        _ => fallback_ip.to_string(),
    }
}

impl LocationRecorder {
    pub fn new(db: PgPool, geo: GeoLocationClient, fallback_ip: String) -> Self {
        Self {
            db,
            geo,
            fallback_ip,
        }
    }

    /// Record the location of a user action in the background
    pub fn record(&self, user_id: i32, action: LocationAction, client_ip: Option<IpAddr>) {
        let recorder = self.clone();
        tokio::spawn(async move {
            if let Err(e) = recorder.record_now(user_id, action, client_ip).await {
                tracing::warn!(user_id, action = %action, "Location not recorded: {}", e);
            }
        });
    }

    pub async fn record_now(
        &self,
        user_id: i32,
        action: LocationAction,
        client_ip: Option<IpAddr>,
    ) -> AppResult<()> {
        let target = lookup_target(client_ip, &self.fallback_ip);
        let coordinates = match self.geo.lookup(&target).await {
            Ok(coordinates) => coordinates,
            Err(e) if target != self.fallback_ip => {
                tracing::debug!(ip = %target, "Lookup failed, retrying with fallback address: {}", e);
                self.geo.lookup(&self.fallback_ip).await?
            }
            Err(e) => return Err(e),
        };

        let action_id = sqlx::query_scalar::<_, i32>("SELECT id FROM actions_catalog WHERE name = $1")
            .bind(action.as_str())
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Action '{}'", action)))?;

        sqlx::query(
            r#"
            INSERT INTO user_locations (user_id, latitude, longitude, action_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(coordinates.latitude)
        .bind(coordinates.longitude)
        .bind(action_id)
        .execute(&self.db)
        .await
        .map_err(AppError::from_db)?;

        tracing::debug!(user_id, action = %action, "Location recorded");
        Ok(())
    }

    /// Recorded locations of a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<UserLocation>> {
        let locations = sqlx::query_as::<_, UserLocation>(
            r#"
            SELECT l.id, l.user_id, l.latitude, l.longitude, a.name AS action, l.recorded_at
            FROM user_locations l
            JOIN actions_catalog a ON a.id = l.action_id
            WHERE l.user_id = $1
            ORDER BY l.recorded_at DESC, l.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let direct: IpAddr = "10.0.0.2".parse().unwrap();
        assert_eq!(
            extract_client_ip(&headers, Some(direct)),
            Some("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let direct: IpAddr = "198.51.100.4".parse().unwrap();
        assert_eq!(extract_client_ip(&HeaderMap::new(), Some(direct)), Some(direct));
        assert_eq!(extract_client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_local_addresses_use_probe_address() {
        let fallback = "104.28.210.155";
        assert_eq!(lookup_target(Some("127.0.0.1".parse().unwrap()), fallback), fallback);
        assert_eq!(lookup_target(Some("::1".parse().unwrap()), fallback), fallback);
        assert_eq!(lookup_target(None, fallback), fallback);
        assert_eq!(
            lookup_target(Some("203.0.113.7".parse().unwrap()), fallback),
            "203.0.113.7"
        );
    }
}
