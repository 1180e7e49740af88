//! IP geolocation client for an ip-api compatible service

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Geolocation API client
#[derive(Clone)]
pub struct GeoLocationClient {
    client: Client,
    base_url: String,
}

/// Coordinates resolved for an address
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

/// Raw lookup response; failed lookups carry no coordinates
#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl GeoLocationClient {
    pub fn new(base_url: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Configuration(format!("Failed to create geolocation client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve the coordinates of a public IP address
    pub async fn lookup(&self, ip: &str) -> AppResult<Coordinates> {
        let url = format!("{}/{}?fields=status,message,lat,lon", self.base_url, ip);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Geolocation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Geolocation API error: {}",
                response.status()
            )));
        }

        let data: LookupResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse geolocation response: {}", e))
        })?;

        coordinates_from(data)
    }
}

fn coordinates_from(data: LookupResponse) -> AppResult<Coordinates> {
    if data.status.as_deref() == Some("fail") {
        return Err(AppError::ExternalService(format!(
            "Geolocation lookup failed: {}",
            data.message.unwrap_or_default()
        )));
    }
    match (data.lat, data.lon) {
        (Some(latitude), Some(longitude)) => Ok(Coordinates {
            latitude,
            longitude,
        }),
        _ => Err(AppError::ExternalService(
            "Geolocation response has no coordinates".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_coordinates() {
        let data: LookupResponse =
            serde_json::from_str(r#"{"status":"success","lat":19.43,"lon":-99.13}"#).unwrap();
        let coords = coordinates_from(data).unwrap();
        assert_eq!(coords.latitude, 19.43);
        assert_eq!(coords.longitude, -99.13);
    }

    #[test]
    fn test_failed_lookup_is_an_error() {
        let data: LookupResponse =
            serde_json::from_str(r#"{"status":"fail","message":"private range"}"#).unwrap();
        assert!(coordinates_from(data).is_err());
    }
}
