//! One-shot location detection
//!
//! A terminal has no device geolocation, so detection asks an IP geolocation
//! service for approximate coordinates. Failure is never surfaced to the user;
//! the caller logs it and keeps the default location.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GuideError, Result};
use crate::state::Coordinates;

pub const IP_LOOKUP_URL: &str = "http://ip-api.com/json";

#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates>;
}

#[derive(Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpLookupResponse {
    fn into_coordinates(self) -> Result<Coordinates> {
        if self.status != "success" {
            return Err(GuideError::Location(
                self.message.unwrap_or_else(|| self.status.clone()),
            ));
        }
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(GuideError::Location("response had no coordinates".to_string())),
        }
    }
}

#[derive(Clone)]
pub struct IpLocator {
    client: Client,
    url: String,
}

impl IpLocator {
    pub fn new() -> Self {
        Self::with_url(IP_LOOKUP_URL)
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Locator for IpLocator {
    async fn locate(&self) -> Result<Coordinates> {
        debug!(url = %self.url, "Looking up location");

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(GuideError::Location(format!(
                "lookup returned status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response.json().await?;
        body.into_coordinates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> IpLookupResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_success_yields_coordinates() {
        let coords = decode(r#"{"status":"success","lat":38.72,"lon":-9.14,"city":"Lisbon"}"#)
            .into_coordinates()
            .unwrap();
        assert_eq!(coords.latitude, 38.72);
        assert_eq!(coords.longitude, -9.14);
    }

    #[test]
    fn test_fail_status_is_error() {
        let err = decode(r#"{"status":"fail","message":"private range"}"#)
            .into_coordinates()
            .unwrap_err();
        assert!(err.to_string().contains("private range"));
    }

    #[test]
    fn test_missing_coordinates_is_error() {
        assert!(decode(r#"{"status":"success"}"#).into_coordinates().is_err());
    }
}
