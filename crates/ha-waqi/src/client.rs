//! WAQI station directory client interface
//!
//! The HTTP client is provided by the host. The flows only see these traits:
//! a factory standing in for "construct a client with this token on the
//! shared HTTP session", and the two calls the flows make.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::WaqiError;

/// One hit of a station search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Station id
    #[serde(deserialize_with = "station_uid")]
    pub uid: String,
    pub station: Station,
}

/// Station details as returned by the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    /// `[latitude, longitude]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geo: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Current readings of a single station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(alias = "idx", deserialize_with = "station_uid")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<Station>,
}

/// The API reports station ids as numbers; config entries key them as strings.
fn station_uid<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Uid {
        Number(i64),
        Text(String),
    }

    Ok(match Uid::deserialize(deserializer)? {
        Uid::Number(n) => n.to_string(),
        Uid::Text(s) => s,
    })
}

/// Calls the flows make against the WAQI API
#[async_trait]
pub trait WaqiClient: Send + Sync {
    /// Search stations by city or area name
    async fn search(&self, keyword: &str) -> Result<Vec<SearchResult>, WaqiError>;

    /// Fetch the feed of one station; `None` when the station has no feed
    async fn feed(&self, station_id: &str) -> Result<Option<Feed>, WaqiError>;
}

/// Builds a client authenticated with the given API token
pub trait WaqiClientFactory: Send + Sync {
    fn create(&self, api_token: &str) -> Box<dyn WaqiClient>;
}
