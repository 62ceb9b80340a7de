use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Map;
use std::time::Duration;

use crate::collect::global_variables::{
    OVERPASS_URL, QUERY_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS, USER_AGENT,
};
use crate::geo_core::BoundingBox;

/// One point of a way's inline geometry, or a way's computed center.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

/// One element of an Overpass response. Nodes carry `lat`/`lon`, ways carry
/// either an inline `geometry` (from `out geom`) or a `center` (from
/// `out center`).
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: Map<String, serde_json::Value>,
    pub geometry: Option<Vec<LonLat>>,
    pub center: Option<LonLat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// Base struct for Overpass API data collection
/// Builds query envelopes, submits them to the interpreter endpoint and
/// holds the decoded response.
pub struct OsmCollect {
    pub content: Option<OverpassResponse>,
    pub bbox: BoundingBox,
    endpoint: String,
    client: Client,
}

impl OsmCollect {
    pub fn new(bbox: BoundingBox) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(OsmCollect {
            content: None,
            bbox,
            endpoint: OVERPASS_URL.to_string(),
            client,
        })
    }

    /// Wrap a set of Overpass QL statements into a full query with the JSON
    /// output header and the configured server-side timeout.
    pub fn build_query(statements: &str, out: &str) -> String {
        format!(
            "[out:json][timeout:{}];\n(\n{});\nout {};",
            QUERY_TIMEOUT_SECS, statements, out
        )
    }

    /// Submit one query to the interpreter as a blocking POST and decode the
    /// JSON response into `self.content`.
    pub fn execute(&mut self, query: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .context("Failed to send query to Overpass API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Overpass API returned error {}: {}", status, body);
        }

        let decoded: OverpassResponse = response
            .json()
            .context("Failed to decode Overpass API response")?;

        self.content = Some(decoded);
        Ok(())
    }
}
