//! Client for the agency's JSON:API endpoints (`/stops`, `/vehicles`).

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::geo::Coordinate;
use crate::layout::Stop;
use crate::locator::{Direction, Vehicle};

pub const DEFAULT_API_URL: &str = "https://api-v3.mbta.com/";

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API url {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Status { url: Url, status: StatusCode },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

// JSON:API envelope
#[derive(Debug, Deserialize)]
struct Document<T> {
    data: Vec<Resource<T>>,
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    id: String,
    attributes: T,
}

#[derive(Debug, Deserialize)]
struct StopAttributes {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct VehicleAttributes {
    label: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    direction_id: Option<u8>,
    current_status: Option<String>,
    current_stop_sequence: Option<u32>,
    bearing: Option<f64>,
    updated_at: Option<DateTime<FixedOffset>>,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ApiClient {
    /// Requests taking longer than `timeout` fail the cycle.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let mut base_url = parse_url(base_url, None)?;
        // Endpoints are joined onto the base, which would replace a last
        // segment without a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url,
            api_key,
        })
    }

    /// `{base}{endpoint}?filter[route]={route}`
    pub fn build_api_url(&self, endpoint: &str, route: Option<&str>) -> Result<Url, ApiError> {
        let mut url = parse_url(endpoint, Some(&self.base_url))?;
        if let Some(route) = route {
            url.query_pairs_mut().append_pair("filter[route]", route);
        }
        Ok(url)
    }

    async fn call_api(&self, url: Url) -> Result<String, ApiError> {
        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { url, status });
        }
        let body = response.text().await?;
        log::debug!("API response from {}: {}", url, body);
        Ok(body)
    }

    /// Stops served by `route`, in the order the agency lists them.
    pub async fn fetch_stops(&self, route: &str) -> Result<Vec<Stop>, ApiError> {
        let url = self.build_api_url("stops", Some(route))?;
        let body = self.call_api(url).await?;
        parse_stops(&body)
    }

    pub async fn fetch_vehicles(&self, route: &str) -> Result<Vec<Vehicle>, ApiError> {
        let url = self.build_api_url("vehicles", Some(route))?;
        let body = self.call_api(url).await?;
        parse_vehicles(&body)
    }
}

fn parse_url(input: &str, base: Option<&Url>) -> Result<Url, ApiError> {
    let parsed = match base {
        Some(base) => base.join(input),
        None => Url::parse(input),
    };
    parsed.map_err(|e| ApiError::Url {
        url: input.to_string(),
        reason: e.to_string(),
    })
}

pub fn parse_stops(body: &str) -> Result<Vec<Stop>, ApiError> {
    let document: Document<StopAttributes> = serde_json::from_str(body)?;
    Ok(document
        .data
        .into_iter()
        .enumerate()
        .map(|(source_order, resource)| {
            let attrs = resource.attributes;
            Stop::new(
                resource.id,
                attrs.name,
                Coordinate::new(attrs.latitude, attrs.longitude),
                source_order,
            )
        })
        .collect())
}

/// Vehicles without a reported position are dropped.
pub fn parse_vehicles(body: &str) -> Result<Vec<Vehicle>, ApiError> {
    let document: Document<VehicleAttributes> = serde_json::from_str(body)?;
    let mut vehicles = Vec::with_capacity(document.data.len());

    for resource in document.data {
        let attrs = resource.attributes;
        let (Some(latitude), Some(longitude)) = (attrs.latitude, attrs.longitude) else {
            log::warn!("Vehicle {} has no position, skipping", resource.id);
            continue;
        };

        vehicles.push(Vehicle {
            id: attrs.label.unwrap_or(resource.id),
            coordinate: Coordinate::new(latitude, longitude),
            direction: Direction::from_direction_id(attrs.direction_id),
            status: attrs.current_status.unwrap_or_default(),
            stop_sequence: attrs.current_stop_sequence,
            bearing: attrs.bearing,
            updated_at: attrs.updated_at,
        });
    }

    Ok(vehicles)
}
