use async_trait::async_trait;
use serde::Deserialize;

use crate::models::service::TransportMode;
use crate::travel::{RoutingService, TravelError};

pub const DIRECTIONS_API_PATH: &str = "/directions/json";

pub struct DirectionsClientParams {
    pub base_url: String,
    pub api_key: String,
}

/// Google-Directions-compatible routing client.
pub struct DirectionsClient {
    params: DirectionsClientParams,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Deserialize)]
struct Route {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Deserialize)]
struct Leg {
    duration: TextValue,
}

#[derive(Deserialize)]
struct TextValue {
    /// Seconds.
    value: u64,
}

impl DirectionsClient {
    pub fn new(params: DirectionsClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }
}

pub fn api_mode(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Car => "driving",
        TransportMode::Bicycle => "bicycling",
        TransportMode::PublicTransit => "transit",
        TransportMode::Walking | TransportMode::None => "walking",
    }
}

#[async_trait]
impl RoutingService for DirectionsClient {
    async fn travel_minutes(
        &self,
        origin: &str,
        destination: &str,
        mode: TransportMode,
    ) -> Result<u32, TravelError> {
        let mut url = self.params.base_url.trim_end_matches('/').to_string();
        url.push_str(DIRECTIONS_API_PATH);

        let response: DirectionsResponse = self
            .client
            .get(url)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("mode", api_mode(mode)),
                ("departure_time", "now"),
                ("key", self.params.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            return Err(TravelError::Status(response.status));
        }

        let seconds = response
            .routes
            .first()
            .and_then(|route| route.legs.first())
            .map(|leg| leg.duration.value)
            .ok_or(TravelError::NoRoute)?;

        Ok(u32::try_from(seconds / 60).unwrap_or(u32::MAX))
    }
}
