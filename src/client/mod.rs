//! REST client for the campaign server.
//!
//! Queries are unauthenticated GETs under `/query`. Each call is issued once:
//! there is no retry, no backoff and no timeout beyond reqwest's defaults.
//! Callers decide what a failure means; the dashboard logs it and leaves the
//! affected section empty.

pub mod admin;
mod error;

pub use admin::{AdminClient, BanDuration, ControlOutcome};
pub use error::{ClientError, Result};

use crate::model::{
    pilot::PilotFilter, DateTime, Online, Pilot, PilotWithMissions, Player, SimulationStep,
    ValueOf, WarState, World,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

/// Decode a response body with simd-json.
pub fn decode<T: DeserializeOwned>(mut body: Vec<u8>) -> Result<T> {
    Ok(simd_json::serde::from_slice(&mut body)?)
}

/// Base URL extended with percent-encoded path segments.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| ClientError::Parse(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::Parse(format!("{} cannot carry a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Fail with the body text on any non-success status.
pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp)
}

/// The four queries the map and timeline are built from.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn world(&self) -> Result<World>;
    async fn dates(&self) -> Result<Vec<DateTime>>;
    async fn state(&self, day: usize) -> Result<WarState>;
    async fn simulation_steps(&self, day: usize) -> Result<Vec<SimulationStep>>;
}

/// Which route serves a day's war state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StateEndpoint {
    /// `/query/past/{day}`
    #[default]
    Past,
    /// `/query/state/{day}/summary`
    Summary,
}

pub struct WebDataSource {
    client: reqwest::Client,
    base_url: String,
    state_endpoint: StateEndpoint,
}

impl WebDataSource {
    pub fn new(base_url: impl Into<String>, state_endpoint: StateEndpoint) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            state_endpoint,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.base_url, segments)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "GET");
        let resp = self.client.get(url).send().await?;
        let resp = ensure_success(resp).await?;
        let body = resp.bytes().await?;
        decode(body.to_vec())
    }

    fn state_url(&self, day: usize) -> Result<Url> {
        let day = day.to_string();
        match self.state_endpoint {
            StateEndpoint::Past => self.url(&["query", "past", &day]),
            StateEndpoint::Summary => self.url(&["query", "state", &day, "summary"]),
        }
    }

    /// Supply flow into a region computed by the server, in m³/h.
    pub async fn region_supplies(&self, day: usize, region: &str) -> Result<f64> {
        let day = day.to_string();
        self.get(self.url(&["query", "state", &day, "regions", region, "supplies"])?)
            .await
    }

    pub async fn region_capacity(&self, day: usize, region: &str) -> Result<f64> {
        let day = day.to_string();
        self.get(self.url(&["query", "state", &day, "regions", region, "capacity"])?)
            .await
    }

    pub async fn airfield_capacity(&self, day: usize, airfield: &str) -> Result<f64> {
        let day = day.to_string();
        self.get(self.url(&["query", "state", &day, "airfields", airfield, "capacity"])?)
            .await
    }

    /// Road transport capacity between two regions.
    pub async fn land_transport(&self, day: usize, region_a: &str, region_b: &str) -> Result<f64> {
        let day = day.to_string();
        self.get(self.url(&["query", "state", &day, "transport", region_a, region_b, "land"])?)
            .await
    }

    fn pilots_request(&self, filter: &PilotFilter) -> Result<reqwest::Request> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(health) = filter.health {
            params.push(("health", health.as_str()));
        }
        if let Some(coalition) = &filter.coalition {
            params.push(("coalition", coalition));
        }
        if let Some(country) = &filter.country {
            params.push(("country", country));
        }
        if let Some(name) = &filter.name {
            params.push(("name", name));
        }
        let mut builder = self.client.get(self.url(&["query", "pilots"])?);
        if !params.is_empty() {
            builder = builder.query(&params);
        }
        Ok(builder.build()?)
    }

    pub async fn pilots(&self, filter: &PilotFilter) -> Result<Vec<Pilot>> {
        let request = self.pilots_request(filter)?;
        tracing::debug!(url = %request.url(), "GET");
        let resp = ensure_success(self.client.execute(request).await?).await?;
        decode(resp.bytes().await?.to_vec())
    }

    pub async fn players(&self, name: Option<&str>) -> Result<Vec<Player>> {
        let mut url = self.url(&["query", "players"])?;
        if let Some(name) = name {
            url.query_pairs_mut().append_pair("name", name);
        }
        self.get(url).await
    }

    pub async fn pilot(&self, id: &str) -> Result<PilotWithMissions> {
        self.get(self.url(&["query", "pilot", id])?).await
    }

    pub async fn online(&self) -> Result<Online> {
        self.get(self.url(&["query", "online"])?).await
    }

    pub async fn scenarios(&self) -> Result<Vec<String>> {
        self.get(self.url(&["query", "scenarios"])?).await
    }

    /// Synchronization status line of the campaign server.
    pub async fn sync_state(&self) -> Result<String> {
        let status: ValueOf<String> = self.get(self.url(&["query", "sync", "state"])?).await?;
        Ok(status.value)
    }
}

#[async_trait]
impl DataSource for WebDataSource {
    async fn world(&self) -> Result<World> {
        self.get(self.url(&["query", "world"])?).await
    }

    async fn dates(&self) -> Result<Vec<DateTime>> {
        self.get(self.url(&["query", "dates"])?).await
    }

    async fn state(&self, day: usize) -> Result<WarState> {
        self.get(self.state_url(day)?).await
    }

    async fn simulation_steps(&self, day: usize) -> Result<Vec<SimulationStep>> {
        self.get(self.url(&["query", "simulation", &day.to_string()])?)
            .await
    }
}


/// In-memory source for tests. Missing days answer 404.
#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashMap;

    pub struct MemorySource {
        pub world: World,
        pub dates: Vec<DateTime>,
        pub states: HashMap<usize, WarState>,
        pub logs: HashMap<usize, Vec<SimulationStep>>,
    }

    fn not_found(what: &str, day: usize) -> ClientError {
        ClientError::Api {
            status: 404,
            message: format!("no {} for day {}", what, day),
        }
    }

    #[async_trait]
    impl DataSource for MemorySource {
        async fn world(&self) -> Result<World> {
            Ok(self.world.clone())
        }

        async fn dates(&self) -> Result<Vec<DateTime>> {
            Ok(self.dates.clone())
        }

        async fn state(&self, day: usize) -> Result<WarState> {
            self.states.get(&day).cloned().ok_or_else(|| not_found("state", day))
        }

        async fn simulation_steps(&self, day: usize) -> Result<Vec<SimulationStep>> {
            self.logs.get(&day).cloned().ok_or_else(|| not_found("log", day))
        }
    }
}
