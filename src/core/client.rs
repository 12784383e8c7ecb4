//! Route acquisition against an OSRM-style routing engine
//!
//! Issues one route request per (home, resort) pair with bounded
//! concurrency and per-resort retries. A resort whose request keeps failing
//! is skipped, logged and counted; it never fails the run as long as other
//! resorts succeed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use log::{debug, warn};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::core::geo::haversine_m;
use crate::core::model::{Home, Resort};
use crate::core::store::RouteRecord;

/// Attempts per resort, first try included
const MAX_ATTEMPTS: u32 = 4;

/// Backoff base; attempt n sleeps n × this before the next try
const RETRY_DELAY_MS: u64 = 350;

/// Global HTTP client with connection pooling and timeouts
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(20)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("resort-routes/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Progress callback: (completed resorts, total resorts)
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Options for an acquisition run
pub struct AcquireOptions {
    /// Maximum in-flight route requests
    pub concurrency: usize,

    /// Optional Authorization header value for the routing engine
    pub api_key: Option<String>,

    /// Optional progress callback
    pub progress: Option<ProgressCallback>,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            concurrency: 6,
            api_key: None,
            progress: None,
        }
    }
}

/// Final per-run acquisition counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireSummary {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<EngineRoute>,
}

#[derive(Deserialize)]
struct EngineRoute {
    geometry: EngineGeometry,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Deserialize)]
struct EngineGeometry {
    #[serde(default)]
    coordinates: Vec<Vec<f64>>,
}

/// Build the OSRM-style route request URL for one pair
fn route_url(base: &str, home: &Home, resort: &Resort) -> String {
    format!(
        "{}/route/v1/driving/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson&alternatives=false",
        base.trim_end_matches('/'),
        home.lon,
        home.lat,
        resort.lon,
        resort.lat
    )
}

/// Clamp the requested concurrency to the work and the machine
fn effective_concurrency(requested: usize, resorts: usize) -> usize {
    requested
        .max(1)
        .min(resorts.max(1))
        .min(num_cpus::get() * 2)
}

/// One request attempt; any failure mode is an Err the retry loop handles
async fn request_route(
    base: &str,
    api_key: Option<&str>,
    home: &Home,
    resort: &Resort,
) -> Result<RouteRecord> {
    let url = route_url(base, home, resort);
    let mut request = GLOBAL_CLIENT.get(&url);
    if let Some(key) = api_key {
        request = request.header("Authorization", key);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(Error::HttpError(format!(
            "routing engine answered {} for '{}'",
            response.status(),
            resort.key()
        )));
    }

    let body: RouteResponse = response.json().await.map_err(|e| {
        Error::HttpError(format!(
            "undecodable routing response for '{}': {e}",
            resort.key()
        ))
    })?;

    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoRoute(format!("no candidate route for '{}'", resort.key())))?;

    let geometry: Vec<(f64, f64)> = route
        .geometry
        .coordinates
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect();
    if geometry.len() < 2 {
        return Err(Error::NoRoute(format!(
            "route for '{}' has no usable geometry",
            resort.key()
        )));
    }

    // A route without a numeric distance still has a polyline to measure
    let distance_m = route
        .distance
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or_else(|| geometry.windows(2).map(|p| haversine_m(p[0], p[1])).sum());
    let duration_sec = route.duration.filter(|d| d.is_finite() && *d >= 0.0);

    Ok(RouteRecord {
        home_id: home.id.clone(),
        resort_id: resort.key().to_string(),
        name: resort.name.clone(),
        geometry,
        duration_sec,
        distance_m,
    })
}

/// Request one route with the full retry budget
async fn fetch_with_retry(
    base: &str,
    api_key: Option<&str>,
    home: &Home,
    resort: &Resort,
) -> Result<RouteRecord> {
    let mut attempt = 1;

    loop {
        match request_route(base, api_key, home, resort).await {
            Ok(record) => return Ok(record),
            Err(e) if attempt < MAX_ATTEMPTS => {
                let delay = Duration::from_millis(RETRY_DELAY_MS * attempt as u64);
                debug!(
                    "attempt {attempt}/{MAX_ATTEMPTS} for '{}' failed: {e}; retrying in {delay:?}",
                    resort.key()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Acquire routes from one home to every resort
///
/// Completion order is non-deterministic; the returned records are sorted by
/// resort key so downstream output never depends on it. A run in which every
/// resort fails is an error, since there is nothing to store.
pub async fn acquire_routes(
    base: &str,
    home: &Home,
    resorts: &[Resort],
    options: &AcquireOptions,
) -> Result<(Vec<RouteRecord>, AcquireSummary)> {
    let concurrency = effective_concurrency(options.concurrency, resorts.len());
    let total = resorts.len() as u64;
    let completed = AtomicU64::new(0);
    let api_key = options.api_key.as_deref();

    let outcomes: Vec<Option<RouteRecord>> = futures::stream::iter(resorts.iter().map(|resort| {
        let completed = &completed;
        let progress = &options.progress;
        async move {
            let outcome = match fetch_with_retry(base, api_key, home, resort).await {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("skipping resort '{}': {e}", resort.key());
                    None
                }
            };
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(cb) = progress {
                cb(done, total);
            }
            outcome
        }
    }))
    .buffer_unordered(concurrency)
    .collect()
    .await;

    let mut records: Vec<RouteRecord> = outcomes.into_iter().flatten().collect();
    records.sort_by(|a, b| a.resort_id.cmp(&b.resort_id));

    let summary = AcquireSummary {
        succeeded: records.len(),
        failed: resorts.len() - records.len(),
    };

    if records.is_empty() && !resorts.is_empty() {
        return Err(Error::NoRoute(format!(
            "all {} route requests failed",
            resorts.len()
        )));
    }

    Ok((records, summary))
}
