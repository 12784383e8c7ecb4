//! # resort-routes
//!
//! Batch pipeline that precomputes driving routes from a named home point to
//! several hundred ski resorts and derives two artifacts from the route set:
//!
//! - a flat per-resort travel-time table (`travel_times_<home>.json`), and
//! - a usage-weighted corridor graph (`corridors_<home>.geojson`) showing
//!   which road segments are shared by many routes, annotated with how far
//!   along the routes (in travel time) each segment lies.
//!
//! The acquired routes themselves persist as a GeoJSON route store
//! (`routes_<home>.geojson`); re-running the pipeline reuses an existing
//! store unless forced to refetch.
//!
//! ## Basic usage
//!
//! ```rust,no_run
//! use resort_routes::{run_pipeline, Home, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig {
//!         home: Home {
//!             id: "muc".into(),
//!             name: "Munich".into(),
//!             lat: 48.137,
//!             lon: 11.575,
//!         },
//!         resorts_path: "resorts.json".into(),
//!         routing_base: "http://localhost:5000".into(),
//!         out_dir: "data".into(),
//!         ..Default::default()
//!     };
//!     let report = run_pipeline(config).await?;
//!     eprintln!("{} routed, {} skipped", report.succeeded, report.failed);
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use log::info;

// Re-export the types users of the library need
pub use crate::core::client::{AcquireOptions, AcquireSummary, ProgressCallback};
pub use crate::core::corridor::{CorridorConfig, CorridorEdge, CorridorGraph};
pub use crate::core::error::{Error, Result};
pub use crate::core::model::{
    load_homes, load_resorts, parse_origin, select_home, Home, HomeSpec, Resort,
};
pub use crate::core::store::RouteRecord;
pub use crate::core::travel_time::TravelTime;

mod core;

use crate::core::{client, corridor, store, travel_time};

/// Everything one pipeline run needs, passed explicitly
pub struct PipelineConfig {
    /// Origin to route from
    pub home: Home,
    /// Path to the resorts JSON file
    pub resorts_path: PathBuf,
    /// Base URL of the OSRM-style routing engine
    pub routing_base: String,
    /// Output directory for the three generated files
    pub out_dir: PathBuf,
    /// Refetch routes even when the store file already exists
    pub force: bool,
    pub acquire: AcquireOptions,
    pub corridor: CorridorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            home: Home {
                id: String::new(),
                name: String::new(),
                lat: 0.0,
                lon: 0.0,
            },
            resorts_path: PathBuf::new(),
            routing_base: "http://localhost:5000".to_string(),
            out_dir: PathBuf::from("data"),
            force: false,
            acquire: AcquireOptions::default(),
            corridor: CorridorConfig::default(),
        }
    }
}

/// What one pipeline run did
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub home_id: String,
    pub resorts: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub corridor_edges: usize,
    /// True when an existing route store was read instead of refetched
    pub reused_store: bool,
}

/// Path of the route store for a home under the output directory
pub fn store_path(out_dir: &std::path::Path, home_id: &str) -> PathBuf {
    out_dir.join(format!("routes_{home_id}.geojson"))
}

/// Run the full pipeline for one home: acquire (or reuse) the route store,
/// extract the travel-time table, aggregate the corridor graph
pub async fn run_pipeline(config: PipelineConfig) -> Result<PipelineReport> {
    crate::core::model::validate_coord(
        &format!("home '{}'", config.home.id),
        config.home.lat,
        config.home.lon,
    )?;
    let resorts = load_resorts(&config.resorts_path)?;

    let routes_path = store_path(&config.out_dir, &config.home.id);
    std::fs::create_dir_all(&config.out_dir)?;

    let (records, summary, reused_store) = if routes_path.exists() && !config.force {
        info!(
            "route store {} exists, reusing it (pass --force to refetch)",
            routes_path.display()
        );
        let records = store::read_store(&routes_path)?;
        let summary = AcquireSummary {
            succeeded: records.len(),
            failed: 0,
        };
        (records, summary, true)
    } else {
        info!(
            "routing {} resorts from '{}' via {}",
            resorts.len(),
            config.home.name,
            config.routing_base
        );
        let (records, summary) = client::acquire_routes(
            &config.routing_base,
            &config.home,
            &resorts,
            &config.acquire,
        )
        .await?;
        store::write_store(&records, &routes_path)?;
        info!(
            "route store written: {} ({} routed, {} skipped)",
            routes_path.display(),
            summary.succeeded,
            summary.failed
        );
        (records, summary, false)
    };

    let table = travel_time::extract(&records);
    let table_path = config
        .out_dir
        .join(format!("travel_times_{}.json", config.home.id));
    travel_time::write_table(&table, &table_path)?;
    info!("travel-time table written: {}", table_path.display());

    let graph = corridor::aggregate(&records, &config.corridor);
    let corridors_path = config
        .out_dir
        .join(format!("corridors_{}.geojson", config.home.id));
    corridor::write_geojson(&graph, &corridors_path)?;
    info!(
        "corridor graph written: {} ({} edges from {} routes)",
        corridors_path.display(),
        graph.edges.len(),
        graph.source_routes
    );

    Ok(PipelineReport {
        home_id: config.home.id,
        resorts: resorts.len(),
        succeeded: summary.succeeded,
        failed: summary.failed,
        corridor_edges: graph.edges.len(),
        reused_store,
    })
}
