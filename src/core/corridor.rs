//! Corridor aggregation
//!
//! Quantizes every route's resampled path onto a uniform Web-Mercator grid
//! and folds the cell-adjacency steps of all routes into one undirected
//! weighted edge map. Edges crossed by enough distinct contributions form
//! the "corridors" a renderer can paint; everything else is noise and is
//! dropped at finalization. The output geometry is centroid-to-centroid,
//! a deliberately coarse approximation for visualization, not routing.

use std::collections::HashMap;
use std::path::Path;

use serde_json::json;

use crate::core::error::Result;
use crate::core::geo::{edge_key, GridCell};
use crate::core::resample::resample;
use crate::core::store::RouteRecord;

/// Tunables for the aggregation; passed explicitly, never ambient
#[derive(Debug, Clone, Copy)]
pub struct CorridorConfig {
    /// Resample step along each route, meters
    pub step_m: f64,
    /// Grid resolution, meters
    pub grid_m: f64,
    /// Minimum number of contributions for an edge to survive
    pub min_count: u32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            step_m: 500.0,
            grid_m: 800.0,
            min_count: 3,
        }
    }
}

/// An undirected edge between two adjacent grid cells
#[derive(Debug, Clone)]
pub struct CorridorEdge {
    pub a: GridCell,
    pub b: GridCell,
    pub count: u32,
    /// Minutes into the fastest route that crosses this edge; None when no
    /// contributing route carried a duration
    pub min_duration_min: Option<f64>,
    pub avg_duration_min: Option<f64>,
}

/// The finalized, filtered corridor graph plus summary metadata
#[derive(Debug)]
pub struct CorridorGraph {
    /// Sorted by min duration descending (furthest first); unknown-duration
    /// edges come before every known one
    pub edges: Vec<CorridorEdge>,
    pub source_routes: usize,
    pub max_count: u32,
    pub max_duration_min: Option<f64>,
    pub config: CorridorConfig,
}

#[derive(Default)]
struct EdgeAccum {
    count: u32,
    min_duration_min: Option<f64>,
    duration_samples: Vec<f64>,
}

/// Fold every route of a store into the corridor edge map and finalize it
pub fn aggregate(records: &[RouteRecord], config: &CorridorConfig) -> CorridorGraph {
    let mut accum: HashMap<(GridCell, GridCell), EdgeAccum> = HashMap::new();

    for record in records {
        let duration_min = record.duration_min().filter(|d| d.is_finite());
        let points = resample(&record.geometry, config.step_m);

        for pair in points.windows(2) {
            let cell_a = GridCell::of(pair[0].coord, config.grid_m);
            let cell_b = GridCell::of(pair[1].coord, config.grid_m);
            if cell_a == cell_b {
                // The sub-step stays inside one cell; no boundary crossed
                continue;
            }

            let entry = accum.entry(edge_key(cell_a, cell_b)).or_default();
            entry.count += 1;
            if let Some(total) = duration_min {
                let at = total * (pair[0].progress + pair[1].progress) / 2.0;
                entry.min_duration_min =
                    Some(entry.min_duration_min.map_or(at, |m: f64| m.min(at)));
                entry.duration_samples.push(at);
            }
        }
    }

    let mut edges: Vec<CorridorEdge> = accum
        .into_iter()
        .filter(|(_, acc)| acc.count >= config.min_count)
        .map(|((a, b), acc)| {
            let avg = if acc.duration_samples.is_empty() {
                None
            } else {
                Some(acc.duration_samples.iter().sum::<f64>() / acc.duration_samples.len() as f64)
            };
            CorridorEdge {
                a,
                b,
                count: acc.count,
                min_duration_min: acc.min_duration_min,
                avg_duration_min: avg,
            }
        })
        .collect();

    edges.sort_by(|x, y| {
        let kx = x.min_duration_min.unwrap_or(f64::INFINITY);
        let ky = y.min_duration_min.unwrap_or(f64::INFINITY);
        ky.partial_cmp(&kx)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (x.a, x.b).cmp(&(y.a, y.b)))
    });

    let max_count = edges.iter().map(|e| e.count).max().unwrap_or(0);
    let max_duration_min = edges
        .iter()
        .filter_map(|e| e.min_duration_min)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.max(d))));

    CorridorGraph {
        edges,
        source_routes: records.len(),
        max_count,
        max_duration_min,
        config: *config,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Render the graph as a GeoJSON FeatureCollection
pub fn to_geojson(graph: &CorridorGraph) -> serde_json::Value {
    let features: Vec<serde_json::Value> = graph
        .edges
        .iter()
        .map(|edge| {
            let from = edge.a.centroid(graph.config.grid_m);
            let to = edge.b.centroid(graph.config.grid_m);
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[from.0, from.1], [to.0, to.1]],
                },
                "properties": {
                    "count": edge.count,
                    "grid_m": graph.config.grid_m,
                    "duration_min": edge.min_duration_min.map(round2),
                    "duration_avg_min": edge.avg_duration_min.map(round2),
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "properties": {
            "source_routes": graph.source_routes,
            "step_m": graph.config.step_m,
            "grid_m": graph.config.grid_m,
            "min_count": graph.config.min_count,
            "max_count": graph.max_count,
            "max_duration_min": graph.max_duration_min.map(round2),
        },
        "features": features,
    })
}

/// Write the corridor graph GeoJSON to disk
pub fn write_geojson(graph: &CorridorGraph, path: &Path) -> Result<()> {
    let body = serde_json::to_string(&to_geojson(graph))?;
    std::fs::write(path, body)?;
    Ok(())
}
