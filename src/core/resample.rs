//! Fixed-step polyline resampling
//!
//! Re-expresses a route's geometry as points spaced roughly `step_m` meters
//! apart along the path, each annotated with the fraction of the route's
//! total arc length already covered. Arc length uses haversine between the
//! original vertices; the in-segment interpolation is linear in (lon, lat).

use crate::core::geo::{haversine_m, lerp};

/// A resampled waypoint with its progress ratio along the route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampledPoint {
    /// (lon, lat)
    pub coord: (f64, f64),
    /// Cumulative arc length so far divided by total arc length, in [0, 1]
    pub progress: f64,
}

/// Resample a polyline at a fixed arc-length step
///
/// The first output point is the first vertex (progress 0) and the final
/// vertex is always emitted with progress 1, even when it is closer than
/// `step_m` to its predecessor. Degenerate input (fewer than 2 vertices, or
/// zero total length) yields an empty sequence.
pub fn resample(geometry: &[(f64, f64)], step_m: f64) -> Vec<ResampledPoint> {
    if geometry.len() < 2 || step_m <= 0.0 {
        return Vec::new();
    }

    let segment_lengths: Vec<f64> = geometry
        .windows(2)
        .map(|pair| haversine_m(pair[0], pair[1]))
        .collect();
    let total: f64 = segment_lengths.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut points = vec![ResampledPoint {
        coord: geometry[0],
        progress: 0.0,
    }];

    let mut traveled = 0.0;
    let mut next_mark = step_m;

    for (pair, &seg_len) in geometry.windows(2).zip(&segment_lengths) {
        if seg_len <= 0.0 {
            continue;
        }
        // Emit every step boundary that falls inside this segment; the
        // exact end of the route is left to the final-vertex push below.
        while next_mark < total && next_mark <= traveled + seg_len {
            let frac = (next_mark - traveled) / seg_len;
            points.push(ResampledPoint {
                coord: lerp(pair[0], pair[1], frac),
                progress: next_mark / total,
            });
            next_mark += step_m;
        }
        traveled += seg_len;
    }

    points.push(ResampledPoint {
        coord: geometry[geometry.len() - 1],
        progress: 1.0,
    });

    points
}
