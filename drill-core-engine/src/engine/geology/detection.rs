use bevy::prelude::*;

use constants::drill::DRILL_RADIUS;
use constants::geology::{
    LOCAL_PROBE_RANGE, LOCAL_PROBE_RISE, SKY_PROBE_RANGE, SKY_PROBE_RISE,
    SURFACE_AGREEMENT_TOLERANCE,
};

use super::layer::LayerId;
use super::registry::{GroundQuery, LayerRegistry};

/// Transient description of one drilling path. Never persisted.
#[derive(Debug, Clone, Copy)]
pub struct DrillPath {
    pub origin: Vec3,
    pub direction: Dir3,
    pub max_distance: f32,
    pub radius: f32,
}

impl DrillPath {
    pub fn straight_down(origin: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: Dir3::NEG_Y,
            max_distance,
            radius: DRILL_RADIUS,
        }
    }
}

/// One stratum crossed by a drilling path. Depths are measured along the path
/// from its origin; the exit depth is the true far face, which may lie past
/// the requested depth window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerIntersection {
    pub layer: LayerId,
    pub entry_depth: f32,
    pub exit_depth: f32,
}

/// Per-phase counters for one detection pass. The exact-intersection count is
/// the performance contract: it must only cover pre-filter survivors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionStats {
    pub candidates: usize,
    pub apparatus_excluded: usize,
    pub horizontal_rejected: usize,
    pub vertical_rejected: usize,
    pub exact_tested: usize,
    pub exact_rejected: usize,
    pub window_rejected: usize,
    pub accepted: usize,
}

/// Ordered strata intersected by `path` whose entry depth falls inside
/// `depth_window`. Ties on entry depth resolve by registration order.
pub fn detect(
    registry: &LayerRegistry,
    path: &DrillPath,
    depth_window: (f32, f32),
) -> Vec<LayerIntersection> {
    detect_with_stats(registry, path, depth_window).0
}

pub fn detect_with_stats(
    registry: &LayerRegistry,
    path: &DrillPath,
    depth_window: (f32, f32),
) -> (Vec<LayerIntersection>, DetectionStats) {
    let (window_start, window_end) = depth_window;
    let mut stats = DetectionStats::default();
    let mut hits = Vec::new();

    // World-space vertical span covered by the path, for the cheap range test.
    let far_y = path.origin.y + path.direction.y * path.max_distance;
    let span_min = path.origin.y.min(far_y);
    let span_max = path.origin.y.max(far_y);

    for layer in registry.iter() {
        stats.candidates += 1;

        if layer.is_apparatus() {
            stats.apparatus_excluded += 1;
            continue;
        }
        if !layer
            .bounds
            .horizontal_footprint_contains(path.origin, path.radius)
        {
            stats.horizontal_rejected += 1;
            continue;
        }
        if !layer.bounds.vertical_span_overlaps(span_min, span_max) {
            stats.vertical_rejected += 1;
            continue;
        }

        stats.exact_tested += 1;
        let Some((entry, exit)) = layer.bounds.ray_interval(path.origin, *path.direction) else {
            stats.exact_rejected += 1;
            continue;
        };
        if entry > path.max_distance {
            stats.exact_rejected += 1;
            continue;
        }
        if entry < window_start || entry >= window_end {
            stats.window_rejected += 1;
            continue;
        }

        stats.accepted += 1;
        hits.push(LayerIntersection {
            layer: layer.id,
            entry_depth: entry,
            exit_depth: exit,
        });
    }

    // Shallowest first; registration order breaks exact ties deterministically.
    hits.sort_by(|a, b| {
        a.entry_depth
            .partial_cmp(&b.entry_depth)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.layer.cmp(&b.layer))
    });

    debug!(
        "Layer detection: {} candidates, {} horizontal / {} vertical rejected, {} exact tested, {} accepted",
        stats.candidates,
        stats.horizontal_rejected,
        stats.vertical_rejected,
        stats.exact_tested,
        stats.accepted
    );

    (hits, stats)
}

/// Result of the surface search at a horizontal position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub point: Vec3,
    pub layer: LayerId,
}

/// Locate true ground at a horizontal position before any path exists.
///
/// A sky probe cast from well above the position selects the highest struck
/// stratum. A second probe directly at the footprint overrides it when the
/// two disagree by more than the tolerance, so local terrain noise wins over
/// a distant plateau reading.
pub fn find_surface(registry: &LayerRegistry, position: Vec3) -> Option<SurfaceHit> {
    let sky = registry.probe_down(position + Vec3::Y * SKY_PROBE_RISE, SKY_PROBE_RANGE);
    let local = registry.probe_down(position + Vec3::Y * LOCAL_PROBE_RISE, LOCAL_PROBE_RANGE);

    match (sky, local) {
        (Some(sky_hit), Some(local_hit)) => {
            let chosen = if (local_hit.point.y - sky_hit.point.y).abs() > SURFACE_AGREEMENT_TOLERANCE
            {
                local_hit
            } else {
                sky_hit
            };
            Some(SurfaceHit {
                point: chosen.point,
                layer: chosen.layer,
            })
        }
        (Some(hit), None) | (None, Some(hit)) => Some(SurfaceHit {
            point: hit.point,
            layer: hit.layer,
        }),
        (None, None) => None,
    }
}
