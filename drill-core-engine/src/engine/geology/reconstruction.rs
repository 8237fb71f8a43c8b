use bevy::prelude::*;
use chrono::{SecondsFormat, Utc};

use constants::drill::{MIN_SEGMENT_THICKNESS, SAMPLE_ELEVATION, SAMPLE_RING_RADIUS};
use constants::geology::{DEFAULT_SURFACE_NAME, SKY_PROBE_RANGE, SKY_PROBE_RISE};

use super::detection::{LayerIntersection, SurfaceHit};
use super::layer::LayerId;
use super::registry::{GroundQuery, LayerRegistry};

/// One slice of a reconstructed core sample. `layer` is `None` when the slice
/// was cut from unidentified ground and should use the default material.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSegment {
    pub layer: Option<LayerId>,
    pub layer_name: String,
    /// Depth offset of the slice top relative to the sample's own origin.
    pub relative_depth: f32,
    pub thickness: f32,
}

/// The collectable core-sample artifact produced by one bore. Owned by the
/// drill site that produced it until collected or the site is recalled.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedSample {
    pub sample_id: String,
    pub display_name: String,
    pub description: String,
    pub collection_time: String,
    pub origin: Vec3,
    pub source_tool_id: String,
    pub total_depth: f32,
    pub radius: f32,
    pub depth_start: f32,
    pub depth_end: f32,
    /// Stratum count at collection time. Survives persistence even though the
    /// segments themselves do not.
    pub layer_count: u32,
    pub display_position: Vec3,
    pub segments: Vec<LayerSegment>,
}

/// Everything the reconstruction step needs to label one bore's sample.
#[derive(Debug, Clone)]
pub struct ReconstructionRequest<'a> {
    pub site_id: &'a str,
    pub bore_index: u32,
    pub tool_id: &'a str,
    pub origin: Vec3,
    pub radius: f32,
    pub depth_start: f32,
    pub depth_end: f32,
    pub display_position: Vec3,
}

/// Build a positioned sample from detection results.
///
/// One segment per intersected stratum, ordered by entry depth with offsets
/// relative to the window start. An empty detection result degrades to a
/// single homogeneous segment keyed to the surface stratum (or the default
/// material when none was found); it never fails.
pub fn reconstruct(
    detections: &[LayerIntersection],
    surface: Option<&SurfaceHit>,
    registry: &LayerRegistry,
    request: &ReconstructionRequest<'_>,
) -> ReconstructedSample {
    let window_span = request.depth_end - request.depth_start;
    let mut segments = Vec::with_capacity(detections.len().max(1));

    for intersection in detections {
        let entry = intersection.entry_depth.max(request.depth_start);
        let exit = intersection.exit_depth.min(request.depth_end);
        let thickness = exit - entry;
        if thickness < MIN_SEGMENT_THICKNESS {
            continue;
        }
        segments.push(LayerSegment {
            layer: Some(intersection.layer),
            layer_name: layer_name(registry, intersection.layer),
            relative_depth: entry - request.depth_start,
            thickness,
        });
    }

    if segments.is_empty() {
        // Required fallback path: a homogeneous "simple sample" spanning the
        // whole window, keyed to whatever surface material was found.
        let (layer, fallback_name) = match surface {
            Some(hit) => (Some(hit.layer), layer_name(registry, hit.layer)),
            None => (None, DEFAULT_SURFACE_NAME.to_owned()),
        };
        warn!(
            "No strata detected for bore {} of site {}; building simple sample from '{}'",
            request.bore_index, request.site_id, fallback_name
        );
        segments.push(LayerSegment {
            layer,
            layer_name: fallback_name,
            relative_depth: 0.0,
            thickness: window_span,
        });
    }

    // Catalogue note for the topmost identified stratum, if any.
    let topmost = segments
        .iter()
        .find_map(|segment| segment.layer)
        .and_then(|id| registry.get(id))
        .map(|layer| format!(", topmost {} ({})", layer.name, layer.geological_age))
        .unwrap_or_default();

    let sample_id = format!("{}-{:02}", request.site_id, request.bore_index);
    ReconstructedSample {
        display_name: format!("Core sample #{}", request.bore_index + 1),
        description: format!(
            "Bore {} at {:.1}m-{:.1}m, {} strata{}",
            request.bore_index + 1,
            request.depth_start,
            request.depth_end,
            segments.len(),
            topmost
        ),
        collection_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        origin: request.origin,
        source_tool_id: request.tool_id.to_owned(),
        total_depth: request.depth_end,
        radius: request.radius,
        depth_start: request.depth_start,
        depth_end: request.depth_end,
        layer_count: segments.len() as u32,
        display_position: request.display_position,
        segments,
        sample_id,
    }
}

fn layer_name(registry: &LayerRegistry, id: LayerId) -> String {
    registry
        .get(id)
        .map(|layer| layer.name.clone())
        .unwrap_or_else(|| DEFAULT_SURFACE_NAME.to_owned())
}

/// Deterministic ring slot for the sample of one bore.
///
/// Each bore claims the angular slot `bore_index * 360 / max_bores` at the
/// ring radius; the final height snaps to local ground plus the hover
/// elevation, falling back to the anchor height when the probe misses.
pub fn sample_ring_position(
    anchor: Vec3,
    bore_index: u32,
    max_bores: u32,
    ground: &impl GroundQuery,
) -> Vec3 {
    let slots = max_bores.max(1);
    let angle = bore_index as f32 * std::f32::consts::TAU / slots as f32;
    let offset = Vec3::new(
        angle.sin() * SAMPLE_RING_RADIUS,
        0.0,
        angle.cos() * SAMPLE_RING_RADIUS,
    );
    let candidate = anchor + offset;

    let probe_origin = candidate + Vec3::Y * SKY_PROBE_RISE;
    let height = match ground.probe_down(probe_origin, SKY_PROBE_RANGE) {
        Some(hit) => hit.point.y + SAMPLE_ELEVATION,
        None => anchor.y + SAMPLE_ELEVATION,
    };

    Vec3::new(candidate.x, height, candidate.z)
}

/// Whether adjacent ring slots keep at least `spacing` clearance. Checked
/// when a site is placed so a bad tuning shows up before the first bore.
pub fn ring_slots_clear(ring_radius: f32, max_bores: u32, spacing: f32) -> bool {
    if max_bores <= 1 {
        return true;
    }
    ring_radius * 2.0 * (std::f32::consts::PI / max_bores as f32).sin() >= spacing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geology::layer::{LayerBounds, LayerKind};
    use crate::engine::geology::registry::{GroundHit, StratumDefinition};
    use constants::drill::{MAX_BORES, SAMPLE_SPACING};

    struct FlatGround(f32);

    impl GroundQuery for FlatGround {
        fn probe_down(&self, from: Vec3, _max_distance: f32) -> Option<GroundHit> {
            Some(GroundHit {
                point: Vec3::new(from.x, self.0, from.z),
                layer: LayerId(0),
            })
        }
    }

    struct NoGround;

    impl GroundQuery for NoGround {
        fn probe_down(&self, _from: Vec3, _max_distance: f32) -> Option<GroundHit> {
            None
        }
    }

    fn registry_with(names: &[&str]) -> LayerRegistry {
        let mut registry = LayerRegistry::default();
        for name in names {
            registry.register(StratumDefinition {
                name: (*name).into(),
                kind: LayerKind::default(),
                geological_age: String::new(),
                description: String::new(),
                colour: [0.5; 3],
                bounds: LayerBounds {
                    min_x: -10.0,
                    max_x: 10.0,
                    min_y: -10.0,
                    max_y: 0.0,
                    min_z: -10.0,
                    max_z: 10.0,
                },
            });
        }
        registry
    }

    fn request(depth_start: f32, depth_end: f32) -> ReconstructionRequest<'static> {
        ReconstructionRequest {
            site_id: "site-1",
            bore_index: 0,
            tool_id: "tower",
            origin: Vec3::ZERO,
            radius: 0.1,
            depth_start,
            depth_end,
            display_position: Vec3::new(0.0, 3.0, 2.5),
        }
    }

    #[test]
    fn builds_one_segment_per_detected_stratum() {
        let registry = registry_with(&["topsoil", "clay"]);
        let detections = [
            LayerIntersection {
                layer: LayerId(0),
                entry_depth: 0.0,
                exit_depth: 1.2,
            },
            LayerIntersection {
                layer: LayerId(1),
                entry_depth: 1.2,
                exit_depth: 3.5,
            },
        ];

        let sample = reconstruct(&detections, None, &registry, &request(0.0, 2.0));

        assert_eq!(sample.segments.len(), 2);
        assert_eq!(sample.segments[0].layer_name, "topsoil");
        assert!((sample.segments[0].thickness - 1.2).abs() < 1e-5);
        // Second slice clamps to the window and offsets against the sample origin.
        assert!((sample.segments[1].relative_depth - 1.2).abs() < 1e-5);
        assert!((sample.segments[1].thickness - 0.8).abs() < 1e-5);
        assert_eq!(sample.layer_count, 2);
    }

    #[test]
    fn empty_detection_degrades_to_a_simple_sample() {
        let registry = registry_with(&["topsoil"]);
        let surface = SurfaceHit {
            point: Vec3::ZERO,
            layer: LayerId(0),
        };

        let sample = reconstruct(&[], Some(&surface), &registry, &request(0.0, 2.0));

        assert_eq!(sample.segments.len(), 1);
        assert_eq!(sample.segments[0].layer, Some(LayerId(0)));
        assert_eq!(sample.segments[0].layer_name, "topsoil");
        assert!((sample.segments[0].thickness - 2.0).abs() < 1e-5);
    }

    #[test]
    fn missing_surface_falls_back_to_the_default_material() {
        let registry = LayerRegistry::default();
        let sample = reconstruct(&[], None, &registry, &request(4.0, 6.0));

        assert_eq!(sample.segments.len(), 1);
        assert_eq!(sample.segments[0].layer, None);
        assert_eq!(sample.segments[0].layer_name, DEFAULT_SURFACE_NAME);
    }

    #[test]
    fn sample_ids_are_stable_per_site_and_bore() {
        let registry = registry_with(&["topsoil"]);
        let mut req = request(0.0, 2.0);
        req.bore_index = 3;

        let sample = reconstruct(&[], None, &registry, &req);
        assert_eq!(sample.sample_id, "site-1-03");
    }

    #[test]
    fn ring_slots_cover_the_full_circle_at_the_ring_radius() {
        let anchor = Vec3::new(4.0, 1.5, -2.0);
        let ground = FlatGround(0.0);

        for bore_index in 0..MAX_BORES {
            let position = sample_ring_position(anchor, bore_index, MAX_BORES, &ground);
            let offset = position - anchor;
            let horizontal = Vec2::new(offset.x, offset.z);

            assert!((horizontal.length() - SAMPLE_RING_RADIUS).abs() < 1e-4);

            let expected_angle = bore_index as f32 * std::f32::consts::TAU / MAX_BORES as f32;
            let actual_angle = horizontal.x.atan2(horizontal.y).rem_euclid(std::f32::consts::TAU);
            assert!(
                (actual_angle - expected_angle).abs() < 1e-4
                    || (actual_angle - expected_angle).abs() > std::f32::consts::TAU - 1e-4,
                "bore {bore_index}: expected {expected_angle}, got {actual_angle}"
            );

            assert!((position.y - (0.0 + SAMPLE_ELEVATION)).abs() < 1e-4);
        }
    }

    #[test]
    fn ring_height_falls_back_to_the_anchor_when_ground_is_missing() {
        let anchor = Vec3::new(0.0, 2.0, 0.0);
        let position = sample_ring_position(anchor, 0, MAX_BORES, &NoGround);
        assert!((position.y - (2.0 + SAMPLE_ELEVATION)).abs() < 1e-4);
    }

    #[test]
    fn default_ring_tuning_keeps_slots_clear() {
        assert!(ring_slots_clear(SAMPLE_RING_RADIUS, MAX_BORES, SAMPLE_SPACING));
        assert!(!ring_slots_clear(0.2, MAX_BORES, SAMPLE_SPACING));
    }
}
