use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::geology::{APPARATUS_NAME_TAGS, RAY_EPSILON};

/// Identifier of a registered stratum. Indexes into the layer registry and
/// keys the renderer-owned material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u32);

/// Broad lithology classes carried through from the survey catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    #[default]
    Sedimentary,
    Igneous,
    Metamorphic,
    Soil,
    Alluvium,
    Bedrock,
}

/// Axis-aligned world-space extents of one stratum volume.
/// Field layout mirrors the manifest JSON exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl LayerBounds {
    /// Calculate center point for visual placement.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            ((self.max_x + self.min_x) * 0.5) as f32,
            ((self.max_y + self.min_y) * 0.5) as f32,
            ((self.max_z + self.min_z) * 0.5) as f32,
        )
    }

    /// Calculate size dimensions for visual placement.
    pub fn size(&self) -> Vec3 {
        Vec3::new(
            (self.max_x - self.min_x) as f32,
            (self.max_y - self.min_y) as f32,
            (self.max_z - self.min_z) as f32,
        )
    }

    /// Highest world-space point of the volume.
    pub fn top(&self) -> f32 {
        self.max_y as f32
    }

    /// Lowest world-space point of the volume.
    pub fn bottom(&self) -> f32 {
        self.min_y as f32
    }

    /// Cheap horizontal pre-filter: whether the XZ footprint, expanded by
    /// `margin`, contains the given point's horizontal position.
    pub fn horizontal_footprint_contains(&self, point: Vec3, margin: f32) -> bool {
        let (x, z) = (point.x as f64, point.z as f64);
        let m = margin as f64;
        x >= self.min_x - m && x <= self.max_x + m && z >= self.min_z - m && z <= self.max_z + m
    }

    /// Cheap vertical pre-filter: whether the volume's Y extent overlaps the
    /// given world-space span.
    pub fn vertical_span_overlaps(&self, span_min: f32, span_max: f32) -> bool {
        self.min_y as f32 <= span_max && self.max_y as f32 >= span_min
    }

    /// Exact slab-method ray test. Returns the entry and exit distances along
    /// the ray, entry clamped at the ray origin. Callers bound the entry
    /// distance themselves; the exit is the true far face so remaining
    /// thickness past a depth window stays recoverable.
    pub fn ray_interval(&self, origin: Vec3, direction: Vec3) -> Option<(f32, f32)> {
        let min = Vec3::new(self.min_x as f32, self.min_y as f32, self.min_z as f32);
        let max = Vec3::new(self.max_x as f32, self.max_y as f32, self.max_z as f32);

        let mut t_enter = 0.0_f32;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < RAY_EPSILON {
                // Ray runs parallel to this slab; origin must lie inside it.
                if o < min[axis] || o > max[axis] {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let mut t0 = (min[axis] - o) * inv;
                let mut t1 = (max[axis] - o) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_enter = t_enter.max(t0);
                t_exit = t_exit.min(t1);
                if t_enter > t_exit {
                    return None;
                }
            }
        }

        Some((t_enter, t_exit))
    }
}

/// One registered stratum volume. Immutable after scene load; the visual
/// material lives in a renderer-owned table keyed by [`LayerId`].
#[derive(Debug, Clone)]
pub struct GeologyLayer {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub geological_age: String,
    pub description: String,
    pub colour: [f32; 3],
    pub bounds: LayerBounds,
}

impl GeologyLayer {
    /// Volumes named after drilling apparatus are excluded from detection and
    /// ground probing so the rig never intersects itself.
    pub fn is_apparatus(&self) -> bool {
        let name = self.name.to_lowercase();
        APPARATUS_NAME_TAGS.iter().any(|tag| name.contains(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab(min_y: f64, max_y: f64) -> LayerBounds {
        LayerBounds {
            min_x: -10.0,
            max_x: 10.0,
            min_y,
            max_y,
            min_z: -10.0,
            max_z: 10.0,
        }
    }

    #[test]
    fn ray_interval_straight_down_hits_top_and_bottom() {
        let bounds = slab(-3.0, -1.0);
        let (enter, exit) = bounds
            .ray_interval(Vec3::ZERO, Vec3::NEG_Y)
            .expect("ray should hit the slab");
        assert!((enter - 1.0).abs() < 1e-5);
        assert!((exit - 3.0).abs() < 1e-5);
    }

    #[test]
    fn ray_interval_clamps_entry_when_origin_is_inside() {
        let bounds = slab(-2.0, 1.0);
        let (enter, exit) = bounds.ray_interval(Vec3::ZERO, Vec3::NEG_Y).unwrap();
        assert_eq!(enter, 0.0);
        assert!((exit - 2.0).abs() < 1e-5);
    }

    #[test]
    fn ray_interval_misses_sideways_volume() {
        let mut bounds = slab(-3.0, -1.0);
        bounds.min_x = 20.0;
        bounds.max_x = 30.0;
        assert!(bounds.ray_interval(Vec3::ZERO, Vec3::NEG_Y).is_none());
    }

    #[test]
    fn horizontal_footprint_respects_margin() {
        let bounds = slab(-1.0, 0.0);
        let outside = Vec3::new(10.05, 0.0, 0.0);
        assert!(!bounds.horizontal_footprint_contains(outside, 0.0));
        assert!(bounds.horizontal_footprint_contains(outside, 0.1));
    }

    #[test]
    fn vertical_span_overlap_is_inclusive() {
        let bounds = slab(-4.0, -2.0);
        assert!(bounds.vertical_span_overlaps(-2.0, 0.0));
        assert!(bounds.vertical_span_overlaps(-5.0, -4.0));
        assert!(!bounds.vertical_span_overlaps(-1.5, 0.0));
    }

    #[test]
    fn apparatus_tags_match_case_insensitively() {
        let layer = GeologyLayer {
            id: LayerId(0),
            name: "DrillTower_Mast".into(),
            kind: LayerKind::default(),
            geological_age: String::new(),
            description: String::new(),
            colour: [0.5; 3],
            bounds: slab(-1.0, 0.0),
        };
        assert!(layer.is_apparatus());
    }
}
