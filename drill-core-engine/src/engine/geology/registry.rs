use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::layer::{GeologyLayer, LayerBounds, LayerId, LayerKind};

/// One stratum entry as authored in the geology manifest JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratumDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: LayerKind,
    #[serde(default)]
    pub geological_age: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_colour")]
    pub colour: [f32; 3],
    pub bounds: LayerBounds,
}

fn default_colour() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}

/// Complete geology manifest as a Bevy asset. Mirrors the JSON structure
/// exactly; the registry is built from it once at scene load.
#[derive(Asset, Debug, Clone, Serialize, Deserialize, TypePath)]
pub struct GeologyManifest {
    pub scene: String,
    pub strata: Vec<StratumDefinition>,
}

/// Successful downward ground probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub point: Vec3,
    pub layer: LayerId,
}

/// Ground-height collaborator surface. Implemented by the layer registry for
/// the real scene and by test doubles for placement tests.
pub trait GroundQuery {
    fn probe_down(&self, from: Vec3, max_distance: f32) -> Option<GroundHit>;
}

/// Read-only set of stratum volumes for one loaded scene. Registration order
/// is the deterministic tie-break for detection results.
#[derive(Resource, Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<GeologyLayer>,
}

impl LayerRegistry {
    pub fn from_manifest(manifest: &GeologyManifest) -> Self {
        let mut registry = Self::default();
        for definition in &manifest.strata {
            registry.register(definition.clone());
        }
        info!(
            "Layer registry built for scene '{}': {} strata",
            manifest.scene,
            registry.len()
        );
        registry
    }

    pub fn register(&mut self, definition: StratumDefinition) -> LayerId {
        let id = LayerId(self.layers.len() as u32);
        self.layers.push(GeologyLayer {
            id,
            name: definition.name,
            kind: definition.kind,
            geological_age: definition.geological_age,
            description: definition.description,
            colour: definition.colour,
            bounds: definition.bounds,
        });
        id
    }

    pub fn get(&self, id: LayerId) -> Option<&GeologyLayer> {
        self.layers.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeologyLayer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl GroundQuery for LayerRegistry {
    /// Straight-down probe against every non-apparatus volume. The hit with
    /// the smallest entry distance is the highest surface under the origin.
    fn probe_down(&self, from: Vec3, max_distance: f32) -> Option<GroundHit> {
        let mut best: Option<GroundHit> = None;
        let mut best_distance = max_distance;

        for layer in self.layers.iter().filter(|layer| !layer.is_apparatus()) {
            let Some((enter, _)) = layer.bounds.ray_interval(from, Vec3::NEG_Y) else {
                continue;
            };
            if enter <= best_distance {
                best_distance = enter;
                best = Some(GroundHit {
                    point: from + Vec3::NEG_Y * enter,
                    layer: layer.id,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stratum(name: &str, top: f64, bottom: f64) -> StratumDefinition {
        StratumDefinition {
            name: name.into(),
            kind: LayerKind::default(),
            geological_age: String::new(),
            description: String::new(),
            colour: default_colour(),
            bounds: LayerBounds {
                min_x: -10.0,
                max_x: 10.0,
                min_y: bottom,
                max_y: top,
                min_z: -10.0,
                max_z: 10.0,
            },
        }
    }

    #[test]
    fn registration_assigns_sequential_ids() {
        let mut registry = LayerRegistry::default();
        let a = registry.register(stratum("topsoil", 0.0, -1.0));
        let b = registry.register(stratum("clay", -1.0, -3.0));
        assert_eq!(a, LayerId(0));
        assert_eq!(b, LayerId(1));
        assert_eq!(registry.get(b).unwrap().name, "clay");
    }

    #[test]
    fn probe_down_returns_the_highest_surface() {
        let mut registry = LayerRegistry::default();
        registry.register(stratum("clay", -1.0, -3.0));
        let surface = registry.register(stratum("topsoil", 0.0, -1.0));

        let hit = registry
            .probe_down(Vec3::new(0.0, 5.0, 0.0), 20.0)
            .expect("probe should find ground");
        assert_eq!(hit.layer, surface);
        assert!((hit.point.y - 0.0).abs() < 1e-5);
    }

    #[test]
    fn probe_down_skips_apparatus_volumes() {
        let mut registry = LayerRegistry::default();
        registry.register(stratum("drill_tower_base", 2.0, 0.0));
        let ground = registry.register(stratum("topsoil", 0.0, -1.0));

        let hit = registry.probe_down(Vec3::new(0.0, 5.0, 0.0), 20.0).unwrap();
        assert_eq!(hit.layer, ground);
    }

    #[test]
    fn probe_down_misses_outside_range() {
        let mut registry = LayerRegistry::default();
        registry.register(stratum("topsoil", 0.0, -1.0));
        assert!(registry.probe_down(Vec3::new(0.0, 30.0, 0.0), 5.0).is_none());
    }
}
