use std::collections::HashMap;

use bevy::prelude::*;

use constants::drill::{SAMPLE_DISPLAY_HEIGHT_SCALE, SAMPLE_DISPLAY_RADIUS};

use crate::engine::geology::layer::LayerId;
use crate::engine::geology::registry::LayerRegistry;
use crate::tools::drill_site::SampleSpawnEvent;

/// Renderer-owned material table. Strata reference their material by id only;
/// the handles never travel through the simulation core or persistence.
#[derive(Resource, Default)]
pub struct LayerMaterials {
    pub by_layer: HashMap<LayerId, Handle<StandardMaterial>>,
    pub fallback: Handle<StandardMaterial>,
}

impl LayerMaterials {
    pub fn build(registry: &LayerRegistry, materials: &mut Assets<StandardMaterial>) -> Self {
        let by_layer = registry
            .iter()
            .map(|layer| {
                let [r, g, b] = layer.colour;
                let handle = materials.add(StandardMaterial {
                    base_color: Color::srgb(r, g, b),
                    perceptual_roughness: 0.9,
                    ..default()
                });
                (layer.id, handle)
            })
            .collect();

        let fallback = materials.add(StandardMaterial {
            base_color: Color::srgb(0.45, 0.42, 0.38),
            perceptual_roughness: 1.0,
            ..default()
        });

        Self { by_layer, fallback }
    }

    pub fn for_layer(&self, layer: Option<LayerId>) -> Handle<StandardMaterial> {
        layer
            .and_then(|id| self.by_layer.get(&id))
            .unwrap_or(&self.fallback)
            .clone()
    }
}

/// Marker on a spawned core-sample entity, tying it back to the site and
/// sample that produced it so recall and collection can find it.
#[derive(Component)]
pub struct SampleArtifact {
    pub site: Entity,
    pub sample_id: String,
}

/// Spawn the visual stack for each finished sample: one cylinder per layer
/// segment, layered top-down in bore order at the ring position.
pub fn spawn_sample_artifacts(
    mut commands: Commands,
    mut events: EventReader<SampleSpawnEvent>,
    mut meshes: ResMut<Assets<Mesh>>,
    layer_materials: Option<Res<LayerMaterials>>,
) {
    let Some(layer_materials) = layer_materials else {
        return;
    };

    for event in events.read() {
        let sample = &event.sample;
        let total_height = (sample.depth_end - sample.depth_start) * SAMPLE_DISPLAY_HEIGHT_SCALE;

        commands
            .spawn((
                Transform::from_translation(sample.display_position),
                Visibility::default(),
                SampleArtifact {
                    site: event.site,
                    sample_id: sample.sample_id.clone(),
                },
                Name::new(format!("sample_{}", sample.sample_id)),
            ))
            .with_children(|parent| {
                for segment in &sample.segments {
                    let height = segment.thickness * SAMPLE_DISPLAY_HEIGHT_SCALE;
                    if height <= 0.0 {
                        continue;
                    }
                    let centre_y = total_height * 0.5
                        - segment.relative_depth * SAMPLE_DISPLAY_HEIGHT_SCALE
                        - height * 0.5;

                    parent.spawn((
                        Mesh3d(meshes.add(Cylinder::new(SAMPLE_DISPLAY_RADIUS, height))),
                        MeshMaterial3d(layer_materials.for_layer(segment.layer)),
                        Transform::from_xyz(0.0, centre_y, 0.0),
                        Name::new(format!("{}_{}", sample.sample_id, segment.layer_name)),
                    ));
                }
            });

        info!(
            "Spawned sample {} with {} segment meshes at {:?}",
            sample.sample_id,
            sample.segments.len(),
            sample.display_position
        );
    }
}
