use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy::render::alpha::AlphaMode;
use bevy::window::PresentMode;
use bevy_common_assets::json::JsonAssetPlugin;

mod engine;
mod tools;

use constants::drill::{INTERACTION_RANGE, MAX_BORES, SAMPLE_RING_RADIUS, SAMPLE_SPACING};
use constants::persistence::SAVE_FILE_PATH;

use crate::engine::effects::{bore_effect_playback, PlayBoreEffect, StopBoreEffect};
use crate::engine::geology::detection::find_surface;
use crate::engine::geology::reconstruction::ring_slots_clear;
use crate::engine::geology::registry::{GeologyManifest, LayerRegistry};
use crate::engine::inventory::SampleInventory;
use crate::engine::persistence::store::{
    handle_restore_scene, handle_save_scene, poll_pending_restore, PersistenceStore,
    RestoreSceneEvent, SaveSceneEvent,
};
use crate::tools::drill_site::{
    handle_begin_bore, handle_collect_sample, handle_recall_site, tick_drill_sites,
    BeginBoreEvent, CollectSampleEvent, DrillSite, RecallSiteEvent, SampleSpawnEvent,
};
use crate::tools::sample_display::{spawn_sample_artifacts, LayerMaterials};
use crate::tools::tool_manager::{
    handle_tool_keyboard_shortcuts, handle_tool_selection_events, ToolManager,
    ToolSelectionEvent,
};

const GEOLOGY_MANIFEST_PATH: &str = "geology/quarry_site.geology.json";

/// Scene the session is currently playing in; keys the persistence store.
#[derive(Resource)]
struct ActiveScene {
    id: String,
}

impl Default for ActiveScene {
    fn default() -> Self {
        Self { id: "quarry".into() }
    }
}

/// Tracks the geology manifest through async asset loading.
#[derive(Resource, Default)]
struct GeologyLoader {
    handle: Option<Handle<GeologyManifest>>,
    loaded: bool,
}

/// Command to plant a new drill site at a world position.
#[derive(Event)]
struct PlaceSiteEvent {
    position: Vec3,
}

fn main() {
    create_app().run();
}

/// Create application with the drilling simulation systems wired up.
fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(JsonAssetPlugin::<GeologyManifest>::new(&["geology.json"]));

    app.add_event::<ToolSelectionEvent>()
        .add_event::<PlaceSiteEvent>()
        .add_event::<BeginBoreEvent>()
        .add_event::<RecallSiteEvent>()
        .add_event::<CollectSampleEvent>()
        .add_event::<SampleSpawnEvent>()
        .add_event::<PlayBoreEffect>()
        .add_event::<StopBoreEffect>()
        .add_event::<SaveSceneEvent>()
        .add_event::<RestoreSceneEvent>();

    app.init_resource::<GeologyLoader>()
        .init_resource::<ActiveScene>()
        .init_resource::<ToolManager>()
        .init_resource::<SampleInventory>()
        .insert_resource(
            PersistenceStore::read_from_disk(SAVE_FILE_PATH).unwrap_or_default(),
        )
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                load_geology_manifest,
                handle_tool_keyboard_shortcuts,
                handle_tool_selection_events,
                handle_drill_keyboard_shortcuts,
                handle_place_site,
                handle_begin_bore,
                tick_drill_sites,
                spawn_sample_artifacts,
                handle_recall_site,
                handle_collect_sample,
                bore_effect_playback,
                handle_save_scene,
                handle_restore_scene,
                poll_pending_restore,
            ),
        );

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(Window {
            title: "Drill Core Engine".into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

/// Setup lighting and the player camera; geology arrives via the manifest.
fn setup(mut commands: Commands) {
    println!("=== GEOLOGICAL CORE-SAMPLING ENGINE ===");

    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 6.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Load the geology manifest JSON and build the layer registry from it.
fn load_geology_manifest(
    mut loader: ResMut<GeologyLoader>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    manifests: Res<Assets<GeologyManifest>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Start loading if not already started.
    if loader.handle.is_none() {
        println!("Loading geology manifest from: {GEOLOGY_MANIFEST_PATH}");
        loader.handle = Some(asset_server.load(GEOLOGY_MANIFEST_PATH));
        return;
    }

    // Check if loaded and not yet processed.
    if loader.loaded {
        return;
    }
    let Some(manifest) = loader.handle.as_ref().and_then(|handle| manifests.get(handle)) else {
        return;
    };

    let registry = LayerRegistry::from_manifest(manifest);
    let layer_materials = LayerMaterials::build(&registry, &mut materials);

    // Translucent stratum volumes so bores and samples stay visible.
    for layer in registry.iter() {
        let [r, g, b] = layer.colour;
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(layer.bounds.size()))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgba(r, g, b, 0.35),
                alpha_mode: AlphaMode::Blend,
                ..default()
            })),
            Transform::from_translation(layer.bounds.center()),
            Name::new(format!("stratum_{}", layer.name)),
        ));
    }

    commands.insert_resource(registry);
    commands.insert_resource(layer_materials);
    loader.loaded = true;
}

/// Keyboard shell for the in-process drilling commands.
fn handle_drill_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    cameras: Query<&Transform, With<Camera3d>>,
    sites: Query<(Entity, &DrillSite)>,
    scene: Res<ActiveScene>,
    mut place_events: EventWriter<PlaceSiteEvent>,
    mut begin_events: EventWriter<BeginBoreEvent>,
    mut recall_events: EventWriter<RecallSiteEvent>,
    mut collect_events: EventWriter<CollectSampleEvent>,
    mut save_events: EventWriter<SaveSceneEvent>,
    mut restore_events: EventWriter<RestoreSceneEvent>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };

    if keyboard.just_pressed(KeyCode::KeyP) {
        place_events.send(PlaceSiteEvent {
            position: camera.translation,
        });
    }

    if keyboard.just_pressed(KeyCode::KeyF) {
        if let Some(entity) = nearest_site_in_range(camera.translation, &sites) {
            begin_events.send(BeginBoreEvent { site: entity });
        }
    }

    if keyboard.just_pressed(KeyCode::KeyG) {
        if let Some(entity) = nearest_site_in_range(camera.translation, &sites) {
            recall_events.send(RecallSiteEvent { site: entity });
        }
    }

    if keyboard.just_pressed(KeyCode::KeyC) {
        if let Some(entity) = nearest_site_in_range(camera.translation, &sites) {
            if let Ok((_, site)) = sites.get(entity) {
                if let Some(sample) = site.samples().first() {
                    collect_events.send(CollectSampleEvent {
                        site: entity,
                        sample_id: sample.sample_id.clone(),
                    });
                }
            }
        }
    }

    if keyboard.just_pressed(KeyCode::KeyO) {
        save_events.send(SaveSceneEvent {
            scene_id: scene.id.clone(),
        });
    }

    if keyboard.just_pressed(KeyCode::KeyL) {
        restore_events.send(RestoreSceneEvent {
            scene_id: scene.id.clone(),
        });
    }
}

fn nearest_site_in_range(position: Vec3, sites: &Query<(Entity, &DrillSite)>) -> Option<Entity> {
    let mut best: Option<(Entity, f32)> = None;
    for (entity, site) in sites {
        let distance = site.anchor().distance(position);
        if distance <= INTERACTION_RANGE && best.is_none_or(|(_, closest)| distance < closest) {
            best = Some((entity, distance));
        }
    }
    best.map(|(entity, _)| entity)
}

/// Plant a drill rig on the surface under the requested position.
fn handle_place_site(
    mut commands: Commands,
    mut events: EventReader<PlaceSiteEvent>,
    registry: Option<Res<LayerRegistry>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut placed_count: Local<u32>,
) {
    for event in events.read() {
        let anchor = registry
            .as_ref()
            .and_then(|registry| find_surface(registry, event.position))
            .map(|surface| surface.point)
            .unwrap_or(Vec3::new(event.position.x, 0.0, event.position.z));

        if !ring_slots_clear(SAMPLE_RING_RADIUS, MAX_BORES, SAMPLE_SPACING) {
            warn!(
                "Ring tuning too tight: radius {SAMPLE_RING_RADIUS} cannot keep {MAX_BORES} slots {SAMPLE_SPACING} apart"
            );
        }

        *placed_count += 1;
        let site_id = format!("site-{:02}", *placed_count);
        info!("Placing drill site {site_id} at {anchor:?}");

        commands.spawn((
            DrillSite::new(site_id.clone(), anchor),
            Mesh3d(meshes.add(Cuboid::new(0.6, 2.4, 0.6))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.8, 0.3, 0.1),
                ..default()
            })),
            Transform::from_translation(anchor + Vec3::Y * 1.2),
            Name::new(site_id),
        ));
    }
}
