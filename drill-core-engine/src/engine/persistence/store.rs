use std::collections::HashMap;
use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::persistence::{RESTORE_MAX_ATTEMPTS, RESTORE_POLL_SECONDS, SAVE_FILE_PATH};

use crate::engine::inventory::SampleInventory;
use crate::tools::tool_manager::{ToolManager, ToolType};

use super::scene_state::{default_pose, PersistedSceneState, PlayerPose, SampleRecord};

/// Cross-session store of per-scene snapshots. Restoring replays inert data;
/// detection is never re-invoked on load.
#[derive(Resource, Debug, Default, Serialize, Deserialize)]
pub struct PersistenceStore {
    pub scenes: HashMap<String, PersistedSceneState>,
}

impl PersistenceStore {
    /// Capture a snapshot, superseding any earlier one for the scene.
    pub fn save_scene(&mut self, scene_id: &str, snapshot: PersistedSceneState) {
        info!(
            "Saving scene '{}': {} samples, tool '{}'",
            scene_id,
            snapshot.items.len(),
            snapshot.equipped_tool
        );
        self.scenes.insert(scene_id.to_owned(), snapshot);
    }

    pub fn snapshot(&self, scene_id: &str) -> Option<&PersistedSceneState> {
        self.scenes.get(scene_id)
    }

    /// Replay a scene snapshot into the collaborators. Clears the inventory
    /// before repopulating, so running it twice cannot duplicate entries.
    /// Returns the pose to apply, or `None` when no snapshot exists and the
    /// caller should fall back to scene defaults.
    pub fn restore_scene(
        &self,
        scene_id: &str,
        inventory: &mut SampleInventory,
        tools: &mut ToolManager,
    ) -> Option<PlayerPose> {
        let Some(snapshot) = self.scenes.get(scene_id) else {
            info!("No snapshot for scene '{scene_id}', applying defaults");
            return None;
        };

        inventory.clear();
        for record in &snapshot.items {
            inventory.add_sample(record.clone().into_shell());
        }

        if let Some(tool) = ToolType::from_string(&snapshot.equipped_tool) {
            tools.activate_tool(tool);
        }

        info!(
            "Restored scene '{}': {} samples back in inventory",
            scene_id,
            snapshot.items.len()
        );
        Some(snapshot.player.clone())
    }

    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string_pretty(self) {
            Ok(json) => Some(json),
            Err(error) => {
                warn!("Could not serialize save data: {error}");
                None
            }
        }
    }

    /// Tolerant parse: a scene whose snapshot is malformed is abandoned with
    /// a warning, without taking the rest of the save file down.
    pub fn from_json(raw: &str) -> Self {
        let mut store = Self::default();

        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(error) => {
                warn!("Save data unreadable, starting empty: {error}");
                return store;
            }
        };
        let Some(scenes) = value.get("scenes").and_then(|scenes| scenes.as_object()) else {
            warn!("Save data missing its scene table, starting empty");
            return store;
        };

        for (scene_id, snapshot) in scenes {
            match serde_json::from_value::<PersistedSceneState>(snapshot.clone()) {
                Ok(state) => {
                    store.scenes.insert(scene_id.clone(), state);
                }
                Err(error) => warn!("Abandoning snapshot for scene '{scene_id}': {error}"),
            }
        }

        store
    }

    pub fn write_to_disk(&self, path: &str) -> bool {
        let Some(json) = self.to_json() else {
            return false;
        };
        match std::fs::write(path, json) {
            Ok(()) => {
                info!("Save data written to {path}");
                true
            }
            Err(error) => {
                warn!("Could not write save data to {path}: {error}");
                false
            }
        }
    }

    pub fn read_from_disk(path: &str) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        Some(Self::from_json(&raw))
    }
}

/// In-flight bounded retry for one scene restoration. The inventory and tool
/// collaborators may not exist yet when restoration is requested; polling
/// suspends between attempts rather than blocking, and exhausting the attempt
/// budget means "nothing to restore", never a fatal fault.
#[derive(Resource, Debug)]
pub struct PendingRestore {
    pub scene_id: String,
    attempts: u32,
    timer: Timer,
}

impl PendingRestore {
    pub fn new(scene_id: impl Into<String>) -> Self {
        Self {
            scene_id: scene_id.into(),
            attempts: 0,
            timer: Timer::from_seconds(RESTORE_POLL_SECONDS, TimerMode::Repeating),
        }
    }

    /// Advance the poll timer; `true` when the next attempt is due.
    pub fn poll_due(&mut self, delta: Duration) -> bool {
        self.timer.tick(delta).just_finished()
    }

    /// Record a failed attempt; `false` once the budget is exhausted.
    pub fn another_attempt(&mut self) -> bool {
        self.attempts += 1;
        self.attempts < RESTORE_MAX_ATTEMPTS
    }
}

/// Request a snapshot of the named scene.
#[derive(Event)]
pub struct SaveSceneEvent {
    pub scene_id: String,
}

/// Request restoration of the named scene.
#[derive(Event)]
pub struct RestoreSceneEvent {
    pub scene_id: String,
}

pub fn handle_save_scene(
    mut events: EventReader<SaveSceneEvent>,
    mut store: ResMut<PersistenceStore>,
    inventory: Option<Res<SampleInventory>>,
    tools: Option<Res<ToolManager>>,
    cameras: Query<&Transform, With<Camera3d>>,
) {
    for event in events.read() {
        let player = cameras
            .single()
            .map(PlayerPose::from_transform)
            .unwrap_or_default();
        let equipped_tool = tools
            .as_ref()
            .and_then(|tools| tools.active_tool())
            .map(|tool| tool.to_string().to_owned())
            .unwrap_or_default();
        let items = inventory
            .as_ref()
            .map(|inventory| inventory.iter().map(SampleRecord::from_sample).collect())
            .unwrap_or_default();

        store.save_scene(
            &event.scene_id,
            PersistedSceneState {
                player,
                equipped_tool,
                items,
            },
        );
        store.write_to_disk(SAVE_FILE_PATH);
    }
}

pub fn handle_restore_scene(mut commands: Commands, mut events: EventReader<RestoreSceneEvent>) {
    for event in events.read() {
        info!("Restore requested for scene '{}'", event.scene_id);
        commands.insert_resource(PendingRestore::new(event.scene_id.clone()));
    }
}

/// Drive the pending restoration, waiting out missing collaborators.
pub fn poll_pending_restore(
    mut commands: Commands,
    time: Res<Time>,
    pending: Option<ResMut<PendingRestore>>,
    store: Res<PersistenceStore>,
    inventory: Option<ResMut<SampleInventory>>,
    tools: Option<ResMut<ToolManager>>,
    mut cameras: Query<&mut Transform, With<Camera3d>>,
) {
    let Some(mut pending) = pending else {
        return;
    };
    if !pending.poll_due(time.delta()) {
        return;
    }

    match (inventory, tools) {
        (Some(mut inventory), Some(mut tools)) => {
            let pose = store
                .restore_scene(&pending.scene_id, &mut inventory, &mut tools)
                .unwrap_or_else(|| default_pose(&pending.scene_id));
            if let Ok(mut transform) = cameras.single_mut() {
                pose.apply_to(&mut transform);
            }
            commands.remove_resource::<PendingRestore>();
        }
        _ => {
            if !pending.another_attempt() {
                warn!(
                    "Collaborators never became ready; nothing restored for scene '{}'",
                    pending.scene_id
                );
                commands.remove_resource::<PendingRestore>();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geology::reconstruction::ReconstructedSample;

    fn sample(id: &str, depth_start: f32) -> ReconstructedSample {
        ReconstructedSample {
            sample_id: id.into(),
            display_name: format!("Core sample {id}"),
            description: "two strata".into(),
            collection_time: "2026-08-06T09:30:00Z".into(),
            origin: Vec3::new(1.0, 0.0, -1.0),
            source_tool_id: "tower".into(),
            total_depth: depth_start + 2.0,
            radius: 0.1,
            depth_start,
            depth_end: depth_start + 2.0,
            layer_count: 2,
            display_position: Vec3::ZERO,
            segments: Vec::new(),
        }
    }

    fn snapshot_with_samples(ids: &[&str]) -> PersistedSceneState {
        PersistedSceneState {
            player: PlayerPose::default(),
            equipped_tool: "tower".into(),
            items: ids
                .iter()
                .enumerate()
                .map(|(index, id)| SampleRecord::from_sample(&sample(id, index as f32 * 2.0)))
                .collect(),
        }
    }

    #[test]
    fn three_samples_round_trip_field_for_field() {
        let mut store = PersistenceStore::default();
        store.save_scene("quarry", snapshot_with_samples(&["a", "b", "c"]));

        let reloaded = PersistenceStore::from_json(&store.to_json().unwrap());
        let mut inventory = SampleInventory::default();
        let mut tools = ToolManager::default();

        reloaded
            .restore_scene("quarry", &mut inventory, &mut tools)
            .expect("snapshot present");

        assert_eq!(inventory.count(), 3);
        let restored: Vec<SampleRecord> = inventory.iter().map(SampleRecord::from_sample).collect();
        assert_eq!(restored, store.snapshot("quarry").unwrap().items);
        assert_eq!(tools.active_tool(), Some(ToolType::Tower));
    }

    #[test]
    fn restoring_twice_does_not_duplicate_inventory() {
        let mut store = PersistenceStore::default();
        store.save_scene("quarry", snapshot_with_samples(&["a", "b", "c"]));

        let mut inventory = SampleInventory::default();
        let mut tools = ToolManager::default();
        store.restore_scene("quarry", &mut inventory, &mut tools);
        store.restore_scene("quarry", &mut inventory, &mut tools);

        assert_eq!(inventory.count(), 3);
    }

    #[test]
    fn missing_snapshot_falls_back_to_defaults() {
        let store = PersistenceStore::default();
        let mut inventory = SampleInventory::default();
        let mut tools = ToolManager::default();

        assert!(store
            .restore_scene("laboratory", &mut inventory, &mut tools)
            .is_none());
        assert_eq!(default_pose("laboratory").position, [0.0, 1.0, 2.0]);
    }

    #[test]
    fn malformed_scene_is_abandoned_without_poisoning_others() {
        let raw = r#"{
            "scenes": {
                "broken": { "items": "not-an-array" },
                "quarry": { "equipped_tool": "bore", "items": [] }
            }
        }"#;

        let store = PersistenceStore::from_json(raw);
        assert!(store.snapshot("broken").is_none());
        assert!(store.snapshot("quarry").is_some());
    }

    #[test]
    fn unreadable_save_data_starts_empty() {
        let store = PersistenceStore::from_json("{ not json");
        assert!(store.scenes.is_empty());
    }

    #[test]
    fn retry_budget_is_bounded() {
        let mut pending = PendingRestore::new("quarry");
        for _ in 0..RESTORE_MAX_ATTEMPTS - 1 {
            assert!(pending.another_attempt());
        }
        assert!(!pending.another_attempt());
    }

    #[test]
    fn polls_fire_on_the_configured_interval() {
        let mut pending = PendingRestore::new("quarry");
        assert!(!pending.poll_due(Duration::from_millis(100)));
        assert!(pending.poll_due(Duration::from_millis(100)));
        assert!(pending.poll_due(Duration::from_secs_f32(RESTORE_POLL_SECONDS)));
    }
}
