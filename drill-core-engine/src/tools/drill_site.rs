use std::time::Duration;

use bevy::prelude::*;

use constants::drill::{BORE_SETTLE_SECONDS, DEPTH_PER_BORE, MAX_BORES};

use crate::engine::effects::{PlayBoreEffect, StopBoreEffect};
use crate::engine::geology::detection::{detect_with_stats, find_surface, DrillPath};
use crate::engine::geology::layer::LayerId;
use crate::engine::geology::reconstruction::{
    reconstruct, sample_ring_position, ReconstructedSample, ReconstructionRequest,
};
use crate::engine::geology::registry::LayerRegistry;
use crate::engine::inventory::SampleInventory;
use crate::tools::sample_display::SampleArtifact;
use crate::tools::tool_manager::{ToolManager, ToolType};

/// Per-layer note captured when a bore bottoms out: how much of the stratum
/// continues below the reached depth.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerNote {
    pub layer: LayerId,
    pub remaining_thickness: f32,
    pub contact_depth: f32,
}

/// Immutable record of one completed bore. Appended-only, owned by the site.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthRecord {
    /// Absolute depth reached, from the surface.
    pub depth: f32,
    pub world_position: Vec3,
    pub direction: Vec3,
    pub layer_notes: Vec<LayerNote>,
}

/// Work order emitted exactly once when the settle phase of a bore ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoreJob {
    pub bore_index: u32,
    pub depth_start: f32,
    pub depth_end: f32,
}

/// One placed drilling rig and its progression through successive bores.
///
/// `is_boring` is the sole mutual-exclusion guard for the site: set when a
/// bore command is accepted, cleared only when the bore completes. Under the
/// single-threaded schedule no other synchronization is needed.
#[derive(Component, Debug, Clone)]
pub struct DrillSite {
    site_id: String,
    anchor: Vec3,
    drill_index: u32,
    max_bores: u32,
    depth_per_bore: f32,
    is_boring: bool,
    settle: Timer,
    history: Vec<DepthRecord>,
    samples: Vec<ReconstructedSample>,
}

impl DrillSite {
    pub fn new(site_id: impl Into<String>, anchor: Vec3) -> Self {
        Self {
            site_id: site_id.into(),
            anchor,
            drill_index: 0,
            max_bores: MAX_BORES,
            depth_per_bore: DEPTH_PER_BORE,
            is_boring: false,
            settle: Timer::from_seconds(BORE_SETTLE_SECONDS, TimerMode::Once),
            history: Vec::new(),
            samples: Vec::new(),
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn drill_index(&self) -> u32 {
        self.drill_index
    }

    pub fn max_bores(&self) -> u32 {
        self.max_bores
    }

    pub fn is_boring(&self) -> bool {
        self.is_boring
    }

    pub fn history(&self) -> &[DepthRecord] {
        &self.history
    }

    pub fn samples(&self) -> &[ReconstructedSample] {
        &self.samples
    }

    pub fn can_bore(&self) -> bool {
        !self.is_boring && self.drill_index < self.max_bores
    }

    /// Accept a bore command and enter the settle phase. Rejected silently
    /// while a bore is in flight or once the site is exhausted.
    pub fn begin_bore(&mut self) -> bool {
        if !self.can_bore() {
            return false;
        }
        self.is_boring = true;
        self.settle.reset();
        true
    }

    /// Count the settle phase down. Emits the bore's work order exactly once,
    /// on the tick that crosses the settle duration; `is_boring` stays set
    /// until [`DrillSite::complete_bore`].
    pub fn tick(&mut self, delta: Duration) -> Option<BoreJob> {
        if !self.is_boring {
            return None;
        }
        self.settle.tick(delta);
        if !self.settle.just_finished() {
            return None;
        }

        let depth_start = self.drill_index as f32 * self.depth_per_bore;
        Some(BoreJob {
            bore_index: self.drill_index,
            depth_start,
            depth_end: depth_start + self.depth_per_bore,
        })
    }

    /// Land a finished bore: record it, take ownership of the sample, advance
    /// the depth index and return to idle. Runs unconditionally, even when
    /// detection degraded to the fallback sample.
    pub fn complete_bore(
        &mut self,
        job: &BoreJob,
        record: DepthRecord,
        sample: ReconstructedSample,
    ) {
        debug_assert_eq!(job.bore_index, self.drill_index);
        self.samples.push(sample);
        self.history.push(record);
        self.drill_index += 1;
        self.is_boring = false;
    }

    /// Recall is only legal while idle; an in-flight bore must finish first.
    pub fn can_recall(&self) -> bool {
        !self.is_boring
    }

    pub fn take_sample(&mut self, sample_id: &str) -> Option<ReconstructedSample> {
        let index = self
            .samples
            .iter()
            .position(|sample| sample.sample_id == sample_id)?;
        Some(self.samples.remove(index))
    }
}

/// Run detection and reconstruction for one settled bore job.
///
/// The drilling path starts at the true surface above the anchor (falling
/// back to the anchor itself when no surface is found) so successive windows
/// of one site always measure depth from the same datum.
pub fn execute_bore(
    site: &DrillSite,
    job: &BoreJob,
    registry: &LayerRegistry,
    tool_id: &str,
) -> (DepthRecord, ReconstructedSample) {
    let surface = find_surface(registry, site.anchor());
    let origin = surface.map(|hit| hit.point).unwrap_or(site.anchor());

    let path = DrillPath::straight_down(origin, job.depth_end);
    let (hits, _stats) = detect_with_stats(registry, &path, (job.depth_start, job.depth_end));

    let display_position = sample_ring_position(site.anchor(), job.bore_index, site.max_bores(), registry);
    let sample = reconstruct(
        &hits,
        surface.as_ref(),
        registry,
        &ReconstructionRequest {
            site_id: site.site_id(),
            bore_index: job.bore_index,
            tool_id,
            origin,
            radius: path.radius,
            depth_start: job.depth_start,
            depth_end: job.depth_end,
            display_position,
        },
    );

    let layer_notes = hits
        .iter()
        .filter(|hit| hit.exit_depth > job.depth_end)
        .map(|hit| LayerNote {
            layer: hit.layer,
            remaining_thickness: hit.exit_depth - job.depth_end,
            contact_depth: hit.entry_depth,
        })
        .collect();

    let record = DepthRecord {
        depth: job.depth_end,
        world_position: origin + Vec3::NEG_Y * job.depth_end,
        direction: Vec3::NEG_Y,
        layer_notes,
    };

    (record, sample)
}

/// Command a site to start its next bore.
#[derive(Event)]
pub struct BeginBoreEvent {
    pub site: Entity,
}

/// Command a site to pack up, discarding its samples.
#[derive(Event)]
pub struct RecallSiteEvent {
    pub site: Entity,
}

/// Transfer one of a site's samples into the player inventory.
#[derive(Event)]
pub struct CollectSampleEvent {
    pub site: Entity,
    pub sample_id: String,
}

/// A finished sample ready for the display spawner.
#[derive(Event)]
pub struct SampleSpawnEvent {
    pub site: Entity,
    pub sample: ReconstructedSample,
}

pub fn handle_begin_bore(
    mut events: EventReader<BeginBoreEvent>,
    mut sites: Query<&mut DrillSite>,
    mut play_effects: EventWriter<PlayBoreEffect>,
) {
    for event in events.read() {
        let Ok(mut site) = sites.get_mut(event.site) else {
            continue;
        };
        if site.begin_bore() {
            info!(
                "Site {} boring {}/{}",
                site.site_id(),
                site.drill_index() + 1,
                site.max_bores()
            );
            play_effects.send(PlayBoreEffect {
                position: site.anchor(),
            });
        } else {
            warn!(
                "Site {} cannot bore (boring: {}, depth index {}/{})",
                site.site_id(),
                site.is_boring(),
                site.drill_index(),
                site.max_bores()
            );
        }
    }
}

/// Advance every in-flight bore and land the ones whose settle phase ended.
pub fn tick_drill_sites(
    time: Res<Time>,
    registry: Option<Res<LayerRegistry>>,
    tool_manager: Res<ToolManager>,
    mut sites: Query<(Entity, &mut DrillSite)>,
    mut stop_effects: EventWriter<StopBoreEffect>,
    mut spawn_events: EventWriter<SampleSpawnEvent>,
) {
    let Some(registry) = registry else {
        return;
    };

    let tool_id = tool_manager
        .active_tool()
        .unwrap_or(ToolType::Tower)
        .to_string();

    for (entity, mut site) in &mut sites {
        let Some(job) = site.tick(time.delta()) else {
            continue;
        };

        let (record, sample) = execute_bore(&site, &job, &registry, tool_id);
        info!(
            "Site {} finished bore {} ({:.1}m-{:.1}m): {} segments",
            site.site_id(),
            job.bore_index + 1,
            job.depth_start,
            job.depth_end,
            sample.segments.len()
        );

        site.complete_bore(&job, record, sample.clone());
        spawn_events.send(SampleSpawnEvent {
            site: entity,
            sample,
        });
        stop_effects.send(StopBoreEffect);
    }
}

pub fn handle_recall_site(
    mut commands: Commands,
    mut events: EventReader<RecallSiteEvent>,
    sites: Query<&DrillSite>,
    artifacts: Query<(Entity, &SampleArtifact)>,
) {
    for event in events.read() {
        let Ok(site) = sites.get(event.site) else {
            continue;
        };
        if !site.can_recall() {
            warn!("Site {} is boring, recall rejected", site.site_id());
            continue;
        }

        for (artifact_entity, artifact) in &artifacts {
            if artifact.site == event.site {
                commands.entity(artifact_entity).despawn();
            }
        }
        info!(
            "Site {} recalled, {} samples discarded",
            site.site_id(),
            site.samples().len()
        );
        commands.entity(event.site).despawn();
    }
}

pub fn handle_collect_sample(
    mut commands: Commands,
    mut events: EventReader<CollectSampleEvent>,
    mut sites: Query<&mut DrillSite>,
    mut inventory: ResMut<SampleInventory>,
    artifacts: Query<(Entity, &SampleArtifact)>,
) {
    for event in events.read() {
        let Ok(mut site) = sites.get_mut(event.site) else {
            continue;
        };
        if inventory.is_full() {
            warn!("Inventory full, leaving sample {} in place", event.sample_id);
            continue;
        }
        let Some(sample) = site.take_sample(&event.sample_id) else {
            continue;
        };
        inventory.add_sample(sample);

        for (artifact_entity, artifact) in &artifacts {
            if artifact.sample_id == event.sample_id {
                commands.entity(artifact_entity).despawn();
            }
        }
    }
}
