use bevy::prelude::*;

/// Fired when a bore enters its settle phase. Consumed by the audio/particle
/// collaborator; the state machine never waits on it.
#[derive(Event)]
pub struct PlayBoreEffect {
    pub position: Vec3,
}

/// Fired when a bore leaves its settle phase.
#[derive(Event)]
pub struct StopBoreEffect;

/// Placeholder consumer standing in for the rendering/audio collaborator.
pub fn bore_effect_playback(
    mut play_events: EventReader<PlayBoreEffect>,
    mut stop_events: EventReader<StopBoreEffect>,
) {
    for event in play_events.read() {
        info!("Bore effects started at {:?}", event.position);
    }
    for _ in stop_events.read() {
        info!("Bore effects stopped");
    }
}
