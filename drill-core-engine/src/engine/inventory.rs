use bevy::prelude::*;

use constants::persistence::MAX_INVENTORY_SAMPLES;

use crate::engine::geology::reconstruction::ReconstructedSample;

/// Bounded store of samples the player has collected. Collaborator surface
/// for the drilling core; display widgets live elsewhere.
#[derive(Resource, Debug)]
pub struct SampleInventory {
    samples: Vec<ReconstructedSample>,
    max_samples: usize,
}

impl Default for SampleInventory {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
            max_samples: MAX_INVENTORY_SAMPLES,
        }
    }
}

impl SampleInventory {
    /// Accept a sample unless the inventory is full. Full is a signal, not an
    /// error; the caller keeps ownership on `false`.
    pub fn add_sample(&mut self, sample: ReconstructedSample) -> bool {
        if self.is_full() {
            warn!(
                "Inventory full ({}/{}), refusing sample {}",
                self.samples.len(),
                self.max_samples,
                sample.sample_id
            );
            return false;
        }
        info!("Collected sample {}", sample.sample_id);
        self.samples.push(sample);
        true
    }

    pub fn remove_sample(&mut self, sample_id: &str) -> Option<ReconstructedSample> {
        let index = self
            .samples
            .iter()
            .position(|sample| sample.sample_id == sample_id)?;
        Some(self.samples.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReconstructedSample> {
        self.samples.iter()
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.max_samples
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> ReconstructedSample {
        ReconstructedSample {
            sample_id: id.into(),
            display_name: String::new(),
            description: String::new(),
            collection_time: String::new(),
            origin: Vec3::ZERO,
            source_tool_id: "tower".into(),
            total_depth: 2.0,
            radius: 0.1,
            depth_start: 0.0,
            depth_end: 2.0,
            layer_count: 1,
            display_position: Vec3::ZERO,
            segments: Vec::new(),
        }
    }

    #[test]
    fn refuses_samples_past_capacity() {
        let mut inventory = SampleInventory {
            samples: Vec::new(),
            max_samples: 2,
        };
        assert!(inventory.add_sample(sample("a")));
        assert!(inventory.add_sample(sample("b")));
        assert!(!inventory.add_sample(sample("c")));
        assert_eq!(inventory.count(), 2);
    }

    #[test]
    fn removal_is_by_sample_id() {
        let mut inventory = SampleInventory::default();
        inventory.add_sample(sample("a"));
        inventory.add_sample(sample("b"));

        let removed = inventory.remove_sample("a").expect("sample a present");
        assert_eq!(removed.sample_id, "a");
        assert!(inventory.remove_sample("a").is_none());
        assert_eq!(inventory.count(), 1);
    }

    #[test]
    fn clear_empties_the_store() {
        let mut inventory = SampleInventory::default();
        inventory.add_sample(sample("a"));
        inventory.clear();
        assert_eq!(inventory.count(), 0);
        assert!(!inventory.is_full());
    }
}
