use std::collections::{HashMap, HashSet};

use sector_atlas_core::{Event, SectorId};
use tracing::debug;

use crate::{GraphicsQueue, PreviewImage};

/// Preview images keyed by sector.
#[derive(Debug, Default)]
pub struct PreviewStore {
    headless: bool,
    generation: u64,
    images: HashMap<SectorId, PreviewImage>,
    retired: HashSet<SectorId>,
}

impl PreviewStore {
    /// Creates an empty store; a headless store never requests renders.
    #[must_use]
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            generation: 0,
            images: HashMap::new(),
            retired: HashSet::new(),
        }
    }

    /// Reacts to world events, queueing renders on `queue`.
    pub fn handle(&mut self, events: &[Event], queue: &mut GraphicsQueue) {
        for event in events {
            match event {
                Event::PreviewRequested { sector, footprint } if !self.headless => {
                    queue.submit(*sector, *footprint, self.generation);
                }
                Event::PreviewsCleared => self.clear(),
                Event::SectorAbsorbed { sector, .. } => self.retire(*sector),
                _ => {}
            }
        }
    }

    /// Stores a finished image, returning the one it replaced.
    pub fn insert(&mut self, sector: SectorId, image: PreviewImage) -> Option<PreviewImage> {
        self.images.insert(sector, image)
    }

    /// Releases the sector's image.
    pub fn remove(&mut self, sector: SectorId) -> Option<PreviewImage> {
        self.images.remove(&sector)
    }

    /// Releases the sector's image and refuses renders of it still in flight.
    pub fn retire(&mut self, sector: SectorId) {
        let _ = self.images.remove(&sector);
        let _ = self.retired.insert(sector);
    }

    /// Reports whether the sector no longer accepts images.
    #[must_use]
    pub fn is_retired(&self, sector: SectorId) -> bool {
        self.retired.contains(&sector)
    }

    /// Releases every image and invalidates renders still in flight.
    pub fn clear(&mut self) {
        debug!(released = self.images.len(), "previews cleared");
        self.images.clear();
        self.retired.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Image rendered for the sector, if any.
    #[must_use]
    pub fn get(&self, sector: SectorId) -> Option<&PreviewImage> {
        self.images.get(&sector)
    }

    /// Number of stored images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Reports whether no image is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Counter bumped by every clear; renders tagged with an older value are stale.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}
