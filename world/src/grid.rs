use std::collections::HashMap;

use sector_atlas_core::{Footprint, PackedPosition, SectorId};

/// Sparse index from grid cell to the sector occupying it.
///
/// Absent cells are locked: no sector has been created there yet.
#[derive(Clone, Debug, Default)]
pub struct SectorGrid {
    cells: HashMap<PackedPosition, SectorId>,
}

impl SectorGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sector occupying the cell, if any.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<SectorId> {
        PackedPosition::try_pack(x, y).and_then(|key| self.get_packed(key))
    }

    /// Sector occupying the cell addressed by a packed key, if any.
    #[must_use]
    pub fn get_packed(&self, key: PackedPosition) -> Option<SectorId> {
        self.cells.get(&key).copied()
    }

    /// Occupies or clears a single cell.
    ///
    /// Returns `false` when the coordinates cannot be packed.
    pub fn put(&mut self, x: i32, y: i32, sector: Option<SectorId>) -> bool {
        let Some(key) = PackedPosition::try_pack(x, y) else {
            return false;
        };
        match sector {
            Some(sector) => {
                let _ = self.cells.insert(key, sector);
            }
            None => {
                let _ = self.cells.remove(&key);
            }
        }
        true
    }

    /// Reports whether any sector occupies the cell.
    #[must_use]
    pub fn contains_key(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some()
    }

    /// Occupant of every occupied cell; a sector appears once per cell it covers.
    pub fn values(&self) -> impl Iterator<Item = SectorId> + '_ {
        self.cells.values().copied()
    }

    /// Occupies every cell of the footprint with `sector`.
    pub fn fill(&mut self, footprint: Footprint, sector: SectorId) {
        for (x, y) in footprint.cells() {
            let _ = self.put(x, y, Some(sector));
        }
    }

    /// Clears every cell of the footprint.
    pub fn clear_footprint(&mut self, footprint: Footprint) {
        for (x, y) in footprint.cells() {
            let _ = self.put(x, y, None);
        }
    }

    /// Removes every occupied cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no cell is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
