#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative sector world state for Sector Atlas.
//!
//! The world owns the sparse sector grid, every sector record, the active
//! play selection and the authoritative tile buffer. Lifecycle mutations go
//! through [`apply`]; in-place growth of the active sector goes through
//! [`expand`] because it additionally drives the tile generator and the
//! entity relocation contract.

mod expansion;
mod grid;
mod sector;

use std::collections::BTreeMap;

use sector_atlas_core::{
    AtlasConfig, Command, Event, Footprint, PackedPosition, SectorId, SectorState, TileBuffer,
};
use tracing::{debug, warn};

pub use expansion::{expand, load_sector_map, ExpansionCollaborators};
pub use grid::SectorGrid;
pub use sector::Sector;

/// Represents the authoritative Sector Atlas world state.
#[derive(Debug)]
pub struct World {
    config: AtlasConfig,
    grid: SectorGrid,
    sectors: BTreeMap<SectorId, Sector>,
    next_sector_id: u32,
    active: Option<SectorId>,
    session_running: bool,
    tiles: TileBuffer,
    map_loading: bool,
}

impl World {
    /// Creates an empty world using the provided configuration.
    #[must_use]
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            config,
            grid: SectorGrid::new(),
            sectors: BTreeMap::new(),
            next_sector_id: 0,
            active: None,
            session_running: false,
            tiles: TileBuffer::default(),
            map_loading: false,
        }
    }

    fn allocate_id(&mut self) -> SectorId {
        let id = SectorId::new(self.next_sector_id);
        self.next_sector_id = self.next_sector_id.wrapping_add(1);
        id
    }

    fn create_sector(&mut self, x: i32, y: i32, out_events: &mut Vec<Event>) {
        let Some(position) = PackedPosition::try_pack(x, y) else {
            warn!(x, y, "ignoring sector outside the packable grid range");
            return;
        };
        if self.grid.contains_key(x, y) {
            return;
        }

        let id = self.allocate_id();
        let footprint = Footprint::unit(position);
        let sector = Sector::new(
            id,
            SectorState {
                footprint,
                complete: false,
                completed_missions: 0,
                save_slot: None,
            },
        );
        debug!(
            sector = id.get(),
            x,
            y,
            difficulty = sector.difficulty(),
            "created sector"
        );
        self.grid.fill(footprint, id);
        let _ = self.sectors.insert(id, sector);
        out_events.push(Event::SectorCreated {
            sector: id,
            position,
        });
        out_events.push(Event::PreviewRequested {
            sector: id,
            footprint,
        });
    }

    fn complete_sector(&mut self, x: i32, y: i32, out_events: &mut Vec<Event>) {
        self.create_sector(x, y, out_events);
        let Some(id) = self.grid.get(x, y) else {
            return;
        };
        let Some(sector) = self.sectors.get_mut(&id) else {
            return;
        };
        if sector.set_complete() {
            debug!(sector = id.get(), "sector completed");
            out_events.push(Event::SectorCompleted { sector: id });
        }

        for (ring_x, ring_y) in unlock_ring(sector.footprint()) {
            self.create_sector(ring_x, ring_y, out_events);
        }
    }

    fn advance_mission(&mut self, id: SectorId, out_events: &mut Vec<Event>) {
        let Some(sector) = self.sectors.get_mut(&id) else {
            return;
        };
        let completed = sector.advance_mission();
        let finished = sector.all_missions_done() && !sector.is_complete();
        let origin = sector.footprint();
        out_events.push(Event::MissionAdvanced {
            sector: id,
            completed,
        });
        if finished {
            self.complete_sector(origin.x(), origin.y(), out_events);
        }
    }

    fn restore_sector(&mut self, state: SectorState, out_events: &mut Vec<Event>) {
        let footprint = state.footprint;
        if footprint.cells().any(|(x, y)| self.grid.contains_key(x, y)) {
            warn!(
                x = footprint.x(),
                y = footprint.y(),
                "skipping stored sector overlapping an existing sector"
            );
            return;
        }

        let id = self.allocate_id();
        self.grid.fill(footprint, id);
        let _ = self.sectors.insert(id, Sector::new(id, state));
        out_events.push(Event::PreviewRequested {
            sector: id,
            footprint,
        });
    }

    fn install_map(&mut self, tiles: TileBuffer, out_events: &mut Vec<Event>) {
        let (width, height) = (tiles.width(), tiles.height());
        self.map_loading = true;
        out_events.push(Event::MapLoadBegan { width, height });
        self.tiles = tiles;
        self.map_loading = false;
        out_events.push(Event::MapLoadEnded { width, height });
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.grid.clear();
        self.sectors.clear();
        self.active = None;
        self.session_running = false;
        self.tiles = TileBuffer::default();
        out_events.push(Event::GridReset);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(AtlasConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::CreateSector { x, y } => world.create_sector(x, y, out_events),
        Command::CompleteSector { x, y } => world.complete_sector(x, y, out_events),
        Command::AdvanceMission { sector } => world.advance_mission(sector, out_events),
        Command::RecordMissionProgress { sector, amount } => {
            let Some(record) = world.sectors.get_mut(&sector) else {
                return;
            };
            let Some(mission) = record.current_mission_mut() else {
                return;
            };
            mission.record_progress(amount);
            if mission.is_complete() {
                world.advance_mission(sector, out_events);
            }
        }
        Command::ResetMissions { sector } => {
            if let Some(record) = world.sectors.get_mut(&sector) {
                record.reset_missions();
                out_events.push(Event::MissionsReset { sector });
            }
        }
        Command::BeginMission { sector } => {
            if let Some(record) = world.sectors.get(&sector) {
                record.current_mission().on_begin(sector, out_events);
            }
        }
        Command::SetActiveSector { sector } => {
            if let Some(id) = sector {
                if !world.sectors.contains_key(&id) {
                    warn!(sector = id.get(), "cannot activate unknown sector");
                    return;
                }
            }
            world.active = sector;
            world.session_running = false;
            out_events.push(Event::ActiveSectorChanged { sector });
        }
        Command::StartSession => {
            let Some(sector) = world.active else {
                warn!("cannot start a session without an active sector");
                return;
            };
            let starting_items = world
                .sectors
                .get(&sector)
                .map(|record| record.starting_items().to_vec())
                .unwrap_or_default();
            world.session_running = true;
            out_events.push(Event::SessionStarted {
                sector,
                starting_items,
            });
        }
        Command::AssignSaveSlot { sector, slot } => {
            if let Some(record) = world.sectors.get_mut(&sector) {
                record.set_save_slot(slot);
                out_events.push(Event::SaveSlotAssigned { sector, slot });
            }
        }
        Command::RestoreSector { state } => world.restore_sector(state, out_events),
        Command::InstallMap { tiles } => world.install_map(tiles, out_events),
        Command::ResetGrid => world.reset(out_events),
    }
}

/// Cells surrounding the footprint at Chebyshev distance one, minus the four diagonal corners.
fn unlock_ring(footprint: Footprint) -> Vec<(i32, i32)> {
    let width = footprint.width() as i32;
    let height = footprint.height() as i32;
    let mut ring = Vec::with_capacity(2 * (width + height) as usize);
    for sx in 0..width + 2 {
        for sy in 0..height + 2 {
            let border = sx == 0 || sy == 0 || sx == width + 1 || sy == height + 1;
            let corner = (sx == 0 || sx == width + 1) && (sy == 0 || sy == height + 1);
            if border && !corner {
                ring.push((footprint.x() + sx - 1, footprint.y() + sy - 1));
            }
        }
    }
    ring
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use sector_atlas_core::{AtlasConfig, SectorId, TileBuffer};

    use super::{Sector, SectorGrid, World};

    /// Provides read-only access to the sparse sector grid.
    #[must_use]
    pub fn grid(world: &World) -> &SectorGrid {
        &world.grid
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &AtlasConfig {
        &world.config
    }

    /// Sector with the provided identifier.
    #[must_use]
    pub fn sector(world: &World, id: SectorId) -> Option<&Sector> {
        world.sectors.get(&id)
    }

    /// Sector occupying the cell, if any.
    #[must_use]
    pub fn sector_at(world: &World, x: i32, y: i32) -> Option<&Sector> {
        world.grid.get(x, y).and_then(|id| world.sectors.get(&id))
    }

    /// Every distinct sector in identifier order.
    pub fn sectors(world: &World) -> impl Iterator<Item = &Sector> {
        world.sectors.values()
    }

    /// Sector the simulation is running against.
    #[must_use]
    pub fn active_sector(world: &World) -> Option<&Sector> {
        world.active.and_then(|id| world.sectors.get(&id))
    }

    /// Reports whether a play session is running on the active sector.
    #[must_use]
    pub fn session_running(world: &World) -> bool {
        world.session_running && world.active.is_some()
    }

    /// Authoritative tile buffer, unavailable while a map load is in progress.
    #[must_use]
    pub fn tiles(world: &World) -> Option<&TileBuffer> {
        (!world.map_loading).then_some(&world.tiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_of(x: i32, y: i32, width: u32, height: u32) -> Vec<(i32, i32)> {
        let footprint = Footprint::new(x, y, width, height).expect("valid footprint");
        let mut ring = unlock_ring(footprint);
        ring.sort_unstable();
        ring
    }

    #[test]
    fn ring_of_unit_sector_is_a_cross() {
        assert_eq!(ring_of(0, 0, 1, 1), vec![(-1, 0), (0, -1), (0, 1), (1, 0)]);
    }

    #[test]
    fn ring_of_wide_sector_skips_corners() {
        let ring = ring_of(0, 0, 3, 2);
        assert_eq!(ring.len(), 2 * (3 + 2));
        for corner in [(-1, -1), (-1, 2), (3, -1), (3, 2)] {
            assert!(!ring.contains(&corner));
        }
        assert!(ring.contains(&(1, -1)));
        assert!(ring.contains(&(3, 1)));
    }

    #[test]
    fn apply_create_populates_derived_fields() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(&mut world, Command::CreateSector { x: 3, y: 4 }, &mut events);

        let sector = query::sector_at(&world, 3, 4).expect("sector created");
        assert_eq!(sector.difficulty(), 5);
        assert_eq!(sector.missions().len(), 1);
        assert!(!sector.spawn_schedule().is_empty());
        assert_eq!(sector.save_slot(), None);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn start_session_requires_active_sector() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(&mut world, Command::StartSession, &mut events);
        assert!(events.is_empty());
        assert!(!query::session_running(&world));
    }

    #[test]
    fn activating_unknown_sector_is_ignored() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetActiveSector {
                sector: Some(SectorId::new(9)),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert!(query::active_sector(&world).is_none());
    }
}
