#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sector Atlas engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative sector world, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that adapters
//! react to (preview rendering, user notices, map reloads). Collaborators the
//! world consults but does not own are expressed as traits: [`TileGenerator`]
//! for terrain and [`EntityRegistry`] for live simulation entities.

mod config;
mod missions;
mod position;
mod tiles;

use serde::{Deserialize, Serialize};

pub use config::AtlasConfig;
pub use missions::{
    BlockKind, Mission, Objective, SpawnGroup, TutorialStep, UnitKind, DEFAULT_WAVES, VICTORY,
};
pub use position::{Footprint, PackedPosition};
pub use tiles::{
    FloorId, GeneratedTile, Structure, Team, Tile, TileBuffer, TileBufferBuilder, TileGenerator,
    TileTransform, WallId,
};

/// Commands that express all permissible world mutations besides expansion.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Creates a locked 1x1 sector at the cell unless the cell is already occupied.
    CreateSector {
        /// Column of the cell.
        x: i32,
        /// Row of the cell.
        y: i32,
    },
    /// Marks the sector covering the cell complete and unlocks its surrounding ring.
    CompleteSector {
        /// Column of the cell.
        x: i32,
        /// Row of the cell.
        y: i32,
    },
    /// Records that the sector's current mission was accomplished.
    AdvanceMission {
        /// Sector whose mission advanced.
        sector: SectorId,
    },
    /// Adds progress to the sector's current mission, advancing it once complete.
    RecordMissionProgress {
        /// Sector whose current mission progressed.
        sector: SectorId,
        /// Progress to add.
        amount: u32,
    },
    /// Discards progress on every mission of the sector.
    ResetMissions {
        /// Sector whose missions are reset.
        sector: SectorId,
    },
    /// Emits the begin notification of the sector's current mission.
    BeginMission {
        /// Sector whose current mission begins.
        sector: SectorId,
    },
    /// Selects the sector the simulation is running against.
    SetActiveSector {
        /// Sector that becomes active, or `None` to leave play.
        sector: Option<SectorId>,
    },
    /// Starts a fresh play session on the active sector.
    StartSession,
    /// Binds or unbinds a save slot to the sector.
    AssignSaveSlot {
        /// Sector receiving the binding.
        sector: SectorId,
        /// Slot to bind, `None` once the save was deleted.
        slot: Option<SaveSlotId>,
    },
    /// Re-creates a sector from persisted state.
    RestoreSector {
        /// Persisted state of the sector.
        state: SectorState,
    },
    /// Replaces the authoritative tile buffer, typically from a loaded save.
    InstallMap {
        /// Tiles that become authoritative.
        tiles: TileBuffer,
    },
    /// Removes every sector from the grid and leaves play.
    ResetGrid,
}

/// User-facing notices raised while entering a sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notice {
    /// The sector's save was written by an incompatible build and was removed.
    OutdatedSave {
        /// Sector whose save was removed.
        sector: SectorId,
    },
    /// The sector's save could not be loaded and was removed.
    CorruptSave {
        /// Sector whose save was removed.
        sector: SectorId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new sector was created on the grid.
    SectorCreated {
        /// Identifier assigned to the sector.
        sector: SectorId,
        /// Packed bottom-left cell of the sector.
        position: PackedPosition,
    },
    /// A sector was marked complete.
    SectorCompleted {
        /// Identifier of the completed sector.
        sector: SectorId,
    },
    /// A sector grew in place.
    SectorExpanded {
        /// Identifier of the expanded sector.
        sector: SectorId,
        /// Footprint after the expansion.
        footprint: Footprint,
    },
    /// A sector was removed because an expansion grew over it.
    SectorAbsorbed {
        /// Identifier of the removed sector.
        sector: SectorId,
        /// Identifier of the sector that grew over it.
        by: SectorId,
    },
    /// An expansion was refused and rolled back.
    ExpansionRejected {
        /// Identifier of the sector that attempted to grow.
        sector: SectorId,
        /// Requested column delta.
        dx: i32,
        /// Requested row delta.
        dy: i32,
    },
    /// A sector's current mission was accomplished.
    MissionAdvanced {
        /// Identifier of the sector.
        sector: SectorId,
        /// Number of missions completed so far.
        completed: u32,
    },
    /// A sector's missions were reset.
    MissionsReset {
        /// Identifier of the sector.
        sector: SectorId,
    },
    /// A mission became the sector's active objective.
    MissionBegan {
        /// Identifier of the sector.
        sector: SectorId,
        /// Objective that began.
        objective: Objective,
        /// Human-readable summary of the objective.
        description: String,
    },
    /// The active sector changed.
    ActiveSectorChanged {
        /// Sector that became active.
        sector: Option<SectorId>,
    },
    /// A fresh play session started on the active sector.
    SessionStarted {
        /// Sector being played.
        sector: SectorId,
        /// Inventory the player's core is stocked with.
        starting_items: Vec<ItemStack>,
    },
    /// A sector's save slot binding changed.
    SaveSlotAssigned {
        /// Identifier of the sector.
        sector: SectorId,
        /// Slot now bound to the sector.
        slot: Option<SaveSlotId>,
    },
    /// Display-only offset that fog and camera layers should apply while a map reloads.
    FogOffset {
        /// Tile offset along the column axis.
        shift_x: u32,
        /// Tile offset along the row axis.
        shift_y: u32,
    },
    /// Consumers must stop reading tiles until [`Event::MapLoadEnded`].
    MapLoadBegan {
        /// Width of the incoming buffer in tiles.
        width: u32,
        /// Height of the incoming buffer in tiles.
        height: u32,
    },
    /// A new authoritative tile buffer is installed.
    MapLoadEnded {
        /// Width of the buffer in tiles.
        width: u32,
        /// Height of the buffer in tiles.
        height: u32,
    },
    /// A preview image should be (re)rendered for the sector.
    PreviewRequested {
        /// Identifier of the sector.
        sector: SectorId,
        /// Footprint to render.
        footprint: Footprint,
    },
    /// Every preview image should be released.
    PreviewsCleared,
    /// Every sector was removed from the grid.
    GridReset,
    /// A notice should be surfaced to the user.
    Notice(Notice),
}

/// Stable identifier of a sector within a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorId(u32);

impl SectorId {
    /// Creates a sector identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a save slot managed by the save-slot store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SaveSlotId(u32);

impl SaveSlotId {
    /// Creates a save slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Difficulty bracket applied to a sector's session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DifficultyTier {
    /// Relaxed enemy scaling.
    Normal,
    /// Increased enemy scaling.
    Hard,
    /// Maximum enemy scaling.
    Insane,
}

/// Items that can be stocked in a sector's core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    /// Basic construction metal.
    Copper,
    /// Secondary construction metal.
    Lead,
    /// Fuel ore.
    Coal,
    /// Smelted alloy.
    DenseAlloy,
    /// Refined semiconductor.
    Silicon,
    /// Late-game metal.
    Titanium,
}

impl ItemKind {
    /// Display name of the item.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Copper => "copper",
            Self::Lead => "lead",
            Self::Coal => "coal",
            Self::DenseAlloy => "dense alloy",
            Self::Silicon => "silicon",
            Self::Titanium => "titanium",
        }
    }
}

/// Quantity of a single item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item kind.
    pub item: ItemKind,
    /// Number of items.
    pub amount: u32,
}

impl ItemStack {
    /// Creates a new item stack.
    #[must_use]
    pub const fn new(item: ItemKind, amount: u32) -> Self {
        Self { item, amount }
    }
}

/// Persistent portion of a sector; everything else is re-derived on load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectorState {
    /// Cells covered by the sector.
    pub footprint: Footprint,
    /// Whether the sector has been completed.
    pub complete: bool,
    /// Number of missions completed so far.
    pub completed_missions: u32,
    /// Save slot bound to the sector, `None` when no save exists.
    pub save_slot: Option<SaveSlotId>,
}

/// Live simulation entity as seen by the expansion engine.
pub trait SimEntity {
    /// Current position in world units.
    fn position(&self) -> (f32, f32);

    /// Moves the entity to a new position in world units.
    fn set_position(&mut self, x: f32, y: f32);

    /// Packed index of the tile the entity was spawned from, if it tracks one.
    fn spawner_tile(&self) -> Option<u32> {
        None
    }

    /// Replaces the tracked spawner tile.
    fn set_spawner_tile(&mut self, _tile: Option<u32>) {}
}

/// Iteration contract over every live simulation entity.
pub trait EntityRegistry {
    /// Visits every live entity exactly once.
    fn for_each_entity(&mut self, visit: &mut dyn FnMut(&mut dyn SimEntity));
}

#[cfg(test)]
mod tests {
    use super::{ItemKind, ItemStack, PackedPosition, SaveSlotId, SectorId, Tile};
    use crate::{FloorId, GeneratedTile, Structure, Team, WallId};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&SectorId::new(42));
        assert_round_trip(&SaveSlotId::new(7));
        assert_round_trip(&PackedPosition::pack(-3, 12));
    }

    #[test]
    fn item_stack_round_trips_through_bincode() {
        assert_round_trip(&ItemStack::new(ItemKind::DenseAlloy, 470));
    }

    #[test]
    fn tile_with_structure_round_trips_through_bincode() {
        let mut tile = Tile::generated(
            3,
            4,
            GeneratedTile {
                floor: FloorId::new(2),
                wall: WallId::AIR,
                elevation: 1,
            },
        );
        tile.place_structure(Team::Player, Structure::new(9, vec![1, 2, 3]));
        assert_round_trip(&tile);
    }

    #[test]
    fn item_names_are_lowercase() {
        assert_eq!(ItemKind::DenseAlloy.name(), "dense alloy");
        assert_eq!(ItemKind::Titanium.name(), "titanium");
    }
}
