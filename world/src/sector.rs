use sector_atlas_core::{
    DifficultyTier, Footprint, ItemStack, Mission, PackedPosition, SaveSlotId, SectorId,
    SectorState, SpawnGroup, VICTORY,
};
use sector_atlas_system_missions::{profile_for, SectorProfile};

/// Rectangular, independently unlockable region of the world grid.
///
/// Only [`SectorState`] survives persistence. Difficulty, missions, spawn
/// schedule and starting items are re-derived from the sector's position
/// whenever the record is created or restored.
#[derive(Clone, Debug, PartialEq)]
pub struct Sector {
    id: SectorId,
    state: SectorState,
    profile: SectorProfile,
}

impl Sector {
    pub(crate) fn new(id: SectorId, state: SectorState) -> Self {
        Self {
            id,
            profile: profile_for(state.footprint.origin()),
            state,
        }
    }

    /// Stable identifier of the sector.
    #[must_use]
    pub const fn id(&self) -> SectorId {
        self.id
    }

    /// Cells covered by the sector.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        self.state.footprint
    }

    /// Packed bottom-left cell, used as the sector's seed and save name suffix.
    #[must_use]
    pub const fn position(&self) -> PackedPosition {
        self.state.footprint.origin()
    }

    /// Whether the sector has been completed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.state.complete
    }

    /// Number of missions completed so far.
    #[must_use]
    pub const fn completed_missions(&self) -> u32 {
        self.state.completed_missions
    }

    /// Save slot bound to the sector.
    #[must_use]
    pub const fn save_slot(&self) -> Option<SaveSlotId> {
        self.state.save_slot
    }

    /// Persistent portion of the sector.
    #[must_use]
    pub const fn state(&self) -> SectorState {
        self.state
    }

    /// Floored distance of the sector's origin from the grid origin.
    #[must_use]
    pub const fn difficulty(&self) -> u32 {
        self.profile.difficulty
    }

    /// Session tier derived from the difficulty.
    #[must_use]
    pub const fn tier(&self) -> DifficultyTier {
        self.profile.tier
    }

    /// Ordered missions of the sector.
    #[must_use]
    pub fn missions(&self) -> &[Mission] {
        &self.profile.missions
    }

    /// Waves of every mission, in mission order.
    #[must_use]
    pub fn spawn_schedule(&self) -> &[SpawnGroup] {
        &self.profile.spawn_schedule
    }

    /// Items the player starts with.
    #[must_use]
    pub fn starting_items(&self) -> &[ItemStack] {
        &self.profile.starting_items
    }

    /// Mission currently in play, or [`VICTORY`] once every mission is done.
    #[must_use]
    pub fn current_mission(&self) -> &Mission {
        usize::try_from(self.state.completed_missions)
            .ok()
            .and_then(|index| self.profile.missions.get(index))
            .unwrap_or(&VICTORY)
    }

    pub(crate) fn current_mission_mut(&mut self) -> Option<&mut Mission> {
        let index = usize::try_from(self.state.completed_missions).ok()?;
        self.profile.missions.get_mut(index)
    }

    pub(crate) fn set_complete(&mut self) -> bool {
        let changed = !self.state.complete;
        self.state.complete = true;
        changed
    }

    pub(crate) fn advance_mission(&mut self) -> u32 {
        self.state.completed_missions = self.state.completed_missions.saturating_add(1);
        self.state.completed_missions
    }

    pub(crate) fn reset_missions(&mut self) {
        for mission in &mut self.profile.missions {
            mission.reset();
        }
    }

    pub(crate) fn set_save_slot(&mut self, slot: Option<SaveSlotId>) {
        self.state.save_slot = slot;
    }

    pub(crate) fn set_footprint(&mut self, footprint: Footprint) {
        self.state.footprint = footprint;
    }

    pub(crate) fn all_missions_done(&self) -> bool {
        usize::try_from(self.state.completed_missions)
            .map_or(true, |completed| completed >= self.profile.missions.len())
    }
}
