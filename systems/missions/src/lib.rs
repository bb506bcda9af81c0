#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic mission assignment for freshly materialised sectors.
//!
//! Every value produced here is a pure function of the sector's packed
//! position, so missions and spawn schedules are re-derived identically after
//! a reload instead of being persisted.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sector_atlas_core::{
    BlockKind, DifficultyTier, ItemKind, ItemStack, Mission, Objective, PackedPosition,
    SpawnGroup, TutorialStep,
};
use sector_atlas_system_difficulty::{difficulty_of, starting_items, tier_for};

const WAVES_PER_DIFFICULTY: u32 = 5;
const WAVES_PER_ROLL: u32 = 5;
const MAX_TARGET_WAVE: u32 = 100;
const MAX_WAVE_ROLL: u32 = 3;

/// Every derived field of a sector, computed in one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectorProfile {
    /// Floored distance of the sector from the grid origin.
    pub difficulty: u32,
    /// Session tier for the difficulty.
    pub tier: DifficultyTier,
    /// Ordered missions the sector asks the player to accomplish.
    pub missions: Vec<Mission>,
    /// Concatenated waves of every mission, in mission order.
    pub spawn_schedule: Vec<SpawnGroup>,
    /// Items the player starts with.
    pub starting_items: Vec<ItemStack>,
}

/// Derives the full profile of the sector anchored at `position`.
#[must_use]
pub fn profile_for(position: PackedPosition) -> SectorProfile {
    let difficulty = difficulty_of(position.x().into(), position.y().into());
    let missions = assign_missions(position, difficulty);
    let spawn_schedule = spawn_schedule(&missions);
    SectorProfile {
        difficulty,
        tier: tier_for(difficulty),
        missions,
        spawn_schedule,
        starting_items: starting_items(difficulty),
    }
}

/// Missions for a sector of the provided difficulty anchored at `position`.
///
/// The origin sector receives the tutorial sequence; every other sector
/// receives a single wave-survival mission whose target is rolled from a
/// generator seeded with the packed position.
#[must_use]
pub fn assign_missions(position: PackedPosition, difficulty: u32) -> Vec<Mission> {
    if difficulty == 0 {
        return tutorial_missions();
    }

    let roll = deterministic_random(position.get(), 0, MAX_WAVE_ROLL);
    let target_wave = difficulty
        .saturating_mul(WAVES_PER_DIFFICULTY)
        .saturating_add(roll * WAVES_PER_ROLL)
        .min(MAX_TARGET_WAVE);
    vec![Mission::new(Objective::WaveSurvival { target_wave })]
}

/// Concatenation, in mission order, of every mission's waves.
#[must_use]
pub fn spawn_schedule(missions: &[Mission]) -> Vec<SpawnGroup> {
    missions.iter().flat_map(Mission::waves).collect()
}

/// Uniform integer in `min..=max` reproducible from `seed`.
#[must_use]
pub fn deterministic_random(seed: i32, min: u32, max: u32) -> u32 {
    if max <= min {
        return min;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed as u32));
    rng.gen_range(min..=max)
}

/// Fixed introductory mission sequence played on the origin sector.
#[must_use]
pub fn tutorial_missions() -> Vec<Mission> {
    [
        TutorialStep::Build {
            block: BlockKind::MechanicalDrill,
            count: 1,
        },
        TutorialStep::Build {
            block: BlockKind::Conveyor,
            count: 4,
        },
        TutorialStep::Collect {
            item: ItemKind::Copper,
            amount: 50,
        },
        TutorialStep::Build {
            block: BlockKind::Duo,
            count: 2,
        },
        TutorialStep::Collect {
            item: ItemKind::Lead,
            amount: 40,
        },
        TutorialStep::Build {
            block: BlockKind::Smelter,
            count: 1,
        },
        TutorialStep::Survive { waves: 5 },
    ]
    .into_iter()
    .map(|step| Mission::new(Objective::Tutorial(step)))
    .collect()
}
