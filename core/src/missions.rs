use crate::{Event, ItemKind, SectorId};

/// Kinds of enemy units that waves are composed of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Light ground infantry.
    Dagger,
    /// Fast light air unit.
    Flare,
    /// Heavy ground unit.
    Titan,
    /// Armoured air unit.
    Wraith,
}

/// Enemy wave definition describing which units spawn on which waves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpawnGroup {
    /// Unit spawned by the group.
    pub unit: UnitKind,
    /// First wave (zero-based) on which the group spawns.
    pub begin: u32,
    /// Last wave on which the group spawns, unbounded when `None`.
    pub end: Option<u32>,
    /// Number of waves between consecutive spawns of the group.
    pub spacing: u32,
    /// Waves required for the group to gain one additional unit.
    pub scaling: u32,
    /// Units spawned the first time the group appears.
    pub amount: u32,
    /// Upper bound on units spawned in a single wave.
    pub max: u32,
}

impl SpawnGroup {
    /// Number of units the group contributes to the provided wave.
    #[must_use]
    pub fn units_at(&self, wave: u32) -> u32 {
        if wave < self.begin || self.end.is_some_and(|end| wave > end) {
            return 0;
        }
        let spacing = self.spacing.max(1);
        let elapsed = wave - self.begin;
        if elapsed % spacing != 0 {
            return 0;
        }
        let growth = (elapsed / spacing) / self.scaling.max(1);
        (self.amount.saturating_sub(1) + growth.max(1)).min(self.max)
    }
}

/// Default wave table shared by every wave-survival objective.
pub const DEFAULT_WAVES: [SpawnGroup; 5] = [
    SpawnGroup {
        unit: UnitKind::Dagger,
        begin: 0,
        end: Some(10),
        spacing: 1,
        scaling: 2,
        amount: 1,
        max: 6,
    },
    SpawnGroup {
        unit: UnitKind::Flare,
        begin: 2,
        end: None,
        spacing: 2,
        scaling: 3,
        amount: 1,
        max: 8,
    },
    SpawnGroup {
        unit: UnitKind::Dagger,
        begin: 11,
        end: None,
        spacing: 1,
        scaling: 1,
        amount: 2,
        max: 20,
    },
    SpawnGroup {
        unit: UnitKind::Titan,
        begin: 20,
        end: None,
        spacing: 3,
        scaling: 4,
        amount: 1,
        max: 10,
    },
    SpawnGroup {
        unit: UnitKind::Wraith,
        begin: 35,
        end: None,
        spacing: 2,
        scaling: 3,
        amount: 2,
        max: 12,
    },
];

const TUTORIAL_WAVES: [SpawnGroup; 1] = [SpawnGroup {
    unit: UnitKind::Dagger,
    begin: 0,
    end: None,
    spacing: 1,
    scaling: 3,
    amount: 1,
    max: 3,
}];

/// Buildings referenced by tutorial objectives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Drill extracting ore from the floor.
    MechanicalDrill,
    /// Conveyor belt moving items between blocks.
    Conveyor,
    /// Entry-level turret.
    Duo,
    /// Core-adjacent smelter producing dense alloy.
    Smelter,
}

/// Single step of the introductory tutorial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TutorialStep {
    /// Build the listed number of blocks.
    Build {
        /// Block the player must construct.
        block: BlockKind,
        /// Number of blocks required.
        count: u32,
    },
    /// Deliver items into the core.
    Collect {
        /// Item that must be delivered.
        item: ItemKind,
        /// Quantity required.
        amount: u32,
    },
    /// Survive attacking waves.
    Survive {
        /// Number of waves to survive.
        waves: u32,
    },
}

/// What a mission requires the player to accomplish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Objective {
    /// Scripted introductory step.
    Tutorial(TutorialStep),
    /// Survive until the target wave is reached.
    WaveSurvival {
        /// Wave that completes the mission.
        target_wave: u32,
    },
    /// Terminal objective shown once every mission of a sector is done.
    Victory,
}

/// Objective attached to a sector together with the player's progress on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mission {
    objective: Objective,
    progress: u32,
}

/// Terminal mission reported once a sector's mission list is exhausted.
pub const VICTORY: Mission = Mission::new(Objective::Victory);

impl Mission {
    /// Creates a mission with no recorded progress.
    #[must_use]
    pub const fn new(objective: Objective) -> Self {
        Self {
            objective,
            progress: 0,
        }
    }

    /// Objective the mission tracks.
    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Progress accumulated toward the objective.
    #[must_use]
    pub const fn progress(&self) -> u32 {
        self.progress
    }

    /// Quantity of progress that completes the mission; `None` for victory.
    #[must_use]
    pub const fn goal(&self) -> Option<u32> {
        match self.objective {
            Objective::Tutorial(TutorialStep::Build { count, .. }) => Some(count),
            Objective::Tutorial(TutorialStep::Collect { amount, .. }) => Some(amount),
            Objective::Tutorial(TutorialStep::Survive { waves }) => Some(waves),
            Objective::WaveSurvival { target_wave } => Some(target_wave),
            Objective::Victory => None,
        }
    }

    /// Adds progress, saturating at the goal.
    pub fn record_progress(&mut self, amount: u32) {
        let next = self.progress.saturating_add(amount);
        self.progress = self.goal().map_or(next, |goal| next.min(goal));
    }

    /// Reports whether the recorded progress satisfies the objective.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.goal().is_some_and(|goal| self.progress >= goal)
    }

    /// Discards recorded progress.
    pub fn reset(&mut self) {
        self.progress = 0;
    }

    /// Enemy waves the mission contributes to its sector's spawn schedule.
    #[must_use]
    pub fn waves(&self) -> Vec<SpawnGroup> {
        let (table, limit): (&[SpawnGroup], u32) = match self.objective {
            Objective::WaveSurvival { target_wave } => (&DEFAULT_WAVES, target_wave),
            Objective::Tutorial(TutorialStep::Survive { waves }) => (&TUTORIAL_WAVES, waves),
            Objective::Tutorial(_) | Objective::Victory => return Vec::new(),
        };
        table
            .iter()
            .filter(|group| group.begin < limit)
            .map(|group| SpawnGroup {
                end: Some(group.end.map_or(limit, |end| end.min(limit))),
                ..*group
            })
            .collect()
    }

    /// Human-readable summary of the objective.
    #[must_use]
    pub fn description(&self) -> String {
        match self.objective {
            Objective::Tutorial(TutorialStep::Build { block, count }) => {
                format!("Build {count} x {block:?}")
            }
            Objective::Tutorial(TutorialStep::Collect { item, amount }) => {
                format!("Collect {amount} {}", item.name())
            }
            Objective::Tutorial(TutorialStep::Survive { waves }) => {
                format!("Survive {waves} waves")
            }
            Objective::WaveSurvival { target_wave } => format!("Survive until wave {target_wave}"),
            Objective::Victory => "Sector secured".to_owned(),
        }
    }

    /// Announces that the mission became the sector's active objective.
    pub fn on_begin(&self, sector: SectorId, out_events: &mut Vec<Event>) {
        out_events.push(Event::MissionBegan {
            sector,
            objective: self.objective,
            description: self.description(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn victory_has_no_goal_and_never_completes() {
        let mut victory = VICTORY;
        victory.record_progress(1_000);
        assert_eq!(victory.goal(), None);
        assert!(!victory.is_complete());
        assert!(victory.waves().is_empty());
    }

    #[test]
    fn reset_discards_progress() {
        let mut mission = Mission::new(Objective::WaveSurvival { target_wave: 10 });
        mission.record_progress(25);
        assert_eq!(mission.progress(), 10);
        assert!(mission.is_complete());
        mission.reset();
        assert_eq!(mission.progress(), 0);
        assert!(!mission.is_complete());
    }

    #[test]
    fn wave_survival_truncates_default_table_at_target() {
        let mission = Mission::new(Objective::WaveSurvival { target_wave: 15 });
        let waves = mission.waves();
        assert_eq!(waves.len(), 3);
        assert!(waves.iter().all(|group| group.begin < 15));
        assert!(waves.iter().all(|group| group.end.is_some_and(|end| end <= 15)));
    }

    #[test]
    fn tutorial_build_steps_contribute_no_waves() {
        let mission = Mission::new(Objective::Tutorial(TutorialStep::Build {
            block: BlockKind::Conveyor,
            count: 4,
        }));
        assert!(mission.waves().is_empty());
    }

    #[test]
    fn units_at_respects_spacing_and_cap() {
        let group = DEFAULT_WAVES[1];
        assert_eq!(group.units_at(1), 0);
        assert_eq!(group.units_at(2), 1);
        assert_eq!(group.units_at(3), 0);
        assert_eq!(group.units_at(2 + 2 * 60), 8);
    }

    #[test]
    fn on_begin_emits_description() {
        let mut events = Vec::new();
        VICTORY.on_begin(SectorId::new(4), &mut events);
        assert_eq!(
            events,
            vec![Event::MissionBegan {
                sector: SectorId::new(4),
                objective: Objective::Victory,
                description: "Sector secured".to_owned(),
            }]
        );
    }
}
