use sector_atlas_core::{
    Command, Event, Footprint, ItemKind, ItemStack, Objective, PackedPosition, SaveSlotId,
    SectorId, SectorState,
};
use sector_atlas_world::{apply, query, World};

fn sector_id_at(world: &World, x: i32, y: i32) -> SectorId {
    query::sector_at(world, x, y)
        .map(|sector| sector.id())
        .expect("sector exists")
}

#[test]
fn create_sector_is_idempotent() {
    let mut world = World::default();
    let mut events = Vec::new();

    apply(&mut world, Command::CreateSector { x: 2, y: -1 }, &mut events);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        Event::SectorCreated { position, .. } if position == PackedPosition::pack(2, -1)
    ));

    events.clear();
    apply(&mut world, Command::CreateSector { x: 2, y: -1 }, &mut events);
    assert!(events.is_empty(), "occupied cell must not create a second sector");
    assert_eq!(query::grid(&world).len(), 1);
    assert_eq!(query::sectors(&world).count(), 1);
}

#[test]
fn create_sector_outside_packable_range_is_ignored() {
    let mut world = World::default();
    let mut events = Vec::new();

    apply(&mut world, Command::CreateSector { x: 40_000, y: 0 }, &mut events);

    assert!(events.is_empty());
    assert!(query::grid(&world).is_empty());
}

#[test]
fn completing_origin_unlocks_cross() {
    let mut world = World::default();
    let mut events = Vec::new();

    apply(&mut world, Command::CompleteSector { x: 0, y: 0 }, &mut events);

    let origin = query::sector_at(&world, 0, 0).expect("origin created");
    assert!(origin.is_complete());
    for (x, y) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        let neighbour = query::sector_at(&world, x, y).expect("neighbour unlocked");
        assert!(!neighbour.is_complete());
        assert_eq!(neighbour.footprint().width(), 1);
    }
    for (x, y) in [(1, 1), (-1, -1), (1, -1), (-1, 1)] {
        assert!(
            !query::grid(&world).contains_key(x, y),
            "diagonal corners stay locked"
        );
    }
    assert_eq!(query::grid(&world).len(), 5);
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, Event::SectorCompleted { .. }))
            .count(),
        1
    );
}

#[test]
fn completing_twice_reports_completion_once() {
    let mut world = World::default();
    let mut events = Vec::new();

    apply(&mut world, Command::CompleteSector { x: 3, y: 3 }, &mut events);
    events.clear();
    apply(&mut world, Command::CompleteSector { x: 3, y: 3 }, &mut events);

    assert!(events.is_empty());
}

#[test]
fn grid_values_cover_every_sector_cell() {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::CompleteSector { x: 0, y: 0 }, &mut events);
    apply(&mut world, Command::CompleteSector { x: 1, y: 0 }, &mut events);

    let covered: usize = query::sectors(&world)
        .map(|sector| sector.footprint().cells().count())
        .sum();
    assert_eq!(query::grid(&world).values().count(), covered);
    for sector in query::sectors(&world) {
        for (x, y) in sector.footprint().cells() {
            assert_eq!(query::grid(&world).get(x, y), Some(sector.id()));
        }
    }
}

#[test]
fn finishing_last_mission_completes_sector() {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::CreateSector { x: 3, y: 4 }, &mut events);
    let id = sector_id_at(&world, 3, 4);
    let goal = query::sector(&world, id)
        .and_then(|sector| sector.current_mission().goal())
        .expect("wave mission has a goal");

    events.clear();
    apply(
        &mut world,
        Command::RecordMissionProgress {
            sector: id,
            amount: goal,
        },
        &mut events,
    );

    let sector = query::sector(&world, id).expect("sector exists");
    assert_eq!(sector.completed_missions(), 1);
    assert!(sector.is_complete());
    assert_eq!(sector.current_mission().objective(), Objective::Victory);
    assert!(events.contains(&Event::MissionAdvanced {
        sector: id,
        completed: 1
    }));
    assert!(query::grid(&world).contains_key(4, 4));
}

#[test]
fn partial_progress_does_not_advance() {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::CreateSector { x: 3, y: 4 }, &mut events);
    let id = sector_id_at(&world, 3, 4);

    events.clear();
    apply(
        &mut world,
        Command::RecordMissionProgress {
            sector: id,
            amount: 1,
        },
        &mut events,
    );

    let sector = query::sector(&world, id).expect("sector exists");
    assert_eq!(sector.completed_missions(), 0);
    assert_eq!(sector.current_mission().progress(), 1);
    assert!(events.is_empty());

    apply(&mut world, Command::ResetMissions { sector: id }, &mut events);
    let sector = query::sector(&world, id).expect("sector exists");
    assert_eq!(sector.current_mission().progress(), 0);
}

#[test]
fn begin_mission_announces_current_objective() {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::CreateSector { x: 0, y: 0 }, &mut events);
    let id = sector_id_at(&world, 0, 0);

    events.clear();
    apply(&mut world, Command::BeginMission { sector: id }, &mut events);

    let expected = query::sector(&world, id)
        .map(|sector| sector.missions()[0].objective())
        .expect("tutorial missions");
    assert!(matches!(
        &events[..],
        [Event::MissionBegan { sector, objective, .. }] if *sector == id && *objective == expected
    ));
}

#[test]
fn session_follows_active_sector() {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::CreateSector { x: 0, y: 0 }, &mut events);
    let id = sector_id_at(&world, 0, 0);

    apply(
        &mut world,
        Command::SetActiveSector { sector: Some(id) },
        &mut events,
    );
    apply(&mut world, Command::StartSession, &mut events);
    assert!(query::session_running(&world));
    assert_eq!(query::active_sector(&world).map(|sector| sector.id()), Some(id));

    apply(&mut world, Command::SetActiveSector { sector: None }, &mut events);
    assert!(!query::session_running(&world));
}

#[test]
fn session_start_stocks_starting_items() {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::CreateSector { x: 3, y: 0 }, &mut events);
    let id = sector_id_at(&world, 3, 0);
    apply(
        &mut world,
        Command::SetActiveSector { sector: Some(id) },
        &mut events,
    );

    events.clear();
    apply(&mut world, Command::StartSession, &mut events);

    assert_eq!(
        events,
        vec![Event::SessionStarted {
            sector: id,
            starting_items: vec![
                ItemStack::new(ItemKind::Copper, 400),
                ItemStack::new(ItemKind::Lead, 100),
            ],
        }]
    );
}

#[test]
fn save_slot_binding_is_recorded() {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::CreateSector { x: 0, y: 0 }, &mut events);
    let id = sector_id_at(&world, 0, 0);

    apply(
        &mut world,
        Command::AssignSaveSlot {
            sector: id,
            slot: Some(SaveSlotId::new(4)),
        },
        &mut events,
    );

    assert_eq!(
        query::sector(&world, id).and_then(|sector| sector.save_slot()),
        Some(SaveSlotId::new(4))
    );
}

#[test]
fn restore_skips_overlapping_records() {
    let mut world = World::default();
    let mut events = Vec::new();
    let wide = Footprint::new(0, 0, 2, 1).expect("valid footprint");
    let overlapping = Footprint::new(1, 0, 1, 1).expect("valid footprint");

    for footprint in [wide, overlapping] {
        apply(
            &mut world,
            Command::RestoreSector {
                state: SectorState {
                    footprint,
                    complete: true,
                    completed_missions: 1,
                    save_slot: None,
                },
            },
            &mut events,
        );
    }

    assert_eq!(query::sectors(&world).count(), 1);
    let restored = query::sector_at(&world, 1, 0).expect("wide sector covers cell");
    assert_eq!(restored.footprint(), wide);
    assert!(restored.is_complete());
    assert_eq!(restored.difficulty(), 0);
}

#[test]
fn reset_grid_removes_everything() {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::CompleteSector { x: 0, y: 0 }, &mut events);

    events.clear();
    apply(&mut world, Command::ResetGrid, &mut events);

    assert_eq!(events, vec![Event::GridReset]);
    assert!(query::grid(&world).is_empty());
    assert_eq!(query::sectors(&world).count(), 0);
}
