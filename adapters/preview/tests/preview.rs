use std::sync::Arc;

use sector_atlas_core::{
    AtlasConfig, Command, Event, FloorId, Footprint, GeneratedTile, ItemKind, SectorId,
    TileGenerator, WallId,
};
use sector_atlas_preview::{
    GraphicsQueue, PaletteColorMapper, PreviewRenderer, PreviewStore,
};
use sector_atlas_world::{apply, query, World};

const RESOLUTION: u32 = 4;
const CELLS: u32 = 8;

struct Checkerboard;

impl TileGenerator for Checkerboard {
    fn generate(
        &self,
        sector_x: i32,
        sector_y: i32,
        local_x: u32,
        local_y: u32,
        _with_ores: bool,
        _ores: &[ItemKind],
    ) -> GeneratedTile {
        let parity = (sector_x + sector_y).rem_euclid(3) as u32 + local_x + local_y;
        GeneratedTile {
            floor: FloorId::new((parity % 3) as u16),
            wall: WallId::AIR,
            elevation: 0,
        }
    }
}

fn queue() -> GraphicsQueue {
    let renderer = PreviewRenderer::new(
        Arc::new(Checkerboard),
        Arc::new(PaletteColorMapper::default()),
        RESOLUTION,
        CELLS,
    );
    GraphicsQueue::new(renderer).expect("spawn preview worker")
}

fn explored() -> (World, Vec<Event>) {
    let mut world = World::new(AtlasConfig {
        cells_per_sector: CELLS,
        preview_resolution: RESOLUTION,
        ..AtlasConfig::default()
    });
    let mut events = Vec::new();
    apply(&mut world, Command::CompleteSector { x: 0, y: 0 }, &mut events);
    (world, events)
}

#[test]
fn requested_previews_are_rendered_per_sector() {
    let (world, events) = explored();
    let mut store = PreviewStore::new(false);
    let mut queue = queue();

    store.handle(&events, &mut queue);
    let stored = queue.wait_idle(&mut store).expect("renders finish");

    assert_eq!(stored, query::sectors(&world).count());
    assert_eq!(queue.pending(), 0);
    for sector in query::sectors(&world) {
        let image = store.get(sector.id()).expect("preview stored");
        assert_eq!((image.width(), image.height()), (RESOLUTION, RESOLUTION));
    }
}

#[test]
fn headless_store_never_renders() {
    let (_, events) = explored();
    let mut store = PreviewStore::new(true);
    let mut queue = queue();

    store.handle(&events, &mut queue);

    assert_eq!(queue.pending(), 0);
    assert_eq!(queue.wait_idle(&mut store).expect("idle"), 0);
    assert!(store.is_empty());
}

#[test]
fn clearing_discards_renders_in_flight() {
    let (_, events) = explored();
    let mut store = PreviewStore::new(false);
    let mut queue = queue();

    store.handle(&events, &mut queue);
    store.handle(&[Event::PreviewsCleared], &mut queue);
    let stored = queue.wait_idle(&mut store).expect("renders finish");

    assert_eq!(stored, 0);
    assert!(store.is_empty());
    assert_eq!(store.generation(), 1);
}

#[test]
fn absorbed_sector_loses_its_preview() {
    let mut store = PreviewStore::new(false);
    let mut queue = queue();
    let footprint = Footprint::new(2, 2, 1, 1).expect("valid footprint");
    let (kept, absorbed) = (SectorId::new(0), SectorId::new(1));
    store.handle(
        &[
            Event::PreviewRequested {
                sector: kept,
                footprint,
            },
            Event::PreviewRequested {
                sector: absorbed,
                footprint,
            },
        ],
        &mut queue,
    );
    let _ = queue.wait_idle(&mut store).expect("renders finish");
    assert_eq!(store.len(), 2);

    store.handle(
        &[Event::SectorAbsorbed {
            sector: absorbed,
            by: kept,
        }],
        &mut queue,
    );

    assert!(store.get(absorbed).is_none());
    assert!(store.get(kept).is_some());
}

#[test]
fn rerender_replaces_previous_image() {
    let mut store = PreviewStore::new(false);
    let mut queue = queue();
    let sector = SectorId::new(3);
    let small = Footprint::new(0, 0, 1, 1).expect("valid footprint");
    let wide = Footprint::new(0, 0, 2, 1).expect("valid footprint");

    queue.submit(sector, small, store.generation());
    let _ = queue.wait_idle(&mut store).expect("first render");
    queue.submit(sector, wide, store.generation());
    let _ = queue.wait_idle(&mut store).expect("second render");

    assert_eq!(store.len(), 1);
    let image = store.get(sector).expect("preview stored");
    assert_eq!((image.width(), image.height()), (2 * RESOLUTION, RESOLUTION));
}

#[test]
fn absorbed_sector_refuses_render_in_flight() {
    let mut store = PreviewStore::new(false);
    let mut queue = queue();
    let footprint = Footprint::new(0, 0, 1, 1).expect("valid footprint");
    let (kept, absorbed) = (SectorId::new(0), SectorId::new(1));

    store.handle(
        &[
            Event::PreviewRequested {
                sector: absorbed,
                footprint,
            },
            Event::SectorAbsorbed {
                sector: absorbed,
                by: kept,
            },
        ],
        &mut queue,
    );
    let stored = queue.wait_idle(&mut store).expect("renders finish");

    assert_eq!(stored, 0);
    assert!(store.get(absorbed).is_none());
    assert!(store.is_retired(absorbed));
    assert!(store.is_empty());
}

#[test]
fn clearing_forgets_retired_sectors() {
    let mut store = PreviewStore::new(false);
    let mut queue = queue();
    let sector = SectorId::new(4);
    let footprint = Footprint::new(0, 0, 1, 1).expect("valid footprint");

    store.retire(sector);
    store.handle(
        &[
            Event::PreviewsCleared,
            Event::PreviewRequested { sector, footprint },
        ],
        &mut queue,
    );
    let _ = queue.wait_idle(&mut store).expect("renders finish");

    assert!(!store.is_retired(sector));
    assert!(store.get(sector).is_some());
}
