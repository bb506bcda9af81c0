use std::{collections::BTreeSet, mem};

use sector_atlas_core::{
    EntityRegistry, Event, Footprint, SectorId, SimEntity, Tile, TileBuffer, TileBufferBuilder,
    TileGenerator, TileTransform,
};
use sector_atlas_system_difficulty::ores_for;
use tracing::{debug, warn};

use crate::World;

/// Collaborators consulted while a sector grows in place.
pub struct ExpansionCollaborators<'a> {
    /// Terrain source for freshly added cells.
    pub generator: &'a dyn TileGenerator,
    /// Live entities that must follow the shifted buffer.
    pub entities: &'a mut dyn EntityRegistry,
}

/// Grows the active sector by the provided deltas, reflowing the live tile buffer.
///
/// Negative deltas grow the sector leftward or downward, which moves its
/// origin and shifts every existing tile and entity so they keep their
/// logical place. Sectors the new footprint grows over are absorbed. When the
/// configuration enables the expansion guard and the new footprint covers a
/// completed sector, the grid is restored exactly and `false` is returned.
///
/// # Panics
///
/// Panics when `sector` is not the active sector.
pub fn expand(
    world: &mut World,
    sector: SectorId,
    dx: i32,
    dy: i32,
    collaborators: &mut ExpansionCollaborators<'_>,
    out_events: &mut Vec<Event>,
) -> bool {
    assert_eq!(
        world.active,
        Some(sector),
        "only the active sector can be expanded"
    );
    let Some(old) = world.sectors.get(&sector).map(|record| record.footprint()) else {
        panic!("active sector {} is missing from the world", sector.get());
    };

    world.grid.clear_footprint(old);

    let Some(grown) = old.grown(dx, dy) else {
        warn!(sector = sector.get(), dx, dy, "expansion leaves the grid range");
        reject(world, sector, old, dx, dy, out_events);
        return false;
    };

    let cells = world.config.cells_per_sector;
    let Some(layout) = Layout::new(grown, dx, dy, cells) else {
        warn!(sector = sector.get(), dx, dy, "expanded map exceeds the tile range");
        reject(world, sector, old, dx, dy, out_events);
        return false;
    };

    if world.config.check_expansion && covers_completed_sector(world, grown) {
        debug!(sector = sector.get(), dx, dy, "expansion blocked by a completed sector");
        reject(world, sector, old, dx, dy, out_events);
        return false;
    }

    absorb_overlapped(world, sector, grown, out_events);
    world.grid.fill(grown, sector);
    if let Some(record) = world.sectors.get_mut(&sector) {
        record.set_footprint(grown);
    }
    debug!(
        sector = sector.get(),
        x = grown.x(),
        y = grown.y(),
        width = grown.width(),
        height = grown.height(),
        "sector footprint grown"
    );

    let (shift_x, shift_y) = (layout.shift_x, layout.shift_y);
    let transform = TileTransform {
        old_width: world.tiles.width(),
        old_height: world.tiles.height(),
        new_width: layout.width,
        new_height: layout.height,
        shift_x,
        shift_y,
    };

    let previous = mem::take(&mut world.tiles);
    let reflowed = if previous.is_empty() || matches_footprint(&previous, old, cells) {
        previous.into_tiles()
    } else {
        warn!(
            sector = sector.get(),
            width = previous.width(),
            height = previous.height(),
            "live map does not cover the sector footprint, regenerating it"
        );
        Vec::new()
    };

    relocate_entities(collaborators.entities, &transform, world.config.tile_size);
    out_events.push(Event::FogOffset { shift_x, shift_y });

    let mut builder = TileBufferBuilder::new(transform.new_width, transform.new_height);
    for mut tile in reflowed {
        let (x, y) = (tile.x() + shift_x, tile.y() + shift_y);
        tile.relocate(x, y, &transform);
        let _ = builder.place(tile);
    }

    world.map_loading = true;
    out_events.push(Event::MapLoadBegan {
        width: transform.new_width,
        height: transform.new_height,
    });

    for (cell_x, cell_y) in grown.cells().filter(|&(x, y)| !old.contains(x, y)) {
        generate_cell(collaborators.generator, grown, cells, cell_x, cell_y, &mut builder);
    }
    let vacant = builder.vacant();
    if vacant > 0 {
        debug!(vacant, "generating tiles missing from the previous buffer");
    }
    let tiles = builder.finish(|x, y| generate_tile(collaborators.generator, grown, cells, x, y));
    let _ = mem::replace(&mut world.tiles, tiles);
    world.map_loading = false;
    out_events.push(Event::MapLoadEnded {
        width: transform.new_width,
        height: transform.new_height,
    });

    out_events.push(Event::SectorExpanded {
        sector,
        footprint: grown,
    });
    out_events.push(Event::PreviewRequested {
        sector,
        footprint: grown,
    });
    true
}

/// Generates the full tile buffer of the sector and installs it as the live map.
///
/// Returns `false` when the sector does not exist.
pub fn load_sector_map(
    world: &mut World,
    sector: SectorId,
    generator: &dyn TileGenerator,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(footprint) = world.sectors.get(&sector).map(|record| record.footprint()) else {
        return false;
    };
    let cells = world.config.cells_per_sector;
    let (width, height) = (footprint.width() * cells, footprint.height() * cells);

    world.map_loading = true;
    out_events.push(Event::MapLoadBegan { width, height });
    let tiles = TileBufferBuilder::new(width, height)
        .finish(|x, y| generate_tile(generator, footprint, cells, x, y));
    world.tiles = tiles;
    world.map_loading = false;
    out_events.push(Event::MapLoadEnded { width, height });
    debug!(sector = sector.get(), width, height, "sector map generated");
    true
}

/// Tile dimensions and shift of a grown footprint.
struct Layout {
    width: u32,
    height: u32,
    shift_x: u32,
    shift_y: u32,
}

impl Layout {
    fn new(grown: Footprint, dx: i32, dy: i32, cells: u32) -> Option<Self> {
        let shift = |delta: i32| {
            if delta < 0 {
                delta.unsigned_abs().checked_mul(cells)
            } else {
                Some(0)
            }
        };
        Some(Self {
            width: grown.width().checked_mul(cells)?,
            height: grown.height().checked_mul(cells)?,
            shift_x: shift(dx)?,
            shift_y: shift(dy)?,
        })
    }
}

fn reject(
    world: &mut World,
    sector: SectorId,
    old: Footprint,
    dx: i32,
    dy: i32,
    out_events: &mut Vec<Event>,
) {
    world.grid.fill(old, sector);
    out_events.push(Event::ExpansionRejected { sector, dx, dy });
}

fn covers_completed_sector(world: &World, footprint: Footprint) -> bool {
    footprint.cells().any(|(x, y)| {
        world
            .grid
            .get(x, y)
            .and_then(|id| world.sectors.get(&id))
            .is_some_and(|record| record.is_complete())
    })
}

fn absorb_overlapped(
    world: &mut World,
    sector: SectorId,
    footprint: Footprint,
    out_events: &mut Vec<Event>,
) {
    let overlapped: BTreeSet<SectorId> = footprint
        .cells()
        .filter_map(|(x, y)| world.grid.get(x, y))
        .filter(|id| *id != sector)
        .collect();
    for id in overlapped {
        if let Some(record) = world.sectors.remove(&id) {
            world.grid.clear_footprint(record.footprint());
            debug!(sector = id.get(), by = sector.get(), "sector absorbed");
            out_events.push(Event::SectorAbsorbed { sector: id, by: sector });
        }
    }
}

fn relocate_entities(entities: &mut dyn EntityRegistry, transform: &TileTransform, tile_size: f32) {
    let offset_x = transform.shift_x as f32 * tile_size;
    let offset_y = transform.shift_y as f32 * tile_size;
    entities.for_each_entity(&mut |entity: &mut dyn SimEntity| {
        let (x, y) = entity.position();
        entity.set_position(x + offset_x, y + offset_y);
        if let Some(tile) = entity.spawner_tile() {
            entity.set_spawner_tile(transform.apply(tile));
        }
    });
}

fn generate_cell(
    generator: &dyn TileGenerator,
    footprint: Footprint,
    cells: u32,
    cell_x: i32,
    cell_y: i32,
    builder: &mut TileBufferBuilder,
) {
    let ores = ores_for(cell_x, cell_y);
    let base_x = (cell_x - footprint.x()).unsigned_abs() * cells;
    let base_y = (cell_y - footprint.y()).unsigned_abs() * cells;
    for local_x in 0..cells {
        for local_y in 0..cells {
            let terrain = generator.generate(cell_x, cell_y, local_x, local_y, true, &ores);
            let _ = builder.place(Tile::generated(
                base_x + local_x,
                base_y + local_y,
                terrain,
            ));
        }
    }
}

fn generate_tile(
    generator: &dyn TileGenerator,
    footprint: Footprint,
    cells: u32,
    x: u32,
    y: u32,
) -> Tile {
    let cells = cells.max(1);
    let cell_x = footprint.x() + (x / cells) as i32;
    let cell_y = footprint.y() + (y / cells) as i32;
    let ores = ores_for(cell_x, cell_y);
    let terrain = generator.generate(cell_x, cell_y, x % cells, y % cells, true, &ores);
    Tile::generated(x, y, terrain)
}

fn matches_footprint(tiles: &TileBuffer, footprint: Footprint, cells: u32) -> bool {
    tiles.width() == footprint.width() * cells && tiles.height() == footprint.height() * cells
}
