//! Minimal entity roster the command-line adapter hands to expansions.

use sector_atlas_core::{EntityRegistry, SimEntity, TileBuffer};

/// Unit tracked by the roster.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Unit {
    pub(crate) label: &'static str,
    x: f32,
    y: f32,
    spawner: Option<u32>,
}

impl SimEntity for Unit {
    fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    fn spawner_tile(&self) -> Option<u32> {
        self.spawner
    }

    fn set_spawner_tile(&mut self, tile: Option<u32>) {
        self.spawner = tile;
    }
}

/// Units standing on the live map.
#[derive(Clone, Debug, Default)]
pub(crate) struct Roster {
    units: Vec<Unit>,
}

impl Roster {
    /// Places a core at the centre of the map and a guard on its first open tile.
    pub(crate) fn garrison(tiles: &TileBuffer, tile_size: f32) -> Self {
        let centre = |extent: u32| (extent / 2) as f32 * tile_size;
        let mut units = vec![Unit {
            label: "core",
            x: centre(tiles.width()),
            y: centre(tiles.height()),
            spawner: None,
        }];
        if let Some(tile) = tiles.tiles().iter().find(|tile| tile.wall().is_air()) {
            units.push(Unit {
                label: "guard",
                x: tile.x() as f32 * tile_size,
                y: tile.y() as f32 * tile_size,
                spawner: Some(tile.x() + tile.y() * tiles.width()),
            });
        }
        Self { units }
    }

    pub(crate) fn units(&self) -> &[Unit] {
        &self.units
    }
}

impl EntityRegistry for Roster {
    fn for_each_entity(&mut self, visit: &mut dyn FnMut(&mut dyn SimEntity)) {
        for unit in &mut self.units {
            visit(unit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sector_atlas_core::{FloorId, GeneratedTile, Tile, WallId};

    fn map() -> TileBuffer {
        let tiles = (0..6)
            .map(|index| {
                Tile::generated(
                    index % 3,
                    index / 3,
                    GeneratedTile {
                        floor: FloorId::new(1),
                        wall: if index < 4 { WallId::new(1) } else { WallId::AIR },
                        elevation: 0,
                    },
                )
            })
            .collect();
        TileBuffer::from_tiles(3, 2, tiles).expect("consistent buffer")
    }

    #[test]
    fn garrison_places_core_and_guard() {
        let roster = Roster::garrison(&map(), 8.0);
        let units = roster.units();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].position(), (8.0, 8.0));
        assert_eq!(units[1].position(), (8.0, 8.0));
        assert_eq!(units[1].spawner_tile(), Some(4));
    }

    #[test]
    fn registry_visits_every_unit() {
        let mut roster = Roster::garrison(&map(), 8.0);
        let mut visited = 0;
        roster.for_each_entity(&mut |unit| {
            let (x, y) = unit.position();
            unit.set_position(x + 1.0, y);
            visited += 1;
        });

        assert_eq!(visited, 2);
        assert!(roster.units().iter().all(|unit| unit.position().0 == 9.0));
    }
}
