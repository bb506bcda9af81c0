//! Simplex noise terrain used by the command-line adapter.

use noise::{NoiseFn, Simplex};
use sector_atlas_core::{FloorId, GeneratedTile, ItemKind, TileGenerator, WallId};

const WATER: FloorId = FloorId::new(0);
const STONE: FloorId = FloorId::new(1);
const SAND: FloorId = FloorId::new(2);
const GRASS: FloorId = FloorId::new(3);
const COPPER_ORE: FloorId = FloorId::new(4);
const LEAD_ORE: FloorId = FloorId::new(5);
const COAL_ORE: FloorId = FloorId::new(6);

const STONE_WALL: WallId = WallId::new(1);
const SAND_WALL: WallId = WallId::new(2);
const SHRUBS: WallId = WallId::new(3);

const ELEVATION_FREQUENCY: f64 = 0.012;
const MOISTURE_FREQUENCY: f64 = 0.02;
const ORE_FREQUENCY: f64 = 0.09;
const ORE_THRESHOLD: f64 = 0.55;

/// Deterministic terrain sampled in world tile coordinates.
///
/// A tile's world coordinate is its sector cell times the sector edge plus
/// its local offset, so neighbouring cells join seamlessly.
#[derive(Clone)]
pub(crate) struct NoiseTerrain {
    elevation: Simplex,
    moisture: Simplex,
    ore: Simplex,
    cells_per_sector: u32,
}

impl NoiseTerrain {
    pub(crate) fn new(seed: u32, cells_per_sector: u32) -> Self {
        Self {
            elevation: Simplex::new(seed),
            moisture: Simplex::new(seed.wrapping_add(1)),
            ore: Simplex::new(seed.wrapping_add(2)),
            cells_per_sector,
        }
    }

    fn world_point(&self, sector_x: i32, sector_y: i32, local_x: u32, local_y: u32) -> [f64; 2] {
        let cells = f64::from(self.cells_per_sector);
        [
            f64::from(sector_x) * cells + f64::from(local_x),
            f64::from(sector_y) * cells + f64::from(local_y),
        ]
    }

    fn elevation_at(&self, [x, y]: [f64; 2]) -> f64 {
        let fx = x * ELEVATION_FREQUENCY;
        let fy = y * ELEVATION_FREQUENCY;
        (self.elevation.get([fx, fy])
            + 0.5 * self.elevation.get([fx * 2.0, fy * 2.0])
            + 0.25 * self.elevation.get([fx * 4.0, fy * 4.0]))
            / 1.75
    }

    fn ore_at(&self, [x, y]: [f64; 2], ores: &[ItemKind]) -> Option<FloorId> {
        let strength = self.ore.get([x * ORE_FREQUENCY, y * ORE_FREQUENCY]);
        if strength < ORE_THRESHOLD || ores.is_empty() {
            return None;
        }
        let pick = self.ore.get([y * ORE_FREQUENCY * 0.25, x * ORE_FREQUENCY * 0.25]);
        let index = (((pick + 1.0) / 2.0) * ores.len() as f64) as usize;
        match ores.get(index.min(ores.len() - 1)) {
            Some(ItemKind::Copper) => Some(COPPER_ORE),
            Some(ItemKind::Lead) => Some(LEAD_ORE),
            Some(ItemKind::Coal) => Some(COAL_ORE),
            _ => None,
        }
    }
}

impl TileGenerator for NoiseTerrain {
    fn generate(
        &self,
        sector_x: i32,
        sector_y: i32,
        local_x: u32,
        local_y: u32,
        with_ores: bool,
        ores: &[ItemKind],
    ) -> GeneratedTile {
        let point = self.world_point(sector_x, sector_y, local_x, local_y);
        let height = self.elevation_at(point);
        let moisture = self
            .moisture
            .get([point[0] * MOISTURE_FREQUENCY, point[1] * MOISTURE_FREQUENCY]);

        if height < -0.35 {
            return GeneratedTile {
                floor: WATER,
                wall: WallId::AIR,
                elevation: 0,
            };
        }

        let elevation = ((height + 0.35) * 4.0).clamp(0.0, 4.0) as u8;
        let (floor, wall) = if height < -0.2 {
            (SAND, WallId::AIR)
        } else if height > 0.55 {
            (STONE, STONE_WALL)
        } else if moisture > 0.45 {
            (GRASS, SHRUBS)
        } else if moisture < -0.6 {
            (SAND, SAND_WALL)
        } else if moisture > 0.0 {
            (GRASS, WallId::AIR)
        } else {
            (STONE, WallId::AIR)
        };

        let floor = if with_ores && wall.is_air() {
            self.ore_at(point, ores).unwrap_or(floor)
        } else {
            floor
        };

        GeneratedTile {
            floor,
            wall,
            elevation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let terrain = NoiseTerrain::new(7, 16);
        let again = NoiseTerrain::new(7, 16);
        for local in 0..16 {
            assert_eq!(
                terrain.generate(2, -1, local, 15 - local, true, &[ItemKind::Copper]),
                again.generate(2, -1, local, 15 - local, true, &[ItemKind::Copper])
            );
        }
    }

    #[test]
    fn neighbouring_cells_share_world_coordinates() {
        let terrain = NoiseTerrain::new(3, 16);
        assert_eq!(
            terrain.generate(0, 0, 16, 5, false, &[]),
            terrain.generate(1, 0, 0, 5, false, &[])
        );
        assert_eq!(
            terrain.generate(0, 0, 3, 20, false, &[]),
            terrain.generate(0, 1, 3, 4, false, &[])
        );
    }

    #[test]
    fn ores_only_replace_open_floor() {
        let terrain = NoiseTerrain::new(11, 32);
        let ore_floors = [COPPER_ORE, LEAD_ORE, COAL_ORE];
        for x in 0..32 {
            for y in 0..32 {
                let plain = terrain.generate(0, 0, x, y, false, &[]);
                let rich = terrain.generate(0, 0, x, y, true, &[ItemKind::Copper, ItemKind::Lead]);
                assert!(!ore_floors.contains(&plain.floor));
                assert_eq!(plain.wall, rich.wall);
                assert_eq!(plain.elevation, rich.elevation);
                if rich.floor != plain.floor {
                    assert!(rich.wall.is_air());
                    assert!(rich.floor == COPPER_ORE || rich.floor == LEAD_ORE);
                }
            }
        }
    }
}
