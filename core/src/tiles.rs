use serde::{Deserialize, Serialize};

use crate::ItemKind;

/// Identifier of a floor block produced by the tile generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloorId(u16);

impl FloorId {
    /// Creates a floor identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Identifier of a wall block produced by the tile generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallId(u16);

impl WallId {
    /// Absence of a wall.
    pub const AIR: Self = Self(0);

    /// Creates a wall identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Reports whether the identifier denotes an empty wall slot.
    #[must_use]
    pub const fn is_air(&self) -> bool {
        self.0 == 0
    }
}

/// Faction owning a tile or a structure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Unowned terrain.
    #[default]
    Neutral,
    /// Structures built by the player.
    Player,
    /// Structures and units belonging to the attacking waves.
    Enemy,
}

/// Terrain produced by the external tile generator for a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratedTile {
    /// Floor placed on the tile.
    pub floor: FloorId,
    /// Wall placed on the tile, [`WallId::AIR`] when open.
    pub wall: WallId,
    /// Terrain height level.
    pub elevation: u8,
}

/// External procedural generator consulted for every freshly generated tile.
///
/// Implementations must be pure functions of their inputs so previews and
/// expansions agree on terrain without sharing state.
pub trait TileGenerator: Send + Sync {
    /// Generates the tile at `(local_x, local_y)` inside the sector cell `(sector_x, sector_y)`.
    fn generate(
        &self,
        sector_x: i32,
        sector_y: i32,
        local_x: u32,
        local_y: u32,
        with_ores: bool,
        ores: &[ItemKind],
    ) -> GeneratedTile;
}

/// Coordinate transform mapping packed tile indices between two buffer layouts.
///
/// Indices are row-major (`x + y * width`). The transform moves every tile of
/// the old layout by the shift so it lands on the same logical tile of the new
/// layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileTransform {
    /// Width of the layout the indices were recorded against.
    pub old_width: u32,
    /// Height of the layout the indices were recorded against.
    pub old_height: u32,
    /// Width of the layout the indices are remapped into.
    pub new_width: u32,
    /// Height of the layout the indices are remapped into.
    pub new_height: u32,
    /// Column offset applied to every tile.
    pub shift_x: u32,
    /// Row offset applied to every tile.
    pub shift_y: u32,
}

impl TileTransform {
    /// Remaps an index of the old layout, returning `None` when it does not
    /// address a tile of either layout.
    #[must_use]
    pub fn apply(&self, index: u32) -> Option<u32> {
        if self.old_width == 0 {
            return None;
        }
        let x = index % self.old_width;
        let y = index / self.old_width;
        if y >= self.old_height {
            return None;
        }
        let x = x.checked_add(self.shift_x)?;
        let y = y.checked_add(self.shift_y)?;
        if x >= self.new_width || y >= self.new_height {
            return None;
        }
        y.checked_mul(self.new_width)?.checked_add(x)
    }
}

/// Building occupying a tile, possibly linked to other tiles of the buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    block: u16,
    links: Vec<u32>,
}

impl Structure {
    /// Creates a structure of the provided block kind linked to the listed tile indices.
    #[must_use]
    pub fn new(block: u16, links: Vec<u32>) -> Self {
        Self { block, links }
    }

    /// Block kind of the structure.
    #[must_use]
    pub const fn block(&self) -> u16 {
        self.block
    }

    /// Packed tile indices this structure references.
    #[must_use]
    pub fn links(&self) -> &[u32] {
        &self.links
    }

    /// Re-links every referenced tile through the transform.
    ///
    /// Links that no longer address a tile are dropped.
    pub fn transform_links(&mut self, transform: &TileTransform) {
        self.links = self
            .links
            .iter()
            .filter_map(|link| transform.apply(*link))
            .collect();
    }
}

/// Single tile of the authoritative world buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    x: u32,
    y: u32,
    floor: FloorId,
    wall: WallId,
    elevation: u8,
    team: Team,
    structure: Option<Structure>,
}

impl Tile {
    /// Creates an unowned tile from generated terrain.
    #[must_use]
    pub fn generated(x: u32, y: u32, terrain: GeneratedTile) -> Self {
        Self {
            x,
            y,
            floor: terrain.floor,
            wall: terrain.wall,
            elevation: terrain.elevation,
            team: Team::Neutral,
            structure: None,
        }
    }

    /// Column within the buffer.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Row within the buffer.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Floor block.
    #[must_use]
    pub const fn floor(&self) -> FloorId {
        self.floor
    }

    /// Wall block.
    #[must_use]
    pub const fn wall(&self) -> WallId {
        self.wall
    }

    /// Terrain height level.
    #[must_use]
    pub const fn elevation(&self) -> u8 {
        self.elevation
    }

    /// Owning team.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Structure built on the tile, if any.
    #[must_use]
    pub fn structure(&self) -> Option<&Structure> {
        self.structure.as_ref()
    }

    /// Places a structure owned by `team`, replacing any previous one.
    pub fn place_structure(&mut self, team: Team, structure: Structure) {
        self.team = team;
        self.structure = Some(structure);
    }

    /// Moves the tile to a new buffer position and re-links its structure.
    pub fn relocate(&mut self, x: u32, y: u32, transform: &TileTransform) {
        self.x = x;
        self.y = y;
        if let Some(structure) = self.structure.as_mut() {
            structure.transform_links(transform);
        }
    }
}

/// Dense row-major tile buffer covering a sector's footprint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileBuffer {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileBuffer {
    /// Assembles a buffer from tiles in row-major order.
    ///
    /// Returns `None` when the tile count does not match the dimensions or a
    /// tile's stored coordinates disagree with its slot.
    #[must_use]
    pub fn from_tiles(width: u32, height: u32, tiles: Vec<Tile>) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).ok()?;
        if tiles.len() != expected {
            return None;
        }
        let consistent = tiles.iter().enumerate().all(|(index, tile)| {
            let column = index % width.max(1) as usize;
            let row = index / width.max(1) as usize;
            tile.x as usize == column && tile.y as usize == row
        });
        consistent.then_some(Self {
            width,
            height,
            tiles,
        })
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the buffer holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile at the provided position.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<&Tile> {
        self.index(x, y).and_then(|index| self.tiles.get(index))
    }

    /// Tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Consumes the buffer, yielding its tiles in row-major order.
    #[must_use]
    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            let row = usize::try_from(y).ok()?;
            let column = usize::try_from(x).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Partially populated buffer used while a layout is being rebuilt.
#[derive(Debug)]
pub struct TileBufferBuilder {
    width: u32,
    height: u32,
    slots: Vec<Option<Tile>>,
}

impl TileBufferBuilder {
    /// Allocates an empty layout of the provided dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            slots: vec![None; capacity],
        }
    }

    /// Width of the layout in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the layout in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Stores a tile at its recorded position, returning `false` when it lies outside the layout.
    pub fn place(&mut self, tile: Tile) -> bool {
        let Some(index) = self.index(tile.x, tile.y) else {
            return false;
        };
        self.slots[index] = Some(tile);
        true
    }

    /// Number of slots that have not been populated yet.
    #[must_use]
    pub fn vacant(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Completes the layout, filling any vacant slot through `fill`.
    #[must_use]
    pub fn finish(self, mut fill: impl FnMut(u32, u32) -> Tile) -> TileBuffer {
        let width = self.width;
        let tiles = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let index = index as u32;
                    fill(index % width, index / width)
                })
            })
            .collect();
        TileBuffer {
            width: self.width,
            height: self.height,
            tiles,
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            usize::try_from(u64::from(y) * u64::from(self.width) + u64::from(x)).ok()
        } else {
            None
        }
    }
}
