#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sector preview images for Sector Atlas adapters.
//!
//! Previews are small top-down renderings of a sector's terrain sampled
//! straight from the tile generator. They are produced off the simulation
//! thread by [`GraphicsQueue`] and kept per sector in [`PreviewStore`].

mod queue;
mod store;

use std::sync::Arc;

use sector_atlas_core::{FloorId, Footprint, Team, TileGenerator, WallId};

pub use queue::{GraphicsQueue, PreviewError};
pub use store::PreviewStore;

/// RGBA color produced by a [`ColorMapper`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        Self {
            red: self.red + (1.0 - self.red) * amount,
            green: self.green + (1.0 - self.green) * amount,
            blue: self.blue + (1.0 - self.blue) * amount,
            alpha: self.alpha,
        }
    }

    /// Packs the color into RGBA bytes.
    #[must_use]
    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            channel(self.red),
            channel(self.green),
            channel(self.blue),
            channel(self.alpha),
        ]
    }
}

/// Maps generated terrain to preview colors.
pub trait ColorMapper: Send + Sync {
    /// Color of a tile; `highlight` is set when the terrain just above is higher.
    fn color_for(
        &self,
        floor: FloorId,
        wall: WallId,
        team: Team,
        elevation: u8,
        highlight: bool,
    ) -> Color;
}

/// Color mapper backed by per-block palettes.
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteColorMapper {
    floors: Vec<Color>,
    walls: Vec<Color>,
    fallback: Color,
}

impl PaletteColorMapper {
    /// Creates a mapper indexing `floors` by floor id and `walls` by wall id.
    #[must_use]
    pub fn new(floors: Vec<Color>, walls: Vec<Color>, fallback: Color) -> Self {
        Self {
            floors,
            walls,
            fallback,
        }
    }

    fn lookup(palette: &[Color], index: u16, fallback: Color) -> Color {
        palette.get(usize::from(index)).copied().unwrap_or(fallback)
    }
}

impl Default for PaletteColorMapper {
    fn default() -> Self {
        Self::new(
            vec![
                Color::from_rgb_u8(0x1f, 0x3b, 0x73),
                Color::from_rgb_u8(0x55, 0x55, 0x5d),
                Color::from_rgb_u8(0xc2, 0xb2, 0x80),
                Color::from_rgb_u8(0x4f, 0x7d, 0x3a),
                Color::from_rgb_u8(0xd9, 0x8b, 0x5f),
                Color::from_rgb_u8(0x8c, 0x8c, 0xa0),
                Color::from_rgb_u8(0x2e, 0x2e, 0x2e),
            ],
            vec![
                Color::from_rgb_u8(0, 0, 0),
                Color::from_rgb_u8(0x3d, 0x3d, 0x44),
                Color::from_rgb_u8(0x6b, 0x5a, 0x3c),
                Color::from_rgb_u8(0x2c, 0x4a, 0x22),
            ],
            Color::from_rgb_u8(0xff, 0x00, 0xff),
        )
    }
}

impl ColorMapper for PaletteColorMapper {
    fn color_for(
        &self,
        floor: FloorId,
        wall: WallId,
        team: Team,
        elevation: u8,
        highlight: bool,
    ) -> Color {
        let base = if wall.is_air() {
            Self::lookup(&self.floors, floor.get(), self.fallback)
        } else {
            match team {
                Team::Player => Color::from_rgb_u8(0xff, 0xd3, 0x7f),
                Team::Enemy => Color::from_rgb_u8(0xe5, 0x54, 0x54),
                Team::Neutral => Self::lookup(&self.walls, wall.get(), self.fallback),
            }
        };
        let shaded = base.lighten(f32::from(elevation.min(8)) * 0.04);
        if highlight {
            shaded.lighten(0.25)
        } else {
            shaded
        }
    }
}

/// RGBA preview bitmap, rows stored top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PreviewImage {
    fn blank(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * 4;
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at the provided position, counted from the top-left corner.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let bytes = self.pixels.get(start..start + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Raw RGBA bytes, row-major from the top-left corner.
    #[must_use]
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the image, yielding its raw RGBA bytes.
    #[must_use]
    pub fn into_rgba(self) -> Vec<u8> {
        self.pixels
    }

    fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let start = ((y as usize) * (self.width as usize) + x as usize) * 4;
        if let Some(slot) = self.pixels.get_mut(start..start + 4) {
            slot.copy_from_slice(&rgba);
        }
    }
}

/// Samples the tile generator into preview images.
#[derive(Clone)]
pub struct PreviewRenderer {
    generator: Arc<dyn TileGenerator>,
    mapper: Arc<dyn ColorMapper>,
    resolution: u32,
    cells_per_sector: u32,
}

impl PreviewRenderer {
    /// Creates a renderer producing `resolution` pixels per grid cell edge.
    #[must_use]
    pub fn new(
        generator: Arc<dyn TileGenerator>,
        mapper: Arc<dyn ColorMapper>,
        resolution: u32,
        cells_per_sector: u32,
    ) -> Self {
        Self {
            generator,
            mapper,
            resolution: resolution.max(1),
            cells_per_sector,
        }
    }

    /// Renders the footprint's terrain.
    ///
    /// Pixels are sampled against the footprint's origin cell with local
    /// coordinates spanning the whole footprint. Image rows are flipped so
    /// the top row shows the footprint's highest tiles.
    #[must_use]
    pub fn render(&self, footprint: Footprint) -> PreviewImage {
        let width = self.resolution * footprint.width();
        let height = self.resolution * footprint.height();
        let mut image = PreviewImage::blank(width, height);
        let scale = |pixel: u32| {
            (u64::from(pixel) * u64::from(self.cells_per_sector) / u64::from(self.resolution))
                as u32
        };

        for x in 0..width {
            for y in 0..height {
                let (local_x, local_y) = (scale(x), scale(y));
                let sample = self.generator.generate(
                    footprint.x(),
                    footprint.y(),
                    local_x,
                    local_y,
                    false,
                    &[],
                );
                let above = self.generator.generate(
                    footprint.x(),
                    footprint.y(),
                    local_x,
                    scale(y + 1),
                    false,
                    &[],
                );
                let color = self.mapper.color_for(
                    sample.floor,
                    sample.wall,
                    Team::Neutral,
                    sample.elevation,
                    above.elevation > sample.elevation,
                );
                image.put(x, height - 1 - y, color.to_rgba8());
            }
        }
        image
    }
}
