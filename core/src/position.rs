use serde::{Deserialize, Serialize};

/// Signed grid coordinate pair packed into a single 32-bit key.
///
/// The high half stores the column and the low half stores the row, both as
/// two's-complement 16-bit values. The packed value doubles as the seed for
/// position-keyed randomness and as the suffix of sector save names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackedPosition(i32);

impl PackedPosition {
    /// Packs an in-range coordinate pair.
    #[must_use]
    pub const fn pack(x: i16, y: i16) -> Self {
        let high = (x as u16 as u32) << 16;
        let low = y as u16 as u32;
        Self((high | low) as i32)
    }

    /// Packs a wide coordinate pair, rejecting values outside the 16-bit range.
    #[must_use]
    pub fn try_pack(x: i32, y: i32) -> Option<Self> {
        let x = i16::try_from(x).ok()?;
        let y = i16::try_from(y).ok()?;
        Some(Self::pack(x, y))
    }

    /// Splits the key back into its coordinate pair.
    #[must_use]
    pub const fn unpack(self) -> (i16, i16) {
        let bits = self.0 as u32;
        ((bits >> 16) as u16 as i16, (bits & 0xffff) as u16 as i16)
    }

    /// Column half of the key.
    #[must_use]
    pub const fn x(self) -> i16 {
        self.unpack().0
    }

    /// Row half of the key.
    #[must_use]
    pub const fn y(self) -> i16 {
        self.unpack().1
    }

    /// Raw packed representation.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

/// Rectangular set of grid cells anchored at its bottom-left cell.
///
/// Construction guarantees a non-zero extent and that every covered cell is
/// representable as a [`PackedPosition`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Footprint {
    x: i16,
    y: i16,
    width: u16,
    height: u16,
}

impl Footprint {
    /// Creates a footprint, rejecting empty extents and cells beyond the packable range.
    #[must_use]
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let origin_x = i16::try_from(x).ok()?;
        let origin_y = i16::try_from(y).ok()?;
        let width = u16::try_from(width).ok()?;
        let height = u16::try_from(height).ok()?;
        let last_x = i32::from(origin_x) + i32::from(width) - 1;
        let last_y = i32::from(origin_y) + i32::from(height) - 1;
        if last_x > i32::from(i16::MAX) || last_y > i32::from(i16::MAX) {
            return None;
        }
        Some(Self {
            x: origin_x,
            y: origin_y,
            width,
            height,
        })
    }

    /// Single-cell footprint at the provided position.
    #[must_use]
    pub const fn unit(position: PackedPosition) -> Self {
        let (x, y) = position.unpack();
        Self {
            x,
            y,
            width: 1,
            height: 1,
        }
    }

    /// Column of the bottom-left cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x as i32
    }

    /// Row of the bottom-left cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y as i32
    }

    /// Width measured in grid cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width as u32
    }

    /// Height measured in grid cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height as u32
    }

    /// Packed position of the bottom-left cell.
    #[must_use]
    pub const fn origin(&self) -> PackedPosition {
        PackedPosition::pack(self.x, self.y)
    }

    /// Reports whether the cell lies inside the footprint.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x()
            && y >= self.y()
            && x < self.x() + self.width() as i32
            && y < self.y() + self.height() as i32
    }

    /// Footprint grown by the provided signed deltas.
    ///
    /// Negative deltas move the origin so the footprint grows leftward or
    /// downward; the extent always grows by the absolute delta.
    #[must_use]
    pub fn grown(&self, dx: i32, dy: i32) -> Option<Self> {
        let x = if dx < 0 { self.x().checked_add(dx)? } else { self.x() };
        let y = if dy < 0 { self.y().checked_add(dy)? } else { self.y() };
        let width = self.width().checked_add(dx.unsigned_abs())?;
        let height = self.height().checked_add(dy.unsigned_abs())?;
        Self::new(x, y, width, height)
    }

    /// Iterates every covered cell, column-major from the bottom-left cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let (x, y, width, height) = (self.x(), self.y(), self.width(), self.height());
        (0..width as i32).flat_map(move |cx| (0..height as i32).map(move |cy| (x + cx, y + cy)))
    }
}
