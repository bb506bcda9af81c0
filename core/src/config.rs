use serde::{Deserialize, Serialize};

/// Tunables shared by the world, the play flow and the preview renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtlasConfig {
    /// Tiles along each edge of a single grid cell.
    pub cells_per_sector: u32,
    /// World units spanned by a single tile; entity positions are expressed in these units.
    pub tile_size: f32,
    /// Preview pixels along each edge of a single grid cell.
    pub preview_resolution: u32,
    /// Rejects expansions whose new footprint covers a completed sector.
    pub check_expansion: bool,
    /// Disables every graphics-backed feature such as preview images.
    pub headless: bool,
    /// Build versions whose saves cannot be loaded by this build.
    pub breaking_builds: Vec<u32>,
    /// Build version stamped into newly written saves.
    pub current_build: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            cells_per_sector: 140,
            tile_size: 8.0,
            preview_resolution: 32,
            check_expansion: false,
            headless: false,
            breaking_builds: vec![47, 48, 49, 50],
            current_build: 64,
        }
    }
}

impl AtlasConfig {
    /// Reports whether saves stamped with `build` are incompatible with this build.
    #[must_use]
    pub fn is_breaking_build(&self, build: u32) -> bool {
        self.breaking_builds.contains(&build)
    }
}
