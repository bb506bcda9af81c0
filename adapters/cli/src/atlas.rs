//! Session state shared by every subcommand.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use sector_atlas_core::{
    AtlasConfig, Command, Event, ItemStack, Notice, SectorId, SimEntity, SpawnGroup,
};
use sector_atlas_preview::{
    GraphicsQueue, PaletteColorMapper, PreviewImage, PreviewRenderer, PreviewStore,
};
use sector_atlas_system_campaign::{
    expand_active, play_sector, CampaignContext, PlayOutcome,
};
use sector_atlas_system_persistence::{self as persistence, BincodeFileStore, DirectorySaveSlots};
use sector_atlas_world::{apply, query, World};
use tracing::{debug, info, warn};

use crate::{roster::Roster, terrain::NoiseTerrain};

/// Reads the configuration file, falling back to defaults when none is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<AtlasConfig> {
    let Some(path) = path else {
        return Ok(AtlasConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// World plus the stores backing it under a data directory.
pub(crate) struct Atlas {
    world: World,
    store: BincodeFileStore,
    slots: DirectorySaveSlots,
    terrain: Arc<NoiseTerrain>,
}

impl Atlas {
    /// Loads the sector grid stored under `data_dir`.
    pub(crate) fn open(data_dir: &Path, config: AtlasConfig, seed: u32) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        let terrain = Arc::new(NoiseTerrain::new(seed, config.cells_per_sector));
        let slots = DirectorySaveSlots::new(data_dir.join("saves"), config.current_build);
        let store = BincodeFileStore::new(data_dir.join("sectors.bin"));

        let mut world = World::new(config);
        let mut events = Vec::new();
        let count = persistence::load(&mut world, &store, &mut events)
            .with_context(|| format!("failed to load sectors from {}", store.path().display()))?;
        debug!(sectors = count, "sector grid loaded");

        Ok(Self {
            world,
            store,
            slots,
            terrain,
        })
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Sector occupying the grid cell.
    pub(crate) fn sector_at(&self, x: i32, y: i32) -> Result<SectorId> {
        match query::sector_at(&self.world, x, y) {
            Some(sector) => Ok(sector.id()),
            None => bail!("no sector occupies ({x}, {y})"),
        }
    }

    /// Completes the sector at the cell, creating it when needed.
    pub(crate) fn complete(&mut self, x: i32, y: i32) -> Result<()> {
        let mut events = Vec::new();
        apply(&mut self.world, Command::CompleteSector { x, y }, &mut events);
        report(&events);
        persistence::save(&self.world, &mut self.store).context("failed to save sectors")
    }

    /// Enters the sector at the cell.
    pub(crate) fn play(&mut self, x: i32, y: i32) -> Result<PlayOutcome> {
        let sector = self.sector_at(x, y)?;
        let mut events = Vec::new();
        let mut ctx = CampaignContext {
            world: &mut self.world,
            slots: &mut self.slots,
            store: &mut self.store,
            generator: self.terrain.as_ref(),
        };
        let outcome = play_sector(&mut ctx, sector, &mut events);
        report(&events);
        let outcome = outcome.with_context(|| format!("failed to play sector at ({x}, {y})"))?;
        info!(x, y, ?outcome, "sector entered");
        Ok(outcome)
    }

    /// Enters the sector at the cell and grows it, returning the relocated units.
    pub(crate) fn expand(
        &mut self,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
    ) -> Result<(bool, Roster)> {
        let _ = self.play(x, y)?;
        let Some(tiles) = query::tiles(&self.world) else {
            bail!("sector map is still loading");
        };
        let mut roster = Roster::garrison(tiles, query::config(&self.world).tile_size);

        let mut events = Vec::new();
        let mut ctx = CampaignContext {
            world: &mut self.world,
            slots: &mut self.slots,
            store: &mut self.store,
            generator: self.terrain.as_ref(),
        };
        let grown = expand_active(&mut ctx, dx, dy, &mut roster, &mut events);
        report(&events);
        let grown = grown.with_context(|| format!("failed to expand sector at ({x}, {y})"))?;
        Ok((grown, roster))
    }

    /// Renders the preview of the sector at the cell on the graphics worker.
    pub(crate) fn preview(&self, x: i32, y: i32) -> Result<PreviewImage> {
        let config = query::config(&self.world);
        if config.headless {
            bail!("previews are unavailable in headless mode");
        }
        let sector = self.sector_at(x, y)?;
        let footprint = query::sector(&self.world, sector)
            .map(|record| record.footprint())
            .context("sector vanished")?;

        let renderer = PreviewRenderer::new(
            self.terrain.clone(),
            Arc::new(PaletteColorMapper::default()),
            config.preview_resolution,
            config.cells_per_sector,
        );
        let mut queue = GraphicsQueue::new(renderer)?;
        let mut previews = PreviewStore::new(config.headless);
        previews.handle(&[Event::PreviewRequested { sector, footprint }], &mut queue);
        let _ = queue.wait_idle(&mut previews)?;
        previews
            .remove(sector)
            .context("preview worker produced no image")
    }

    /// Location of the stored sector grid.
    pub(crate) fn store_path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }
}

/// Writes the image as a PNG file.
pub(crate) fn write_png(image: PreviewImage, path: &Path) -> Result<()> {
    let (width, height) = (image.width(), image.height());
    let buffer = image::RgbaImage::from_raw(width, height, image.into_rgba())
        .context("preview buffer does not match its dimensions")?;
    buffer
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Renders the unit positions for the terminal.
pub(crate) fn describe_units(roster: &Roster) -> Vec<String> {
    roster
        .units()
        .iter()
        .map(|unit| {
            let (x, y) = unit.position();
            match unit.spawner_tile() {
                Some(tile) => format!("{} at ({x:.1}, {y:.1}) spawned from tile {tile}", unit.label),
                None => format!("{} at ({x:.1}, {y:.1})", unit.label),
            }
        })
        .collect()
}

/// Renders an inventory as `Copper x400, Lead x100`.
pub(crate) fn describe_items(items: &[ItemStack]) -> String {
    if items.is_empty() {
        return "none".to_owned();
    }
    items
        .iter()
        .map(|stack| format!("{:?} x{}", stack.item, stack.amount))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Units the schedule spawns on its first wave.
pub(crate) fn opening_wave(schedule: &[SpawnGroup]) -> u32 {
    schedule.iter().map(|group| group.units_at(0)).sum()
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::Notice(Notice::OutdatedSave { sector }) => {
                warn!(
                    sector = sector.get(),
                    "save was written by an incompatible build and has been removed"
                );
            }
            Event::Notice(Notice::CorruptSave { sector }) => {
                warn!(sector = sector.get(), "save was corrupt; the sector restarted");
            }
            Event::SessionStarted {
                sector,
                starting_items,
            } => {
                info!(
                    sector = sector.get(),
                    items = %describe_items(starting_items),
                    "core stocked for a fresh session"
                );
            }
            other => debug!(event = ?other, "world event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sector_atlas_core::{ItemKind, DEFAULT_WAVES};

    #[test]
    fn items_are_listed_in_order() {
        let items = [
            ItemStack::new(ItemKind::Copper, 400),
            ItemStack::new(ItemKind::DenseAlloy, 130),
        ];
        assert_eq!(describe_items(&items), "Copper x400, DenseAlloy x130");
        assert_eq!(describe_items(&[]), "none");
    }

    #[test]
    fn opening_wave_counts_groups_starting_on_the_first_wave() {
        assert_eq!(opening_wave(&DEFAULT_WAVES), 1);
        assert_eq!(opening_wave(&DEFAULT_WAVES[1..]), 0);
        assert_eq!(opening_wave(&[]), 0);
    }
}
