#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistence of the sector grid and of per-sector save slots.
//!
//! Only the persistent [`SectorState`] portion of each sector is stored; the
//! world re-derives difficulty, missions and inventory when records are
//! restored. Map contents live in separate save slots managed through
//! [`SaveSlots`].

mod format;
mod slots;
mod store;

use std::{io, path::PathBuf};

use sector_atlas_core::{Command, Event, Footprint, SaveSlotId, SectorState};
use sector_atlas_world::{apply, query, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use slots::{DirectorySaveSlots, MemorySaveSlots, SaveSlots};
pub use store::{BincodeFileStore, MemoryStore};

/// Failures raised while reading or writing persisted data.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backing file could not be accessed.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Data could not be serialized.
    #[error("failed to encode save data: {0}")]
    Encode(#[source] bincode::Error),
    /// Data could not be deserialized.
    #[error("failed to decode save data: {0}")]
    Decode(#[source] bincode::Error),
    /// The data ended before the format header.
    #[error("data too short for the save header")]
    TooShort,
    /// The data does not start with the expected magic number.
    #[error("invalid magic number 0x{0:08X}")]
    InvalidMagic(u32),
    /// The data was written with an unknown format version.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),
    /// The requested save slot does not exist.
    #[error("save slot {} does not exist", .0.get())]
    MissingSlot(SaveSlotId),
    /// The stored tiles disagree with the stored dimensions.
    #[error("stored tile buffer is inconsistent with its dimensions")]
    CorruptMap,
    /// The live map is being replaced and cannot be captured.
    #[error("the live map is being replaced")]
    MapLoading,
}

/// Storage representation of a single sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSector {
    /// Column of the bottom-left cell.
    pub x: i32,
    /// Row of the bottom-left cell.
    pub y: i32,
    /// Width in grid cells.
    pub width: u32,
    /// Height in grid cells.
    pub height: u32,
    /// Whether the sector was completed.
    pub complete: bool,
    /// Number of missions completed so far.
    pub completed_missions: u32,
    /// Raw identifier of the bound save slot.
    pub save_slot: Option<u32>,
}

impl StoredSector {
    /// Captures the persistent portion of a sector.
    #[must_use]
    pub fn from_state(state: SectorState) -> Self {
        Self {
            x: state.footprint.x(),
            y: state.footprint.y(),
            width: state.footprint.width(),
            height: state.footprint.height(),
            complete: state.complete,
            completed_missions: state.completed_missions,
            save_slot: state.save_slot.map(|slot| slot.get()),
        }
    }

    /// Rebuilds the sector state, returning `None` when the footprint is not representable.
    #[must_use]
    pub fn to_state(&self) -> Option<SectorState> {
        let footprint = Footprint::new(self.x, self.y, self.width, self.height)?;
        Some(SectorState {
            footprint,
            complete: self.complete,
            completed_missions: self.completed_missions,
            save_slot: self.save_slot.map(SaveSlotId::new),
        })
    }
}

/// Storage backend for the collection of stored sectors.
pub trait SectorStore {
    /// Reads every stored sector; an empty store yields an empty collection.
    fn read(&self) -> Result<Vec<StoredSector>, PersistenceError>;

    /// Replaces the stored collection.
    fn write(&mut self, records: &[StoredSector]) -> Result<(), PersistenceError>;
}

/// Replaces the world's sectors with the stored collection.
///
/// The store is read before the world is touched, so a failed read leaves
/// the world unchanged. Records that overlap an earlier record or fall
/// outside the grid range are skipped. An empty store yields a fresh grid
/// holding only the origin sector. Returns the number of sectors in the
/// world afterwards.
pub fn load(
    world: &mut World,
    store: &dyn SectorStore,
    out_events: &mut Vec<Event>,
) -> Result<usize, PersistenceError> {
    let records = store.read()?;

    out_events.push(Event::PreviewsCleared);
    apply(world, Command::ResetGrid, out_events);

    if records.is_empty() {
        debug!("no stored sectors, creating the origin sector");
        apply(world, Command::CreateSector { x: 0, y: 0 }, out_events);
    }

    for record in &records {
        let Some(state) = record.to_state() else {
            warn!(
                x = record.x,
                y = record.y,
                width = record.width,
                height = record.height,
                "skipping stored sector outside the grid range"
            );
            continue;
        };
        apply(world, Command::RestoreSector { state }, out_events);
    }

    let restored = query::sectors(world).count();
    debug!(stored = records.len(), restored, "sectors loaded");
    Ok(restored)
}

/// Writes one record per distinct sector, in identifier order.
pub fn save(world: &World, store: &mut dyn SectorStore) -> Result<(), PersistenceError> {
    let records: Vec<StoredSector> = query::sectors(world)
        .map(|sector| StoredSector::from_state(sector.state()))
        .collect();
    store.write(&records)?;
    debug!(count = records.len(), "sectors saved");
    Ok(())
}
