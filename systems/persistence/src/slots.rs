use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use sector_atlas_core::{Command, Event, SaveSlotId, Tile, TileBuffer};
use sector_atlas_world::{apply, query, World};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    format,
    store::{io_error, write_atomically},
    PersistenceError,
};

/// Store of named map saves, each stamped with the build that wrote it.
pub trait SaveSlots {
    /// Captures the live map into a new slot.
    fn add_save(&mut self, name: &str, world: &World) -> Result<SaveSlotId, PersistenceError>;

    /// Reports whether the slot holds a save.
    fn exists(&self, slot: SaveSlotId) -> bool;

    /// Build version stamped into the slot.
    fn build_version(&self, slot: SaveSlotId) -> Result<u32, PersistenceError>;

    /// Installs the slot's map as the live map.
    fn load(
        &self,
        slot: SaveSlotId,
        world: &mut World,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PersistenceError>;

    /// Overwrites the slot with the live map.
    fn save(&mut self, slot: SaveSlotId, world: &World) -> Result<(), PersistenceError>;

    /// Removes the slot.
    fn delete(&mut self, slot: SaveSlotId) -> Result<(), PersistenceError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SaveFile {
    name: String,
    build: u32,
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl SaveFile {
    fn capture(name: &str, build: u32, world: &World) -> Result<Self, PersistenceError> {
        let tiles = query::tiles(world).ok_or(PersistenceError::MapLoading)?;
        Ok(Self {
            name: name.to_owned(),
            build,
            width: tiles.width(),
            height: tiles.height(),
            tiles: tiles.tiles().to_vec(),
        })
    }

    fn install(self, world: &mut World, out_events: &mut Vec<Event>) -> Result<(), PersistenceError> {
        let tiles = TileBuffer::from_tiles(self.width, self.height, self.tiles)
            .ok_or(PersistenceError::CorruptMap)?;
        apply(world, Command::InstallMap { tiles }, out_events);
        Ok(())
    }
}

/// Save slots held in memory.
#[derive(Clone, Debug)]
pub struct MemorySaveSlots {
    build: u32,
    next_slot: u32,
    saves: BTreeMap<SaveSlotId, SaveFile>,
}

impl MemorySaveSlots {
    /// Creates an empty store stamping saves with `build`.
    #[must_use]
    pub fn new(build: u32) -> Self {
        Self {
            build,
            next_slot: 0,
            saves: BTreeMap::new(),
        }
    }

    /// Number of slots holding a save.
    #[must_use]
    pub fn len(&self) -> usize {
        self.saves.len()
    }

    /// Reports whether no slot holds a save.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }

    /// Name the slot was created with.
    #[must_use]
    pub fn name(&self, slot: SaveSlotId) -> Option<&str> {
        self.saves.get(&slot).map(|save| save.name.as_str())
    }
}

impl SaveSlots for MemorySaveSlots {
    fn add_save(&mut self, name: &str, world: &World) -> Result<SaveSlotId, PersistenceError> {
        let save = SaveFile::capture(name, self.build, world)?;
        let slot = SaveSlotId::new(self.next_slot);
        self.next_slot = self.next_slot.wrapping_add(1);
        let _ = self.saves.insert(slot, save);
        Ok(slot)
    }

    fn exists(&self, slot: SaveSlotId) -> bool {
        self.saves.contains_key(&slot)
    }

    fn build_version(&self, slot: SaveSlotId) -> Result<u32, PersistenceError> {
        self.saves
            .get(&slot)
            .map(|save| save.build)
            .ok_or(PersistenceError::MissingSlot(slot))
    }

    fn load(
        &self,
        slot: SaveSlotId,
        world: &mut World,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PersistenceError> {
        let save = self
            .saves
            .get(&slot)
            .cloned()
            .ok_or(PersistenceError::MissingSlot(slot))?;
        save.install(world, out_events)
    }

    fn save(&mut self, slot: SaveSlotId, world: &World) -> Result<(), PersistenceError> {
        let build = self.build;
        let save = self
            .saves
            .get_mut(&slot)
            .ok_or(PersistenceError::MissingSlot(slot))?;
        *save = SaveFile::capture(&save.name, build, world)?;
        Ok(())
    }

    fn delete(&mut self, slot: SaveSlotId) -> Result<(), PersistenceError> {
        self.saves
            .remove(&slot)
            .map(|_| ())
            .ok_or(PersistenceError::MissingSlot(slot))
    }
}

/// Save slots stored as one bincode file per slot inside a directory.
#[derive(Clone, Debug)]
pub struct DirectorySaveSlots {
    dir: PathBuf,
    build: u32,
}

impl DirectorySaveSlots {
    /// Creates a store rooted at `dir`, stamping saves with `build`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, build: u32) -> Self {
        Self {
            dir: dir.into(),
            build,
        }
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: SaveSlotId) -> PathBuf {
        self.dir.join(format!("slot-{}.bin", slot.get()))
    }

    fn read(&self, slot: SaveSlotId) -> Result<SaveFile, PersistenceError> {
        let path = self.slot_path(slot);
        match fs::read(&path) {
            Ok(bytes) => format::decode(&bytes),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(PersistenceError::MissingSlot(slot))
            }
            Err(source) => Err(PersistenceError::Io { path, source }),
        }
    }

    fn write(&self, slot: SaveSlotId, save: &SaveFile) -> Result<(), PersistenceError> {
        let bytes = format::encode(save)?;
        write_atomically(&self.slot_path(slot), &bytes)
    }

    fn next_slot(&self) -> Result<SaveSlotId, PersistenceError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(SaveSlotId::new(0))
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        let next = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_prefix("slot-"))
                    .and_then(|name| name.strip_suffix(".bin"))
                    .and_then(|id| id.parse::<u32>().ok())
            })
            .max()
            .map_or(0, |highest| highest.saturating_add(1));
        Ok(SaveSlotId::new(next))
    }
}

impl SaveSlots for DirectorySaveSlots {
    fn add_save(&mut self, name: &str, world: &World) -> Result<SaveSlotId, PersistenceError> {
        let save = SaveFile::capture(name, self.build, world)?;
        let slot = self.next_slot()?;
        self.write(slot, &save)?;
        debug!(slot = slot.get(), name, "save slot created");
        Ok(slot)
    }

    fn exists(&self, slot: SaveSlotId) -> bool {
        self.slot_path(slot).is_file()
    }

    fn build_version(&self, slot: SaveSlotId) -> Result<u32, PersistenceError> {
        self.read(slot).map(|save| save.build)
    }

    fn load(
        &self,
        slot: SaveSlotId,
        world: &mut World,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PersistenceError> {
        self.read(slot)?.install(world, out_events)
    }

    fn save(&mut self, slot: SaveSlotId, world: &World) -> Result<(), PersistenceError> {
        let name = self.read(slot)?.name;
        let save = SaveFile::capture(&name, self.build, world)?;
        self.write(slot, &save)
    }

    fn delete(&mut self, slot: SaveSlotId) -> Result<(), PersistenceError> {
        let path = self.slot_path(slot);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(slot = slot.get(), "save slot deleted");
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(PersistenceError::MissingSlot(slot))
            }
            Err(source) => Err(io_error(&path)(source)),
        }
    }
}
