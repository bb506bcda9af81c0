#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Play flow that enters, resumes and grows sectors.
//!
//! The campaign glues the world to its storage: it decides whether a sector
//! starts fresh or resumes from its save slot, retires saves written by
//! incompatible builds, recovers from corrupt saves and keeps the stored grid
//! in step with every change.

use sector_atlas_core::{
    Command, EntityRegistry, Event, Notice, SaveSlotId, SectorId, TileGenerator,
};
use sector_atlas_system_persistence::{
    self as persistence, PersistenceError, SaveSlots, SectorStore,
};
use sector_atlas_world::{apply, expand, load_sector_map, query, ExpansionCollaborators, World};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures that abort the play flow.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// The sector does not exist in the world.
    #[error("sector {} does not exist", .0.get())]
    UnknownSector(SectorId),
    /// No sector is being played.
    #[error("no sector is being played")]
    NoActiveSector,
    /// A new save slot could not be created.
    #[error("failed to create a save for the sector")]
    CreateSave(#[source] PersistenceError),
    /// The active sector's save could not be overwritten.
    #[error("failed to write the sector save")]
    WriteSave(#[source] PersistenceError),
    /// A stale save could not be removed.
    #[error("failed to remove a stale save")]
    DeleteSave(#[source] PersistenceError),
    /// The sector grid could not be written to its store.
    #[error("failed to persist the sector grid")]
    PersistGrid(#[source] PersistenceError),
    /// The save kept failing to load after being replaced.
    #[error("failed to load the sector save")]
    LoadSave(#[source] PersistenceError),
}

/// How a sector was entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// A fresh map was generated and a new save created.
    Started,
    /// The sector's existing save was loaded.
    Resumed,
}

/// Collaborators the play flow reads and mutates.
pub struct CampaignContext<'a> {
    /// Authoritative world state.
    pub world: &'a mut World,
    /// Per-sector map saves.
    pub slots: &'a mut dyn SaveSlots,
    /// Store of the sector grid.
    pub store: &'a mut dyn SectorStore,
    /// Terrain source for fresh maps.
    pub generator: &'a dyn TileGenerator,
}

/// Enters the sector, resuming its save when one is usable.
///
/// Saves written by a breaking build are deleted and reported with
/// [`Notice::OutdatedSave`]. A save that fails to load is deleted, reported
/// with [`Notice::CorruptSave`] and the sector is entered fresh instead; this
/// recovery happens at most once per call.
pub fn play_sector(
    ctx: &mut CampaignContext<'_>,
    sector: SectorId,
    out_events: &mut Vec<Event>,
) -> Result<PlayOutcome, CampaignError> {
    let mut recovered = false;
    loop {
        let slot = usable_slot(ctx, sector, out_events)?;
        let Some(slot) = slot else {
            start_fresh(ctx, sector, out_events)?;
            if recovered {
                out_events.push(Event::Notice(Notice::CorruptSave { sector }));
            }
            return Ok(PlayOutcome::Started);
        };

        match ctx.slots.load(slot, ctx.world, out_events) {
            Ok(()) => {
                enter(ctx.world, sector, out_events);
                info!(sector = sector.get(), slot = slot.get(), "sector resumed");
                return Ok(PlayOutcome::Resumed);
            }
            Err(error) if !recovered => {
                warn!(
                    sector = sector.get(),
                    slot = slot.get(),
                    %error,
                    "sector save is corrupt"
                );
                remove_save(ctx, sector, slot, out_events)?;
                recovered = true;
            }
            Err(error) => return Err(CampaignError::LoadSave(error)),
        }
    }
}

/// Grows the active sector and refreshes its save and the stored grid.
///
/// Returns `false` when the expansion was rejected.
pub fn expand_active(
    ctx: &mut CampaignContext<'_>,
    dx: i32,
    dy: i32,
    entities: &mut dyn EntityRegistry,
    out_events: &mut Vec<Event>,
) -> Result<bool, CampaignError> {
    let active = query::active_sector(ctx.world).ok_or(CampaignError::NoActiveSector)?;
    let (sector, slot) = (active.id(), active.save_slot());

    let mut collaborators = ExpansionCollaborators {
        generator: ctx.generator,
        entities,
    };
    if !expand(ctx.world, sector, dx, dy, &mut collaborators, out_events) {
        return Ok(false);
    }

    if let Some(slot) = slot {
        ctx.slots
            .save(slot, ctx.world)
            .map_err(CampaignError::WriteSave)?;
    }
    persistence::save(ctx.world, ctx.store).map_err(CampaignError::PersistGrid)?;
    Ok(true)
}

/// Name of the save slot created for a sector.
#[must_use]
pub fn save_name(world: &World, sector: SectorId) -> Option<String> {
    query::sector(world, sector).map(|record| format!("sector-{}", record.position().get()))
}

/// Returns the sector's save slot if it can be loaded by this build.
fn usable_slot(
    ctx: &mut CampaignContext<'_>,
    sector: SectorId,
    out_events: &mut Vec<Event>,
) -> Result<Option<SaveSlotId>, CampaignError> {
    let record = query::sector(ctx.world, sector).ok_or(CampaignError::UnknownSector(sector))?;
    let Some(slot) = record.save_slot().filter(|slot| ctx.slots.exists(*slot)) else {
        return Ok(None);
    };

    let config = query::config(ctx.world);
    match ctx.slots.build_version(slot) {
        Ok(build) if config.is_breaking_build(build) => {
            warn!(
                sector = sector.get(),
                build,
                "removing save written by an incompatible build"
            );
            remove_save(ctx, sector, slot, out_events)?;
            out_events.push(Event::Notice(Notice::OutdatedSave { sector }));
            Ok(None)
        }
        _ => Ok(Some(slot)),
    }
}

fn remove_save(
    ctx: &mut CampaignContext<'_>,
    sector: SectorId,
    slot: SaveSlotId,
    out_events: &mut Vec<Event>,
) -> Result<(), CampaignError> {
    match ctx.slots.delete(slot) {
        Ok(()) | Err(PersistenceError::MissingSlot(_)) => {}
        Err(error) => return Err(CampaignError::DeleteSave(error)),
    }
    apply(
        ctx.world,
        Command::AssignSaveSlot { sector, slot: None },
        out_events,
    );
    persistence::save(ctx.world, ctx.store).map_err(CampaignError::PersistGrid)
}

fn start_fresh(
    ctx: &mut CampaignContext<'_>,
    sector: SectorId,
    out_events: &mut Vec<Event>,
) -> Result<(), CampaignError> {
    let name = save_name(ctx.world, sector).ok_or(CampaignError::UnknownSector(sector))?;

    apply(ctx.world, Command::ResetMissions { sector }, out_events);
    let _ = load_sector_map(ctx.world, sector, ctx.generator, out_events);
    apply(
        ctx.world,
        Command::SetActiveSector {
            sector: Some(sector),
        },
        out_events,
    );
    apply(ctx.world, Command::StartSession, out_events);

    let slot = ctx
        .slots
        .add_save(&name, ctx.world)
        .map_err(CampaignError::CreateSave)?;
    apply(
        ctx.world,
        Command::AssignSaveSlot {
            sector,
            slot: Some(slot),
        },
        out_events,
    );
    persistence::save(ctx.world, ctx.store).map_err(CampaignError::PersistGrid)?;

    apply(ctx.world, Command::BeginMission { sector }, out_events);
    info!(sector = sector.get(), slot = slot.get(), %name, "sector started");
    Ok(())
}

fn enter(world: &mut World, sector: SectorId, out_events: &mut Vec<Event>) {
    apply(
        world,
        Command::SetActiveSector {
            sector: Some(sector),
        },
        out_events,
    );
    apply(world, Command::StartSession, out_events);
    apply(world, Command::BeginMission { sector }, out_events);
    debug!(sector = sector.get(), "sector entered");
}
