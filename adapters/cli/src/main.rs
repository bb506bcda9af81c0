#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that explores and grows the Sector Atlas grid.

mod atlas;
mod roster;
mod terrain;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sector_atlas_world::query;
use tracing_subscriber::EnvFilter;

use crate::atlas::{describe_items, describe_units, load_config, opening_wave, write_png, Atlas};

/// Explore, play and grow sectors of the atlas.
#[derive(Debug, Parser)]
#[command(name = "sector-atlas", version)]
struct Cli {
    /// Directory holding the sector grid and save slots.
    #[arg(long, default_value = "atlas-data")]
    data_dir: PathBuf,
    /// TOML file overriding the default configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed of the terrain generator.
    #[arg(long, default_value_t = 0)]
    seed: u32,
    /// Logs debug output.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: AtlasCommand,
}

#[derive(Debug, Subcommand)]
enum AtlasCommand {
    /// Lists every sector of the grid.
    Status,
    /// Completes the sector at a grid cell, unlocking its neighbours.
    Complete(Cell),
    /// Enters the sector at a grid cell, resuming its save when possible.
    Play(Cell),
    /// Grows the sector at a grid cell by the given deltas.
    Expand {
        #[command(flatten)]
        cell: Cell,
        /// Columns to add; negative values grow to the left.
        #[arg(allow_negative_numbers = true)]
        dx: i32,
        /// Rows to add; negative values grow downwards.
        #[arg(allow_negative_numbers = true)]
        dy: i32,
    },
    /// Writes the preview of the sector at a grid cell as a PNG file.
    Preview {
        #[command(flatten)]
        cell: Cell,
        /// Destination of the PNG file.
        out: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, Args)]
struct Cell {
    /// Grid column.
    #[arg(allow_negative_numbers = true)]
    x: i32,
    /// Grid row.
    #[arg(allow_negative_numbers = true)]
    y: i32,
}

/// Entry point for the Sector Atlas command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let mut atlas = Atlas::open(&cli.data_dir, config, cli.seed)?;

    match cli.command {
        AtlasCommand::Status => print_status(&atlas),
        AtlasCommand::Complete(Cell { x, y }) => {
            atlas.complete(x, y)?;
            println!("completed sector at ({x}, {y})");
        }
        AtlasCommand::Play(Cell { x, y }) => {
            let outcome = atlas.play(x, y)?;
            let sector = atlas.sector_at(x, y)?;
            if let Some(record) = query::sector(atlas.world(), sector) {
                println!(
                    "{outcome:?} sector at ({x}, {y}): {}",
                    record.current_mission().description()
                );
                println!("  starting items: {}", describe_items(record.starting_items()));
                println!(
                    "  opening wave: {} unit(s)",
                    opening_wave(record.spawn_schedule())
                );
            }
        }
        AtlasCommand::Expand {
            cell: Cell { x, y },
            dx,
            dy,
        } => {
            let (grown, roster) = atlas.expand(x, y, dx, dy)?;
            if grown {
                println!("expanded sector at ({x}, {y}) by ({dx}, {dy})");
                for line in describe_units(&roster) {
                    println!("  {line}");
                }
            } else {
                println!("expansion of sector at ({x}, {y}) by ({dx}, {dy}) was rejected");
            }
        }
        AtlasCommand::Preview {
            cell: Cell { x, y },
            out,
        } => {
            let image = atlas.preview(x, y)?;
            write_png(image, &out)?;
            println!("wrote preview of ({x}, {y}) to {}", out.display());
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_status(atlas: &Atlas) {
    let world = atlas.world();
    println!("sectors stored in {}", atlas.store_path().display());
    for sector in query::sectors(world) {
        let footprint = sector.footprint();
        let marker = match query::active_sector(world) {
            Some(active) if active.id() == sector.id() => "*",
            _ => " ",
        };
        println!(
            "{marker} #{:<4} ({:>4}, {:>4}) {}x{} {:<8} difficulty {:>3} {:?} {}",
            sector.id().get(),
            footprint.x(),
            footprint.y(),
            footprint.width(),
            footprint.height(),
            if sector.is_complete() { "complete" } else { "locked" },
            sector.difficulty(),
            sector.tier(),
            sector.current_mission().description(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::try_parse_from(["sector-atlas", "expand", "-2", "3", "-1", "0"])
            .expect("parse expand");
        match cli.command {
            AtlasCommand::Expand { cell, dx, dy } => {
                assert_eq!((cell.x, cell.y, dx, dy), (-2, 3, -1, 0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_have_defaults() {
        let cli = Cli::try_parse_from(["sector-atlas", "status"]).expect("parse status");
        assert_eq!(cli.data_dir, PathBuf::from("atlas-data"));
        assert!(cli.config.is_none());
        assert_eq!(cli.seed, 0);
        assert!(!cli.verbose);
    }

    #[test]
    fn preview_requires_destination() {
        assert!(Cli::try_parse_from(["sector-atlas", "preview", "0", "0"]).is_err());
    }

    #[test]
    fn config_file_is_parsed_with_defaults() {
        let path = std::env::temp_dir().join(format!(
            "sector-atlas-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "cells_per_sector = 20\nheadless = true\n").expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.cells_per_sector, 20);
        assert!(config.headless);
        assert_eq!(config.current_build, 64);

        std::fs::write(&path, "unknown_field = 1\n").expect("write config");
        assert!(load_config(Some(&path)).is_err());
        let _ = std::fs::remove_file(path);
    }
}
