//! Frontline - headless skirmish runner
//!
//! Builds a two-faction map, scatters units near the front with a seeded
//! RNG, starts auto-capture operations for both sides and runs the
//! simulation for a fixed number of control ticks.

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use frontline::campaign::auto_capture::Selection;
use frontline::campaign::units::UnitRoster;
use frontline::core::config::SimulationConfig;
use frontline::core::error::Result;
use frontline::core::types::{FactionId, GridCoord, UnitId, Vec2, WorldRect};
use frontline::simulation::{SimulationEvent, SimulationState};
use frontline::spatial::grid::GridGeometry;
use frontline::spatial::territory::{CellOwner, TerritoryGrid};

const WEST: FactionId = FactionId(1);
const EAST: FactionId = FactionId(2);

/// Frontline - run a territorial control skirmish between two factions
#[derive(Parser, Debug)]
#[command(name = "frontline")]
#[command(about = "Run a headless territorial control skirmish")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Grid width in cells
    #[arg(long, default_value_t = 40)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 24)]
    height: usize,

    /// Number of control ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Units spawned per faction
    #[arg(long, default_value_t = 6)]
    units: u32,

    /// TOML file overriding the default tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    seed: u64,
    ticks: u64,
    flips: usize,
    cities_captured: Vec<String>,
    territory: BTreeMap<u32, usize>,
    troops: BTreeMap<u32, f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("frontline=info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let territory = build_map(args.width.max(4), args.height.max(3), config.grid.cell_size);
    let mut sim = SimulationState::new(territory, UnitRoster::new(), config)?;

    let mid = (sim.territory().width() / 2) as i64;
    let row = (sim.territory().height() / 2) as i64;
    sim.add_city("Westhold", 1, row, true)?;
    sim.add_city("Eastmarch", sim.territory().width() as i64 - 2, row, true)?;
    sim.add_city("Midford", mid, row, false)?;

    let west = spawn_near_front(&mut sim, WEST, args.units, &mut rng);
    let east = spawn_near_front(&mut sim, EAST, args.units, &mut rng);

    if let Err(e) = sim.request_country_capture(&Selection::new(WEST, west), EAST) {
        tracing::warn!("West could not start its offensive: {}", e);
    }
    let geometry = *sim.territory().geometry();
    let band = front_band(&geometry, mid);
    if let Err(e) = sim.request_area_capture(&Selection::new(EAST, east), band) {
        tracing::warn!("East could not start its offensive: {}", e);
    }

    let mut summary = Summary {
        seed: args.seed,
        ..Default::default()
    };
    let frame_ms = sim.config().grid.tick_interval_ms;
    for _ in 0..args.ticks {
        for event in sim.tick(frame_ms) {
            match event {
                SimulationEvent::CellOwnerChanged { .. } => summary.flips += 1,
                SimulationEvent::CityCaptured { name, .. } => summary.cities_captured.push(name),
                _ => {}
            }
        }
    }

    summary.ticks = sim.current_tick();
    summary.territory = sim
        .territory_counts()
        .into_iter()
        .map(|(f, n)| (f.0, n))
        .collect();
    for faction in [WEST, EAST] {
        summary.troops.insert(faction.0, sim.units().total_troops(faction));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Ocean border, west half for one faction, east half for the other
fn build_map(width: usize, height: usize, cell_size: f32) -> TerritoryGrid {
    let mut territory = TerritoryGrid::new(GridGeometry::new(width, height, cell_size, Vec2::default()));
    for coord in territory.geometry().coords().collect::<Vec<_>>() {
        if coord.x == 0 || coord.y == 0 || coord.x + 1 == width || coord.y + 1 == height {
            continue;
        }
        let owner = if coord.x < width / 2 { WEST } else { EAST };
        if let Err(e) = territory.set_land(coord, CellOwner::Faction(owner)) {
            tracing::warn!("Skipping cell ({}, {}): {}", coord.x, coord.y, e);
        }
    }
    territory
}

fn spawn_near_front<R: Rng>(
    sim: &mut SimulationState,
    faction: FactionId,
    count: u32,
    rng: &mut R,
) -> Vec<UnitId> {
    let geometry = *sim.territory().geometry();
    let mid = geometry.width / 2;
    let (lo, hi) = if faction == WEST {
        (mid.saturating_sub(4).max(1), mid)
    } else {
        (mid, (mid + 4).min(geometry.width - 1))
    };

    (0..count)
        .map(|_| {
            let x = rng.gen_range(lo..hi);
            let y = rng.gen_range(1..geometry.height - 1);
            let troops = rng.gen_range(1..=3) as f64 * 10_000.0;
            let position = geometry.cell_center(GridCoord::new(x, y));
            sim.units_mut().spawn(faction, position, troops)
        })
        .collect()
}

/// World rectangle covering the columns just west of the border
fn front_band(geometry: &GridGeometry, mid: i64) -> WorldRect {
    let size = geometry.cell_size;
    let left = (mid - 3).max(0) as f32 * size;
    let right = mid as f32 * size - 0.01;
    WorldRect::from_corners(
        Vec2::new(geometry.origin.x + left, geometry.origin.y),
        Vec2::new(geometry.origin.x + right, geometry.origin.y + geometry.height as f32 * size),
    )
}

fn print_summary(summary: &Summary) {
    println!("\n=== FRONTLINE (seed {}) ===", summary.seed);
    println!("Control ticks: {}", summary.ticks);
    println!("Cells changed hands: {}", summary.flips);
    if !summary.cities_captured.is_empty() {
        println!("Cities captured: {}", summary.cities_captured.join(", "));
    }
    for (faction, cells) in &summary.territory {
        let troops = summary.troops.get(faction).copied().unwrap_or(0.0);
        println!("  Faction {}: {} cells, {:.0} troops", faction, cells, troops);
    }
}
