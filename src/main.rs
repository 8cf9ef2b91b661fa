use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use city_traffic::simulation::{load_map_source, CityWorld, DirectionTable};

#[derive(Parser)]
#[command(name = "city_traffic")]
#[command(about = "Grid city traffic simulation")]
struct Cli {
    /// Path to the ASCII map file
    #[arg(long, default_value = "maps/city_base.txt")]
    map: PathBuf,

    /// Path to the character/direction table
    #[arg(long, default_value = "maps/map_dictionary.json")]
    table: PathBuf,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "200")]
    ticks: u64,

    /// Ticks between printed world maps
    #[arg(long, default_value = "20")]
    report_every: u64,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let map_source = load_map_source(&cli.map)
        .with_context(|| format!("loading map {}", cli.map.display()))?;
    let table = DirectionTable::from_file(&cli.table)
        .with_context(|| format!("loading direction table {}", cli.table.display()))?;

    let mut world = match cli.seed {
        Some(seed) => CityWorld::new_seeded(&map_source, &table, seed)?,
        None => CityWorld::new(&map_source, &table)?,
    };

    println!("Legend: C=Car, G/R=Traffic light, #=Obstacle, D=Destination, ^v<>+=Road");
    println!("{}", world.render_map());
    println!();

    for _ in 0..cli.ticks {
        let summary = world.tick();

        if summary.step_index % cli.report_every == 0 {
            world.log_summary();
            println!("--- step {} ---", summary.step_index);
            println!("{}", world.render_map());
            println!();
        }

        if !world.running {
            println!("All spawn points blocked at step {}; stopping.", summary.step_index);
            break;
        }
    }

    world.log_summary();
    println!("=== Final state ===");
    println!("{}", world.render_map());
    Ok(())
}
