use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use terrain_generator::presets::PresetRegistry;
use terrain_generator::seeds::resolve_seed;
use terrain_generator::stats::compute_stats;
use terrain_generator::world;
use terrain_generator::Biome;

#[derive(Parser, Debug)]
#[command(name = "terrain_generator")]
#[command(about = "Generate tile-based terrain maps with rivers, lakes and biomes")]
struct Args {
    /// Random seed (uses a random seed if missing, zero or not a number)
    #[arg(short, long)]
    seed: Option<String>,

    /// Width of the map in tiles
    #[arg(short = 'W', long, default_value = "140")]
    width: usize,

    /// Height of the map in tiles
    #[arg(short = 'H', long, default_value = "120")]
    height: usize,

    /// Preset id (falls back to "normal" if unknown)
    #[arg(short, long, default_value = "normal")]
    preset: String,

    /// JSON file with extra presets (single preset or a map of id to preset)
    #[arg(long)]
    presets_file: Option<PathBuf>,

    /// Write the map as `[x][y]` JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print map statistics
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut registry = PresetRegistry::with_builtins();
    if let Some(path) = &args.presets_file {
        let ids = registry
            .import_file(path)
            .with_context(|| format!("importing presets from {}", path.display()))?;
        println!("Imported presets: {}", ids.join(", "));
    }
    let preset = registry.resolve(Some(args.preset.as_str()));

    let seed = resolve_seed(args.seed.as_deref());
    println!("Generating map with seed: {}", seed);
    println!("Map size: {}x{}", args.width, args.height);
    println!("Preset: {}", preset.id);

    let grid = world::generate(seed, args.width, args.height, &preset);
    let stats = compute_stats(&grid);
    println!(
        "Done: {} river tiles, {} lake tiles",
        stats.rivers, stats.lakes
    );

    if args.stats {
        println!("Map statistics:");
        println!("  Tiles: {}", stats.total);
        println!(
            "  Elevation: {:.3} to {:.3} (avg {:.3})",
            stats.elevation.min, stats.elevation.max, stats.elevation.avg
        );
        println!(
            "  Moisture: {:.3} to {:.3} (avg {:.3})",
            stats.moisture.min, stats.moisture.max, stats.moisture.avg
        );
        println!(
            "  Flow accumulation: min {} max {} avg {:.2}",
            stats.accum_min, stats.accum_max, stats.accum_avg
        );
        for &biome in Biome::all() {
            let count = stats.biome_count(biome);
            println!(
                "  {:<10} {:>6} ({:.1}%)",
                biome.display_name(),
                count,
                100.0 * count as f64 / stats.total.max(1) as f64
            );
        }
    }

    if let Some(path) = &args.output {
        grid.write_json_file(path, args.pretty)
            .with_context(|| format!("writing map to {}", path.display()))?;
        println!("Map written to {}", path.display());
    }

    Ok(())
}
