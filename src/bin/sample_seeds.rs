//! Generate maps from several random seeds and print one stats line per seed.
//! Useful when tuning preset multipliers.

use clap::Parser;

use terrain_generator::presets::PresetRegistry;
use terrain_generator::seeds::random_seed;
use terrain_generator::stats::compute_stats;
use terrain_generator::world;

#[derive(Parser, Debug)]
#[command(name = "sample_seeds")]
#[command(about = "Print hydrology statistics for maps from random seeds")]
struct Args {
    /// Number of seeds to sample
    #[arg(short = 'n', long, default_value = "5")]
    count: usize,

    #[arg(short = 'W', long, default_value = "140")]
    width: usize,

    #[arg(short = 'H', long, default_value = "120")]
    height: usize,

    #[arg(short, long, default_value = "normal")]
    preset: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let preset = PresetRegistry::with_builtins().resolve(Some(args.preset.as_str()));
    println!(
        "Sampling {} seeds ({}x{}, preset {})",
        args.count, args.width, args.height, preset.id
    );

    for _ in 0..args.count {
        let seed = random_seed();
        let grid = world::generate(seed, args.width, args.height, &preset);
        let stats = compute_stats(&grid);
        println!("seed {} {}", seed, stats);
    }

    Ok(())
}
