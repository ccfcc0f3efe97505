//! Terrain map generation library
//!
//! Re-exports modules for use by binaries and tools.

pub mod biomes;
pub mod error;
pub mod heightmap;
pub mod hydrology;
pub mod presets;
pub mod seeds;
pub mod stats;
pub mod tilemap;
pub mod value_noise;
pub mod world;

pub use biomes::Biome;
pub use error::MapError;
pub use presets::{Preset, PresetRegistry};
pub use stats::{compute_stats, MapStats};
pub use world::{generate, generate_tiles, Tile, TileGrid};
