//! Tile grid and the generation entry point
//!
//! `generate` is a pure function of seed, size and preset: it runs noise
//! synthesis, flow routing, lake detection and biome classification and hands
//! back an owned `TileGrid`. Nothing is cached between calls.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::biomes::{self, Biome};
use crate::error::{MapError, Result};
use crate::heightmap;
use crate::hydrology::{detect_lakes, FlowNetwork};
use crate::presets::Preset;
use crate::seeds::{random_seed, WorldSeeds};
use crate::tilemap::Tilemap;

/// One map cell. Field names match the persisted map format; every field has
/// a default so partially filled tiles still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tile {
    pub elevation: f64,
    pub moisture: f64,
    pub biome: Biome,
    pub river: bool,
    pub lake: bool,
    /// Cells (including this one) whose flow passes through or ends here.
    pub flow_accum: u32,
    /// Placed by map editors; generation never sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            elevation: 0.0,
            moisture: 0.0,
            biome: Biome::Grassland,
            river: false,
            lake: false,
            flow_accum: 1,
            building: None,
        }
    }
}

/// A finished W x H map. Serialises as an array of columns (`[x][y]`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<Tile>>", try_from = "Vec<Vec<Tile>>")]
pub struct TileGrid {
    tiles: Tilemap<Tile>,
}

impl TileGrid {
    pub fn from_tilemap(tiles: Tilemap<Tile>) -> Self {
        Self { tiles }
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }

    pub fn get(&self, x: usize, y: usize) -> &Tile {
        self.tiles.get(x, y)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Tile)> {
        self.tiles.iter()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a `[x][y]` map. Fails on empty or non-rectangular input.
    pub fn from_json(json: &str) -> Result<Self> {
        let columns: Vec<Vec<Tile>> = serde_json::from_str(json)?;
        Self::try_from(columns)
    }

    /// Read a `[x][y]` map from a JSON file.
    pub fn read_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write the map as `[x][y]` JSON.
    pub fn write_json_file(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        fs::write(path, json)?;
        Ok(())
    }

    /// Crop or pad to `width x height`. Padding uses blank grassland tiles.
    pub fn resized(&self, width: usize, height: usize) -> Self {
        let tiles = Tilemap::from_fn(width, height, |x, y| {
            if x < self.width() && y < self.height() {
                self.tiles.get(x, y).clone()
            } else {
                Tile::default()
            }
        });
        Self { tiles }
    }

    /// Rerun flow routing and lake detection on the current elevations.
    ///
    /// Lake basins become lakes and high-accumulation cells become rivers.
    /// Every other tile keeps its biome, and existing lake flags are kept.
    pub fn recalculate_hydrology(&mut self, preset: &Preset) {
        let elevation = self.tiles.map(|t| t.elevation);
        let network = FlowNetwork::compute(&elevation);
        let detection = detect_lakes(&elevation, &network, preset.lake_mult);
        let threshold =
            biomes::river_accumulation_threshold(self.width(), self.height(), preset.river_mult);

        for (x, y, tile) in self.tiles.iter_mut() {
            tile.flow_accum = *network.accumulation.get(x, y);
            if *detection.lake_mask.get(x, y) {
                tile.lake = true;
                tile.biome = Biome::Lake;
            }
            if tile.lake {
                tile.river = false;
                continue;
            }
            tile.river = tile.flow_accum >= threshold;
            if tile.river {
                tile.biome = Biome::River;
            }
        }

        log::debug!(
            "hydrology recalculated: {} lake cells, river threshold {}",
            detection.lake_cell_count(),
            threshold
        );
    }

    /// Relabel every tile from the preset bands, keeping lake and river flags.
    pub fn reapply_biomes(&mut self, preset: &Preset) {
        biomes::reapply(&mut self.tiles, &preset.biome_thresholds);
    }
}

impl From<TileGrid> for Vec<Vec<Tile>> {
    fn from(grid: TileGrid) -> Self {
        let tiles = grid.tiles;
        (0..tiles.width)
            .map(|x| (0..tiles.height).map(|y| tiles.get(x, y).clone()).collect())
            .collect()
    }
}

impl TryFrom<Vec<Vec<Tile>>> for TileGrid {
    type Error = MapError;

    fn try_from(columns: Vec<Vec<Tile>>) -> Result<Self> {
        let width = columns.len();
        let height = columns.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(MapError::EmptyMap);
        }
        if let Some((column, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != height) {
            return Err(MapError::RaggedColumn {
                column,
                expected: height,
                found: col.len(),
            });
        }

        let mut tiles = Tilemap::new(width, height);
        for (x, column) in columns.into_iter().enumerate() {
            for (y, tile) in column.into_iter().enumerate() {
                tiles.set(x, y, tile);
            }
        }
        Ok(Self { tiles })
    }
}

/// Generate a map. The same seed, size and preset always give the same grid.
pub fn generate(seed: u32, width: usize, height: usize, preset: &Preset) -> TileGrid {
    let start = Instant::now();
    let seeds = WorldSeeds::from_master(seed);
    log::debug!("{}", seeds);

    let fields = heightmap::generate_fields(width, height, preset, &seeds);

    let network = FlowNetwork::compute(&fields.elevation);
    log::debug!("flow routing: {} sinks", network.sinks().count());

    let lakes = detect_lakes(&fields.elevation, &network, preset.lake_mult);

    // Hydrology runs on the raw field; the bands see the island falloff.
    let mut elevation = fields.elevation;
    if preset.island_mode {
        heightmap::apply_island_falloff(&mut elevation);
    }

    let mut tiles = Tilemap::from_fn(width, height, |x, y| Tile {
        elevation: *elevation.get(x, y),
        moisture: *fields.moisture.get(x, y),
        lake: *lakes.lake_mask.get(x, y),
        flow_accum: *network.accumulation.get(x, y),
        ..Tile::default()
    });

    biomes::classify(&mut tiles, preset, seeds.forest);

    log::info!(
        "generated {}x{} map, seed {}, preset {}, {} ms",
        width,
        height,
        seed,
        preset.id,
        start.elapsed().as_millis()
    );

    TileGrid { tiles }
}

/// Generate with fallbacks: a missing or zero seed is replaced by a random one
/// and a missing preset by `normal`. Returns the seed actually used.
pub fn generate_tiles(
    seed: Option<u32>,
    width: usize,
    height: usize,
    preset: Option<&Preset>,
) -> (u32, TileGrid) {
    let seed = match seed {
        Some(seed) if seed != 0 => seed,
        _ => {
            let seed = random_seed();
            log::warn!("no usable seed given, using random seed {}", seed);
            seed
        }
    };

    let grid = match preset {
        Some(preset) => generate(seed, width, height, preset),
        None => generate(seed, width, height, &Preset::normal()),
    };
    (seed, grid)
}
