//! Biome classification
//!
//! Runs over a tile grid whose elevation, moisture, flow accumulation and
//! basin lake flags are already set:
//!
//! 1. Flow rivers - non-lake cells with enough upstream area become river candidates
//! 2. Elevation bands - ordered first-match classification, flags synced to the label
//! 3. Forests - seeded near rivers and in wet grassland, then grown by neighbour spread
//! 4. Snow - cells next to existing snow at high elevation turn to snow
//!
//! The forest passes draw from a seeded ChaCha stream in column-major order,
//! so the same seed always produces the same forests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::presets::{BiomeThresholds, Preset, SnowRule};
use crate::tilemap::Tilemap;
use crate::world::Tile;

/// Terrain label of a tile.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    #[default]
    Grassland,
    Forest,
    Mountain,
    Snow,
    River,
    Lake,
    Beach,
}

impl Biome {
    pub fn all() -> &'static [Biome] {
        &[
            Biome::Grassland,
            Biome::Forest,
            Biome::Mountain,
            Biome::Snow,
            Biome::River,
            Biome::Lake,
            Biome::Beach,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Biome::Grassland => "Grassland",
            Biome::Forest => "Forest",
            Biome::Mountain => "Mountain",
            Biome::Snow => "Snow",
            Biome::River => "River",
            Biome::Lake => "Lake",
            Biome::Beach => "Beach",
        }
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// CONSTANTS
// =============================================================================

/// Map area per unit of river threshold before the river multiplier is applied.
const RIVER_AREA_DIVISOR: f64 = 900.0;
/// Smallest river multiplier used in the threshold (caps the threshold from above).
const MIN_RIVER_MULT: f64 = 0.25;
/// The accumulation threshold never drops below this.
const MIN_RIVER_THRESHOLD: u32 = 8;

/// Radius of the square searched for rivers when seeding forests (5x5).
const FOREST_RIVER_RADIUS: i32 = 2;
const RIVERSIDE_FOREST_MOISTURE: f64 = 0.36;
const RIVERSIDE_FOREST_CHANCE: f64 = 0.28;
const WET_FOREST_MOISTURE: f64 = 0.72;
const WET_FOREST_CHANCE: f64 = 0.22;

/// Number of cellular spread iterations after seeding.
pub const FOREST_SPREAD_ITERATIONS: usize = 5;
const SPREAD_MIN_NEIGHBORS: usize = 2;
const SPREAD_MOISTURE: f64 = 0.40;
const SPREAD_CHANCE: f64 = 0.28;

const SNOW_MIN_NEIGHBORS: usize = 2;
/// Mountains above this become snow under the legacy rule.
const LEGACY_PEAK_ELEVATION: f64 = 0.86;
/// Legacy rule spreads snow strictly above this elevation.
const LEGACY_SPREAD_ELEVATION: f64 = 0.72;

// =============================================================================
// RIVERS AND BANDS
// =============================================================================

/// Flow accumulation a cell needs to count as a river.
pub fn river_accumulation_threshold(width: usize, height: usize, river_mult: f64) -> u32 {
    let area = (width * height) as f64;
    let threshold = (area / RIVER_AREA_DIVISOR / river_mult.max(MIN_RIVER_MULT)).floor();
    (threshold as u32).max(MIN_RIVER_THRESHOLD)
}

/// Flag non-lake cells with `flow_accum >= threshold` as river candidates.
/// Returns the number of candidates.
pub fn mark_flow_rivers(tiles: &mut Tilemap<Tile>, threshold: u32) -> usize {
    let mut count = 0;
    for (_, _, tile) in tiles.iter_mut() {
        tile.river = !tile.lake && tile.flow_accum >= threshold;
        if tile.river {
            count += 1;
        }
    }
    count
}

/// Elevation rounded to two decimals, the way beach matching compares it.
pub fn round_to_hundredths(e: f64) -> f64 {
    (e * 100.0).round() / 100.0
}

/// First elevation band that matches, or `None` if the thresholds leave a gap.
pub fn elevation_band(e: f64, river_candidate: bool, t: &BiomeThresholds) -> Option<Biome> {
    if e < t.lake {
        Some(Biome::Lake)
    } else if round_to_hundredths(e) == t.beach_rounded {
        Some(Biome::Beach)
    } else if (e >= t.river_min && e < t.river_max) || river_candidate {
        Some(Biome::River)
    } else if e >= t.grass_min && e < t.grass_max {
        Some(Biome::Grassland)
    } else if e >= t.forest_min && e < t.forest_max {
        Some(Biome::Forest)
    } else if e >= t.mountain_min && e < t.mountain_max {
        Some(Biome::Mountain)
    } else if e >= t.snow_min {
        Some(Biome::Snow)
    } else {
        None
    }
}

fn set_biome(tile: &mut Tile, biome: Biome) {
    tile.biome = biome;
    tile.lake = biome == Biome::Lake;
    tile.river = biome == Biome::River;
}

/// Label every tile from its elevation band, using the current `river` flag as
/// the flow-river candidate. Hydrology flags are rewritten to match the label.
/// Tiles falling in a gap between bands become grassland.
pub fn classify_bands(tiles: &mut Tilemap<Tile>, thresholds: &BiomeThresholds) {
    for (_, _, tile) in tiles.iter_mut() {
        let biome = elevation_band(tile.elevation, tile.river, thresholds).unwrap_or_default();
        set_biome(tile, biome);
    }
}

// =============================================================================
// FORESTS
// =============================================================================

/// Turn some grassland into forest: near rivers when moist enough, anywhere
/// when very wet. Returns the number of conversions.
pub fn seed_forests(tiles: &mut Tilemap<Tile>, rng: &mut ChaCha8Rng) -> usize {
    let mut converted = 0;
    let coords: Vec<(usize, usize)> = tiles.coords_column_major().collect();

    for (x, y) in coords {
        if tiles.get(x, y).biome != Biome::Grassland {
            continue;
        }
        let near_river = tiles
            .neighbors_within(x, y, FOREST_RIVER_RADIUS)
            .into_iter()
            .any(|(nx, ny)| tiles.get(nx, ny).river);

        let moisture = tiles.get(x, y).moisture;
        let forest = if near_river
            && moisture > RIVERSIDE_FOREST_MOISTURE
            && rng.gen::<f64>() < RIVERSIDE_FOREST_CHANCE
        {
            true
        } else {
            moisture > WET_FOREST_MOISTURE && rng.gen::<f64>() < WET_FOREST_CHANCE
        };

        if forest {
            tiles.get_mut(x, y).biome = Biome::Forest;
            converted += 1;
        }
    }

    converted
}

/// Grow forests into moist grassland with at least two forest neighbours.
/// Each iteration collects its conversions before applying them.
pub fn spread_forests(tiles: &mut Tilemap<Tile>, rng: &mut ChaCha8Rng, iterations: usize) -> usize {
    let mut total = 0;

    for iter in 0..iterations {
        let mut changes = Vec::new();
        for (x, y) in tiles.coords_column_major() {
            let tile = tiles.get(x, y);
            if tile.biome != Biome::Grassland {
                continue;
            }
            let forest_neighbors = tiles.count_neighbors_8(x, y, |t| t.biome == Biome::Forest);
            if forest_neighbors >= SPREAD_MIN_NEIGHBORS
                && tile.moisture > SPREAD_MOISTURE
                && rng.gen::<f64>() < SPREAD_CHANCE
            {
                changes.push((x, y));
            }
        }

        log::debug!("forest spread iteration {}: {} cells", iter, changes.len());
        total += changes.len();
        for (x, y) in changes {
            tiles.get_mut(x, y).biome = Biome::Forest;
        }
    }

    total
}

// =============================================================================
// SNOW
// =============================================================================

/// Single snow expansion pass, applied in place during a column-major scan:
/// a cell turned to snow counts as a snow neighbour for cells scanned after
/// it. Under the legacy rule each high mountain becomes snow as it is reached.
/// Returns the number of tiles turned to snow.
pub fn expand_snow(tiles: &mut Tilemap<Tile>, thresholds: &BiomeThresholds, rule: SnowRule) -> usize {
    let mut converted = 0;
    let coords: Vec<(usize, usize)> = tiles.coords_column_major().collect();

    for (x, y) in coords {
        let tile = tiles.get_mut(x, y);
        if rule == SnowRule::Legacy
            && tile.biome == Biome::Mountain
            && tile.elevation > LEGACY_PEAK_ELEVATION
        {
            set_biome(tile, Biome::Snow);
            converted += 1;
        }

        let tile = tiles.get(x, y);
        if tile.biome == Biome::Snow {
            continue;
        }
        let high_enough = match rule {
            SnowRule::Threshold => tile.elevation >= thresholds.snow_min,
            SnowRule::Legacy => tile.elevation > LEGACY_SPREAD_ELEVATION,
        };
        if high_enough
            && tiles.count_neighbors_8(x, y, |t| t.biome == Biome::Snow) >= SNOW_MIN_NEIGHBORS
        {
            set_biome(tiles.get_mut(x, y), Biome::Snow);
            converted += 1;
        }
    }

    converted
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Run the full classifier on freshly generated tiles.
pub fn classify(tiles: &mut Tilemap<Tile>, preset: &Preset, forest_seed: u64) {
    let thresholds = &preset.biome_thresholds;

    let threshold = river_accumulation_threshold(tiles.width, tiles.height, preset.river_mult);
    let candidates = mark_flow_rivers(tiles, threshold);
    log::debug!(
        "river accumulation threshold {}: {} flow river candidates",
        threshold,
        candidates
    );

    classify_bands(tiles, thresholds);

    if !preset.force_elevation_biomes {
        let mut rng = ChaCha8Rng::seed_from_u64(forest_seed);
        let seeded = seed_forests(tiles, &mut rng);
        let spread = spread_forests(tiles, &mut rng, FOREST_SPREAD_ITERATIONS);
        log::debug!("forests: {} seeded, {} grown by spread", seeded, spread);
    }

    let snow = expand_snow(tiles, thresholds, preset.snow_rule);
    log::debug!("snow expansion: {} cells", snow);
}

/// Relabel tiles from the preset bands, keeping existing lake and river flags
/// as overrides. Tiles in a gap between bands (including the river band
/// without a river flag) keep their current biome.
pub fn reapply(tiles: &mut Tilemap<Tile>, thresholds: &BiomeThresholds) {
    for (_, _, tile) in tiles.iter_mut() {
        if tile.lake {
            tile.river = false;
            tile.biome = Biome::Lake;
            continue;
        }
        if tile.river {
            tile.biome = Biome::River;
            continue;
        }
        match elevation_band(tile.elevation, false, thresholds) {
            Some(Biome::River) | None => {}
            // Band lakes get their flag too, so a lake label always carries it.
            Some(biome) => set_biome(tile, biome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(elevation: f64, moisture: f64) -> Tile {
        Tile {
            elevation,
            moisture,
            ..Tile::default()
        }
    }

    fn grid_from(elevations: &[&[f64]], moisture: f64) -> Tilemap<Tile> {
        let height = elevations.len();
        let width = elevations[0].len();
        Tilemap::from_fn(width, height, |x, y| tile(elevations[y][x], moisture))
    }

    #[test]
    fn test_river_threshold() {
        assert_eq!(river_accumulation_threshold(140, 120, 0.28), 66);
        // River multipliers below 0.25 are clamped.
        assert_eq!(river_accumulation_threshold(140, 120, 0.12), 74);
        assert_eq!(river_accumulation_threshold(10, 10, 0.28), 8);
        assert_eq!(river_accumulation_threshold(140, 120, 100.0), 8);
    }

    #[test]
    fn test_elevation_bands() {
        let t = BiomeThresholds::default();
        assert_eq!(elevation_band(0.1, false, &t), Some(Biome::Lake));
        assert_eq!(elevation_band(0.32, false, &t), Some(Biome::Beach));
        assert_eq!(elevation_band(0.3249, false, &t), Some(Biome::Beach));
        assert_eq!(elevation_band(0.34, false, &t), Some(Biome::River));
        assert_eq!(elevation_band(0.40, false, &t), Some(Biome::Grassland));
        assert_eq!(elevation_band(0.40, true, &t), Some(Biome::River));
        assert_eq!(elevation_band(0.55, false, &t), Some(Biome::Forest));
        assert_eq!(elevation_band(0.65, false, &t), Some(Biome::Mountain));
        assert_eq!(elevation_band(0.70, false, &t), Some(Biome::Snow));
        // 0.312 rounds to 0.31: above the lake band, below every other band.
        assert_eq!(elevation_band(0.312, false, &t), None);
    }

    #[test]
    fn test_beach_wins_over_river_candidate() {
        let t = BiomeThresholds::default();
        let mut tiles = Tilemap::new_with(1, 1, tile(0.32, 0.5));
        tiles.get_mut(0, 0).river = true;
        classify_bands(&mut tiles, &t);
        let result = tiles.get(0, 0);
        assert_eq!(result.biome, Biome::Beach);
        assert!(!result.river && !result.lake);
    }

    #[test]
    fn test_flow_rivers_skip_lakes() {
        let mut tiles = Tilemap::new_with(2, 1, tile(0.4, 0.5));
        for (_, _, t) in tiles.iter_mut() {
            t.flow_accum = 100;
        }
        tiles.get_mut(1, 0).lake = true;
        assert_eq!(mark_flow_rivers(&mut tiles, 50), 1);
        assert!(tiles.get(0, 0).river);
        assert!(!tiles.get(1, 0).river);
    }

    #[test]
    fn test_band_classification_is_idempotent() {
        let t = BiomeThresholds::default();
        let mut tiles = Tilemap::from_fn(20, 20, |x, y| {
            let mut t = tile((x * 20 + y) as f64 / 400.0, 0.5);
            t.flow_accum = 1 + (x * y) as u32;
            t
        });
        mark_flow_rivers(&mut tiles, 100);
        classify_bands(&mut tiles, &t);
        let first = tiles.clone();
        classify_bands(&mut tiles, &t);
        assert_eq!(first, tiles);
        for (_, _, tile) in tiles.iter() {
            assert!(!(tile.river && tile.lake));
            assert_eq!(tile.lake, tile.biome == Biome::Lake);
            assert_eq!(tile.river, tile.biome == Biome::River);
        }
    }

    #[test]
    fn test_forest_passes_are_seeded() {
        let run = |seed: u64| {
            let mut tiles = Tilemap::from_fn(30, 30, |x, y| {
                tile(0.4, 0.3 + ((x * 7 + y * 13) % 60) as f64 / 100.0)
            });
            tiles.get_mut(15, 15).river = true;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            seed_forests(&mut tiles, &mut rng);
            spread_forests(&mut tiles, &mut rng, FOREST_SPREAD_ITERATIONS);
            tiles
        };
        assert_eq!(run(7), run(7));
        let forests = run(7).iter().filter(|(_, _, t)| t.biome == Biome::Forest).count();
        assert!(forests > 0);
    }

    #[test]
    fn test_spread_needs_two_forest_neighbors() {
        let mut tiles = Tilemap::new_with(5, 5, tile(0.4, 0.9));
        tiles.get_mut(0, 0).biome = Biome::Forest;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // A lone forest tile has no grassland cell with two forest neighbours.
        assert_eq!(spread_forests(&mut tiles, &mut rng, 10), 0);
    }

    #[test]
    fn test_dry_grassland_never_becomes_forest() {
        let mut tiles = Tilemap::new_with(10, 10, tile(0.4, 0.2));
        tiles.get_mut(5, 5).river = true;
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(seed_forests(&mut tiles, &mut rng), 0);
    }

    #[test]
    fn test_snow_expands_next_to_two_snow_cells() {
        let t = BiomeThresholds::default();
        let mut tiles = grid_from(&[&[0.8, 0.8, 0.8], &[0.75, 0.5, 0.75]], 0.5);
        tiles.get_mut(0, 0).biome = Biome::Snow;
        tiles.get_mut(2, 0).biome = Biome::Snow;
        // High river cell between two snow cells.
        tiles.get_mut(1, 0).biome = Biome::River;
        tiles.get_mut(1, 0).river = true;

        let converted = expand_snow(&mut tiles, &t, SnowRule::Threshold);
        assert_eq!(converted, 2);
        assert_eq!(tiles.get(1, 0).biome, Biome::Snow);
        assert!(!tiles.get(1, 0).river);
        // (2, 1) is scanned after (1, 0) turned to snow, so it sees two snow neighbours.
        assert_eq!(tiles.get(2, 1).biome, Biome::Snow);
        // (0, 1) is scanned first and only sees one; the low cell never converts.
        assert_ne!(tiles.get(0, 1).biome, Biome::Snow);
        assert_ne!(tiles.get(1, 1).biome, Biome::Snow);
    }

    #[test]
    fn test_snow_cascades_along_scan_order() {
        let t = BiomeThresholds::default();
        let mut tiles = Tilemap::new_with(4, 2, tile(0.8, 0.5));
        tiles.get_mut(0, 0).biome = Biome::Snow;
        tiles.get_mut(0, 1).biome = Biome::Snow;

        assert_eq!(expand_snow(&mut tiles, &t, SnowRule::Threshold), 6);
        assert!(tiles.iter().all(|(_, _, t)| t.biome == Biome::Snow));
    }

    #[test]
    fn test_legacy_snow_spreads_above_fixed_elevation() {
        let t = BiomeThresholds::default();
        let strip = || {
            let mut tiles = grid_from(&[&[0.8, 0.71], &[0.8, 0.75]], 0.5);
            tiles.get_mut(0, 0).biome = Biome::Snow;
            tiles.get_mut(0, 1).biome = Biome::Snow;
            tiles
        };

        // 0.71 clears snowMin (0.70) but not the legacy 0.72 cutoff.
        let mut threshold = strip();
        assert_eq!(expand_snow(&mut threshold, &t, SnowRule::Threshold), 2);
        assert_eq!(threshold.get(1, 0).biome, Biome::Snow);

        let mut legacy = strip();
        assert_eq!(expand_snow(&mut legacy, &t, SnowRule::Legacy), 1);
        assert_ne!(legacy.get(1, 0).biome, Biome::Snow);
        assert_eq!(legacy.get(1, 1).biome, Biome::Snow);

        // With a higher snowMin the legacy rule still spreads to 0.75.
        let high = BiomeThresholds {
            snow_min: 0.9,
            ..BiomeThresholds::default()
        };
        let mut threshold = strip();
        assert_eq!(expand_snow(&mut threshold, &high, SnowRule::Threshold), 0);
        let mut legacy = strip();
        assert_eq!(expand_snow(&mut legacy, &high, SnowRule::Legacy), 1);
        assert_eq!(legacy.get(1, 1).biome, Biome::Snow);
    }

    #[test]
    fn test_wet_grassland_seeds_forest_without_rivers() {
        let mut tiles = Tilemap::new_with(10, 10, tile(0.4, 0.9));
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let converted = seed_forests(&mut tiles, &mut rng);

        // With no river nearby each cell makes exactly one 22% draw, column by column.
        let mut replay = ChaCha8Rng::seed_from_u64(11);
        let mut expected = Vec::new();
        for x in 0..10 {
            for y in 0..10 {
                if replay.gen::<f64>() < WET_FOREST_CHANCE {
                    expected.push((x, y));
                }
            }
        }
        assert_eq!(converted, expected.len());
        assert!(converted > 0 && converted < 100);
        for (x, y) in expected {
            assert_eq!(tiles.get(x, y).biome, Biome::Forest);
        }

        // Moist but not wet, and no river: nothing is seeded.
        let mut tiles = Tilemap::new_with(10, 10, tile(0.4, 0.6));
        assert_eq!(seed_forests(&mut tiles, &mut rng), 0);
    }

    #[test]
    fn test_legacy_snow_caps_high_mountains() {
        let t = BiomeThresholds::default();
        let mut tiles = Tilemap::new_with(3, 3, tile(0.5, 0.5));
        tiles.get_mut(1, 1).elevation = 0.9;
        tiles.get_mut(1, 1).biome = Biome::Mountain;
        assert_eq!(expand_snow(&mut tiles, &t, SnowRule::Threshold), 0);
        assert_eq!(expand_snow(&mut tiles, &t, SnowRule::Legacy), 1);
        assert_eq!(tiles.get(1, 1).biome, Biome::Snow);
    }

    #[test]
    fn test_reapply_respects_manual_flags() {
        let t = BiomeThresholds::default();
        let mut tiles = grid_from(&[&[0.65, 0.65, 0.65, 0.34]], 0.5);
        tiles.get_mut(0, 0).lake = true;
        tiles.get_mut(1, 0).river = true;
        tiles.get_mut(3, 0).biome = Biome::Forest;
        reapply(&mut tiles, &t);
        assert_eq!(tiles.get(0, 0).biome, Biome::Lake);
        assert_eq!(tiles.get(1, 0).biome, Biome::River);
        assert_eq!(tiles.get(2, 0).biome, Biome::Mountain);
        // River band without a river flag keeps its label.
        assert_eq!(tiles.get(3, 0).biome, Biome::Forest);
    }

    #[test]
    fn test_reapply_syncs_band_lake_flag() {
        let t = BiomeThresholds::default();
        let mut tiles = grid_from(&[&[0.2, 0.32]], 0.5);
        reapply(&mut tiles, &t);
        assert_eq!(tiles.get(0, 0).biome, Biome::Lake);
        assert!(tiles.get(0, 0).lake);
        assert_eq!(tiles.get(1, 0).biome, Biome::Beach);
        assert!(!tiles.get(1, 0).lake && !tiles.get(1, 0).river);
    }

    #[test]
    fn test_biome_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Biome::Grassland).unwrap(), "\"grassland\"");
        let lake: Biome = serde_json::from_str("\"lake\"").unwrap();
        assert_eq!(lake, Biome::Lake);
        assert_eq!(Biome::all().len(), 7);
    }
}
