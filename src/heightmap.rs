//! Elevation and moisture synthesis
//!
//! Elevation is fractal value noise blended with a radial bias toward the map
//! centre and a small per-cell jitter. Moisture is a second noise field damped
//! by elevation. Island presets multiply the elevation by a radial falloff so
//! land fades to water toward the edges; the falloff is applied after
//! hydrology, so only biome classification sees it.

use crate::presets::{NoiseShape, Preset};
use crate::seeds::WorldSeeds;
use crate::tilemap::Tilemap;
use crate::value_noise::{fractal_noise, seeded_hash};

/// Weight of the fractal noise term in the elevation blend.
const ELEVATION_NOISE_WEIGHT: f64 = 0.8;
/// How strongly elevation dries out the moisture field.
const MOISTURE_ELEVATION_DAMPING: f64 = 0.45;
/// Baseline moisture added everywhere.
const MOISTURE_FLOOR: f64 = 0.06;
/// Offset applied to moisture sampling coordinates to decorrelate it from elevation.
const MOISTURE_COORD_OFFSET: f64 = 200.0;
/// Exponent of the island falloff `1 - dist^k`.
const ISLAND_FALLOFF_EXPONENT: f64 = 1.5;

/// The two continuous fields every later stage reads.
#[derive(Clone, Debug)]
pub struct TerrainFields {
    /// Elevation in `[0, 1]`
    pub elevation: Tilemap<f64>,
    /// Moisture in `[0, 1]`
    pub moisture: Tilemap<f64>,
}

/// Normalised distance of `(x, y)` from the map centre; `0.0` at the centre,
/// about `0.707` at the corners.
pub fn distance_from_center(x: usize, y: usize, width: usize, height: usize) -> f64 {
    let nx = x as f64 / width as f64 - 0.5;
    let ny = y as f64 / height as f64 - 0.5;
    (nx * nx + ny * ny).sqrt()
}

/// Island falloff multiplier for a given centre distance.
pub fn island_falloff(dist: f64) -> f64 {
    1.0 - dist.powf(ISLAND_FALLOFF_EXPONENT)
}

/// Elevation at one cell before the island falloff, clamped to `[0, 1]`.
pub fn base_elevation(
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    shape: &NoiseShape,
    seeds: &WorldSeeds,
) -> f64 {
    let dist = distance_from_center(x, y, width, height);
    let noise = fractal_noise(
        x as f64,
        y as f64,
        shape.elevation_octaves,
        shape.elevation_scale,
        seeds.elevation,
    );
    let jitter = seeded_hash(x as i32, y as i32, seeds.jitter) - 0.5;

    let elevation = noise * ELEVATION_NOISE_WEIGHT
        + (1.0 - dist) * shape.center_weight
        + jitter * shape.jitter;
    elevation.clamp(0.0, 1.0)
}

/// Moisture at one cell for a given (pre-falloff) elevation, clamped to `[0, 1]`.
pub fn moisture_at(x: usize, y: usize, elevation: f64, shape: &NoiseShape, seeds: &WorldSeeds) -> f64 {
    let noise = fractal_noise(
        x as f64 + MOISTURE_COORD_OFFSET,
        y as f64 + MOISTURE_COORD_OFFSET,
        shape.moisture_octaves,
        shape.moisture_scale,
        seeds.moisture,
    );
    let moisture = noise * (1.0 - elevation * MOISTURE_ELEVATION_DAMPING) + MOISTURE_FLOOR;
    moisture.clamp(0.0, 1.0)
}

/// Generate the elevation and moisture fields for a map. The island falloff
/// is not applied here.
pub fn generate_fields(width: usize, height: usize, preset: &Preset, seeds: &WorldSeeds) -> TerrainFields {
    let shape = preset.noise_shape();

    let elevation = Tilemap::from_fn(width, height, |x, y| {
        base_elevation(x, y, width, height, &shape, seeds)
    });
    let moisture = Tilemap::from_fn(width, height, |x, y| {
        moisture_at(x, y, *elevation.get(x, y), &shape, seeds)
    });

    TerrainFields { elevation, moisture }
}

/// Multiply every elevation by the radial island falloff.
pub fn apply_island_falloff(elevation: &mut Tilemap<f64>) {
    let (width, height) = (elevation.width, elevation.height);
    for (x, y, e) in elevation.iter_mut() {
        let dist = distance_from_center(x, y, width, height);
        *e = (*e * island_falloff(dist)).clamp(0.0, 1.0);
    }
}
