//! Seed management for map generation
//!
//! Every stage derives its own seed from the master seed by a fixed offset, so
//! the same master seed always reproduces the same map.

/// Upper bound (exclusive) for seeds picked when the caller did not supply one.
pub const RANDOM_SEED_RANGE: u32 = 1_000_000;

const ELEVATION_OFFSET: u32 = 10;
const JITTER_OFFSET: u32 = 42;
const MOISTURE_OFFSET: u32 = 77;
const FOREST_PHASE: u64 = 0xF0_2E57;

/// Seeds for all generation stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldSeeds {
    /// Master seed (used for display/reference)
    pub master: u32,
    /// Fractal elevation noise
    pub elevation: u32,
    /// Per-cell elevation jitter
    pub jitter: u32,
    /// Fractal moisture noise
    pub moisture: u32,
    /// Forest seeding and spreading passes
    pub forest: u64,
}

impl WorldSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u32) -> Self {
        Self {
            master,
            elevation: master.wrapping_add(ELEVATION_OFFSET),
            jitter: master.wrapping_add(JITTER_OFFSET),
            moisture: master.wrapping_add(MOISTURE_OFFSET),
            forest: (master as u64) ^ FOREST_PHASE,
        }
    }
}

impl std::fmt::Display for WorldSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WorldSeeds {{ master: {}, elevation: {}, jitter: {}, moisture: {}, forest: {} }}",
            self.master, self.elevation, self.jitter, self.moisture, self.forest,
        )
    }
}

/// Pick a fresh seed in `[1, RANDOM_SEED_RANGE)`.
pub fn random_seed() -> u32 {
    1 + rand::random::<u32>() % (RANDOM_SEED_RANGE - 1)
}

/// Parse a user-supplied seed. Integers are truncated to 32 bits; fractional
/// numbers are floored first. Returns `None` for empty, non-numeric or zero input.
pub fn parse_seed(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = raw.parse::<f64>().ok().filter(|f| f.is_finite())?;
            f.floor() as i64
        }
    };
    match value as u32 {
        0 => None,
        seed => Some(seed),
    }
}

/// Resolve an optional raw seed, falling back to [`random_seed`] when it is
/// missing or unusable.
pub fn resolve_seed(raw: Option<&str>) -> u32 {
    match raw.and_then(parse_seed) {
        Some(seed) => seed,
        None => {
            let seed = random_seed();
            if let Some(raw) = raw {
                log::warn!("seed {:?} is not usable, using random seed {}", raw, seed);
            }
            seed
        }
    }
}
