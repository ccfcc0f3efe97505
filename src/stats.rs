//! Summary statistics over a generated map, for tuning presets.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::biomes::Biome;
use crate::world::TileGrid;

/// Min, max and mean of one scalar field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl FieldRange {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            min,
            max,
            avg: sum / count as f64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStats {
    pub total: usize,
    pub rivers: usize,
    pub lakes: usize,
    pub accum_min: u32,
    pub accum_max: u32,
    pub accum_sum: u64,
    pub accum_avg: f64,
    pub elevation: FieldRange,
    pub moisture: FieldRange,
    /// Tile count per biome; every biome is present, possibly with zero.
    pub biomes: BTreeMap<Biome, usize>,
}

impl MapStats {
    pub fn biome_count(&self, biome: Biome) -> usize {
        self.biomes.get(&biome).copied().unwrap_or(0)
    }
}

impl fmt::Display for MapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rivers {} lakes {} accumMin/max/avg {} {} {:.2}",
            self.rivers, self.lakes, self.accum_min, self.accum_max, self.accum_avg
        )
    }
}

pub fn compute_stats(grid: &TileGrid) -> MapStats {
    let total = grid.width() * grid.height();
    let mut biomes: BTreeMap<Biome, usize> = Biome::all().iter().map(|&b| (b, 0)).collect();
    let mut rivers = 0;
    let mut lakes = 0;
    let mut accum_min = u32::MAX;
    let mut accum_max = 0;
    let mut accum_sum = 0u64;

    for (_, _, tile) in grid.iter() {
        if tile.river {
            rivers += 1;
        }
        if tile.lake {
            lakes += 1;
        }
        accum_min = accum_min.min(tile.flow_accum);
        accum_max = accum_max.max(tile.flow_accum);
        accum_sum += tile.flow_accum as u64;
        *biomes.entry(tile.biome).or_insert(0) += 1;
    }

    if total == 0 {
        accum_min = 0;
    }

    MapStats {
        total,
        rivers,
        lakes,
        accum_min,
        accum_max,
        accum_sum,
        accum_avg: if total == 0 {
            0.0
        } else {
            accum_sum as f64 / total as f64
        },
        elevation: FieldRange::from_values(grid.iter().map(|(_, _, t)| t.elevation)),
        moisture: FieldRange::from_values(grid.iter().map(|(_, _, t)| t.moisture)),
        biomes,
    }
}
