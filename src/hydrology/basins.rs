//! Basin collection and lake detection
//!
//! Each sink's basin is the set of cells whose flow path ends at it. Small
//! basins whose rim stands clearly above the sink are marked as lakes; large
//! basins are abandoned as soon as the walk outgrows the lake area limit.

use std::collections::{HashSet, VecDeque};

use crate::hydrology::flow::FlowNetwork;
use crate::tilemap::Tilemap;

/// Fraction of the map area a single lake basin may cover at `lakeMult == 1`.
pub const LAKE_AREA_FRACTION: f64 = 0.0003;

/// How far the rim must rise above the sink for the basin to hold water.
pub const RIM_TOLERANCE: f64 = 0.02;

/// Largest basin (in cells) that may become a lake.
pub fn max_lake_area(width: usize, height: usize, lake_mult: f64) -> usize {
    let area = (width * height) as f64;
    ((area * LAKE_AREA_FRACTION * lake_mult).floor() as usize).max(1)
}

/// A basin that stayed within the lake area limit.
#[derive(Clone, Debug)]
pub struct Basin {
    pub sink: (usize, usize),
    /// Cells in breadth-first order from the sink.
    pub cells: Vec<(usize, usize)>,
    pub sink_elevation: f64,
    /// Lowest 4-neighbour outside the basin; `None` if the basin has no rim cells.
    pub rim_min: Option<f64>,
    pub holds_water: bool,
}

impl Basin {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Height of the rim above the sink.
    pub fn rim_height(&self) -> Option<f64> {
        self.rim_min.map(|rim| rim - self.sink_elevation)
    }
}

/// Result of lake detection over a whole map.
#[derive(Clone, Debug)]
pub struct LakeDetection {
    /// `true` for every cell inside a water-holding basin.
    pub lake_mask: Tilemap<bool>,
    /// Every basin that stayed within the area limit, dry or not.
    pub basins: Vec<Basin>,
    /// Number of sinks whose basin outgrew the limit.
    pub discarded: usize,
    pub max_lake_area: usize,
}

impl LakeDetection {
    pub fn lake_basins(&self) -> impl Iterator<Item = &Basin> {
        self.basins.iter().filter(|b| b.holds_water)
    }

    pub fn lake_cell_count(&self) -> usize {
        self.lake_mask.iter().filter(|(_, _, wet)| **wet).count()
    }
}

/// Breadth-first walk up the flow relation from a sink.
///
/// Returns `None` as soon as the basin holds more than `max_area` cells.
pub fn collect_basin(
    network: &FlowNetwork,
    sink: (usize, usize),
    max_area: usize,
) -> Option<Vec<(usize, usize)>> {
    let mut queue = VecDeque::new();
    let mut seen = HashSet::new();
    let mut basin = Vec::new();

    queue.push_back(sink);
    seen.insert(sink);

    while let Some((x, y)) = queue.pop_front() {
        basin.push((x, y));
        for &from in network.upstream.get(x, y) {
            if seen.insert(from) {
                queue.push_back(from);
            }
        }
        if basin.len() > max_area {
            return None;
        }
    }

    Some(basin)
}

/// Lowest elevation among the 4-neighbours of basin cells that lie outside the basin.
pub fn rim_min(elevation: &Tilemap<f64>, cells: &[(usize, usize)]) -> Option<f64> {
    let members: HashSet<(usize, usize)> = cells.iter().copied().collect();
    cells
        .iter()
        .flat_map(|&(x, y)| elevation.neighbors(x, y))
        .filter(|n| !members.contains(n))
        .map(|(nx, ny)| *elevation.get(nx, ny))
        .min_by(f64::total_cmp)
}

/// Find every sink's basin and mark the water-holding ones as lakes.
pub fn detect_lakes(elevation: &Tilemap<f64>, network: &FlowNetwork, lake_mult: f64) -> LakeDetection {
    let max_area = max_lake_area(elevation.width, elevation.height, lake_mult);
    let mut lake_mask = Tilemap::new_with(elevation.width, elevation.height, false);
    let mut basins = Vec::new();
    let mut discarded = 0;

    for sink in network.sinks() {
        let Some(cells) = collect_basin(network, sink, max_area) else {
            discarded += 1;
            continue;
        };

        let sink_elevation = *elevation.get(sink.0, sink.1);
        let rim = rim_min(elevation, &cells);
        let holds_water = rim.map_or(false, |rim| rim - sink_elevation > RIM_TOLERANCE);

        if holds_water {
            for &(x, y) in &cells {
                lake_mask.set(x, y, true);
            }
        }

        basins.push(Basin {
            sink,
            cells,
            sink_elevation,
            rim_min: rim,
            holds_water,
        });
    }

    let detection = LakeDetection {
        lake_mask,
        basins,
        discarded,
        max_lake_area: max_area,
    };
    log::debug!(
        "basins: {} within limit {}, {} holding water, {} discarded",
        detection.basins.len(),
        max_area,
        detection.lake_basins().count(),
        discarded
    );
    detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap::generate_fields;
    use crate::presets::Preset;
    use crate::seeds::WorldSeeds;

    /// Flat plateau at 0.5 with a one-cell pit of the given depth.
    fn plateau_with_pit(depth: f64) -> Tilemap<f64> {
        let mut map = Tilemap::new_with(9, 9, 0.5);
        map.set(4, 4, 0.5 - depth);
        map
    }

    #[test]
    fn test_max_lake_area() {
        assert_eq!(max_lake_area(140, 120, 0.6), 3);
        assert_eq!(max_lake_area(140, 120, 0.45), 2);
        assert_eq!(max_lake_area(10, 10, 0.6), 1);
    }

    #[test]
    fn test_deep_pit_becomes_lake() {
        let elevation = plateau_with_pit(0.1);
        let network = FlowNetwork::compute(&elevation);
        // Every plateau cell touching the pit drains into it: 1 + 8 cells.
        let detection = detect_lakes(&elevation, &network, 1000.0);
        let pit_basin = detection.basins.iter().find(|b| b.sink == (4, 4)).unwrap();
        assert_eq!(pit_basin.len(), 9);
        assert!(pit_basin.holds_water);
        // The rim is the plateau around the 3x3 basin, 0.1 above the sink.
        assert!((pit_basin.rim_height().unwrap() - 0.1).abs() < 1e-12);
        assert!(*detection.lake_mask.get(3, 3));
        assert!(!*detection.lake_mask.get(0, 0));
        assert_eq!(detection.lake_cell_count(), 9);
    }

    #[test]
    fn test_shallow_pit_stays_dry() {
        let elevation = plateau_with_pit(0.01);
        let network = FlowNetwork::compute(&elevation);
        let detection = detect_lakes(&elevation, &network, 1000.0);
        let pit_basin = detection.basins.iter().find(|b| b.sink == (4, 4)).unwrap();
        assert!(!pit_basin.holds_water);
        assert_eq!(detection.lake_cell_count(), 0);
    }

    #[test]
    fn test_oversized_basin_is_discarded() {
        let elevation = plateau_with_pit(0.1);
        let network = FlowNetwork::compute(&elevation);
        assert!(collect_basin(&network, (4, 4), 8).is_none());
        assert_eq!(collect_basin(&network, (4, 4), 9).map(|b| b.len()), Some(9));

        // 81 cells * 0.0003 * 10 floors to 0, so the limit is a single cell.
        let detection = detect_lakes(&elevation, &network, 10.0);
        assert_eq!(detection.max_lake_area, 1);
        assert!(detection.basins.iter().all(|b| b.sink != (4, 4)));
        assert!(detection.discarded >= 1);
    }

    #[test]
    fn test_whole_map_basin_has_no_rim() {
        // A bowl where everything drains to the centre: no cell lies outside.
        let elevation = Tilemap::from_fn(3, 3, |x, y| if (x, y) == (1, 1) { 0.0 } else { 1.0 });
        let network = FlowNetwork::compute(&elevation);
        let cells = collect_basin(&network, (1, 1), 100).unwrap();
        assert_eq!(cells.len(), 9);
        assert_eq!(rim_min(&elevation, &cells), None);
        let detection = detect_lakes(&elevation, &network, 1.0e6);
        assert_eq!(detection.lake_cell_count(), 0);
    }

    #[test]
    fn test_generated_lakes_respect_limit() {
        for seed in [3u32, 42, 777] {
            let preset = Preset::normal();
            let fields = generate_fields(140, 120, &preset, &WorldSeeds::from_master(seed));
            let network = FlowNetwork::compute(&fields.elevation);
            let detection = detect_lakes(&fields.elevation, &network, preset.lake_mult);
            for basin in detection.lake_basins() {
                assert!(basin.len() <= detection.max_lake_area);
                assert!(basin.rim_height().unwrap() > RIM_TOLERANCE);
            }
            assert_eq!(
                detection.basins.len() + detection.discarded,
                network.sinks().count()
            );
        }
    }
}
