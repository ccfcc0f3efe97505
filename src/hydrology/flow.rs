//! D8 flow routing and flow accumulation.
//!
//! 1. Flow direction - every cell drains to its lowest strictly-lower 8-neighbour
//! 2. Flow accumulation - counts the cells draining through each cell
//! 3. Upstream relation - the inverse of flow direction, used for basin walks
//!
//! A cell only ever drains to a strictly lower neighbour, so the flow relation
//! is a forest of trees rooted at sinks and every downstream walk terminates.

use crate::tilemap::Tilemap;

/// Neighbour offsets in scan order. When two neighbours are equally low the
/// one listed first wins.
pub const DX: [i32; 8] = [1, -1, 0, 0, 1, 1, -1, -1];
pub const DY: [i32; 8] = [0, 0, 1, -1, 1, -1, 1, -1];

/// Direction value for sinks (no lower neighbour).
pub const NO_FLOW: u8 = 255;

/// Compute the D8 flow direction of every cell.
///
/// Unlike slope-weighted D8 the target is simply the lowest neighbour; the
/// diagonal distance is not taken into account.
pub fn compute_flow_direction(elevation: &Tilemap<f64>) -> Tilemap<u8> {
    let mut flow_dir = Tilemap::new_with(elevation.width, elevation.height, NO_FLOW);

    for (x, y, &current) in elevation.iter() {
        let mut lowest = current;
        let mut best_dir = NO_FLOW;

        for dir in 0..8u8 {
            let Some((nx, ny)) = elevation.offset(x, y, DX[dir as usize], DY[dir as usize]) else {
                continue;
            };
            let neighbor = *elevation.get(nx, ny);
            if neighbor < lowest {
                lowest = neighbor;
                best_dir = dir;
            }
        }

        flow_dir.set(x, y, best_dir);
    }

    flow_dir
}

/// Cell that `(x, y)` drains into, or `None` for a sink.
pub fn flow_target(flow_dir: &Tilemap<u8>, x: usize, y: usize) -> Option<(usize, usize)> {
    let dir = *flow_dir.get(x, y);
    if dir == NO_FLOW {
        return None;
    }
    flow_dir.offset(x, y, DX[dir as usize], DY[dir as usize])
}

/// Compute flow accumulation: every cell starts at 1 and passes its total to
/// its flow target, processing cells from highest to lowest.
pub fn compute_flow_accumulation(elevation: &Tilemap<f64>, flow_dir: &Tilemap<u8>) -> Tilemap<u32> {
    let mut accumulation = Tilemap::new_with(elevation.width, elevation.height, 1u32);

    // Sort cells by elevation, highest first. The sort is stable, so equal
    // elevations keep column-major order.
    let mut cells: Vec<(usize, usize, f64)> = elevation
        .coords_column_major()
        .map(|(x, y)| (x, y, *elevation.get(x, y)))
        .collect();
    cells.sort_by(|a, b| b.2.total_cmp(&a.2));

    for (x, y, _) in cells {
        let Some((nx, ny)) = flow_target(flow_dir, x, y) else {
            continue;
        };
        let current = *accumulation.get(x, y);
        *accumulation.get_mut(nx, ny) += current;
    }

    accumulation
}

/// For each cell, the cells that drain directly into it.
pub fn compute_upstream(flow_dir: &Tilemap<u8>) -> Tilemap<Vec<(usize, usize)>> {
    let mut upstream: Tilemap<Vec<(usize, usize)>> = Tilemap::new(flow_dir.width, flow_dir.height);
    for (x, y) in flow_dir.coords_column_major() {
        if let Some((nx, ny)) = flow_target(flow_dir, x, y) {
            upstream.get_mut(nx, ny).push((x, y));
        }
    }
    upstream
}

/// Flow direction, accumulation and the upstream relation for one elevation field.
#[derive(Clone, Debug)]
pub struct FlowNetwork {
    pub direction: Tilemap<u8>,
    pub accumulation: Tilemap<u32>,
    pub upstream: Tilemap<Vec<(usize, usize)>>,
}

impl FlowNetwork {
    pub fn compute(elevation: &Tilemap<f64>) -> Self {
        let direction = compute_flow_direction(elevation);
        let accumulation = compute_flow_accumulation(elevation, &direction);
        let upstream = compute_upstream(&direction);
        Self {
            direction,
            accumulation,
            upstream,
        }
    }

    pub fn target(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        flow_target(&self.direction, x, y)
    }

    pub fn is_sink(&self, x: usize, y: usize) -> bool {
        *self.direction.get(x, y) == NO_FLOW
    }

    /// Sink cells in column-major order.
    pub fn sinks(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.direction
            .coords_column_major()
            .filter(move |&(x, y)| self.is_sink(x, y))
    }

    /// Follow the flow from `(x, y)` down to its sink.
    pub fn sink_of(&self, x: usize, y: usize) -> (usize, usize) {
        let mut current = (x, y);
        while let Some(next) = self.target(current.0, current.1) {
            current = next;
        }
        current
    }
}
