/// A bounded 2D tilemap grid. Coordinates outside `[0, width) x [0, height)`
/// are never stored; neighbour queries clip at the map edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Tilemap<T> {
    /// Build a map by evaluating `f` at every coordinate, row by row.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Shift `(x, y)` by `(dx, dy)`, returning `None` when the result leaves the map.
    pub fn offset(&self, x: usize, y: usize, dx: i32, dy: i32) -> Option<(usize, usize)> {
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64 {
            return None;
        }
        Some((nx as usize, ny as usize))
    }

    /// Get neighbors (4-connectivity): right, left, down, up.
    /// Cells on the map edge get fewer than 4.
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .filter_map(|&(dx, dy)| self.offset(x, y, dx, dy))
            .collect()
    }

    /// Get 8-connected neighbors (including diagonals), clipped at the edges.
    pub fn neighbors_8(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        self.neighbors_within(x, y, 1)
    }

    /// All cells in the square of the given radius around `(x, y)`, excluding the
    /// centre, clipped at the edges.
    pub fn neighbors_within(&self, x: usize, y: usize, radius: i32) -> Vec<(usize, usize)> {
        let side = (2 * radius + 1) as usize;
        let mut result = Vec::with_capacity(side * side);
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let Some(p) = self.offset(x, y, dx, dy) {
                    result.push(p);
                }
            }
        }
        result
    }

    /// Count 8-neighbours of `(x, y)` whose value satisfies `pred`.
    pub fn count_neighbors_8(&self, x: usize, y: usize, pred: impl Fn(&T) -> bool) -> usize {
        self.neighbors_8(x, y)
            .into_iter()
            .filter(|&(nx, ny)| pred(self.get(nx, ny)))
            .count()
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Coordinates in column-major order (x outer, y inner). The generation passes
    /// visit cells in this order so that seeded random draws line up with the
    /// `[x][y]` map layout.
    pub fn coords_column_major(&self) -> impl Iterator<Item = (usize, usize)> {
        let height = self.height;
        (0..self.width).flat_map(move |x| (0..height).map(move |y| (x, y)))
    }

    /// Map every value into a new tilemap of the same size.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Tilemap<U> {
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}
