//! Halo resolution for the five-point stencil.
//!
//! For each direction the resolver answers two questions about a lane:
//! does the neighbour exist inside the grid at all, and if so where does its
//! value come from. Horizontal neighbours are always tile resident (the
//! previous and next windows are cached). Vertical neighbours are tile
//! resident except across the block's top and bottom rows, where they are
//! read from global memory because no tile spans two blocks.

use tilestencil_core::{ThreadId, WarpContext};

use crate::cache::{TileCache, Window};
use crate::grid::GridShape;

/// Stencil arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `x + 1`.
    East,
    /// `x - 1`.
    West,
    /// `y + 1`.
    South,
    /// `y - 1`.
    North,
}

impl Direction {
    /// All directions, in the order the kernel accumulates them.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::North,
    ];

    /// Name for logs and protocol errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::East => "east",
            Direction::West => "west",
            Direction::South => "south",
            Direction::North => "north",
        }
    }
}

/// A lane's position for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneCoord {
    /// Lane and warp row.
    pub thread: ThreadId,
    /// Grid column.
    pub x: usize,
    /// Grid row.
    pub y: usize,
    /// Linear offset of `(x, y)`.
    pub offset: usize,
}

impl LaneCoord {
    /// Coordinates of `thread` in `window` on grid row `y`.
    #[inline]
    pub fn new(grid: &GridShape, window: &Window, thread: ThreadId, y: usize) -> Self {
        let x = window.column(thread);
        Self {
            thread,
            x,
            y,
            offset: grid.offset(x, y),
        }
    }
}

/// Where a neighbour's value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaloSource {
    /// Same tile slice as the lane's own value.
    Tile,
    /// Leading edge of the next window, prefetched this step.
    NextWindow,
    /// Trailing edge of the previous window.
    PreviousWindow,
    /// Another warp row of this block's tile.
    NeighbourRow(usize),
    /// Global memory at the given linear offset.
    Global(usize),
}

/// Selects neighbour values from the tile cache or global memory.
#[derive(Debug)]
pub struct HaloResolver<'a, C> {
    cache: &'a C,
    input: &'a [i32],
    grid: GridShape,
}

impl<'a, C: TileCache> HaloResolver<'a, C> {
    /// Resolver over `cache` for a launch on `input`.
    pub fn new(cache: &'a C, input: &'a [i32], grid: GridShape) -> Self {
        Self { cache, input, grid }
    }

    /// Whether the neighbour in `dir` lies inside the grid. Neighbours
    /// outside contribute nothing.
    #[inline]
    pub fn in_grid(&self, dir: Direction, coord: &LaneCoord) -> bool {
        match dir {
            Direction::East => coord.x + 1 < self.grid.x_size,
            Direction::West => coord.x > 0,
            Direction::South => coord.y + 1 < self.grid.y_size,
            Direction::North => coord.y > 0,
        }
    }

    /// Where the neighbour in `dir` is read from. Only meaningful when
    /// [`in_grid`](Self::in_grid) holds.
    pub fn source(&self, warp: &WarpContext<'_>, dir: Direction, coord: &LaneCoord) -> HaloSource {
        let lane = coord.thread.x;
        let row = coord.thread.row();
        match dir {
            Direction::East if lane + 1 == warp.lane_count() => HaloSource::NextWindow,
            Direction::West if lane == 0 => HaloSource::PreviousWindow,
            Direction::East | Direction::West => HaloSource::Tile,
            Direction::South if warp.is_last_row() => {
                HaloSource::Global(coord.offset + self.grid.x_size)
            }
            Direction::South => HaloSource::NeighbourRow(row + 1),
            Direction::North if warp.is_first_row() => {
                HaloSource::Global(coord.offset - self.grid.x_size)
            }
            Direction::North => HaloSource::NeighbourRow(row - 1),
        }
    }

    /// Read the neighbour value in `dir`.
    pub fn fetch(
        &self,
        warp: &WarpContext<'_>,
        window: &Window,
        dir: Direction,
        coord: &LaneCoord,
    ) -> i32 {
        match (dir, self.source(warp, dir, coord)) {
            (_, HaloSource::Global(index)) => warp.load_global(self.input, index),
            (_, HaloSource::NeighbourRow(row)) => {
                self.cache.vertical(warp, window, coord.thread, row)
            }
            (Direction::East, _) => self.cache.east(warp, window, coord.thread),
            (Direction::West, _) => self.cache.west(warp, window, coord.thread),
            // Vertical arms always resolve to a row or global memory.
            (Direction::South | Direction::North, _) => unreachable!("vertical halo in tile"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ModuloTile;
    use tilestencil_core::{BlockBarrier, BlockId, Dim2};

    fn coord(grid: &GridShape, lane: u32, row: u32, x: usize, y: usize) -> LaneCoord {
        LaneCoord {
            thread: ThreadId::new(lane, row),
            x,
            y,
            offset: grid.offset(x, y),
        }
    }

    #[test]
    fn test_grid_edge_suppression() {
        let grid = GridShape::new(8, 4);
        let cache = ModuloTile::alloc(Dim2::new(4, 2));
        let input = vec![0; grid.len()];
        let resolver = HaloResolver::new(&cache, &input, grid);

        let corner = coord(&grid, 0, 0, 0, 0);
        assert!(resolver.in_grid(Direction::East, &corner));
        assert!(!resolver.in_grid(Direction::West, &corner));
        assert!(resolver.in_grid(Direction::South, &corner));
        assert!(!resolver.in_grid(Direction::North, &corner));

        let far = coord(&grid, 3, 1, 7, 3);
        assert!(!resolver.in_grid(Direction::East, &far));
        assert!(resolver.in_grid(Direction::West, &far));
        assert!(!resolver.in_grid(Direction::South, &far));
        assert!(resolver.in_grid(Direction::North, &far));
    }

    #[test]
    fn test_sources_inside_block() {
        let grid = GridShape::new(8, 6);
        let block_dim = Dim2::new(4, 3);
        let cache = ModuloTile::alloc(block_dim);
        let input = vec![0; grid.len()];
        let resolver = HaloResolver::new(&cache, &input, grid);
        let barrier = BlockBarrier::new(1);

        // Middle warp row of the second block: grid row 4.
        let warp = WarpContext::new(BlockId::new(0, 1), 1, block_dim, Dim2::new(1, 2), &barrier);
        let first = coord(&grid, 0, 1, 4, 4);
        let last = coord(&grid, 3, 1, 7, 4);
        let inner = coord(&grid, 1, 1, 5, 4);

        assert_eq!(resolver.source(&warp, Direction::East, &last), HaloSource::NextWindow);
        assert_eq!(resolver.source(&warp, Direction::East, &inner), HaloSource::Tile);
        assert_eq!(resolver.source(&warp, Direction::West, &first), HaloSource::PreviousWindow);
        assert_eq!(resolver.source(&warp, Direction::South, &inner), HaloSource::NeighbourRow(2));
        assert_eq!(resolver.source(&warp, Direction::North, &inner), HaloSource::NeighbourRow(0));
    }

    #[test]
    fn test_block_edges_fall_back_to_global() {
        let grid = GridShape::new(8, 6);
        let block_dim = Dim2::new(4, 3);
        let cache = ModuloTile::alloc(block_dim);
        let input: Vec<i32> = (0..grid.len() as i32).collect();
        let resolver = HaloResolver::new(&cache, &input, grid);
        let barrier = BlockBarrier::new(1);
        let window = Window::first(4);

        let top = WarpContext::new(BlockId::new(0, 1), 0, block_dim, Dim2::new(1, 2), &barrier);
        let c = coord(&grid, 2, 0, 2, 3);
        assert_eq!(resolver.source(&top, Direction::North, &c), HaloSource::Global(18));
        assert_eq!(resolver.fetch(&top, &window, Direction::North, &c), 18);

        let bottom = WarpContext::new(BlockId::new(0, 0), 2, block_dim, Dim2::new(1, 2), &barrier);
        let c = coord(&grid, 2, 2, 2, 2);
        assert_eq!(resolver.source(&bottom, Direction::South, &c), HaloSource::Global(26));
        assert_eq!(resolver.fetch(&bottom, &window, Direction::South, &c), 26);
        assert_eq!(bottom.stats().global_loads, 1);
    }
}
