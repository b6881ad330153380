//! Rotating triple buffer.
//!
//! Three lane-wide tiles per warp row play the roles `left`, `middle` and
//! `right`. The roles are derived from the window's rotation index, so
//! "shifting" after a step is a change of index rather than a copy:
//!
//! ```text
//!   rotation   left   middle   right
//!       0       t0      t1      t2
//!       1       t1      t2      t0
//!       2       t2      t0      t1
//! ```
//!
//! No in-tile index ever wraps; the cost is that the halo columns live in a
//! different tile from the lane's own value.

use tilestencil_core::{Dim2, SharedTile, ThreadId, WarpContext};

use super::{lanes_of, RowSource, TileCache, Window};
use crate::variant::TilingVariant;

/// Role of a tile within the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Left,
    Middle,
    Right,
}

/// Left/middle/right tiles selected by rotation index.
#[derive(Debug)]
pub struct RotatingTripleTile {
    tiles: [SharedTile; 3],
    lanes: usize,
}

impl RotatingTripleTile {
    #[inline]
    fn tile(&self, window: &Window, role: Role) -> &SharedTile {
        let offset = match role {
            Role::Left => 0,
            Role::Middle => 1,
            Role::Right => 2,
        };
        &self.tiles[(window.rotation() + offset) % 3]
    }
}

impl TileCache for RotatingTripleTile {
    const VARIANT: TilingVariant = TilingVariant::Rotating;

    fn alloc(block_dim: Dim2) -> Self {
        let rows = block_dim.y as usize;
        let lanes = lanes_of(block_dim);
        Self {
            tiles: [
                SharedTile::new(rows, lanes),
                SharedTile::new(rows, lanes),
                SharedTile::new(rows, lanes),
            ],
            lanes,
        }
    }

    /// `left` starts zeroed (there is no window before the first), `middle`
    /// holds the first window.
    fn load_initial(&self, warp: &WarpContext<'_>, window: &Window, src: &RowSource<'_>) {
        let row = warp.warp_row() as usize;
        let left = self.tile(window, Role::Left);
        let middle = self.tile(window, Role::Middle);
        warp.for_each_lane(|t| {
            warp.store_shared(left, row, t.lane(), 0);
            warp.store_shared(middle, row, t.lane(), src.load(warp, window.column(t)));
        });
    }

    fn prefetch(&self, warp: &WarpContext<'_>, window: &Window, src: &RowSource<'_>) {
        let row = warp.warp_row() as usize;
        let right = self.tile(window, Role::Right);
        warp.for_each_lane(|t| {
            let x = window.column(t) + window.lanes();
            warp.store_shared(right, row, t.lane(), src.load(warp, x));
        });
    }

    fn centre(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32 {
        warp.load_shared(self.tile(window, Role::Middle), thread.row(), thread.lane())
    }

    fn east(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32 {
        if thread.lane() + 1 == self.lanes {
            warp.load_shared(self.tile(window, Role::Right), thread.row(), 0)
        } else {
            warp.load_shared(self.tile(window, Role::Middle), thread.row(), thread.lane() + 1)
        }
    }

    fn west(&self, warp: &WarpContext<'_>, window: &Window, thread: ThreadId) -> i32 {
        if thread.lane() == 0 {
            warp.load_shared(self.tile(window, Role::Left), thread.row(), self.lanes - 1)
        } else {
            warp.load_shared(self.tile(window, Role::Middle), thread.row(), thread.lane() - 1)
        }
    }

    fn vertical(
        &self,
        warp: &WarpContext<'_>,
        window: &Window,
        thread: ThreadId,
        row: usize,
    ) -> i32 {
        warp.load_shared(self.tile(window, Role::Middle), row, thread.lane())
    }
}
