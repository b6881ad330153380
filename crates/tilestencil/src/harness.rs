//! Host-side harness: input population, golden output and the comparator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::grid::GridShape;

/// Upper bound (exclusive) of randomly generated cell values.
pub const RANDOM_VALUE_LIMIT: i32 = 1 << 15;

/// `input[y][x] = x * y`.
pub fn populate_product(grid: GridShape) -> Vec<i32> {
    let mut buf = vec![0; grid.len()];
    for y in 0..grid.y_size {
        for x in 0..grid.x_size {
            buf[grid.offset(x, y)] = (x as i32).wrapping_mul(y as i32);
        }
    }
    buf
}

/// Every cell holds `value`.
pub fn populate_uniform(grid: GridShape, value: i32) -> Vec<i32> {
    vec![value; grid.len()]
}

/// Reproducible pseudo-random cells in `0..RANDOM_VALUE_LIMIT`.
pub fn populate_random(grid: GridShape, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..grid.len())
        .map(|_| rng.gen_range(0..RANDOM_VALUE_LIMIT))
        .collect()
}

/// Sequential five-point stencil. Neighbours outside the grid are omitted.
pub fn golden_output(input: &[i32], grid: GridShape) -> Vec<i32> {
    let mut out = vec![0; grid.len()];
    for y in 0..grid.y_size {
        for x in 0..grid.x_size {
            let at = |x: usize, y: usize| input[grid.offset(x, y)];
            let mut sum = at(x, y);
            if x + 1 < grid.x_size {
                sum = sum.wrapping_add(at(x + 1, y));
            }
            if x > 0 {
                sum = sum.wrapping_add(at(x - 1, y));
            }
            if y + 1 < grid.y_size {
                sum = sum.wrapping_add(at(x, y + 1));
            }
            if y > 0 {
                sum = sum.wrapping_add(at(x, y - 1));
            }
            out[grid.offset(x, y)] = sum;
        }
    }
    out
}

/// First difference between a computed buffer and the golden output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// The buffers have different lengths.
    #[error("Output holds {computed} elements, expected {expected}")]
    Length {
        /// Golden length.
        expected: usize,
        /// Computed length.
        computed: usize,
    },

    /// A cell differs.
    #[error("Detected an error at index {index:#x}: expected {expected:#x}, computed {computed:#x}")]
    Value {
        /// Linear index of the first differing cell.
        index: usize,
        /// Golden value.
        expected: i32,
        /// Kernel value.
        computed: i32,
    },
}

/// Compare `computed` against `golden`, reporting the first mismatch.
pub fn check_output(computed: &[i32], golden: &[i32]) -> Result<(), Mismatch> {
    if computed.len() != golden.len() {
        return Err(Mismatch::Length {
            expected: golden.len(),
            computed: computed.len(),
        });
    }
    match computed.iter().zip(golden).position(|(c, g)| c != g) {
        Some(index) => Err(Mismatch::Value {
            index,
            expected: golden[index],
            computed: computed[index],
        }),
        None => Ok(()),
    }
}
