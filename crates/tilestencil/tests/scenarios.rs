//! End-to-end stencil scenarios on small grids.

use tilestencil::prelude::*;

fn run_all(simt: SimtConfig, input: &[i32], grid: GridShape) -> Vec<StencilRun> {
    let stencil = TiledStencil::new(simt);
    TilingVariant::ALL
        .iter()
        .map(|&variant| stencil.run(variant, input, grid).unwrap())
        .collect()
}

/// A 4x4 product grid: `output[1,1] = 1 + 2 + 0 + 2 + 0`.
#[test]
fn test_product_grid_interior() {
    let grid = GridShape::new(4, 4);
    let input = populate_product(grid);
    let golden = golden_output(&input, grid);

    for run in run_all(SimtConfig::new(4, 2), &input, grid) {
        assert_eq!(run.output[grid.offset(1, 1)], 5);
        assert_eq!(run.output, golden);
    }
}

/// Uniform grid: corners sum three terms, edges four, interior five.
#[test]
fn test_uniform_grid_edges_and_corners() {
    let grid = GridShape::new(4, 4);
    let input = populate_uniform(grid, 1);

    for run in run_all(SimtConfig::new(2, 2), &input, grid) {
        assert_eq!(run.output[grid.offset(0, 0)], 3);
        assert_eq!(run.output[grid.offset(3, 3)], 3);
        assert_eq!(run.output[grid.offset(1, 0)], 4);
        assert_eq!(run.output[grid.offset(0, 2)], 4);
        assert_eq!(run.output[grid.offset(1, 1)], 5);
        assert_eq!(run.output[grid.offset(2, 2)], 5);
    }
}

/// A single row has no vertical neighbours: a 1D three-point stencil.
#[test]
fn test_single_row_grid() {
    let grid = GridShape::new(16, 1);
    let input: Vec<i32> = (0..16).map(|x| x * x).collect();
    let expected: Vec<i32> = (0..16usize)
        .map(|x| {
            let left = if x > 0 { input[x - 1] } else { 0 };
            let right = if x + 1 < 16 { input[x + 1] } else { 0 };
            left + input[x] + right
        })
        .collect();

    let runs = run_all(SimtConfig::new(4, 1), &input, grid);
    for (variant, run) in TilingVariant::ALL.iter().zip(&runs) {
        assert_eq!(run.output, expected, "{variant}");
        // No vertical halo is ever fetched; only row loads remain.
        let row_loads = match variant {
            TilingVariant::Modulo => 4 * 4 + 3 * 4,
            _ => grid.len(),
        };
        assert_eq!(run.stats.global_loads as usize, row_loads, "{variant}");
    }
}

/// A grid exactly one tile wide finishes in one step and never prefetches.
#[test]
fn test_single_tile_width() {
    let grid = GridShape::new(8, 4);
    let input = populate_product(grid);
    let golden = golden_output(&input, grid);

    for run in run_all(SimtConfig::new(8, 2), &input, grid) {
        assert_eq!(run.output, golden);
        assert_eq!(run.stats.prefetches, 0);
        assert_eq!(run.stats.steps, 4);
        assert_eq!(run.stats.barriers, 4);
    }
}

/// Default configuration: 64x64 product grid, 32 lanes, 4 warps.
#[test]
fn test_default_config_self_test() {
    let config = StencilConfig::default();
    let input = config.generate_input();
    let golden = golden_output(&input, config.grid());
    let stencil = TiledStencil::from_config(&config);

    for variant in TilingVariant::ALL {
        let run = stencil.run(variant, &input, config.grid()).unwrap();
        assert_eq!(check_output(&run.output, &golden), Ok(()), "{variant}");
        assert_eq!(run.stats.blocks, 16);
        assert_eq!(run.stats.warps, 64);
    }
}

/// Full-width lanes: the lane mask uses every bit.
#[test]
fn test_sixty_four_lanes() {
    let grid = GridShape::new(128, 4);
    let input = populate_random(grid, 64);
    let golden = golden_output(&input, grid);

    for run in run_all(SimtConfig::new(64, 2), &input, grid) {
        assert_eq!(run.output, golden);
    }
}

/// One-lane warps degenerate to a column-by-column walk.
#[test]
fn test_single_lane_warps() {
    let grid = GridShape::new(5, 6);
    let input = populate_random(grid, 1);
    let golden = golden_output(&input, grid);

    for run in run_all(SimtConfig::new(1, 3), &input, grid) {
        assert_eq!(run.output, golden);
        assert_eq!(run.stats.steps, 30);
    }
}
