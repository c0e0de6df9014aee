//! Ray coverage counting.
//!
//! Marches unit steps along the angle from source to destination and counts
//! the cells a predicate hits. This is a deliberate approximation of ray
//! coverage, not exact rasterization: after each hit, one extra step is
//! skipped so a single thick obstacle straddling two sampled cells is not
//! counted twice.

use crate::core::{CellState, GridCoord};
use crate::grid::KnowledgeGrid;

/// Count known-obstacle cells hit by the ray from `src` to `dst`.
pub fn count_obstacles_on_ray(grid: &KnowledgeGrid, src: GridCoord, dst: GridCoord) -> usize {
    count_on_ray(grid, src, dst, CellState::is_obstacle)
}

/// Count non-free cells (obstacles and unexplored cells alike) hit by the
/// ray from `src` to `dst`, the pessimistic variant used when signal
/// attenuation through unknown territory matters.
pub fn count_non_free_on_ray(grid: &KnowledgeGrid, src: GridCoord, dst: GridCoord) -> usize {
    count_on_ray(grid, src, dst, |state| !state.is_free_space())
}

fn count_on_ray(
    grid: &KnowledgeGrid,
    src: GridCoord,
    dst: GridCoord,
    hit: impl Fn(CellState) -> bool,
) -> usize {
    let dx = (dst.x - src.x) as f32;
    let dy = (dst.y - src.y) as f32;
    let angle = dy.atan2(dx);
    let distance = (dx * dx + dy * dy).sqrt() as i32;
    let (sin, cos) = angle.sin_cos();

    let mut count = 0;
    let mut step = 0;
    while step <= distance {
        let current = GridCoord::new(
            src.x + (cos * step as f32) as i32,
            src.y + (sin * step as f32) as i32,
        );
        if hit(grid.state_or_blank(current)) {
            count += 1;
            // Skip a step so one thick obstacle is not counted twice.
            step += 1;
        }
        step += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    /// 5x5 all-free grid for obstacle-count tests.
    fn free_grid() -> KnowledgeGrid {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        for x in 0..5 {
            for y in 0..5 {
                grid.set_free_space(coord(x, y)).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_single_obstacle_on_ray() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        grid.set_obstacle(coord(2, 0)).unwrap();
        assert_eq!(count_obstacles_on_ray(&grid, coord(0, 0), coord(4, 0)), 1);
    }

    #[test]
    fn test_adjacent_obstacles_count_once() {
        let mut grid = free_grid();
        grid.set_obstacle(coord(2, 0)).unwrap();
        grid.set_obstacle(coord(3, 0)).unwrap();
        // The post-hit skip lands past the second cell of the wall.
        assert_eq!(count_obstacles_on_ray(&grid, coord(0, 0), coord(4, 0)), 1);
    }

    #[test]
    fn test_separated_obstacles_count_separately() {
        let mut grid = KnowledgeGrid::new(9, 1).unwrap();
        grid.set_obstacle(coord(2, 0)).unwrap();
        grid.set_obstacle(coord(6, 0)).unwrap();
        assert_eq!(count_obstacles_on_ray(&grid, coord(0, 0), coord(8, 0)), 2);
    }

    #[test]
    fn test_clear_ray_counts_zero() {
        let grid = free_grid();
        assert_eq!(count_obstacles_on_ray(&grid, coord(0, 0), coord(4, 4)), 0);
    }

    #[test]
    fn test_non_free_counts_unknown_cells() {
        let grid = KnowledgeGrid::new(5, 5).unwrap();
        // Everything unexplored: every sampled cell is a hit, with the
        // skip dropping every other sample.
        assert!(count_non_free_on_ray(&grid, coord(0, 0), coord(4, 0)) > 0);
        assert_eq!(count_non_free_on_ray(&grid, coord(0, 0), coord(4, 0)), 3);
    }

    #[test]
    fn test_diagonal_ray_hits_obstacle() {
        let mut grid = free_grid();
        grid.set_obstacle(coord(2, 2)).unwrap();
        assert_eq!(count_obstacles_on_ray(&grid, coord(0, 0), coord(4, 4)), 1);
    }

    #[test]
    fn test_zero_length_ray_samples_source() {
        let mut grid = free_grid();
        grid.set_obstacle(coord(1, 1)).unwrap();
        assert_eq!(count_obstacles_on_ray(&grid, coord(1, 1), coord(1, 1)), 1);
        assert_eq!(count_obstacles_on_ray(&grid, coord(0, 0), coord(0, 0)), 0);
    }
}
