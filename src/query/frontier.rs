//! Frontier detection for exploration-target selection.
//!
//! A frontier cell sits on the boundary between known free space and
//! unexplored space; the exploration planner scores frontier cells as
//! candidate next targets. All queries here are read-only and treat
//! out-of-range coordinates as never-observed.

use crate::core::GridCoord;
use crate::grid::KnowledgeGrid;

/// Has the cell never been observed? True for out-of-range coordinates:
/// beyond the grid is by definition unexplored.
#[inline]
pub fn is_unknown(grid: &KnowledgeGrid, coord: GridCoord) -> bool {
    let state = grid.state_or_blank(coord);
    !state.is_free_space() && !state.is_safe_space() && !state.is_obstacle()
}

/// Does any cell of the 3x3 neighborhood remain unobserved?
#[inline]
pub fn has_unknown_neighbor(grid: &KnowledgeGrid, coord: GridCoord) -> bool {
    coord.neighbors_8().iter().any(|&n| is_unknown(grid, n))
}

/// Is this cell a candidate exploration target?
///
/// True for a free, non-obstacle cell that is either not yet safe (the
/// robot has only seen it from afar) or borders unexplored space.
pub fn is_frontier_cell(grid: &KnowledgeGrid, coord: GridCoord) -> bool {
    let state = grid.state_or_blank(coord);
    if !state.is_free_space() || state.is_obstacle() {
        return false;
    }
    !state.is_safe_space() || has_unknown_neighbor(grid, coord)
}

/// Enumerate every frontier cell. Full-grid scan; the exploration planner
/// calls this once per replan, not per tick.
pub fn frontier_cells(grid: &KnowledgeGrid) -> Vec<GridCoord> {
    let mut frontiers = Vec::new();
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let coord = GridCoord::new(x, y);
            if is_frontier_cell(grid, coord) {
                frontiers.push(coord);
            }
        }
    }
    frontiers
}

/// Is the whole 3x3 neighborhood free? Out-of-range cells are not free, so
/// cells on the grid edge are never in open space.
pub fn is_open_space(grid: &KnowledgeGrid, coord: GridCoord) -> bool {
    grid.free_space_at(coord) && coord.neighbors_8().iter().all(|&n| grid.free_space_at(n))
}

/// Count unobserved cells in the (2·range+1)² square around a cell, the
/// center excluded. Only real grid cells are counted; the census scores how
/// much unexplored area a candidate target would reveal.
pub fn count_unknown_in_square(grid: &KnowledgeGrid, center: GridCoord, range: i32) -> usize {
    census_in_square(grid, center, range, |grid, c| is_unknown(grid, c))
}

/// Count safe-space cells in the (2·range+1)² square around a cell, the
/// center excluded.
pub fn count_safe_in_square(grid: &KnowledgeGrid, center: GridCoord, range: i32) -> usize {
    census_in_square(grid, center, range, |grid, c| grid.safe_space_at(c))
}

fn census_in_square(
    grid: &KnowledgeGrid,
    center: GridCoord,
    range: i32,
    pred: impl Fn(&KnowledgeGrid, GridCoord) -> bool,
) -> usize {
    let mut count = 0;
    for x in (center.x - range)..=(center.x + range) {
        for y in (center.y - range)..=(center.y + range) {
            let coord = GridCoord::new(x, y);
            if coord != center && grid.in_bounds(coord) && pred(grid, coord) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    #[test]
    fn test_unknown_everywhere_on_fresh_grid() {
        let grid = KnowledgeGrid::new(5, 5).unwrap();
        assert!(is_unknown(&grid, coord(2, 2)));
        assert!(is_unknown(&grid, coord(-1, 0)));
        assert!(is_unknown(&grid, coord(5, 5)));
    }

    #[test]
    fn test_free_but_not_safe_is_frontier() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        grid.set_free_space(coord(2, 2)).unwrap();
        assert!(is_frontier_cell(&grid, coord(2, 2)));
    }

    #[test]
    fn test_safe_cell_bordering_unknown_is_frontier() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        grid.set_safe_space(coord(2, 2)).unwrap();
        // Neighbors unexplored: still a frontier.
        assert!(is_frontier_cell(&grid, coord(2, 2)));
    }

    #[test]
    fn test_safe_interior_cell_is_not_frontier() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        for x in 1..=3 {
            for y in 1..=3 {
                grid.set_safe_space(coord(x, y)).unwrap();
            }
        }
        assert!(!is_frontier_cell(&grid, coord(2, 2)));
        // The ring still borders unexplored cells.
        assert!(is_frontier_cell(&grid, coord(1, 1)));
    }

    #[test]
    fn test_obstacle_is_never_frontier() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        grid.set_obstacle(coord(2, 2)).unwrap();
        assert!(!is_frontier_cell(&grid, coord(2, 2)));
    }

    #[test]
    fn test_safe_cell_at_edge_is_frontier() {
        // Beyond the grid counts as unexplored.
        let mut grid = KnowledgeGrid::new(3, 3).unwrap();
        for x in 0..3 {
            for y in 0..3 {
                grid.set_safe_space(coord(x, y)).unwrap();
            }
        }
        assert!(is_frontier_cell(&grid, coord(0, 1)));
        assert!(!is_frontier_cell(&grid, coord(1, 1)));
    }

    #[test]
    fn test_frontier_cells_enumeration() {
        let mut grid = KnowledgeGrid::new(4, 4).unwrap();
        grid.set_free_space(coord(0, 0)).unwrap();
        grid.set_free_space(coord(3, 3)).unwrap();
        grid.set_obstacle(coord(1, 1)).unwrap();

        let frontiers = frontier_cells(&grid);
        assert_eq!(frontiers, vec![coord(0, 0), coord(3, 3)]);
    }

    #[test]
    fn test_open_space_requires_full_neighborhood() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        for x in 0..5 {
            for y in 0..5 {
                grid.set_free_space(coord(x, y)).unwrap();
            }
        }
        assert!(is_open_space(&grid, coord(2, 2)));
        // Edge cells have out-of-range neighbors, which are not free.
        assert!(!is_open_space(&grid, coord(0, 2)));
        assert!(!is_open_space(&grid, coord(4, 4)));

        grid.set_obstacle(coord(1, 2)).unwrap();
        assert!(!is_open_space(&grid, coord(2, 2)));
    }

    #[test]
    fn test_count_unknown_in_square() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        grid.set_free_space(coord(2, 2)).unwrap();
        grid.set_free_space(coord(1, 2)).unwrap();
        // 3x3 square around (2,2): 8 cells besides the center, one of them
        // free, the rest unknown.
        assert_eq!(count_unknown_in_square(&grid, coord(2, 2), 1), 7);
        // At the corner only 3 in-bounds cells remain besides the center.
        assert_eq!(count_unknown_in_square(&grid, coord(0, 0), 1), 3);
    }

    #[test]
    fn test_count_safe_in_square() {
        let mut grid = KnowledgeGrid::new(5, 5).unwrap();
        grid.set_safe_space(coord(1, 1)).unwrap();
        grid.set_safe_space(coord(2, 2)).unwrap();
        grid.set_safe_space(coord(3, 3)).unwrap();
        // Center itself is excluded from the census.
        assert_eq!(count_safe_in_square(&grid, coord(2, 2), 1), 2);
        assert_eq!(count_safe_in_square(&grid, coord(2, 2), 2), 2);
    }
}
