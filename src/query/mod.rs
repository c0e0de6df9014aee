//! Read-only spatial queries over the knowledge grid.
//!
//! Nothing here mutates the grid, and nothing here errors on out-of-range
//! coordinates: beyond the grid reads as never-observed (not free, not
//! safe, not an obstacle). Queries may run concurrently with each other,
//! but not with a mutation on the same grid; long planning scans should
//! operate on a clone.

mod frontier;
mod raycast;
mod visibility;

pub use frontier::{
    count_safe_in_square, count_unknown_in_square, frontier_cells, has_unknown_neighbor,
    is_frontier_cell, is_open_space, is_unknown,
};
pub use raycast::{count_non_free_on_ray, count_obstacles_on_ray};
pub use visibility::{direct_line_possible, obstacle_within_radius, point_to_line_distance};
