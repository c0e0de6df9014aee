//! Line-of-sight and proximity queries.

use crate::core::GridCoord;
use crate::grid::KnowledgeGrid;

/// Perpendicular distance from `p3` to the line through `p1` and `p2`.
///
/// Uses the standard projection-parameter formula; the projection is not
/// clamped to the segment. Exactly 0 when `p3` coincides with either
/// endpoint; falls back to point distance when `p1 == p2`.
pub fn point_to_line_distance(p1: GridCoord, p2: GridCoord, p3: GridCoord) -> f32 {
    if p3 == p1 || p3 == p2 {
        return 0.0;
    }

    let len_sq = p1.distance_squared(&p2) as f32;
    if len_sq == 0.0 {
        return (p1.distance_squared(&p3) as f32).sqrt();
    }

    let t = ((p3.x - p1.x) * (p2.x - p1.x) + (p3.y - p1.y) * (p2.y - p1.y)) as f32 / len_sq;
    let ix = p1.x as f32 + t * (p2.x - p1.x) as f32;
    let iy = p1.y as f32 + t * (p2.y - p1.y) as f32;

    let dx = p3.x as f32 - ix;
    let dy = p3.y as f32 - iy;
    (dx * dx + dy * dy).sqrt()
}

/// Is there a straight line from `src` to `dst` not blocked by a known
/// obstacle?
///
/// Every cell of the open integer bounding box (both endpoints' rows and
/// columns excluded) within perpendicular distance 0.5 of the segment must
/// be obstacle-free. Unknown cells are passable: the exploration planner
/// probes lines toward frontiers, and treating unexplored territory as
/// opaque would reject every line that matters.
pub fn direct_line_possible(grid: &KnowledgeGrid, src: GridCoord, dst: GridCoord) -> bool {
    let (x0, x1) = (src.x.min(dst.x), src.x.max(dst.x));
    let (y0, y1) = (src.y.min(dst.y), src.y.max(dst.y));

    for x in (x0 + 1)..=(x1 - 1) {
        for y in (y0 + 1)..=(y1 - 1) {
            let coord = GridCoord::new(x, y);
            if grid.obstacle_at(coord) && point_to_line_distance(src, dst, coord) <= 0.5 {
                return false;
            }
        }
    }
    true
}

/// Is any known obstacle within Euclidean distance `radius` of the cell?
/// Circular test, not bounding-box: a corner of the enclosing square
/// farther than `radius` does not count.
pub fn obstacle_within_radius(grid: &KnowledgeGrid, center: GridCoord, radius: i32) -> bool {
    let radius_sq = radius as i64 * radius as i64;
    for x in (center.x - radius)..=(center.x + radius) {
        for y in (center.y - radius)..=(center.y + radius) {
            let coord = GridCoord::new(x, y);
            if center.distance_squared(&coord) <= radius_sq && grid.obstacle_at(coord) {
                return true;
            }
        }
    }
    false
}
